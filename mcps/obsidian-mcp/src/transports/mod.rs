//! MCP transports
//!
//! Each enabled transport gets its own [`ObsidianMcpServer`](crate::ObsidianMcpServer)
//! instance; the [`TransportManager`] starts and stops them independently.

pub mod auth;
pub mod config;
pub mod http;
pub mod manager;
pub mod stdio;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use auth::BearerAuth;
pub use config::{AuthConfig, HttpConfig, StdioConfig, TransportsConfig};
pub use http::{start_http_transport, HttpTransportContext};
pub use manager::{
    HttpFactory, ServerFactory, StdioFactory, TransportFactories, TransportManager,
    TransportStatus, TransportStatusEntry,
};
pub use stdio::{start_stdio_transport, StdioTransportContext};

/// Known transport front-ends, in start order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Stdio,
    Http,
}

impl TransportKind {
    pub const ALL: [TransportKind; 2] = [TransportKind::Stdio, TransportKind::Http];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "http",
        }
    }

    /// Parse a transport name as used in `MCP_TRANSPORTS`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "stdio" => Some(TransportKind::Stdio),
            "http" => Some(TransportKind::Http),
            _ => None,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a running transport
#[async_trait]
pub trait TransportContext: Send + Sync {
    /// Shut the transport down and release its resources
    async fn close(self: Box<Self>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transport_names() {
        assert_eq!(TransportKind::parse("stdio"), Some(TransportKind::Stdio));
        assert_eq!(TransportKind::parse(" HTTP "), Some(TransportKind::Http));
        assert_eq!(TransportKind::parse("sse"), None);
    }

    #[test]
    fn test_start_order() {
        assert_eq!(TransportKind::ALL, [TransportKind::Stdio, TransportKind::Http]);
        assert_eq!(TransportKind::Http.to_string(), "http");
    }
}
