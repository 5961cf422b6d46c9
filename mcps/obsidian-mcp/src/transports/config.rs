//! Transport configuration

use serde::{Deserialize, Serialize};

/// Configuration for all transports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportsConfig {
    #[serde(default)]
    pub stdio: StdioConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl TransportsConfig {
    /// Whether any transport is enabled
    pub fn any_enabled(&self) -> bool {
        self.stdio.enabled || self.http.enabled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for StdioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// HTTP transport configuration
///
/// The MCP endpoint handles both JSON-RPC POSTs and the SSE stream (GET) on
/// `path`; `/health` is served next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_http_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_http_host(),
            port: default_http_port(),
            path: default_http_path(),
            auth: None,
        }
    }
}

/// Bearer-token authentication for the MCP endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Environment variable holding the token, consulted when `token` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env_var: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3000
}

fn default_http_path() -> String {
    "/mcp".to_string()
}
