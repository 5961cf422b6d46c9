//! Obsidian MCP Library
//!
//! Exposes notes from the Obsidian Local REST API plugin over MCP, on stdio
//! and/or streamable HTTP. The REST API may be reachable on several URLs
//! (localhost, LAN, tunnel); the self-healing client picks the fastest one and
//! fails over when it stops answering.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use obsidian_mcp::{ObsidianMcpServer, SelfHealingClient};
//!
//! let client = Arc::new(SelfHealingClient::new(config.self_healing_config())?);
//! client.initialize().await?;
//! let server = ObsidianMcpServer::new(client.clone());
//! ```
//!
//! # Configuration
//! Set `API_KEY` and `API_URLS`, or configure `~/.config/obsidian-mcp/config.toml`

pub mod client;
pub mod config;
pub mod error;
pub mod healing;
pub mod health;
pub mod logging;
pub mod params;
pub mod server;
pub mod transports;

// Re-export main types
pub use client::{ApiError, NoteApi, ObsidianClient};
pub use config::AppConfig;
pub use healing::{HealingError, HealthSnapshot, SelfHealingClient, SelfHealingConfig};
pub use health::{health_status, HealthStatus};
pub use server::ObsidianMcpServer;
pub use transports::{TransportFactories, TransportKind, TransportManager};

// Re-export parameter types for direct API usage
pub use params::{GetNoteContentParams, SearchParams};
