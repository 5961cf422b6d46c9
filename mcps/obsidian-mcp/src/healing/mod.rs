//! Self-healing connection layer
//!
//! Given several candidate base URLs for the REST API, pick the fastest
//! reachable one, watch it, and fail over to another candidate when it
//! stops answering. Callers only ever see a [`NoteApi`](crate::client::NoteApi).

pub mod client;
pub mod probe;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::client::ApiError;

pub use client::SelfHealingClient;
pub use probe::{probe, probe_all, select_best, ProbeResult};

/// Settings for [`SelfHealingClient`]
#[derive(Debug, Clone)]
pub struct SelfHealingConfig {
    /// Candidate base URLs, in configuration order
    pub urls: Vec<String>,
    pub api_key: String,
    /// Per-probe timeout
    pub test_timeout: Duration,
    /// Interval between health checks
    pub retry_interval: Duration,
}

/// Point-in-time view of the connection state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    /// `reconnect_count == 0`; true right after initialization even before
    /// any health check has run
    pub healthy: bool,
    pub url: String,
    pub last_check: DateTime<Utc>,
    pub reconnect_count: u32,
}

/// Errors surfaced by the self-healing client
#[derive(Error, Debug)]
pub enum HealingError {
    #[error("no candidate URLs configured")]
    NoCandidates,

    #[error("no reachable Obsidian API endpoint (tried: {})", tried.join(", "))]
    NoReachableEndpoint { tried: Vec<String> },

    #[error("failed to connect to Obsidian API at {url}: {source}")]
    Verification {
        url: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Client(#[from] ApiError),
}
