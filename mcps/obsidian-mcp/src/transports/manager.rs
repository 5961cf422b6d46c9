//! Transport lifecycle management
//!
//! The manager starts one fresh server instance per enabled transport,
//! tracks which transports are running, and stops them all concurrently.
//! Transports are isolated: one failing to start or close never affects
//! the others, and there is no rollback.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::config::{HttpConfig, TransportsConfig};
use super::http::start_http_transport;
use super::stdio::start_stdio_transport;
use super::{TransportContext, TransportKind};
use crate::server::ObsidianMcpServer;

/// Produces a fresh server instance for one transport
pub type ServerFactory = Arc<dyn Fn() -> ObsidianMcpServer + Send + Sync>;

/// Starts the stdio transport around a server
pub type StdioFactory = Arc<
    dyn Fn(ObsidianMcpServer) -> BoxFuture<'static, Result<Box<dyn TransportContext>>>
        + Send
        + Sync,
>;

/// Starts the HTTP transport around a server
pub type HttpFactory = Arc<
    dyn Fn(HttpConfig, ObsidianMcpServer) -> BoxFuture<'static, Result<Box<dyn TransportContext>>>
        + Send
        + Sync,
>;

/// Registry of transport adapters
///
/// A transport with no registered factory is skipped at start.
#[derive(Clone, Default)]
pub struct TransportFactories {
    pub stdio: Option<StdioFactory>,
    pub http: Option<HttpFactory>,
}

async fn start_builtin_stdio(
    server: ObsidianMcpServer,
    on_end: Option<CancellationToken>,
) -> Result<Box<dyn TransportContext>> {
    Ok(Box::new(start_stdio_transport(server, on_end)))
}

async fn start_builtin_http(
    config: HttpConfig,
    server: ObsidianMcpServer,
) -> Result<Box<dyn TransportContext>> {
    Ok(Box::new(start_http_transport(config, server).await?))
}

impl TransportFactories {
    /// The real stdio and HTTP adapters
    ///
    /// `on_stdio_end` is cancelled when the stdio peer ends its session.
    pub fn builtin(on_stdio_end: Option<CancellationToken>) -> Self {
        let stdio: StdioFactory = Arc::new(move |server: ObsidianMcpServer| {
            start_builtin_stdio(server, on_stdio_end.clone()).boxed()
        });
        let http: HttpFactory = Arc::new(|config: HttpConfig, server: ObsidianMcpServer| {
            start_builtin_http(config, server).boxed()
        });

        Self {
            stdio: Some(stdio),
            http: Some(http),
        }
    }

    pub fn with_stdio(mut self, factory: StdioFactory) -> Self {
        self.stdio = Some(factory);
        self
    }

    pub fn with_http(mut self, factory: HttpFactory) -> Self {
        self.http = Some(factory);
        self
    }
}

/// Status of one transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransportStatusEntry {
    /// From configuration
    pub enabled: bool,
    /// A live context is tracked
    pub running: bool,
}

/// Status of all known transports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransportStatus {
    pub stdio: TransportStatusEntry,
    pub http: TransportStatusEntry,
}

impl TransportStatus {
    pub fn get(&self, kind: TransportKind) -> TransportStatusEntry {
        match kind {
            TransportKind::Stdio => self.stdio,
            TransportKind::Http => self.http,
        }
    }
}

/// Owns the lifecycle of all transports
pub struct TransportManager {
    config: TransportsConfig,
    server_factory: ServerFactory,
    factories: TransportFactories,
    contexts: BTreeMap<TransportKind, Box<dyn TransportContext>>,
}

impl TransportManager {
    pub fn new(
        config: TransportsConfig,
        server_factory: ServerFactory,
        factories: TransportFactories,
    ) -> Self {
        Self {
            config,
            server_factory,
            factories,
            contexts: BTreeMap::new(),
        }
    }

    fn is_enabled(&self, kind: TransportKind) -> bool {
        match kind {
            TransportKind::Stdio => self.config.stdio.enabled,
            TransportKind::Http => self.config.http.enabled,
        }
    }

    /// Start every enabled transport, stdio first
    ///
    /// Failures are logged per transport and do not stop the others.
    pub async fn start_transports(&mut self) {
        tracing::info!("Starting transports");

        for kind in TransportKind::ALL {
            if !self.is_enabled(kind) || self.contexts.contains_key(&kind) {
                continue;
            }

            match self.start_one(kind).await {
                Ok(Some(context)) => {
                    tracing::info!(transport = %kind, "Transport started");
                    self.contexts.insert(kind, context);
                }
                Ok(None) => {
                    tracing::warn!(transport = %kind, "Transport not available, skipping");
                }
                Err(e) => {
                    tracing::warn!(transport = %kind, error = %e, "Failed to start transport");
                }
            }
        }

        tracing::info!(running = ?self.running(), "Transports started");
    }

    async fn start_one(&self, kind: TransportKind) -> Result<Option<Box<dyn TransportContext>>> {
        let server = (self.server_factory)();

        match kind {
            TransportKind::Stdio => match &self.factories.stdio {
                Some(factory) => Ok(Some(factory(server).await?)),
                None => Ok(None),
            },
            TransportKind::Http => match &self.factories.http {
                Some(factory) => Ok(Some(factory(self.config.http.clone(), server).await?)),
                None => Ok(None),
            },
        }
    }

    /// Close every running transport concurrently and forget them
    pub async fn stop_transports(&mut self) {
        tracing::info!("Stopping all transports");

        let contexts = std::mem::take(&mut self.contexts);
        join_all(contexts.into_iter().map(|(kind, context)| async move {
            tracing::debug!(transport = %kind, "Stopping transport");
            if let Err(e) = context.close().await {
                tracing::warn!(transport = %kind, error = %e, "Error stopping transport");
            }
        }))
        .await;

        tracing::info!("All transports stopped");
    }

    /// Enabled (from config) and running (live context) per transport
    pub fn get_status(&self) -> TransportStatus {
        let entry = |kind| TransportStatusEntry {
            enabled: self.is_enabled(kind),
            running: self.contexts.contains_key(&kind),
        };

        TransportStatus {
            stdio: entry(TransportKind::Stdio),
            http: entry(TransportKind::Http),
        }
    }

    /// Transports with a live context
    pub fn running(&self) -> Vec<TransportKind> {
        self.contexts.keys().copied().collect()
    }
}
