//! stdio transport
//!
//! Serves one MCP server instance over the process's stdin/stdout. The
//! session runs in a background task so starting does not wait for the
//! client's `initialize` handshake.

use anyhow::Result;
use async_trait::async_trait;
use rmcp::{transport::stdio, ServiceExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::TransportContext;
use crate::server::ObsidianMcpServer;

/// Running stdio session
pub struct StdioTransportContext {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

async fn run_session(server: ObsidianMcpServer) -> Result<()> {
    let service = server.serve(stdio()).await?;
    tracing::info!("MCP server connected to stdio transport");

    let reason = service.waiting().await?;
    tracing::info!(?reason, "stdio session ended");
    Ok(())
}

/// Start serving `server` on stdin/stdout
///
/// `on_session_end` is cancelled when the peer ends the session (e.g. stdin
/// closes), letting the process shut down instead of idling.
pub fn start_stdio_transport(
    server: ObsidianMcpServer,
    on_session_end: Option<CancellationToken>,
) -> StdioTransportContext {
    let cancel = CancellationToken::new();
    let stop = cancel.clone();

    let task = tokio::spawn(async move {
        tokio::select! {
            _ = stop.cancelled() => {
                tracing::debug!("stdio transport cancelled");
            }
            outcome = run_session(server) => {
                if let Err(e) = outcome {
                    tracing::warn!(error = %e, "stdio transport failed");
                }
                if let Some(token) = on_session_end {
                    token.cancel();
                }
            }
        }
    });

    StdioTransportContext { cancel, task }
}

#[async_trait]
impl TransportContext for StdioTransportContext {
    async fn close(self: Box<Self>) -> Result<()> {
        tracing::info!("Closing stdio transport");
        self.cancel.cancel();
        self.task.await?;
        Ok(())
    }
}
