//! Obsidian MCP Server
//!
//! Serves Obsidian notes over MCP (stdio and/or HTTP), talking to the Local
//! REST API plugin through a self-healing client.
//!
//! # Configuration
//! Set `API_KEY` and `API_URLS` (or `API_HOST`/`API_PORT`), choose transports
//! with `MCP_TRANSPORTS`, or configure `~/.config/obsidian-mcp/config.toml`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use obsidian_mcp::health::health_status;
use obsidian_mcp::logging::init_tracing;
use obsidian_mcp::transports::ServerFactory;
use obsidian_mcp::{
    AppConfig, ObsidianMcpServer, SelfHealingClient, TransportFactories, TransportManager,
};

#[derive(Parser)]
#[command(name = "obsidian-mcp")]
#[command(about = "Obsidian notes over MCP with self-healing REST API failover")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "OBSIDIAN_MCP_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Comma separated transports to enable (stdio, http); overrides MCP_TRANSPORTS
    #[arg(short, long)]
    transports: Option<String>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let started_at = Utc::now();
    let cli = Cli::parse();
    init_tracing()?;

    tracing::info!("Starting Obsidian MCP Server");

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(transports) = cli.transports.as_deref() {
        config.set_transports(transports);
    }
    config.validate()?;

    let client = Arc::new(
        SelfHealingClient::new(config.self_healing_config())
            .context("failed to create Obsidian API client")?,
    );
    client
        .initialize()
        .await
        .context("failed to connect to Obsidian API")?;
    tracing::info!(url = %client.current_url(), "Obsidian API ready");

    let api = Arc::clone(&client);
    let server_factory: ServerFactory = Arc::new(move || ObsidianMcpServer::new(api.clone()));

    // with HTTP also running, a closed stdin must not take the process down
    let stdio_ended = CancellationToken::new();
    let on_stdio_end = (!config.transports.http.enabled).then(|| stdio_ended.clone());
    let mut manager = TransportManager::new(
        config.transports.clone(),
        server_factory,
        TransportFactories::builtin(on_stdio_end),
    );

    manager.start_transports().await;

    if manager.running().is_empty() {
        client.destroy();
        bail!("no transport could be started");
    }

    let health = health_status(&client, &manager, started_at);
    tracing::info!(
        healthy = health.healthy,
        health = %serde_json::to_string(&health)?,
        "Server running, waiting for requests..."
    );

    tokio::select! {
        _ = shutdown_signal() => tracing::info!("Shutdown signal received"),
        _ = stdio_ended.cancelled() => tracing::info!("stdio session ended"),
    }

    let health = health_status(&client, &manager, started_at);
    tracing::info!(
        healthy = health.healthy,
        uptime_secs = health.uptime,
        health = %serde_json::to_string(&health)?,
        "Health at shutdown"
    );

    manager.stop_transports().await;
    client.destroy();

    tracing::info!("Server shutting down");
    Ok(())
}
