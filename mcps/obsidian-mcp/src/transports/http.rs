//! HTTP transport
//!
//! Streamable-HTTP MCP endpoint (JSON-RPC over POST, SSE over GET on the
//! same path) plus an unauthenticated `/health` endpoint. Every MCP session
//! is served by a clone of the transport's server instance.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use axum::{middleware, routing::get, Json, Router};
use chrono::Utc;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, BearerAuth};
use super::config::HttpConfig;
use super::TransportContext;
use crate::server::ObsidianMcpServer;

/// Running HTTP transport
pub struct HttpTransportContext {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl HttpTransportContext {
    /// Address the listener is bound to (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "transport": "http",
    }))
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn build_router(config: &HttpConfig, server: ObsidianMcpServer, cancel: &CancellationToken) -> Router {
    let service: StreamableHttpService<ObsidianMcpServer, LocalSessionManager> =
        StreamableHttpService::new(
            move || Ok(server.clone()),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig {
                stateful_mode: true,
                cancellation_token: cancel.child_token(),
                ..Default::default()
            },
        );

    let path = normalize_path(&config.path);
    let mut mcp = if path == "/" {
        Router::new().fallback_service(service)
    } else {
        Router::new().nest_service(&path, service)
    };

    if let Some(auth) = config.auth.as_ref().filter(|a| a.enabled) {
        let auth = Arc::new(BearerAuth::from_config(auth));
        mcp = mcp.layer(middleware::from_fn_with_state(auth, auth_middleware));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(mcp)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind `host:port` and serve `server` over HTTP
pub async fn start_http_transport(
    config: HttpConfig,
    server: ObsidianMcpServer,
) -> Result<HttpTransportContext> {
    let cancel = CancellationToken::new();
    let router = build_router(&config, server, &cancel);

    let bind = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind HTTP transport to {}", bind))?;
    let local_addr = listener.local_addr()?;

    let shutdown = cancel.child_token();
    let task = tokio::spawn(async move {
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        if let Err(e) = served {
            tracing::warn!(error = %e, "HTTP transport stopped with error");
        }
    });

    tracing::info!(
        addr = %local_addr,
        path = %normalize_path(&config.path),
        auth = config.auth.as_ref().is_some_and(|a| a.enabled),
        "HTTP transport started"
    );

    Ok(HttpTransportContext {
        local_addr,
        cancel,
        task,
    })
}

#[async_trait]
impl TransportContext for HttpTransportContext {
    async fn close(self: Box<Self>) -> Result<()> {
        tracing::info!(addr = %self.local_addr, "Closing HTTP transport");
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| anyhow!("HTTP transport task failed: {}", e))?;
        Ok(())
    }
}
