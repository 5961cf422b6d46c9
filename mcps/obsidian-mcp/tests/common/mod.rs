//! Loopback stand-in for the Obsidian Local REST API
//!
//! Each [`FakeUpstream`] is a real axum server on `127.0.0.1:0` with a
//! toggleable health flag, an optional response delay and hit counters.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::task::JoinHandle;

pub const API_KEY: &str = "0123456789abcdef0123456789abcdef";

pub struct UpstreamState {
    pub name: String,
    healthy: AtomicBool,
    delay_ms: AtomicU64,
    root_hits: AtomicUsize,
    root_budget: AtomicUsize,
    pub writes: Mutex<Vec<(String, String)>>,
}

pub struct FakeUpstream {
    pub url: String,
    pub state: Arc<UpstreamState>,
    task: JoinHandle<()>,
}

impl FakeUpstream {
    pub async fn start(name: &str) -> Self {
        Self::with_delay(name, Duration::ZERO).await
    }

    pub async fn with_delay(name: &str, delay: Duration) -> Self {
        let state = Arc::new(UpstreamState {
            name: name.to_string(),
            healthy: AtomicBool::new(true),
            delay_ms: AtomicU64::new(delay.as_millis() as u64),
            root_hits: AtomicUsize::new(0),
            root_budget: AtomicUsize::new(usize::MAX),
            writes: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/", get(server_info))
            .route("/vault/{*path}", get(read_note).put(write_note))
            .route("/search/simple/", post(search))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let task = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { url, state, task }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Answer only the first `hits` `GET /` requests, then 503
    pub fn fail_root_after(&self, hits: usize) {
        self.state.root_budget.store(hits, Ordering::SeqCst);
    }

    /// Number of `GET /` requests served (probes and health checks)
    pub fn root_hits(&self) -> usize {
        self.state.root_hits.load(Ordering::SeqCst)
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A URL nothing listens on
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn delay(state: &UpstreamState) {
    let ms = state.delay_ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "errorCode": 50300, "message": "Vault unavailable" })),
    )
        .into_response()
}

async fn server_info(State(state): State<Arc<UpstreamState>>) -> Response {
    let hit = state.root_hits.fetch_add(1, Ordering::SeqCst) + 1;
    delay(&state).await;

    if !state.healthy.load(Ordering::SeqCst) || hit > state.root_budget.load(Ordering::SeqCst) {
        return unavailable();
    }

    Json(json!({
        "status": "OK",
        "service": "Obsidian Local REST API",
        "authenticated": true,
        "versions": { "obsidian": "1.5.8", "self": "3.0.1" },
        "manifest": { "id": "obsidian-local-rest-api", "name": state.name, "version": "3.0.1" }
    }))
    .into_response()
}

async fn read_note(State(state): State<Arc<UpstreamState>>, Path(path): Path<String>) -> Response {
    if !state.healthy.load(Ordering::SeqCst) {
        return unavailable();
    }

    if path.starts_with("missing") {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "errorCode": 40400, "message": "File not found" })),
        )
            .into_response();
    }

    Json(json!({
        "path": path,
        "content": format!("# {}\nserved by {}", path, state.name),
        "frontmatter": { "status": "draft" },
        "tags": ["project", "rust"],
        "stat": { "ctime": 1700000000000u64, "mtime": 1700000001000u64, "size": 42 }
    }))
    .into_response()
}

async fn write_note(
    State(state): State<Arc<UpstreamState>>,
    Path(path): Path<String>,
    body: String,
) -> StatusCode {
    state.writes.lock().unwrap().push((path, body));
    StatusCode::NO_CONTENT
}

async fn search(
    State(state): State<Arc<UpstreamState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let query = params.get("query").cloned().unwrap_or_default();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errorCode": 40090, "message": "A search query is required" })),
        )
            .into_response();
    }

    Json(json!([
        {
            "filename": format!("{}/first.md", state.name),
            "score": 2.5,
            "matches": [
                { "match": { "start": 0, "end": 4 }, "context": format!("...{}...", query) },
                { "match": { "start": 10, "end": 14 }, "context": "second context" }
            ]
        },
        {
            "filename": "second.md",
            "score": 0.5,
            "matches": []
        }
    ]))
    .into_response()
}

/// A server whose REST client points nowhere; enough for transport tests
pub fn offline_server() -> obsidian_mcp::ObsidianMcpServer {
    let client = obsidian_mcp::ObsidianClient::new("http://127.0.0.1:9", API_KEY).unwrap();
    obsidian_mcp::ObsidianMcpServer::new(Arc::new(client))
}
