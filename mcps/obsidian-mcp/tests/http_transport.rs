//! HTTP transport over a real loopback listener

mod common;

use std::time::Duration;

use common::offline_server;
use obsidian_mcp::transports::{
    start_http_transport, AuthConfig, HttpConfig, HttpTransportContext, TransportContext,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

const TOKEN: &str = "test-token";
const SESSION_HEADER: &str = "mcp-session-id";

fn http_config(auth: Option<AuthConfig>) -> HttpConfig {
    HttpConfig {
        enabled: true,
        host: "127.0.0.1".to_string(),
        port: 0,
        path: "/mcp".to_string(),
        auth,
    }
}

fn token_auth() -> Option<AuthConfig> {
    Some(AuthConfig {
        enabled: true,
        token: Some(TOKEN.to_string()),
        token_env_var: None,
    })
}

fn initialize_request() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": { "name": "http-transport-test", "version": "0.1.0" }
        }
    })
}

async fn post_mcp(
    context: &HttpTransportContext,
    bearer: Option<&str>,
) -> reqwest::Response {
    let mut request = reqwest::Client::new()
        .post(format!("http://{}/mcp", context.local_addr()))
        .header("Accept", "application/json, text/event-stream")
        .json(&initialize_request());
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    request.send().await.unwrap()
}

async fn post_in_session(
    context: &HttpTransportContext,
    session_id: &str,
    body: Value,
) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{}/mcp", context.local_addr()))
        .header("Accept", "application/json, text/event-stream")
        .header(SESSION_HEADER, session_id)
        .json(&body)
        .send()
        .await
        .unwrap()
}

fn session_id(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .expect("initialize response carries a session id")
        .to_string()
}

/// Read a (possibly SSE) body until it mentions `needle`
async fn read_until(mut response: reqwest::Response, needle: &str) -> String {
    let mut body = String::new();
    let read = async {
        while let Some(chunk) = response.chunk().await.unwrap() {
            body.push_str(&String::from_utf8_lossy(&chunk));
            if body.contains(needle) {
                break;
            }
        }
    };
    let _ = tokio::time::timeout(Duration::from_secs(5), read).await;
    body
}

async fn close(context: HttpTransportContext) {
    Box::new(context).close().await.unwrap();
}

#[tokio::test]
async fn test_health_is_open_even_with_auth() {
    let context = start_http_transport(http_config(token_auth()), offline_server())
        .await
        .unwrap();

    let response = reqwest::get(format!("http://{}/health", context.local_addr()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["transport"], "http");
    assert!(body["timestamp"].is_string());

    close(context).await;
}

#[tokio::test]
async fn test_mcp_requires_bearer_token() {
    let context = start_http_transport(http_config(token_auth()), offline_server())
        .await
        .unwrap();

    let response = post_mcp(&context, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get("www-authenticate")
            .and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "error": "Unauthorized", "message": "Valid Bearer token required" })
    );

    let response = post_mcp(&context, Some("wrong-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_mcp(&context, Some(TOKEN)).await;
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.status().is_success(), "got {}", response.status());

    close(context).await;
}

#[tokio::test]
async fn test_mcp_open_without_auth() {
    let context = start_http_transport(http_config(None), offline_server())
        .await
        .unwrap();

    let response = post_mcp(&context, None).await;
    assert!(response.status().is_success(), "got {}", response.status());

    close(context).await;
}

#[tokio::test]
async fn test_close_releases_listener() {
    let context = start_http_transport(http_config(None), offline_server())
        .await
        .unwrap();
    let addr = context.local_addr();

    close(context).await;

    let result = reqwest::get(format!("http://{}/health", addr)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_session_accepts_follow_up_requests() {
    let context = start_http_transport(http_config(None), offline_server())
        .await
        .unwrap();

    let response = post_mcp(&context, None).await;
    assert!(response.status().is_success(), "got {}", response.status());
    let session = session_id(&response);
    assert!(!session.is_empty());
    let init = read_until(response, "protocolVersion").await;
    assert!(init.contains("protocolVersion"), "initialize body: {init}");

    let response = post_in_session(
        &context,
        &session,
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = post_in_session(
        &context,
        &session,
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {} }),
    )
    .await;
    assert!(response.status().is_success(), "got {}", response.status());
    let body = read_until(response, "obsidian_semantic_search").await;
    assert!(body.contains("get_note_content"), "tools/list body: {body}");
    assert!(body.contains("obsidian_search"));

    // a second client gets its own session
    let other = post_mcp(&context, None).await;
    assert_ne!(session_id(&other), session);

    close(context).await;
}

#[tokio::test]
async fn test_unknown_session_is_rejected() {
    let context = start_http_transport(http_config(None), offline_server())
        .await
        .unwrap();

    let response = post_in_session(
        &context,
        "no-such-session",
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {} }),
    )
    .await;
    assert!(response.status().is_client_error(), "got {}", response.status());

    close(context).await;
}
