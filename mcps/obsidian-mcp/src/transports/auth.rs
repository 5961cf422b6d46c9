//! Bearer token authentication for the HTTP transport
//!
//! Applied to the MCP endpoint only; `/health` stays open. When auth is
//! disabled every request passes. When it is enabled but no token can be
//! resolved, every request is rejected.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::config::AuthConfig;

/// Result of validating an `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Allowed,
    Rejected(&'static str),
}

/// Resolved authentication settings
#[derive(Debug, Clone)]
pub struct BearerAuth {
    enabled: bool,
    token: Option<String>,
}

impl BearerAuth {
    /// Resolve the token from config, falling back to the named env var
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Same as [`from_config`](Self::from_config) with an explicit env lookup
    pub fn resolve(config: &AuthConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| config.token_env_var.as_deref().and_then(&lookup))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if config.enabled && token.is_none() {
            tracing::warn!("HTTP auth enabled but no token configured; all MCP requests will be rejected");
        }

        Self {
            enabled: config.enabled,
            token,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check an `Authorization` header value
    pub fn validate(&self, header: Option<&str>) -> AuthOutcome {
        if !self.enabled {
            return AuthOutcome::Allowed;
        }

        let Some(header) = header else {
            return AuthOutcome::Rejected("Missing Authorization header");
        };

        let Some(provided) = header.strip_prefix("Bearer ") else {
            return AuthOutcome::Rejected(
                "Invalid authorization header format. Expected: Bearer <token>",
            );
        };

        match self.token.as_deref() {
            None => AuthOutcome::Rejected("Authentication not configured properly"),
            Some(expected) if provided == expected => AuthOutcome::Allowed,
            Some(_) => AuthOutcome::Rejected("Invalid authentication token"),
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({
            "error": "Unauthorized",
            "message": "Valid Bearer token required",
        })),
    )
        .into_response()
}

/// axum middleware enforcing [`BearerAuth`]
pub async fn auth_middleware(
    State(auth): State<Arc<BearerAuth>>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth.validate(header) {
        AuthOutcome::Allowed => next.run(request).await,
        AuthOutcome::Rejected(reason) => {
            tracing::warn!(path = %request.uri().path(), reason, "Rejected MCP request");
            unauthorized()
        }
    }
}
