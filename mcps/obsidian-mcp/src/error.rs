//! Conversion of domain errors into MCP errors
//!
//! Tool and resource handlers return `rmcp::ErrorData`. Upstream failures
//! keep their status/code/message so the MCP caller sees why a call failed.

use rmcp::ErrorData as McpError;
use serde_json::json;

use crate::client::ApiError;

/// Type alias for MCP handler results
pub type McpResult<T> = Result<T, McpError>;

/// Trait for converting errors into MCP-compatible errors
pub trait IntoMcpError {
    fn into_mcp_error(self) -> McpError;
}

impl IntoMcpError for ApiError {
    fn into_mcp_error(self) -> McpError {
        match &self {
            ApiError::Status { status, code, .. } => McpError::internal_error(
                self.to_string(),
                Some(json!({ "status": status, "errorCode": code })),
            ),
            ApiError::Request(_) | ApiError::Client(_) => {
                McpError::internal_error(format!("Obsidian API {}", self), None)
            }
        }
    }
}

impl IntoMcpError for serde_json::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(format!("JSON error: {}", self), None)
    }
}

/// Extension trait providing `to_mcp_err()` on results
pub trait ResultExt<T> {
    fn to_mcp_err(self) -> McpResult<T>;
}

impl<T, E: IntoMcpError> ResultExt<T> for Result<T, E> {
    fn to_mcp_err(self) -> McpResult<T> {
        self.map_err(IntoMcpError::into_mcp_error)
    }
}
