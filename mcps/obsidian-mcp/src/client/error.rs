//! Error types for the note REST client

use thiserror::Error;

/// Errors returned by [`ObsidianClient`](super::ObsidianClient) calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// The REST API answered with a non-2xx status
    #[error("Error {code}: {message}")]
    Status {
        /// HTTP status of the response
        status: u16,
        /// `errorCode` from the response body, `-1` when absent
        code: i64,
        /// `message` from the response body
        message: String,
    },

    /// The request never produced a usable response (connect, TLS, timeout, decode)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The HTTP client could not be constructed
    #[error("invalid client configuration: {0}")]
    Client(String),
}

impl ApiError {
    /// HTTP status of the upstream response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            ApiError::Client(_) => None,
        }
    }
}

/// Result type alias for note API operations
pub type ApiResult<T> = Result<T, ApiError>;
