//! Error types for the search-relay crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors produced by the proxy pool and the relay front door.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The proxy list is empty, unreadable, or the environment is malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Selection was requested while every proxy is marked dead.
    #[error("No alive proxies")]
    NoAliveProxies,

    /// An outbound request through a proxy failed or timed out.
    #[error("Proxy request failed via {address}: {reason}")]
    ProxyRequestFailed { address: String, reason: String },

    /// A health probe did not complete within its bound.
    #[error("Probe via {address} timed out after {timeout_ms}ms")]
    ProbeTimeout { address: String, timeout_ms: u64 },

    /// The admin view was requested without valid credentials.
    #[error("Unauthorized")]
    Unauthorized,
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Build a request failure from any displayable cause.
    pub fn request_failed(address: &str, reason: impl ToString) -> Self {
        RelayError::ProxyRequestFailed {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status reported to the immediate caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::NoAliveProxies => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::ProxyRequestFailed { .. } | RelayError::ProbeTimeout { .. } => {
                StatusCode::BAD_GATEWAY
            }
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let message = match &self {
            RelayError::ProxyRequestFailed { .. } => {
                "Proxy request failed, will try next one".to_string()
            }
            other => other.to_string(),
        };
        (self.status_code(), message).into_response()
    }
}
