//! Error types for the API client.

use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Errors that can occur when talking to the Bloomery API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never reached a server (offline, DNS failure, timeout).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered 401; the session token has been cleared.
    #[error("session expired")]
    AuthExpired,

    /// Any other non-2xx response.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status code.
        status: StatusCode,
        /// Server-provided message, or the status' canonical reason.
        message: String,
    },

    /// Response body was not the expected JSON shape.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Init(#[source] reqwest::Error),
}

impl ApiError {
    /// Whether another attempt is worthwhile.
    ///
    /// Network errors, 5xx and 429 are transient; other 4xx mean the
    /// request itself was rejected and retrying won't change that. 401 is
    /// handled globally (credentials cleared, login forced), so it is never
    /// retried either.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::AuthExpired | Self::Parse(_) | Self::Init(_) => false,
        }
    }
}

impl RetryPolicy<ApiError> {
    /// The HTTP eligibility rule: retry network errors, 5xx and 429 only.
    #[must_use]
    pub fn transient() -> Self {
        Self::new(ApiError::is_transient)
    }
}
