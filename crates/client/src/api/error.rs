//! Companion API error types.

use std::sync::Arc;

/// Errors from the SOID companion HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A state-changing call needs a CSRF token and none is configured.
    #[error("missing CSRF token: SOID_SW_CSRF_TOKEN not set")]
    MissingCsrfToken,

    /// Invalid call parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File over the upload limit; rejected before any request.
    #[error("file \"{name}\" is too large ({size}, max 10MB)")]
    FileTooLarge { name: String, size: String },

    /// The session is missing or expired (401/403 or a login redirect).
    #[error("authentication failed: session missing or expired")]
    AuthError,

    /// HTTP error response without a readable envelope.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// The server answered `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ApiError::Timeout } else { ApiError::Network(Arc::new(err)) }
    }
}

impl From<ApiError> for soid_core::Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidInput(msg) => soid_core::Error::InvalidInput(msg),
            ApiError::Timeout => soid_core::Error::FetchTimeout("companion API".into()),
            other => soid_core::Error::Api(other.to_string()),
        }
    }
}
