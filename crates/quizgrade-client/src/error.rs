//! Backend error types.

use thiserror::Error;

/// Errors that can occur when talking to the quiz backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing, expired or invalid credentials (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed, e.g. a non-admin on an admin route (HTTP 403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The backend has no question matching the filters.
    #[error("no question available: {0}")]
    NoQuestionAvailable(String),
}

impl BackendError {
    /// Errors that will not go away by retrying the same request.
    pub fn is_permanent(&self) -> bool {
        match self {
            BackendError::RateLimited { .. }
            | BackendError::Timeout(_)
            | BackendError::NetworkError(_) => false,
            BackendError::ApiError { status, .. } => *status < 500,
            _ => true,
        }
    }
}
