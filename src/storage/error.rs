use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unauthorized: check the configured access token")]
    Unauthorized,

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
