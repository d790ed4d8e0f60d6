use thiserror::Error;

use crate::storage::error::BackendError;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Backend unavailable: {0}")]
    Backend(#[from] BackendError),

    #[error("No artifact matches {architecture}/{software}/{version}/{tag}")]
    NotFound {
        architecture: String,
        software: String,
        version: String,
        tag: String,
    },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}
