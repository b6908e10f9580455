//! Error kinds shared by every component.
//!
//! Only [`CatalogError::Configuration`] aborts a pipeline run. Everything else
//! is caught at the lane, record, or batch boundary by the pipeline, or
//! surfaced as a single terminal error on the query path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Missing or inconsistent settings, including a stored/configured
    /// vector-dimension mismatch.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Rate limiting, timeouts, connection resets, 5xx responses.
    #[error("transient external failure: {0}")]
    Transient(String),

    /// Non-retryable failures reported by an external service.
    #[error("external service failure: {0}")]
    External(String),

    /// Malformed input or output: undecodable snippets, wrong vector length.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl CatalogError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
