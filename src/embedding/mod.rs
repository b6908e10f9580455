//! Text-to-vector embedding through a remote model.
//!
//! Provides the [`EmbeddingProvider`] trait, the [`TaskIntent`] flag the model
//! uses to tell documents from queries, and two HTTP implementations selected
//! by [`create_provider`]: [`gemini`] (default) and [`openai`].

pub mod gemini;
pub mod openai;

use std::fmt;

use crate::config::EmbeddingConfig;
use crate::error::{CatalogError, Result};

/// What the vector will be used for. The same text embedded with different
/// intents gives directionally different vectors, so documents must be
/// embedded with [`TaskIntent::RetrievalDocument`] and search text with
/// [`TaskIntent::RetrievalQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskIntent {
    RetrievalDocument,
    RetrievalQuery,
}

impl TaskIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            Self::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

impl fmt::Display for TaskIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for embedding text into vectors.
///
/// One call embeds exactly one text. Implementations return vectors of
/// exactly [`dimensions`](EmbeddingProvider::dimensions) values or an error.
/// All methods block; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str, intent: TaskIntent) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;

    /// Model identifier, recorded alongside the stored vectors.
    fn model(&self) -> &str;
}

/// Create an embedding provider from config.
///
/// Fails with a Configuration error when the provider is unknown or no API
/// key is available.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(gemini::GeminiProvider::new(config)?)),
        "openai" => Ok(Box::new(openai::OpenAiProvider::new(config)?)),
        other => Err(CatalogError::Configuration(format!(
            "unknown embedding provider: {other}. Supported: gemini, openai"
        ))),
    }
}

/// Reject a vector whose length differs from the configured dimension.
pub(crate) fn check_dimensions(values: Vec<f32>, expected: usize) -> Result<Vec<f32>> {
    if values.len() != expected {
        return Err(CatalogError::Validation(format!(
            "embedding has {} dimensions, expected {expected}",
            values.len()
        )));
    }
    Ok(values)
}

pub(crate) fn http_client(config: &EmbeddingConfig) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| CatalogError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Classify a transport-level failure.
pub(crate) fn request_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        CatalogError::Transient(format!("embedding request failed: {e}"))
    } else {
        CatalogError::External(format!("embedding request failed: {e}"))
    }
}

/// Classify a non-success HTTP status. Rate limits and server errors are
/// transient; everything else (bad key, bad input) is not.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> CatalogError {
    let body = body.trim();
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        CatalogError::Transient(format!("embedding API returned {detail}"))
    } else {
        CatalogError::External(format!("embedding API returned {detail}"))
    }
}
