//! OpenAI-compatible `/v1/embeddings` provider.
//!
//! The endpoint has no notion of task intent; documents and queries are
//! embedded the same way.

use serde::{Deserialize, Serialize};

use super::{
    check_dimensions, http_client, request_error, status_error, EmbeddingProvider, TaskIntent,
};
use crate::config::EmbeddingConfig;
use crate::error::{CatalogError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');

        tracing::info!(
            model = %config.model,
            dimensions = config.dimensions,
            "openai embedding provider ready"
        );

        Ok(Self {
            client: http_client(config)?,
            endpoint: format!("{base_url}/v1/embeddings"),
            model: config.model.clone(),
            api_key,
            dimensions: config.dimensions,
        })
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn embed(&self, text: &str, intent: TaskIntent) -> Result<Vec<f32>> {
        tracing::trace!(%intent, "task intent not supported by openai provider");

        let request = EmbeddingsRequest {
            model: &self.model,
            input: [text],
            dimensions: self.dimensions,
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| CatalogError::Validation(format!("failed to encode request: {e}")))?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(request_error)?;

        let status = response.status();
        let text = response.text().map_err(request_error)?;
        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        let parsed: EmbeddingsResponse = serde_json::from_str(&text)
            .map_err(|e| CatalogError::External(format!("malformed embeddings response: {e}")))?;
        let values = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| CatalogError::External("embeddings response had no data".into()))?;
        check_dimensions(values, self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}
