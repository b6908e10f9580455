//! Google Generative Language `embedContent` provider.
//!
//! Sends one text per request with the task intent and the requested output
//! dimensionality, and returns the `embedding.values` array.

use serde::{Deserialize, Serialize};

use super::{
    check_dimensions, http_client, request_error, status_error, EmbeddingProvider, TaskIntent,
};
use crate::config::EmbeddingConfig;
use crate::error::{CatalogError, Result};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
    dimensions: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

/// The API addresses models as `models/<name>`.
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

impl GeminiProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let model = qualified_model(&config.model);
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        let endpoint = format!("{base_url}/v1beta/{model}:embedContent");

        tracing::info!(
            model = %model,
            dimensions = config.dimensions,
            "gemini embedding provider ready"
        );

        Ok(Self {
            client: http_client(config)?,
            endpoint,
            model,
            api_key,
            dimensions: config.dimensions,
        })
    }
}

impl EmbeddingProvider for GeminiProvider {
    fn embed(&self, text: &str, intent: TaskIntent) -> Result<Vec<f32>> {
        let request = EmbedContentRequest {
            model: &self.model,
            content: Content {
                parts: [Part { text }],
            },
            task_type: intent.as_str(),
            output_dimensionality: self.dimensions,
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| CatalogError::Validation(format!("failed to encode request: {e}")))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(request_error)?;

        let status = response.status();
        let text = response.text().map_err(request_error)?;
        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        let parsed: EmbedContentResponse = serde_json::from_str(&text).map_err(|e| {
            CatalogError::External(format!("malformed embedContent response: {e}"))
        })?;
        check_dimensions(parsed.embedding.values, self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}
