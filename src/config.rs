use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::CatalogError;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CatalogConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub pipeline: PipelineConfig,
    pub search: SearchDefaults,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `gemini` or `openai`.
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub dimensions: usize,
    /// Lane and query texts are cut to this many characters before embedding.
    pub max_chars: usize,
    /// Minimum interval between consecutive embedding calls.
    pub pacing_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub batch_size: usize,
    /// `sections` or `extended`.
    pub content_layout: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchDefaults {
    pub default_limit: usize,
    pub default_lane: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_catalog_dir()
            .join("catalog.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            model: "models/text-embedding-004".into(),
            api_key: None,
            base_url: None,
            dimensions: 768,
            max_chars: 25_000,
            pacing_ms: 500,
            timeout_secs: 30,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            content_layout: "sections".into(),
        }
    }
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            default_limit: 5,
            default_lane: "content".into(),
        }
    }
}

impl EmbeddingConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured API key, or a Configuration error naming the variables
    /// that could have supplied it.
    pub fn require_api_key(&self) -> Result<&str, CatalogError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CatalogError::Configuration(format!(
                "no API key for embedding provider '{}'; set CATALOG_API_KEY or {}",
                self.provider,
                provider_key_var(&self.provider).unwrap_or("embedding.api_key")
            ))),
        }
    }
}

/// Returns `~/.catalog-embed/`
pub fn default_catalog_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".catalog-embed")
}

/// Returns the default config file path: `~/.catalog-embed/config.toml`
pub fn default_config_path() -> PathBuf {
    default_catalog_dir().join("config.toml")
}

fn provider_key_var(provider: &str) -> Option<&'static str> {
    match provider {
        "gemini" => Some("GOOGLE_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}

impl CatalogConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CatalogConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (CATALOG_DB, CATALOG_LOG_LEVEL,
    /// CATALOG_API_KEY, then the provider's own key variable).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CATALOG_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("CATALOG_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("CATALOG_API_KEY") {
            self.embedding.api_key = Some(val);
        } else if self.embedding.api_key.is_none() {
            if let Some(var) = provider_key_var(&self.embedding.provider) {
                if let Ok(val) = std::env::var(var) {
                    self.embedding.api_key = Some(val);
                }
            }
        }
    }

    /// Check settings every command depends on. The API key is checked
    /// separately by commands that actually embed.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let bad = |msg: String| Err(CatalogError::Configuration(msg));

        if provider_key_var(&self.embedding.provider).is_none() {
            return bad(format!(
                "unknown embedding provider: {}. Supported: gemini, openai",
                self.embedding.provider
            ));
        }
        if self.embedding.dimensions == 0 {
            return bad("embedding.dimensions must be greater than zero".into());
        }
        if self.embedding.max_chars == 0 {
            return bad("embedding.max_chars must be greater than zero".into());
        }
        if self.pipeline.batch_size == 0 {
            return bad("pipeline.batch_size must be greater than zero".into());
        }
        if !matches!(self.pipeline.content_layout.as_str(), "sections" | "extended") {
            return bad(format!(
                "unknown content layout: {}. Supported: sections, extended",
                self.pipeline.content_layout
            ));
        }
        if self.search.default_lane.parse::<crate::catalog::types::Lane>().is_err() {
            return bad(format!("unknown default lane: {}", self.search.default_lane));
        }
        Ok(())
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
