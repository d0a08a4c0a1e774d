//! Runtime configuration
//!
//! A [`Config`] is built once at startup (from the process environment, after
//! loading an optional `.env` file) and handed to the index, the summarizer and
//! the answering pipeline. Nothing in the crate reads the environment later.

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default sentence-embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Default chat model used for abstractive summaries
pub const DEFAULT_SUMMARIZATION_MODEL: &str = "gpt-3.5-turbo";

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default location of the persisted index
pub const DEFAULT_INDEX_PATH: &str = "index.idx";

/// Which embedding implementation to construct
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// BERT sentence transformer run with candle
    Candle,
    /// Offline feature-hashing embedder
    Hashing,
}

/// Which nearest-neighbor structure backs the index
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Exhaustive scan
    #[default]
    Flat,
    /// Approximate HNSW graph
    Hnsw,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Flat => write!(f, "flat"),
            StoreKind::Hnsw => write!(f, "hnsw"),
        }
    }
}

/// Output-length bounds handed to the summarizer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryPolicy {
    /// Lower bound on summary length, in words
    pub min_words: usize,
    /// Upper bound on summary length, in words
    pub max_words: usize,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            min_words: 40,
            max_words: 150,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Embedding model identity
    pub embedding_model: String,
    /// Embedding implementation
    pub embedding_backend: EmbeddingBackend,
    /// Summarization model identity
    pub summarization_model: String,
    /// API key for the chat-completion backend
    #[serde(skip_serializing)]
    pub summarization_api_key: Option<String>,
    /// Base URL for OpenAI-compatible APIs (e.g. a local Ollama server)
    pub summarization_base_url: Option<String>,
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Default persisted index location
    pub index_path: PathBuf,
    /// Nearest-neighbor structure for new indexes
    pub vector_store: StoreKind,
    /// Log level name (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    pub log_level: String,
    /// Summary length policy
    pub summary: SummaryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_backend: EmbeddingBackend::Candle,
            summarization_model: DEFAULT_SUMMARIZATION_MODEL.to_string(),
            summarization_api_key: None,
            summarization_base_url: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            vector_store: StoreKind::Flat,
            log_level: "INFO".to_string(),
            summary: SummaryPolicy::default(),
        }
    }
}

impl Config {
    /// Build configuration from the process environment, loading `.env` first
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment overrides from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get("EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Some(backend) = get("EMBEDDING_BACKEND") {
            config.embedding_backend = match backend.to_lowercase().as_str() {
                "candle" => EmbeddingBackend::Candle,
                "hashing" => EmbeddingBackend::Hashing,
                other => {
                    return Err(AssistantError::Validation(format!(
                        "EMBEDDING_BACKEND must be 'candle' or 'hashing', got '{}'",
                        other
                    )));
                }
            };
        }
        if let Some(model) = get("SUMMARIZATION_MODEL") {
            config.summarization_model = model;
        }
        config.summarization_api_key = get("OPENAI_API_KEY");
        config.summarization_base_url = get("OPENAI_BASE_URL");
        if let Some(size) = get("CHUNK_SIZE") {
            config.chunk_size = parse_chunk_size(&size)?;
        }
        if let Some(path) = get("DEFAULT_INDEX_PATH") {
            config.index_path = PathBuf::from(path);
        }
        if let Some(store) = get("VECTOR_STORE") {
            config.vector_store = match store.to_lowercase().as_str() {
                "flat" => StoreKind::Flat,
                "hnsw" => StoreKind::Hnsw,
                other => {
                    return Err(AssistantError::Validation(format!(
                        "VECTOR_STORE must be 'flat' or 'hnsw', got '{}'",
                        other
                    )));
                }
            };
        }
        if let Some(level) = get("LOG_LEVEL") {
            config.log_level = level.to_uppercase();
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(AssistantError::Validation(
                "CHUNK_SIZE must be a positive integer".to_string(),
            ));
        }
        if self.summary.max_words == 0 || self.summary.min_words > self.summary.max_words {
            return Err(AssistantError::Validation(format!(
                "Summary bounds must satisfy 0 <= min <= max, max > 0 (got {}..{})",
                self.summary.min_words, self.summary.max_words
            )));
        }
        self.log_filter()?;
        Ok(())
    }

    /// Map the configured level name to a `log` filter
    pub fn log_filter(&self) -> Result<log::LevelFilter> {
        match self.log_level.as_str() {
            "DEBUG" => Ok(log::LevelFilter::Debug),
            "INFO" => Ok(log::LevelFilter::Info),
            "WARNING" => Ok(log::LevelFilter::Warn),
            "ERROR" | "CRITICAL" => Ok(log::LevelFilter::Error),
            other => Err(AssistantError::Validation(format!(
                "LOG_LEVEL must be one of: DEBUG, INFO, WARNING, ERROR, CRITICAL (got '{}')",
                other
            ))),
        }
    }

    /// Whether a remote chat backend has been configured
    pub fn has_chat_backend(&self) -> bool {
        self.summarization_api_key.is_some() || self.summarization_base_url.is_some()
    }
}

fn parse_chunk_size(raw: &str) -> Result<usize> {
    let value: i64 = raw.trim().parse().map_err(|_| {
        AssistantError::Validation(format!("CHUNK_SIZE must be an integer, got '{}'", raw))
    })?;
    if value <= 0 {
        return Err(AssistantError::Validation(
            "CHUNK_SIZE must be a positive integer".to_string(),
        ));
    }
    Ok(value as usize)
}
