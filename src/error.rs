//! Error types for research-assistant
//!
//! Every fallible operation in the crate returns [`AssistantError`]. The first
//! four variants are the caller-facing taxonomy (validation, not built, not
//! found, corrupt state); the rest wrap backend and I/O failures with context.

use thiserror::Error;

/// Main error type for research-assistant operations
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Bad caller input or configuration (chunk size, question, top-k, paths)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Search or append attempted before an index was built
    #[error("Index not built: {0}")]
    NotBuilt(String),

    /// Persisted index file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persisted index file exists but cannot be trusted
    #[error("Corrupt index state: {0}")]
    CorruptState(String),

    /// PDF text extraction errors
    #[error("PDF processing error: {0}")]
    Pdf(String),

    /// Embedding model errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Summarization backend errors
    #[error("Summarization error: {0}")]
    Summarization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary snapshot encoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Candle ML framework errors
    #[error("Candle ML error: {0}")]
    Candle(#[from] candle_core::Error),
}

/// Result type alias for research-assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

impl AssistantError {
    /// Whether the error is a caller-side validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, AssistantError::Validation(_))
    }

    /// Whether the error signals a missing persisted index
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssistantError::NotFound(_))
    }
}

impl From<bincode::Error> for AssistantError {
    fn from(err: bincode::Error) -> Self {
        AssistantError::Serialization(err.to_string())
    }
}

impl From<tokenizers::Error> for AssistantError {
    fn from(err: tokenizers::Error) -> Self {
        AssistantError::Embedding(err.to_string())
    }
}
