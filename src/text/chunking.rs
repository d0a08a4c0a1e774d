//! Page-aware text chunking
//!
//! Pages are split on whitespace and words are packed greedily into chunks of
//! at most `chunk_size` characters. Chunks never cross a page boundary and
//! chunk ids keep counting across pages.

use crate::config::Config;
use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};

/// Extracted text of one source page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number
    pub page: u32,
    /// Raw page text
    pub text: String,
}

impl PageText {
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// A page-attributed passage ready for embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Page the passage came from
    pub page: u32,
    /// Words joined by single spaces
    pub text: String,
    /// Corpus-wide sequential identifier
    pub chunk_id: u64,
}

/// Metadata stored alongside every indexed passage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Page number
    pub page: u32,
    /// Chunk identifier
    pub chunk_id: u64,
    /// Source document, when known
    #[serde(default)]
    pub source: Option<String>,
}

impl ChunkMetadata {
    pub fn new(page: u32, chunk_id: u64) -> Self {
        Self {
            page,
            chunk_id,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Chunk {
    /// Split into the `(text, metadata)` pair the index consumes
    pub fn into_parts(self, source: Option<&str>) -> (String, ChunkMetadata) {
        let metadata = ChunkMetadata {
            page: self.page,
            chunk_id: self.chunk_id,
            source: source.map(str::to_string),
        };
        (self.text, metadata)
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Greedy whitespace chunker
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
}

impl TextChunker {
    /// Create a chunker; `chunk_size` must be positive
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AssistantError::Validation(
                "chunk_size must be a positive integer".to_string(),
            ));
        }
        Ok(Self { chunk_size })
    }

    /// Create a chunker from the configured chunk size
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.chunk_size)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunk pages with ids starting at 0
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<Chunk> {
        self.chunk_pages_from(pages, 0)
    }

    /// Chunk pages with ids starting at `first_id`
    pub fn chunk_pages_from(&self, pages: &[PageText], first_id: u64) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut next_id = first_id;

        for page in pages {
            let mut current: Vec<&str> = Vec::new();
            // Sum of (word length + 1) over the words in `current`
            let mut current_length = 0usize;

            for word in page.text.split_whitespace() {
                let word_len = word.chars().count();
                if current_length + word_len + 1 > self.chunk_size && !current.is_empty() {
                    chunks.push(Chunk {
                        page: page.page,
                        text: current.join(" "),
                        chunk_id: next_id,
                    });
                    next_id += 1;
                    current.clear();
                    current_length = 0;
                }
                current.push(word);
                current_length += word_len + 1;
            }

            if !current.is_empty() {
                chunks.push(Chunk {
                    page: page.page,
                    text: current.join(" "),
                    chunk_id: next_id,
                });
                next_id += 1;
            }
        }

        log::debug!(
            "Chunked {} pages into {} chunks (chunk_size={})",
            pages.len(),
            chunks.len(),
            self.chunk_size
        );
        chunks
    }
}
