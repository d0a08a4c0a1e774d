//! # research-assistant
//!
//! Semantic indexing of PDF documents and evidence-backed question answering.
//! Pages are split into passages, embedded with a sentence transformer, stored in
//! a persisted vector index and retrieved to answer questions with a short
//! summary plus the passages it was drawn from.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use research_assistant::{Config, ResearchAssistant, VectorIndex, ml};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let embedder = ml::embedding::from_config(&config)?;
//!     let summarizer = ml::summarize::from_config(&config)?;
//!
//!     // Index built earlier with `research-assistant ingest paper.pdf`
//!     let index = VectorIndex::load(&config.index_path, embedder)?;
//!
//!     let assistant = ResearchAssistant::new(&config, &index, summarizer.as_ref());
//!     let answer = assistant.answer_question("What is the main result?", 5)?;
//!
//!     println!("{}", answer.answer);
//!     for evidence in answer.evidence {
//!         println!("Page {}: {}", evidence.page, evidence.text);
//!     }
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod ml;
pub mod storage;
pub mod text;
pub mod utils;

// Re-export main API types
pub use api::{Answer, Evidence, IngestReport, ResearchAssistant, Session};
pub use config::Config;
pub use error::{AssistantError, Result};

// Re-export commonly used types
pub use ml::{Embedder, SearchResult, Summarizer, VectorIndex};
pub use text::{ChunkMetadata, PageText, TextChunker};
