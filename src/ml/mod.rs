//! Machine learning module for research-assistant
//!
//! Embedding generation, vector stores, the vector index built on top of them
//! and the summarization backends used to phrase answers.

pub mod device;
pub mod embedding;
pub mod index;
pub mod search;
pub mod summarize;

// Re-export main types and functions
pub use device::DeviceType;
pub use embedding::{Embedder, Embedding, HashingEmbedder, SentenceEmbedder, SharedEmbedder};
pub use index::{IndexStats, SearchResult, VectorIndex};
pub use search::{FlatL2Store, HnswStore, Neighbor, VectorStore};
pub use summarize::{ChatSummarizer, ExtractiveSummarizer, Summarizer};
