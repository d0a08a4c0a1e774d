//! Text processing for research-assistant
//!
//! Page extraction from PDFs and page-aware chunking.

pub mod chunking;
pub mod pdf;

// Re-export main types and functions
pub use chunking::{Chunk, ChunkMetadata, PageText, TextChunker};
pub use pdf::PdfProcessor;
