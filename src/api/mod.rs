//! API layer for research-assistant
//!
//! Question answering over an index, document ingestion, benchmarking and the
//! interactive session used by the `chat` command.

pub mod assistant;
pub mod benchmark;
pub mod chat;
pub mod ingest;
pub mod session;

// Re-export main API types
pub use assistant::{Answer, DEFAULT_TOP_K, Evidence, ResearchAssistant, Retriever};
pub use benchmark::{BenchmarkReport, SAMPLE_QUESTIONS, benchmark_index, run_benchmark};
pub use chat::chat_loop;
pub use ingest::{
    Document, DocumentReport, IngestReport, ingest_documents, ingest_pdfs, validate_pdf_paths,
};
pub use session::Session;
