//! Document ingestion
//!
//! Turns PDFs into index entries: validate every path, extract pages, chunk
//! with ids that continue the existing corpus, then extend or build the index
//! and save it. A failure on any file aborts before the index file is touched.

use crate::config::Config;
use crate::error::{AssistantError, Result};
use crate::ml::{SharedEmbedder, VectorIndex};
use crate::text::{ChunkMetadata, PageText, PdfProcessor, TextChunker};
use crate::utils;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Page texts of one source document
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub pages: Vec<PageText>,
}

impl Document {
    pub fn new(source: impl Into<String>, pages: Vec<PageText>) -> Self {
        Self {
            source: source.into(),
            pages,
        }
    }

    /// Extract a PDF from disk
    pub fn from_pdf<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let pages = PdfProcessor::extract_pages(path)?;
        Ok(Self::new(path.to_string_lossy(), pages))
    }
}

/// Per-document ingestion counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source: String,
    pub pages: usize,
    pub chunks: usize,
}

/// Outcome of an ingest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,
    /// Chunks added by this run
    pub chunks_added: usize,
    /// Chunks in the saved index
    pub total_chunks: usize,
    /// Whether a new index was built instead of extending one
    pub created: bool,
    pub index_path: PathBuf,
    /// Wall time in seconds
    pub processing_time: f64,
}

/// Chunked corpus ready for the index
pub(crate) struct ChunkedDocuments {
    pub texts: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
    pub reports: Vec<DocumentReport>,
}

/// Check that every path exists and names a PDF
pub fn validate_pdf_paths<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    if paths.is_empty() {
        return Err(AssistantError::Validation(
            "At least one PDF path is required".to_string(),
        ));
    }
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AssistantError::Validation(format!(
                "PDF file not found: {}",
                path.display()
            )));
        }
        if !utils::is_pdf_file(path) {
            return Err(AssistantError::Validation(format!(
                "File is not a PDF: {}",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Chunk documents in order with ids starting at `first_id`
pub(crate) fn chunk_documents(
    chunker: &TextChunker,
    documents: &[Document],
    first_id: u64,
) -> ChunkedDocuments {
    let mut next_id = first_id;
    let mut texts = Vec::new();
    let mut metadatas = Vec::new();
    let mut reports = Vec::with_capacity(documents.len());

    for document in documents {
        let chunks = chunker.chunk_pages_from(&document.pages, next_id);
        if let Some(last) = chunks.last() {
            next_id = last.chunk_id + 1;
        }
        log::info!("Extracted {} chunks from {}", chunks.len(), document.source);
        reports.push(DocumentReport {
            source: document.source.clone(),
            pages: document.pages.len(),
            chunks: chunks.len(),
        });
        for chunk in chunks {
            let (text, metadata) = chunk.into_parts(Some(&document.source));
            texts.push(text);
            metadatas.push(metadata);
        }
    }

    ChunkedDocuments {
        texts,
        metadatas,
        reports,
    }
}

/// Ingest PDF files into the index at `index_path`
pub fn ingest_pdfs<P: AsRef<Path>>(
    config: &Config,
    embedder: SharedEmbedder,
    pdf_paths: &[P],
    index_path: &Path,
) -> Result<IngestReport> {
    log::info!("Starting ingestion of {} PDF files", pdf_paths.len());
    validate_pdf_paths(pdf_paths)?;

    let documents = pdf_paths
        .iter()
        .map(|path| {
            log::info!("Processing PDF: {}", path.as_ref().display());
            Document::from_pdf(path)
        })
        .collect::<Result<Vec<_>>>()?;

    ingest_documents(config, embedder, &documents, index_path)
}

/// Ingest already extracted documents into the index at `index_path`
pub fn ingest_documents(
    config: &Config,
    embedder: SharedEmbedder,
    documents: &[Document],
    index_path: &Path,
) -> Result<IngestReport> {
    let start_time = Instant::now();
    let chunker = TextChunker::from_config(config)?;

    let existing = match VectorIndex::load(index_path, embedder.clone()) {
        Ok(index) => Some(index),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e),
    };
    let first_id = existing.as_ref().map_or(0, VectorIndex::next_chunk_id);

    let ChunkedDocuments {
        texts,
        metadatas,
        reports,
    } = chunk_documents(&chunker, documents, first_id);

    if texts.is_empty() {
        return Err(AssistantError::Validation(
            "No text extracted from PDFs. Please check the files.".to_string(),
        ));
    }
    let chunks_added = texts.len();

    let (index, created) = match existing {
        Some(mut index) => {
            index.add_texts(texts, metadatas)?;
            log::info!("Added {} new text chunks to index", chunks_added);
            (index, false)
        }
        None => {
            let mut index = VectorIndex::new(config, embedder);
            index.build_index(texts, metadatas)?;
            log::info!("Built new index with {} text chunks", chunks_added);
            (index, true)
        }
    };

    index.save(index_path)?;

    Ok(IngestReport {
        documents: reports,
        chunks_added,
        total_chunks: index.len(),
        created,
        index_path: index_path.to_path_buf(),
        processing_time: start_time.elapsed().as_secs_f64(),
    })
}
