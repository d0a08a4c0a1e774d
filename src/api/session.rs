//! In-memory question answering session
//!
//! A [`Session`] owns everything one interactive user needs: configuration,
//! embedder, summarizer and an index that is created by the first ingest and
//! extended by later ones. Nothing is shared between sessions.

use crate::api::assistant::{Answer, ResearchAssistant};
use crate::api::ingest::{self, ChunkedDocuments, Document, DocumentReport};
use crate::config::Config;
use crate::error::{AssistantError, Result};
use crate::ml::{self, IndexStats, SharedEmbedder, Summarizer, VectorIndex};
use crate::text::{PageText, PdfProcessor, TextChunker};
use std::path::Path;

pub struct Session {
    config: Config,
    chunker: TextChunker,
    embedder: SharedEmbedder,
    summarizer: Box<dyn Summarizer>,
    index: Option<VectorIndex>,
}

impl Session {
    /// Create a session with the backends selected by `config`
    pub fn new(config: Config) -> Result<Self> {
        let embedder = ml::embedding::from_config(&config)?;
        let summarizer = ml::summarize::from_config(&config)?;
        Self::with_components(config, embedder, summarizer)
    }

    pub fn with_components(
        config: Config,
        embedder: SharedEmbedder,
        summarizer: Box<dyn Summarizer>,
    ) -> Result<Self> {
        config.validate()?;
        let chunker = TextChunker::from_config(&config)?;
        Ok(Self {
            config,
            chunker,
            embedder,
            summarizer,
            index: None,
        })
    }

    /// Start from a persisted index instead of an empty session
    pub fn open_index<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.index = Some(VectorIndex::load(path, self.embedder.clone())?);
        Ok(())
    }

    /// Chunk and index page texts from one source
    pub fn ingest_pages(&mut self, source: &str, pages: Vec<PageText>) -> Result<DocumentReport> {
        let document = Document::new(source, pages);
        let first_id = self.index.as_ref().map_or(0, VectorIndex::next_chunk_id);
        let ChunkedDocuments { texts, metadatas, .. } =
            ingest::chunk_documents(&self.chunker, std::slice::from_ref(&document), first_id);
        if texts.is_empty() {
            return Err(AssistantError::Validation(format!(
                "No text extracted from {}. Please check the file.",
                source
            )));
        }
        let report = DocumentReport {
            source: document.source,
            pages: document.pages.len(),
            chunks: texts.len(),
        };

        match self.index.as_mut() {
            Some(index) => index.add_texts(texts, metadatas)?,
            None => {
                let mut index = VectorIndex::new(&self.config, self.embedder.clone());
                index.build_index(texts, metadatas)?;
                self.index = Some(index);
            }
        }

        Ok(report)
    }

    /// Extract and index a PDF file
    pub fn ingest_pdf<P: AsRef<Path>>(&mut self, path: P) -> Result<DocumentReport> {
        let path = path.as_ref();
        ingest::validate_pdf_paths(&[path])?;
        let pages = PdfProcessor::extract_pages(path)?;
        self.ingest_pages(&path.to_string_lossy(), pages)
    }

    /// Extract and index an uploaded PDF
    pub fn ingest_pdf_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<DocumentReport> {
        let pages = PdfProcessor::extract_pages_from_mem(bytes)
            .map_err(|e| AssistantError::Pdf(format!("{}: {}", name, e)))?;
        self.ingest_pages(name, pages)
    }

    /// Answer a question from everything ingested so far
    pub fn ask(&self, question: &str, top_k: usize) -> Result<Answer> {
        let index = self.index.as_ref().ok_or_else(|| {
            AssistantError::NotBuilt("Please ingest a PDF first.".to_string())
        })?;
        ResearchAssistant::new(&self.config, index, self.summarizer.as_ref())
            .answer_question(question, top_k)
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    pub fn stats(&self) -> Option<IndexStats> {
        self.index.as_ref().map(VectorIndex::stats)
    }

    pub fn summarizer(&self) -> &dyn Summarizer {
        self.summarizer.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
