//! Vector index over chunk texts
//!
//! [`VectorIndex`] owns the corpus: chunk texts, their metadata and one
//! embedding per chunk held in a [`VectorStore`]. Position `i` in the store always
//! refers to `texts[i]` and `metadata[i]`. The corpus is append-only.

use crate::config::{Config, StoreKind};
use crate::error::{AssistantError, Result};
use crate::ml::embedding::{Embedding, SharedEmbedder};
use crate::ml::search::{self, VectorStore};
use crate::storage::{FORMAT_VERSION, IndexSnapshot};
use crate::text::ChunkMetadata;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Texts embedded per progress step
const EMBED_BATCH: usize = 64;

/// One retrieved passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Squared Euclidean distance (lower is more similar)
    pub distance: f32,
    /// Passage text
    pub text: String,
    /// Passage metadata
    pub metadata: ChunkMetadata,
}

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of chunks
    pub total_chunks: usize,
    /// Number of distinct pages
    pub total_pages: usize,
    /// Number of distinct source documents
    pub total_sources: usize,
    /// Vector dimension, once known
    pub dimension: Option<usize>,
    /// Search structure
    pub store: StoreKind,
    /// Embedding model identity
    pub embedding_model: String,
}

/// Semantic index: embeddings, nearest-neighbor search and persistence
pub struct VectorIndex {
    embedder: SharedEmbedder,
    embedding_model: String,
    store_kind: StoreKind,
    store: Option<Box<dyn VectorStore>>,
    texts: Vec<String>,
    metadata: Vec<ChunkMetadata>,
    built: bool,
}

impl VectorIndex {
    /// Create an unbuilt index
    pub fn new(config: &Config, embedder: SharedEmbedder) -> Self {
        let embedding_model = embedder.model_id().to_string();
        Self {
            embedder,
            embedding_model,
            store_kind: config.vector_store,
            store: None,
            texts: Vec::new(),
            metadata: Vec::new(),
            built: false,
        }
    }

    /// Replace the whole corpus with `texts`/`metadatas`
    pub fn build_index(&mut self, texts: Vec<String>, metadatas: Vec<ChunkMetadata>) -> Result<()> {
        check_lengths(&texts, &metadatas)?;

        let embeddings = self.embed_with_progress(&texts)?;
        let store = match embeddings.first() {
            Some(first) => {
                let mut store = search::new_store(self.store_kind, non_zero_dimension(first)?);
                store.add(&embeddings)?;
                Some(store)
            }
            None => None,
        };

        self.store = store;
        self.texts = texts;
        self.metadata = metadatas;
        self.embedding_model = self.embedder.model_id().to_string();
        self.built = true;

        log::info!(
            "Built {} index with {} chunks (dimension {:?})",
            self.store_kind,
            self.texts.len(),
            self.dimension()
        );
        Ok(())
    }

    /// Append chunks to a built index
    pub fn add_texts(&mut self, texts: Vec<String>, metadatas: Vec<ChunkMetadata>) -> Result<()> {
        if !self.built {
            return Err(AssistantError::NotBuilt(
                "Index not built. Use build_index first.".to_string(),
            ));
        }
        check_lengths(&texts, &metadatas)?;
        if texts.is_empty() {
            return Ok(());
        }

        let embeddings = self.embed_with_progress(&texts)?;
        match self.store.as_mut() {
            Some(store) => store.add(&embeddings)?,
            None => {
                let mut store = search::new_store(self.store_kind, non_zero_dimension(&embeddings[0])?);
                store.add(&embeddings)?;
                self.store = Some(store);
            }
        }

        let added = texts.len();
        self.texts.extend(texts);
        self.metadata.extend(metadatas);
        log::info!("Added {} chunks to index. Total: {}", added, self.texts.len());
        Ok(())
    }

    /// Up to `top_k` passages nearest to `query`, ascending by distance
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if !self.built {
            return Err(AssistantError::NotBuilt(
                "Index not built. Use build_index or load first.".to_string(),
            ));
        }
        if top_k == 0 {
            return Err(AssistantError::Validation(
                "top_k must be a positive integer".to_string(),
            ));
        }
        let Some(store) = self.store.as_ref() else {
            log::debug!("Search on empty corpus for '{}'", query);
            return Ok(Vec::new());
        };
        if let Some(dimension) = self.embedder.dimension() {
            if dimension != store.dimension() {
                return Err(AssistantError::Embedding(format!(
                    "Embedder '{}' produces {}-dimensional vectors but the index holds {}",
                    self.embedder.model_id(),
                    dimension,
                    store.dimension()
                )));
            }
        }

        let query_embedding = self.embedder.embed(query).map_err(|e| {
            AssistantError::Embedding(format!("Failed to embed query '{}': {}", query, e))
        })?;
        let neighbors = store.search(&query_embedding, top_k)?;

        let results: Vec<SearchResult> = neighbors
            .into_iter()
            .filter(|n| n.position < self.texts.len())
            .take(top_k)
            .map(|n| SearchResult {
                distance: n.distance.max(0.0),
                text: self.texts[n.position].clone(),
                metadata: self.metadata[n.position].clone(),
            })
            .collect();

        log::debug!("Found {} results for query '{}'", results.len(), query);
        Ok(results)
    }

    /// Persist the complete index state
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.to_snapshot()?.save(path)?;
        log::info!("Saved index with {} chunks to {}", self.len(), path.display());
        Ok(())
    }

    /// Restore an index saved with [`VectorIndex::save`]
    pub fn load<P: AsRef<Path>>(path: P, embedder: SharedEmbedder) -> Result<Self> {
        let path = path.as_ref();
        let snapshot = IndexSnapshot::load(path)?;
        let index = Self::from_snapshot(snapshot, embedder)?;
        log::info!(
            "Loaded index from {} with {} chunks",
            path.display(),
            index.len()
        );
        Ok(index)
    }

    /// Export the full state
    pub fn to_snapshot(&self) -> Result<IndexSnapshot> {
        if !self.built {
            return Err(AssistantError::NotBuilt(
                "Cannot save an index that was never built".to_string(),
            ));
        }
        Ok(IndexSnapshot {
            format_version: FORMAT_VERSION,
            embedding_model: self.embedding_model.clone(),
            dimension: self.dimension(),
            store: self.store_kind,
            created_at: chrono::Utc::now(),
            texts: self.texts.clone(),
            metadata: self.metadata.clone(),
            vectors: self
                .store
                .as_ref()
                .map(|s| s.raw_vectors().to_vec())
                .unwrap_or_default(),
        })
    }

    /// Rebuild from an exported state
    pub fn from_snapshot(snapshot: IndexSnapshot, embedder: SharedEmbedder) -> Result<Self> {
        snapshot.validate()?;

        if snapshot.embedding_model != embedder.model_id() {
            log::warn!(
                "Index was built with '{}' but queries will use '{}'",
                snapshot.embedding_model,
                embedder.model_id()
            );
        }
        if let (Some(stored), Some(current)) = (snapshot.dimension, embedder.dimension()) {
            if stored != current {
                log::warn!(
                    "Index vectors have dimension {} but '{}' produces {}; searches will fail",
                    stored,
                    embedder.model_id(),
                    current
                );
            }
        }

        let store = match snapshot.dimension {
            Some(dimension) => Some(search::restore_store(
                snapshot.store,
                dimension,
                snapshot.vectors,
            )?),
            None => None,
        };

        Ok(Self {
            embedder,
            embedding_model: snapshot.embedding_model,
            store_kind: snapshot.store,
            store,
            texts: snapshot.texts,
            metadata: snapshot.metadata,
            built: true,
        })
    }

    fn embed_with_progress(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.len() <= EMBED_BATCH {
            return self.checked_embed(texts);
        }

        let progress = ProgressBar::new(texts.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} chunks embedded")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) {
            embeddings.extend(self.checked_embed(batch)?);
            progress.inc(batch.len() as u64);
        }
        progress.finish_and_clear();
        Ok(embeddings)
    }

    fn checked_embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let embeddings = self.embedder.embed_batch(texts)?;
        if embeddings.len() != texts.len() {
            return Err(AssistantError::Embedding(format!(
                "Embedder returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }

    /// Whether `build_index` (or `load`) has happened
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Vector dimension, once any vector exists
    pub fn dimension(&self) -> Option<usize> {
        self.store.as_ref().map(|s| s.dimension())
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn metadata(&self) -> &[ChunkMetadata] {
        &self.metadata
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store_kind
    }

    /// Chunk id that continues the corpus numbering
    pub fn next_chunk_id(&self) -> u64 {
        self.metadata
            .iter()
            .map(|m| m.chunk_id + 1)
            .max()
            .unwrap_or(0)
    }

    /// Get index statistics
    pub fn stats(&self) -> IndexStats {
        let pages: BTreeSet<(Option<&str>, u32)> = self
            .metadata
            .iter()
            .map(|m| (m.source.as_deref(), m.page))
            .collect();
        let sources: BTreeSet<Option<&str>> =
            self.metadata.iter().map(|m| m.source.as_deref()).collect();

        IndexStats {
            total_chunks: self.len(),
            total_pages: pages.len(),
            total_sources: sources.len(),
            dimension: self.dimension(),
            store: self.store_kind,
            embedding_model: self.embedding_model.clone(),
        }
    }
}

fn check_lengths(texts: &[String], metadatas: &[ChunkMetadata]) -> Result<()> {
    if texts.len() != metadatas.len() {
        return Err(AssistantError::Validation(format!(
            "texts and metadatas must have the same length ({} vs {})",
            texts.len(),
            metadatas.len()
        )));
    }
    Ok(())
}

fn non_zero_dimension(embedding: &Embedding) -> Result<usize> {
    if embedding.is_empty() {
        return Err(AssistantError::Embedding(
            "Embedder produced a zero-dimensional vector".to_string(),
        ));
    }
    Ok(embedding.len())
}
