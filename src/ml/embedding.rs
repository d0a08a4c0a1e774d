//! Sentence embedding generation
//!
//! [`SentenceEmbedder`] runs a BERT sentence-transformer with candle: weights and
//! tokenizer come from the HuggingFace hub, token states are mean-pooled over the
//! attention mask and L2-normalized. [`HashingEmbedder`] is a deterministic
//! offline alternative used for tests and air-gapped setups.

use crate::config::{Config, EmbeddingBackend};
use crate::error::{AssistantError, Result};
use crate::ml::device;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use rayon::prelude::*;
use std::sync::Arc;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use unicode_normalization::UnicodeNormalization;

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Embedder shared between an index and the session that created it
pub type SharedEmbedder = Arc<dyn Embedder>;

/// A text embedding function with a stable identity
pub trait Embedder: Send + Sync {
    /// Model identity recorded in persisted indexes
    fn model_id(&self) -> &str;

    /// Output dimension, when known before the first call
    fn dimension(&self) -> Option<usize>;

    /// Embed a batch of texts, one vector per input in input order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| AssistantError::Embedding("Embedder returned no vector".to_string()))
    }
}

/// Construct the embedder selected by the configuration
pub fn from_config(config: &Config) -> Result<SharedEmbedder> {
    match config.embedding_backend {
        EmbeddingBackend::Candle => Ok(Arc::new(SentenceEmbedder::load(&config.embedding_model)?)),
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbedder::default())),
    }
}

/// Configuration for the candle sentence embedder
#[derive(Debug, Clone)]
pub struct SentenceEmbedderConfig {
    /// Maximum tokens per input
    pub max_length: usize,
    /// Inputs per forward pass
    pub batch_size: usize,
}

impl Default for SentenceEmbedderConfig {
    fn default() -> Self {
        Self {
            max_length: 256,
            batch_size: 32,
        }
    }
}

/// BERT sentence-transformer embedder
pub struct SentenceEmbedder {
    model_id: String,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    hidden_size: usize,
    config: SentenceEmbedderConfig,
}

impl SentenceEmbedder {
    /// Download (or reuse the cached copy of) a model and load it
    pub fn load(model_id: &str) -> Result<Self> {
        Self::load_with_config(model_id, SentenceEmbedderConfig::default())
    }

    pub fn load_with_config(model_id: &str, config: SentenceEmbedderConfig) -> Result<Self> {
        log::info!("Loading embedding model: {}", model_id);

        let api = Api::new()
            .map_err(|e| AssistantError::Embedding(format!("Failed to open HF hub: {}", e)))?;
        let repo = api.repo(Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            "main".to_string(),
        ));
        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                AssistantError::Embedding(format!("Failed to fetch {} for {}: {}", file, model_id, e))
            })
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let bert_config: BertConfig = serde_json::from_str(&std::fs::read_to_string(config_path)?)?;
        let hidden_size = bert_config.hidden_size;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer.with_truncation(Some(TruncationParams {
            max_length: config.max_length,
            ..Default::default()
        }))?;

        let device = device::best_device();
        // SAFETY: the safetensors file is owned by the hub cache and not mutated while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)? };
        let model = BertModel::load(vb, &bert_config)?;

        log::info!(
            "Embedding model {} ready (dimension {})",
            model_id,
            hidden_size
        );

        Ok(Self {
            model_id: model_id.to_string(),
            model,
            tokenizer,
            device,
            hidden_size,
            config,
        })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let encodings = self.tokenizer.encode_batch(texts.to_vec(), true)?;

        let ids = encodings
            .iter()
            .map(|e| Tensor::new(e.get_ids(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let masks = encodings
            .iter()
            .map(|e| Tensor::new(e.get_attention_mask(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let input_ids = Tensor::stack(&ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;
        let token_type_ids = input_ids.zeros_like()?;

        // (batch, seq, hidden)
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
        let pooled = summed.broadcast_div(&counts)?;

        let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12f32, f32::MAX)?;
        let normalized = pooled.broadcast_div(&norms)?;

        Ok(normalized.to_vec2::<f32>()?)
    }
}

impl Embedder for SentenceEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.hidden_size)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            embeddings.extend(self.embed_chunk(batch)?);
        }
        Ok(embeddings)
    }
}

/// Deterministic feature-hashing embedder
///
/// Words are NFKC-normalized, lowercased and hashed (FNV-1a) into signed
/// buckets; the bucket vector is L2-normalized. Texts sharing words land close
/// together, identical texts embed identically on every platform.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    model_id: String,
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            model_id: format!("hashing-{}", dimension),
            dimension,
        }
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0f32; self.dimension];
        let normalized: String = text.nfkc().collect::<String>().to_lowercase();

        for token in normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            embedding[bucket] += sign;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-12 {
            for val in &mut embedding {
                *val /= norm;
            }
        }
        embedding
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.par_iter().map(|text| self.embed_one(text)).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ b as u64).wrapping_mul(PRIME))
}
