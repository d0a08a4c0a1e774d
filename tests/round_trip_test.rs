//! Round-trip integration tests
//!
//! Save an index, load it back and check that nothing observable changed:
//! texts, metadata, ordering and search results. Also covers the failure modes
//! of the persisted file.

use research_assistant::config::StoreKind;
use research_assistant::ml::{HashingEmbedder, SharedEmbedder};
use research_assistant::storage::{IndexSnapshot, MAGIC};
use research_assistant::{AssistantError, ChunkMetadata, Config, VectorIndex};
use std::sync::Arc;
use tempfile::tempdir;

fn embedder() -> SharedEmbedder {
    Arc::new(HashingEmbedder::new(128))
}

fn sample_index(store: StoreKind) -> Result<VectorIndex, AssistantError> {
    let texts = vec![
        "The quick brown fox jumps over the lazy dog.",
        "Rust is a systems programming language that guarantees thread safety.",
        "Machine learning is revolutionizing how we process data.",
        "Blockchain technology provides decentralized data storage.",
        "Quantum computing promises to solve intractable problems.",
    ];
    let metadatas = (0..texts.len())
        .map(|i| ChunkMetadata::new(i as u32 / 2 + 1, i as u64).with_source("sample.pdf"))
        .collect();

    let config = Config {
        vector_store: store,
        ..Config::default()
    };
    let mut index = VectorIndex::new(&config, embedder());
    index.build_index(texts.into_iter().map(String::from).collect(), metadatas)?;
    Ok(index)
}

const QUERIES: [&str; 4] = [
    "lazy dog",
    "thread safety in systems languages",
    "decentralized storage",
    "nothing in common here",
];

#[test]
fn test_complete_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("round_trip.idx");

    let original = sample_index(StoreKind::Flat)?;
    original.save(&path)?;
    let loaded = VectorIndex::load(&path, embedder())?;

    assert_eq!(loaded.texts(), original.texts());
    assert_eq!(loaded.metadata(), original.metadata());
    assert_eq!(loaded.dimension(), Some(128));
    assert_eq!(loaded.embedding_model(), "hashing-128");

    for query in QUERIES {
        assert_eq!(loaded.search(query, 3)?, original.search(query, 3)?);
    }
    Ok(())
}

#[test]
fn test_hnsw_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("hnsw.idx");

    let original = sample_index(StoreKind::Hnsw)?;
    original.save(&path)?;
    let loaded = VectorIndex::load(&path, embedder())?;

    assert_eq!(loaded.store_kind(), StoreKind::Hnsw);
    let results = loaded.search("lazy dog", 1)?;
    assert_eq!(results[0].text, "The quick brown fox jumps over the lazy dog.");
    Ok(())
}

#[test]
fn test_extend_after_load() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("extend.idx");
    sample_index(StoreKind::Flat)?.save(&path)?;

    let mut loaded = VectorIndex::load(&path, embedder())?;
    let next_id = loaded.next_chunk_id();
    loaded.add_texts(
        vec!["Photosynthesis converts light into energy.".to_string()],
        vec![ChunkMetadata::new(9, next_id)],
    )?;
    loaded.save(&path)?;

    let reloaded = VectorIndex::load(&path, embedder())?;
    assert_eq!(reloaded.len(), 6);
    assert_eq!(reloaded.metadata()[5].chunk_id, 5);
    assert_eq!(reloaded.search("photosynthesis light", 1)?[0].metadata.page, 9);
    Ok(())
}

#[test]
fn test_empty_index_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("empty.idx");

    let mut index = VectorIndex::new(&Config::default(), embedder());
    index.build_index(Vec::new(), Vec::new())?;
    index.save(&path)?;

    let loaded = VectorIndex::load(&path, embedder())?;
    assert!(loaded.is_built());
    assert!(loaded.is_empty());
    assert!(loaded.search("anything", 5)?.is_empty());
    Ok(())
}

#[test]
fn test_file_layout() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("layout.idx");
    sample_index(StoreKind::Flat)?.save(&path)?;

    let bytes = std::fs::read(&path)?;
    assert_eq!(&bytes[..4], MAGIC);
    assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 1);

    let snapshot = IndexSnapshot::load(&path)?;
    assert_eq!(snapshot.vectors.len(), 5 * 128);
    assert!(!temp_dir.path().join("layout.idx.tmp").exists());
    Ok(())
}

#[test]
fn test_corrupt_files_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;

    let garbage = temp_dir.path().join("garbage.idx");
    std::fs::write(&garbage, b"definitely not an index")?;
    assert!(matches!(
        VectorIndex::load(&garbage, embedder()),
        Err(AssistantError::CorruptState(_))
    ));

    let truncated = temp_dir.path().join("truncated.idx");
    sample_index(StoreKind::Flat)?.save(&truncated)?;
    let bytes = std::fs::read(&truncated)?;
    std::fs::write(&truncated, &bytes[..bytes.len() / 2])?;
    assert!(matches!(
        VectorIndex::load(&truncated, embedder()),
        Err(AssistantError::CorruptState(_))
    ));
    Ok(())
}

#[test]
fn test_model_mismatch_loads_but_dimension_mismatch_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("mismatch.idx");
    sample_index(StoreKind::Flat)?.save(&path)?;

    let loaded = VectorIndex::load(&path, Arc::new(HashingEmbedder::new(64)))?;
    assert_eq!(loaded.embedding_model(), "hashing-128");
    assert!(matches!(
        loaded.search("lazy dog", 2),
        Err(AssistantError::Embedding(_))
    ));
    Ok(())
}
