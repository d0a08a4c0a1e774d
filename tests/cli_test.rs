//! CLI tests
//!
//! Runs the compiled binary with the offline hashing embedder and no chat
//! backend, so every command works without network access.

use research_assistant::api::{self, Document};
use research_assistant::ml::HashingEmbedder;
use research_assistant::{Answer, Config, PageText};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;
use tempfile::tempdir;

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_research-assistant"))
        .args(args)
        .current_dir(dir)
        .env("EMBEDDING_BACKEND", "hashing")
        .env("LOG_LEVEL", "ERROR")
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_BASE_URL")
        .env_remove("DEFAULT_INDEX_PATH")
        .env_remove("CHUNK_SIZE")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run research-assistant")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn seed_index(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let documents = vec![Document::new(
        "ai.pdf",
        vec![
            PageText::new(1, "Artificial intelligence is the simulation of human intelligence by machines."),
            PageText::new(2, "Machine learning lets systems learn from data without explicit programming."),
        ],
    )];
    // Same embedder the binary builds for EMBEDDING_BACKEND=hashing
    api::ingest_documents(
        &Config::default(),
        Arc::new(HashingEmbedder::default()),
        &documents,
        path,
    )?;
    Ok(())
}

#[test]
fn test_query_without_index() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let output = run(dir.path(), &["query", "What is AI?"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Please run 'ingest' first."));
    Ok(())
}

#[test]
fn test_query_rejects_bad_input() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed_index(&dir.path().join("index.idx"))?;

    let output = run(dir.path(), &["query", "What is AI?", "--top-k", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("top-k must be a positive integer"));

    let output = run(dir.path(), &["query", "   "]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Question cannot be empty"));
    Ok(())
}

#[test]
fn test_query_prints_answer_and_evidence() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed_index(&dir.path().join("index.idx"))?;

    let output = run(dir.path(), &["query", "What is machine learning?", "--top-k", "1"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.starts_with("Answer: "));
    assert!(stdout.contains("Evidence:"));
    assert!(stdout.contains("1. Page 2: Machine learning lets systems"));
    Ok(())
}

#[test]
fn test_query_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let index_path = dir.path().join("custom.idx");
    seed_index(&index_path)?;

    let output = run(
        dir.path(),
        &["query", "artificial intelligence", "--index-path", "custom.idx", "--json"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let answer: Answer = serde_json::from_slice(&output.stdout)?;
    assert_eq!(answer.evidence.len(), 2);
    assert_eq!(answer.evidence[0].page, 1);
    assert!(!answer.answer.is_empty());
    Ok(())
}

#[test]
fn test_ingest_rejects_invalid_paths() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("notes.txt"), "plain text")?;

    let output = run(dir.path(), &["ingest", "missing.pdf"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("PDF file not found: missing.pdf"));

    let output = run(dir.path(), &["ingest", "notes.txt"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("File is not a PDF: notes.txt"));

    assert!(!dir.path().join("index.idx").exists());
    Ok(())
}

#[test]
fn test_benchmark_reports_latency() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed_index(&dir.path().join("index.idx"))?;

    let output = run(dir.path(), &["benchmark", "--num-queries", "3"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Benchmark Results:"));
    assert!(stdout.contains("Index load time:"));
    assert!(stdout.contains("Successful queries: 3/3"));
    Ok(())
}
