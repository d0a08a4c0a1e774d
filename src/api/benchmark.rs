//! Query latency benchmark
//!
//! Loads a persisted index (timed) and answers a fixed set of sample questions,
//! recording per-question latency. Failed questions count toward the attempted
//! total but not toward the latency statistics.

use crate::api::assistant::{DEFAULT_TOP_K, ResearchAssistant};
use crate::config::Config;
use crate::error::Result;
use crate::ml::{SharedEmbedder, Summarizer, VectorIndex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

/// Questions asked by the benchmark, in order
pub const SAMPLE_QUESTIONS: [&str; 10] = [
    "What is artificial intelligence?",
    "Explain machine learning.",
    "What are the benefits of AI?",
    "How does deep learning work?",
    "What is natural language processing?",
    "Describe computer vision.",
    "What are neural networks?",
    "Explain supervised learning.",
    "What is unsupervised learning?",
    "How to train a model?",
];

/// Benchmark results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Index load time in seconds
    pub load_time: f64,
    /// Latency of each successful question in seconds
    pub query_times: Vec<f64>,
    /// Questions asked
    pub attempted: usize,
}

impl BenchmarkReport {
    pub fn successful(&self) -> usize {
        self.query_times.len()
    }

    pub fn average(&self) -> Option<f64> {
        if self.query_times.is_empty() {
            return None;
        }
        Some(self.query_times.iter().sum::<f64>() / self.query_times.len() as f64)
    }

    pub fn min(&self) -> Option<f64> {
        self.query_times.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.query_times.iter().copied().reduce(f64::max)
    }
}

/// Load the index at `index_path` and run up to `num_queries` sample questions
pub fn run_benchmark(
    config: &Config,
    embedder: SharedEmbedder,
    summarizer: &dyn Summarizer,
    index_path: &Path,
    num_queries: usize,
) -> Result<BenchmarkReport> {
    log::info!(
        "Starting benchmark with {} queries on index {}",
        num_queries,
        index_path.display()
    );

    let start_time = Instant::now();
    let index = VectorIndex::load(index_path, embedder)?;
    let load_time = start_time.elapsed();
    log::info!("Index loaded in {:.2} seconds", load_time.as_secs_f64());

    let report = benchmark_index(config, &index, summarizer, num_queries);
    Ok(BenchmarkReport {
        load_time: load_time.as_secs_f64(),
        ..report
    })
}

/// Run up to `num_queries` sample questions against a loaded index
pub fn benchmark_index(
    config: &Config,
    index: &VectorIndex,
    summarizer: &dyn Summarizer,
    num_queries: usize,
) -> BenchmarkReport {
    let assistant = ResearchAssistant::new(config, index, summarizer);
    let attempted = num_queries.min(SAMPLE_QUESTIONS.len());
    let mut query_times = Vec::with_capacity(attempted);

    for (i, question) in SAMPLE_QUESTIONS.iter().take(attempted).enumerate() {
        let start_time = Instant::now();
        match assistant.answer_question(question, DEFAULT_TOP_K) {
            Ok(_) => {
                let elapsed = start_time.elapsed();
                log::info!("Query {}: {:.2} seconds", i + 1, elapsed.as_secs_f64());
                query_times.push(elapsed.as_secs_f64());
            }
            Err(e) => log::error!("Error during benchmark query {}: {}", i + 1, e),
        }
    }

    BenchmarkReport {
        load_time: 0.0,
        query_times,
        attempted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn report(times: &[f64]) -> BenchmarkReport {
        BenchmarkReport {
            load_time: 0.5,
            query_times: times.to_vec(),
            attempted: 4,
        }
    }

    #[test]
    fn test_latency_stats() {
        let report = report(&[0.2, 0.4, 0.3]);
        assert_eq!(report.successful(), 3);
        assert_relative_eq!(report.average().unwrap(), 0.3, epsilon = 1e-9);
        assert_relative_eq!(report.min().unwrap(), 0.2);
        assert_relative_eq!(report.max().unwrap(), 0.4);
    }

    #[test]
    fn test_no_successful_queries() {
        let report = report(&[]);
        assert_eq!(report.successful(), 0);
        assert!(report.average().is_none());
        assert!(report.min().is_none());
        assert!(report.max().is_none());
    }
}
