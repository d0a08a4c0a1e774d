//! research-assistant CLI application
//!
//! Command-line interface for the research-assistant library.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use research_assistant::api::{self, DEFAULT_TOP_K, IngestReport, ResearchAssistant, Session};
use research_assistant::{Config, VectorIndex, ml, utils};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "research-assistant")]
#[command(about = "Index PDF documents and answer questions with supporting evidence")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest PDF files and build or extend the index
    Ingest {
        /// Paths to PDF files
        #[arg(required = true)]
        pdf_paths: Vec<PathBuf>,

        /// Path to save the index file
        #[arg(long)]
        index_path: Option<PathBuf>,
    },

    /// Ask a question against the index
    Query {
        /// Question to ask
        question: String,

        /// Path to the index file
        #[arg(long)]
        index_path: Option<PathBuf>,

        /// Number of top results to retrieve
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K as i64, allow_negative_numbers = true)]
        top_k: i64,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run query latency benchmarks
    Benchmark {
        /// Path to the index file
        #[arg(long)]
        index_path: Option<PathBuf>,

        /// Number of queries to run
        #[arg(long, default_value_t = 10)]
        num_queries: usize,
    },

    /// Interactive question answering over PDFs
    Chat {
        /// PDF files to load into the session
        pdfs: Vec<PathBuf>,

        /// Start from an existing index file
        #[arg(long)]
        index_path: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    init_logging(&config)?;

    match cli.command {
        Commands::Ingest {
            pdf_paths,
            index_path,
        } => {
            let index_path = index_path.unwrap_or_else(|| config.index_path.clone());
            ingest_command(&config, pdf_paths, index_path)
        }
        Commands::Query {
            question,
            index_path,
            top_k,
            json,
        } => {
            let index_path = index_path.unwrap_or_else(|| config.index_path.clone());
            query_command(&config, &question, index_path, top_k, json)
        }
        Commands::Benchmark {
            index_path,
            num_queries,
        } => {
            let index_path = index_path.unwrap_or_else(|| config.index_path.clone());
            benchmark_command(&config, index_path, num_queries)
        }
        Commands::Chat { pdfs, index_path } => chat_command(config, pdfs, index_path),
    }
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    // RUST_LOG takes precedence over LOG_LEVEL
    env_logger::Builder::new()
        .filter_level(config.log_filter()?)
        .parse_default_env()
        .init();
    Ok(())
}

fn ingest_command(config: &Config, pdf_paths: Vec<PathBuf>, index_path: PathBuf) -> anyhow::Result<()> {
    api::validate_pdf_paths(&pdf_paths).context("PDF validation failed")?;

    let embedder = ml::embedding::from_config(config)?;
    let report = api::ingest_pdfs(config, embedder, &pdf_paths, &index_path)
        .with_context(|| format!("Ingest into {} failed", index_path.display()))?;

    print!("{}", ingest_summary(&report));
    Ok(())
}

fn ingest_summary(report: &IngestReport) -> String {
    let mut lines: Vec<String> = report
        .documents
        .iter()
        .map(|d| format!("{}: {} pages, {} chunks", d.source, d.pages, d.chunks))
        .collect();
    if report.created {
        lines.push(format!("Built new index with {} chunks", report.total_chunks));
    } else {
        lines.push(format!(
            "Added {} chunks ({} total)",
            report.chunks_added, report.total_chunks
        ));
    }
    lines.push(format!("Index saved to {}", report.index_path.display()));
    lines.push(format!("Processing time: {:.2} seconds", report.processing_time));
    lines.iter().map(|line| format!("{}\n", line)).collect()
}

fn query_command(
    config: &Config,
    question: &str,
    index_path: PathBuf,
    top_k: i64,
    json: bool,
) -> anyhow::Result<()> {
    log::info!("Processing query: '{}' with top_k={}", question, top_k);
    if question.trim().is_empty() {
        bail!("Question cannot be empty.");
    }
    if top_k <= 0 {
        bail!("top-k must be a positive integer.");
    }

    let embedder = ml::embedding::from_config(config)?;
    let index = VectorIndex::load(&index_path, embedder)?;
    let summarizer = ml::summarize::from_config(config)?;

    let assistant = ResearchAssistant::new(config, &index, summarizer.as_ref());
    let answer = assistant
        .answer_question(question, top_k as usize)
        .context("Error during query")?;
    log::info!("Query completed successfully");

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("Answer: {}", answer.answer);
    println!("\nEvidence:");
    for (i, evidence) in answer.evidence.iter().enumerate() {
        println!(
            "{}. Page {}: {}",
            i + 1,
            evidence.page,
            utils::preview(&evidence.text, 100)
        );
    }
    Ok(())
}

fn benchmark_command(config: &Config, index_path: PathBuf, num_queries: usize) -> anyhow::Result<()> {
    let embedder = ml::embedding::from_config(config)?;
    let summarizer = ml::summarize::from_config(config)?;
    let report = api::run_benchmark(config, embedder, summarizer.as_ref(), &index_path, num_queries)?;

    match (report.average(), report.min(), report.max()) {
        (Some(avg), Some(min), Some(max)) => {
            println!("Benchmark Results:");
            println!("Index load time: {:.2} seconds", report.load_time);
            println!("Average query time: {:.2} seconds", avg);
            println!("Min query time: {:.2} seconds", min);
            println!("Max query time: {:.2} seconds", max);
            println!(
                "Successful queries: {}/{}",
                report.successful(),
                report.attempted
            );
        }
        _ => println!("No successful queries during benchmark."),
    }
    Ok(())
}

fn chat_command(config: Config, pdfs: Vec<PathBuf>, index_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut session = Session::new(config)?;

    if let Some(index_path) = index_path {
        session
            .open_index(&index_path)
            .with_context(|| format!("Failed to open {}", index_path.display()))?;
    }
    for pdf in &pdfs {
        let report = session
            .ingest_pdf(pdf)
            .with_context(|| format!("Error processing {}", pdf.display()))?;
        println!("Loaded {} ({} chunks)", report.source, report.chunks);
    }

    let stdin = std::io::stdin();
    api::chat_loop(&mut session, stdin.lock(), std::io::stdout())?;
    Ok(())
}
