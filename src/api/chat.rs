//! Interactive question answering
//!
//! A line-oriented loop over a [`Session`]: every line is a question, except the
//! commands listed by `help`. Input and output are injected so the loop runs
//! the same against a terminal or a buffer.

use crate::api::assistant::DEFAULT_TOP_K;
use crate::api::session::Session;
use crate::error::Result;
use crate::utils;
use std::io::{BufRead, Write};
use std::time::Instant;

const RULE_WIDTH: usize = 50;

/// Run the loop until `quit`, `exit` or end of input
pub fn chat_loop<R: BufRead, W: Write>(session: &mut Session, mut input: R, mut out: W) -> Result<()> {
    writeln!(out, "Interactive Chat Mode")?;
    writeln!(out, "   Type 'quit' or 'exit' to end the session")?;
    writeln!(out, "   Type 'help' for more commands")?;

    match session.stats() {
        Some(stats) => writeln!(out, "\nIndex loaded: {} chunks", stats.total_chunks)?,
        None => writeln!(out, "\nNo documents yet, use 'ingest <file.pdf>'")?,
    }
    if session.config().has_chat_backend() {
        writeln!(out, "Summarizer: {}", session.summarizer().model_id())?;
    } else {
        writeln!(out, "Summarizer: extractive (context-only mode)")?;
    }
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

    let mut line = String::new();
    loop {
        write!(out, "\nYou: ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let lowered = line.to_lowercase();
        match lowered.as_str() {
            "quit" | "exit" | "q" => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            "help" => {
                writeln!(out, "\nCommands:")?;
                writeln!(out, "  ingest <file.pdf> - Add a PDF to this session")?;
                writeln!(out, "  stats             - Show index statistics")?;
                writeln!(out, "  help              - Show this help")?;
                writeln!(out, "  exit/quit         - End session")?;
            }
            "stats" => match session.stats() {
                Some(stats) => {
                    writeln!(out, "\nIndex Statistics:")?;
                    writeln!(out, "  Total chunks: {}", stats.total_chunks)?;
                    writeln!(out, "  Total pages: {}", stats.total_pages)?;
                    writeln!(out, "  Documents: {}", stats.total_sources)?;
                    writeln!(out, "  Store: {}", stats.store)?;
                    writeln!(out, "  Embedding model: {}", stats.embedding_model)?;
                }
                None => writeln!(out, "No documents ingested yet.")?,
            },
            _ if lowered.starts_with("ingest ") => {
                let path = line["ingest ".len()..].trim();
                match session.ingest_pdf(path) {
                    Ok(report) => writeln!(
                        out,
                        "Added {} chunks from {} ({} pages)",
                        report.chunks, report.source, report.pages
                    )?,
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
            }
            _ => {
                let start_time = Instant::now();
                match session.ask(line, DEFAULT_TOP_K) {
                    Ok(answer) if answer.is_empty() => {
                        writeln!(out, "\nAssistant: No relevant passages found.")?
                    }
                    Ok(answer) => {
                        writeln!(out, "\nAssistant: {}", answer.answer)?;
                        for (i, evidence) in answer.evidence.iter().enumerate() {
                            writeln!(
                                out,
                                "  {}. Page {}: {}",
                                i + 1,
                                evidence.page,
                                utils::preview(&evidence.text, 100)
                            )?;
                        }
                        writeln!(out, "[{:.1}s]", start_time.elapsed().as_secs_f64())?;
                    }
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
            }
        }
    }

    Ok(())
}
