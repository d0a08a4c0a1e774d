//! Answering pipeline
//!
//! Retrieves the passages nearest to a question, summarizes them into one
//! answer and returns the passages as evidence in retrieval order.

use crate::config::{Config, SummaryPolicy};
use crate::error::{AssistantError, Result};
use crate::ml::{SearchResult, Summarizer, VectorIndex};
use serde::{Deserialize, Serialize};

/// Passages retrieved per question unless the caller asks otherwise
pub const DEFAULT_TOP_K: usize = 5;

/// Source of ranked passages for a question
pub trait Retriever {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>>;
}

impl Retriever for VectorIndex {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.search(query, top_k)
    }
}

/// One supporting passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub text: String,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<SearchResult> for Evidence {
    fn from(result: SearchResult) -> Self {
        Self {
            text: result.text,
            page: result.metadata.page,
            source: result.metadata.source,
        }
    }
}

/// Summarized answer with its evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub evidence: Vec<Evidence>,
}

impl Answer {
    /// True when nothing was retrieved
    pub fn is_empty(&self) -> bool {
        self.answer.is_empty() && self.evidence.is_empty()
    }
}

/// Question answering over a retriever and a summarizer
pub struct ResearchAssistant<'a> {
    retriever: &'a dyn Retriever,
    summarizer: &'a dyn Summarizer,
    policy: SummaryPolicy,
}

impl<'a> ResearchAssistant<'a> {
    pub fn new(config: &Config, retriever: &'a dyn Retriever, summarizer: &'a dyn Summarizer) -> Self {
        Self::with_policy(config.summary, retriever, summarizer)
    }

    pub fn with_policy(
        policy: SummaryPolicy,
        retriever: &'a dyn Retriever,
        summarizer: &'a dyn Summarizer,
    ) -> Self {
        Self {
            retriever,
            summarizer,
            policy,
        }
    }

    /// Answer `question` from the `top_k` nearest passages
    pub fn answer_question(&self, question: &str, top_k: usize) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(AssistantError::Validation(
                "Question cannot be empty.".to_string(),
            ));
        }
        if top_k == 0 {
            return Err(AssistantError::Validation(
                "top-k must be a positive integer.".to_string(),
            ));
        }

        let results = self.retriever.retrieve(question, top_k)?;
        if results.is_empty() {
            log::info!("No passages retrieved for '{}'", question);
            return Ok(Answer::default());
        }

        let context = results
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let evidence: Vec<Evidence> = results.into_iter().map(Evidence::from).collect();

        if context.trim().is_empty() {
            log::info!("Retrieved passages for '{}' contain no text", question);
            return Ok(Answer {
                answer: String::new(),
                evidence,
            });
        }

        log::debug!(
            "Summarizing {} passages ({} chars) with {}",
            evidence.len(),
            context.chars().count(),
            self.summarizer.model_id()
        );

        let answer = self
            .summarizer
            .summarize(&context, &self.policy)
            .map_err(|e| {
                AssistantError::Summarization(format!(
                    "Failed to answer '{}' with {}: {}",
                    question,
                    self.summarizer.model_id(),
                    e
                ))
            })?;

        Ok(Answer { answer, evidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ChunkMetadata;
    use std::cell::{Cell, RefCell};

    struct FixedRetriever(Vec<SearchResult>);

    impl Retriever for FixedRetriever {
        fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
            Ok(self.0.iter().take(top_k).cloned().collect())
        }
    }

    #[derive(Default)]
    struct RecordingSummarizer {
        calls: Cell<usize>,
        last_input: RefCell<String>,
    }

    impl Summarizer for RecordingSummarizer {
        fn model_id(&self) -> &str {
            "recording"
        }

        fn summarize(&self, text: &str, _policy: &SummaryPolicy) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            *self.last_input.borrow_mut() = text.to_string();
            Ok("summary".to_string())
        }
    }

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        fn model_id(&self) -> &str {
            "failing"
        }

        fn summarize(&self, _text: &str, _policy: &SummaryPolicy) -> Result<String> {
            Err(AssistantError::Summarization("backend down".to_string()))
        }
    }

    fn result(distance: f32, text: &str, page: u32) -> SearchResult {
        SearchResult {
            distance,
            text: text.to_string(),
            metadata: ChunkMetadata::new(page, page as u64),
        }
    }

    #[test]
    fn test_answer_joins_passages_in_order() {
        let retriever = FixedRetriever(vec![
            result(0.1, "first passage", 3),
            result(0.4, "second passage", 1),
        ]);
        let summarizer = RecordingSummarizer::default();
        let assistant = ResearchAssistant::new(&Config::default(), &retriever, &summarizer);

        let answer = assistant.answer_question("what?", DEFAULT_TOP_K).unwrap();
        assert_eq!(answer.answer, "summary");
        assert_eq!(*summarizer.last_input.borrow(), "first passage second passage");
        let pages: Vec<u32> = answer.evidence.iter().map(|e| e.page).collect();
        assert_eq!(pages, vec![3, 1]);
    }

    #[test]
    fn test_zero_results_skip_summarizer() {
        let retriever = FixedRetriever(Vec::new());
        let summarizer = RecordingSummarizer::default();
        let assistant = ResearchAssistant::new(&Config::default(), &retriever, &summarizer);

        let answer = assistant.answer_question("anything", 5).unwrap();
        assert!(answer.is_empty());
        assert_eq!(summarizer.calls.get(), 0);
    }

    #[test]
    fn test_blank_passages_skip_summarizer() {
        let retriever = FixedRetriever(vec![result(0.0, "", 1), result(0.2, "  ", 2)]);
        let summarizer = RecordingSummarizer::default();
        let assistant = ResearchAssistant::new(&Config::default(), &retriever, &summarizer);

        let answer = assistant.answer_question("anything", 5).unwrap();
        assert_eq!(answer.answer, "");
        assert_eq!(answer.evidence.len(), 2);
        assert_eq!(summarizer.calls.get(), 0);
    }

    #[test]
    fn test_invalid_inputs() {
        let retriever = FixedRetriever(vec![result(0.0, "text", 1)]);
        let summarizer = RecordingSummarizer::default();
        let assistant = ResearchAssistant::new(&Config::default(), &retriever, &summarizer);

        assert!(assistant.answer_question("   ", 5).unwrap_err().is_validation());
        assert!(assistant.answer_question("question", 0).unwrap_err().is_validation());
        assert_eq!(summarizer.calls.get(), 0);
    }

    #[test]
    fn test_summarizer_error_names_question() {
        let retriever = FixedRetriever(vec![result(0.0, "text", 1)]);
        let assistant = ResearchAssistant::new(&Config::default(), &retriever, &FailingSummarizer);

        let err = assistant.answer_question("why is the sky blue", 5).unwrap_err();
        assert!(err.to_string().contains("why is the sky blue"));
    }

    #[test]
    fn test_evidence_json_shape() {
        let evidence = Evidence {
            text: "t".to_string(),
            page: 2,
            source: None,
        };
        let json = serde_json::to_value(&evidence).unwrap();
        assert_eq!(json, serde_json::json!({"text": "t", "page": 2}));
    }
}
