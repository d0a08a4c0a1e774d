//! Summarization backends
//!
//! [`ChatSummarizer`] asks an OpenAI-compatible chat model (OpenAI, Ollama, ...)
//! for a short abstractive summary. [`ExtractiveSummarizer`] is the context-only
//! fallback used when no chat backend is configured: it keeps whole leading
//! sentences within the length policy.

use crate::config::{Config, SummaryPolicy};
use crate::error::{AssistantError, Result};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
};
use async_openai::{Client, config::OpenAIConfig};
use regex::Regex;

/// A text summarization function with a stable identity
pub trait Summarizer {
    /// Model identity
    fn model_id(&self) -> &str;

    /// Summarize `text` within the bounds of `policy`
    fn summarize(&self, text: &str, policy: &SummaryPolicy) -> Result<String>;
}

/// Construct the summarizer selected by the configuration
pub fn from_config(config: &Config) -> Result<Box<dyn Summarizer>> {
    if config.has_chat_backend() {
        Ok(Box::new(ChatSummarizer::new(
            &config.summarization_model,
            config.summarization_api_key.as_deref(),
            config.summarization_base_url.as_deref(),
        )?))
    } else {
        log::info!("No chat backend configured, answers will be extractive (context-only mode)");
        Ok(Box::new(ExtractiveSummarizer::new()?))
    }
}

const SYSTEM_PROMPT: &str = "You are a research assistant. You receive passages retrieved from a document. \
Write a concise, faithful summary of the information in the passages. \
Do not add facts that are not in the passages and do not mention that you were given passages.";

/// Chat-completion summarizer for OpenAI-compatible APIs
///
/// The client is async; a private current-thread runtime drives each request so
/// callers stay synchronous. Must not be called from inside another tokio runtime.
pub struct ChatSummarizer {
    client: Client<OpenAIConfig>,
    model: String,
    runtime: tokio::runtime::Runtime,
}

impl ChatSummarizer {
    /// Create a summarizer; `base_url` selects a non-OpenAI endpoint such as
    /// `http://localhost:11434/v1` for Ollama
    pub fn new(model: &str, api_key: Option<&str>, base_url: Option<&str>) -> Result<Self> {
        let mut config = OpenAIConfig::new().with_api_key(api_key.unwrap_or_default());
        if let Some(base_url) = base_url {
            config = config.with_api_base(base_url);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        log::info!(
            "Summarization via chat model {} ({})",
            model,
            base_url.unwrap_or("api.openai.com")
        );

        Ok(Self {
            client: Client::with_config(config),
            model: model.to_string(),
            runtime,
        })
    }

    fn build_messages(text: &str, policy: &SummaryPolicy) -> Vec<ChatCompletionRequestMessage> {
        let instruction = format!(
            "Summarize the following passages in {} to {} words.\n\nPassages:\n{}",
            policy.min_words, policy.max_words, text
        );
        vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(SYSTEM_PROMPT.to_string()),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(instruction),
                name: None,
            }),
        ]
    }

    async fn request(&self, text: &str, policy: &SummaryPolicy) -> Result<String> {
        // Roughly two tokens per English word leaves room for the upper bound
        let max_tokens = (policy.max_words * 2).min(u16::MAX as usize) as u16;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(Self::build_messages(text, policy))
            .max_tokens(max_tokens)
            .temperature(0.0_f32)
            .build()
            .map_err(|e| AssistantError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AssistantError::Summarization(format!("{} request failed: {}", self.model, e)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                log::error!("No content in chat response: {:?}", response);
                AssistantError::Summarization("No content in response".to_string())
            })
    }
}

impl Summarizer for ChatSummarizer {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn summarize(&self, text: &str, policy: &SummaryPolicy) -> Result<String> {
        self.runtime.block_on(self.request(text, policy))
    }
}

/// Leading-sentence summarizer
pub struct ExtractiveSummarizer {
    sentence_regex: Regex,
}

impl ExtractiveSummarizer {
    pub fn new() -> Result<Self> {
        let sentence_regex = Regex::new(r"[^.!?]+(?:[.!?]+|$)").map_err(|e| {
            AssistantError::Summarization(format!("Failed to compile sentence regex: {}", e))
        })?;
        Ok(Self { sentence_regex })
    }
}

impl Summarizer for ExtractiveSummarizer {
    fn model_id(&self) -> &str {
        "extractive"
    }

    fn summarize(&self, text: &str, policy: &SummaryPolicy) -> Result<String> {
        let mut kept: Vec<&str> = Vec::new();

        for sentence in self.sentence_regex.find_iter(text) {
            if kept.len() >= policy.min_words {
                break;
            }
            let words: Vec<&str> = sentence.as_str().split_whitespace().collect();
            let room = policy.max_words.saturating_sub(kept.len());
            if words.len() > room {
                // Only cut into a sentence when the summary is still too short
                kept.extend(words.into_iter().take(room));
                break;
            }
            kept.extend(words);
        }

        Ok(kept.join(" "))
    }
}
