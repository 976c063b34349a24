//! LLM summarization of the assembled context.
//!
//! Every failure (no client, transport error, bad status, malformed payload,
//! timeout) is folded into [`LlmReply`]; nothing here returns an error.

use crate::context::PromptContext;
use methodics_llm::{LlmClient, LlmRequest};
use methodics_prompt::{build_prompt, PromptDefinition};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one summarization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmReply {
    Answer(String),
    /// The call succeeded with no text, or there was nothing to summarize
    Empty,
    Failed(String),
}

/// Generation parameters for the summarization call.
#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub timeout: Duration,
    pub max_context_chars: usize,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.2,
            max_tokens: 800,
            top_p: 0.8,
            timeout: Duration::from_secs(30),
            max_context_chars: 5000,
        }
    }
}

pub struct Summarizer {
    client: Option<Arc<dyn LlmClient>>,
    unavailable_reason: String,
    settings: SummarizerSettings,
    prompt: PromptDefinition,
}

impl Summarizer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        settings: SummarizerSettings,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            client: Some(client),
            unavailable_reason: String::new(),
            settings,
            prompt,
        }
    }

    /// A summarizer without a client; every call reports `Failed(reason)`.
    pub fn unavailable(
        reason: impl Into<String>,
        settings: SummarizerSettings,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            client: None,
            unavailable_reason: reason.into(),
            settings,
            prompt,
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Single bounded LLM call; never retried.
    pub async fn summarize(&self, context: &PromptContext, question: &str) -> LlmReply {
        if !context.is_grounded() {
            return LlmReply::Empty;
        }

        let Some(client) = &self.client else {
            return LlmReply::Failed(self.unavailable_reason.clone());
        };

        let built = match build_prompt(
            &self.prompt,
            question,
            context.text(),
            self.settings.max_context_chars,
        ) {
            Ok(built) => built,
            Err(e) => return LlmReply::Failed(e.to_string()),
        };

        let mut request = LlmRequest::new(built.user, self.settings.model.clone())
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
            .with_top_p(self.settings.top_p);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            "Calling {} with {} context chars",
            client.provider_name(),
            built.metadata.context_chars
        );

        match tokio::time::timeout(self.settings.timeout, client.complete(&request)).await {
            Ok(Ok(response)) => {
                let text = response.content.trim();
                if text.is_empty() {
                    LlmReply::Empty
                } else {
                    LlmReply::Answer(text.to_string())
                }
            }
            Ok(Err(e)) => LlmReply::Failed(e.to_string()),
            Err(_) => LlmReply::Failed(format!(
                "LLM call timed out after {:?}",
                self.settings.timeout
            )),
        }
    }
}

impl std::fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarizer")
            .field(
                "provider",
                &self.client.as_ref().map(|c| c.provider_name().to_string()),
            )
            .field("settings", &self.settings)
            .field("prompt", &self.prompt.id)
            .finish()
    }
}
