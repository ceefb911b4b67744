use tracing::info;

use crate::adapters::llm::{LLMAdapter, LLMRequest};
use crate::core::prompt::ReviewPrompt;
use crate::errors::PipelineError;

/// Generated review text. Posted as-is, never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewResult {
    pub text: String,
    pub model: String,
}

pub struct ReviewClient<'a> {
    adapter: &'a dyn LLMAdapter,
}

impl<'a> ReviewClient<'a> {
    pub fn new(adapter: &'a dyn LLMAdapter) -> Self {
        Self { adapter }
    }

    /// One blocking completion call; any failure is fatal to the run.
    pub async fn review(&self, prompt: &ReviewPrompt) -> Result<ReviewResult, PipelineError> {
        info!(
            "Requesting review from {} ({} prompt chars)",
            self.adapter.model_name(),
            prompt.text.chars().count()
        );

        let request = LLMRequest {
            user_prompt: prompt.text.clone(),
        };
        let response = self
            .adapter
            .complete(request)
            .await
            .map_err(PipelineError::Review)?;

        if let Some(usage) = &response.usage {
            info!(
                "Model usage: {} input, {} output tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(ReviewResult {
            text: response.content,
            model: response.model,
        })
    }
}
