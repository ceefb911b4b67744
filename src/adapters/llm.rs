use anyhow::Result;
use async_trait::async_trait;

use crate::config::{RunConfig, Secret};

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_name: String,
    pub api_key: Secret,
    pub base_url: Option<String>,
    pub max_tokens: usize,
}

impl ModelConfig {
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            model_name: config.model.clone(),
            api_key: config.model_api_key.clone(),
            base_url: config.model_base_url.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LLMRequest {
    pub user_prompt: String,
}

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// A completion service: text prompt in, generated text out.
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn complete(&self, request: LLMRequest) -> Result<LLMResponse>;
    fn model_name(&self) -> &str;
}
