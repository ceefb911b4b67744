pub mod anthropic;
pub mod gitlab;
pub mod hosting;
pub mod llm;

pub use anthropic::AnthropicAdapter;
pub use gitlab::GitLabClient;

#[cfg(test)]
pub(crate) mod fakes;
