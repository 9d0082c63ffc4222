//! LLM provider trait for text generation

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM text generation
///
/// Prompts are assembled by `generation::PromptBuilder`; providers only
/// transport them.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a single-turn prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
