//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `OllamaLlm`: local Ollama server (llama3.2, phi3, etc.)
/// - `OpenAiLlm`: hosted OpenAI-compatible API
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for an assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
