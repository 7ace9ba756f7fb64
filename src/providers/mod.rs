//! Provider abstractions for embeddings, answer generation, and document bytes
//!
//! Trait-based seams that allow switching between a local Ollama server and a
//! hosted OpenAI-compatible API, and let tests substitute mocks.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod source;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use openai::{OpenAiEmbedder, OpenAiLlm};
pub use source::{DocumentSource, LocalDocumentSource};
