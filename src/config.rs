//! Configuration for the ingestion and retrieval core

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration, loadable from TOML. Every section has defaults so an
/// empty file (or `RagConfig::default()`) is a working local-Ollama setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Backend provider (ollama or openai)
    #[serde(default)]
    pub backend: BackendProvider,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding backend configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// LLM backend configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Document processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl RagConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| Error::Internal(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Internal("chunking.chunk_size must be positive".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Internal(
                "chunking.chunk_overlap must be smaller than chunk_size".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Internal("retrieval.top_k must be positive".into()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Internal("embeddings.batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Which backend adapters to construct at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Local Ollama server for both embeddings and generation
    #[default]
    Ollama,
    /// Hosted OpenAI-compatible API
    OpenAi,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensionality
    pub dimensions: usize,
    /// Chunks per embed_batch call during ingestion
    pub batch_size: usize,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient backend failures during ingestion
    pub max_retries: u32,
    /// Base backoff between retries, doubled per attempt
    pub retry_backoff_ms: u64,
    /// API key for hosted backends (unused by Ollama)
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 32,
            timeout_secs: 60,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_key: None,
        }
    }
}

/// LLM backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// API key for hosted backends (unused by Ollama)
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
            api_key: None,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per question
    pub top_k: usize,
    /// Minimum similarity for a chunk to be used (0 disables the filter)
    pub similarity_threshold: f32,
    /// Character budget for the prompt context
    pub max_context_chars: usize,
    /// Excerpt length in source citations
    pub excerpt_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.0,
            max_context_chars: 12_000,
            excerpt_chars: 300,
        }
    }
}

/// Document processing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Concurrent document runs (default: CPU count, capped at 8)
    pub parallel_documents: Option<usize>,
}

impl ProcessingConfig {
    pub fn effective_parallel_documents(&self) -> usize {
        self.parallel_documents
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}
