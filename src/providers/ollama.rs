//! Ollama-backed providers for embeddings and answer generation
//!
//! A thin HTTP client wraps the local Ollama API; adapter structs implement
//! the provider traits on top of it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for a local Ollama server
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Generate an embedding via POST /api/embeddings
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let response = self
            .http
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&EmbedRequest { model, prompt: text })
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("ollama: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::EmbeddingFailed(format!(
                "ollama returned {}",
                response.status()
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingFailed(format!("ollama response: {e}")))?;
        if body.embedding.is_empty() {
            return Err(Error::EmbeddingFailed("ollama returned an empty embedding".into()));
        }
        Ok(body.embedding)
    }

    /// Generate a completion via POST /api/generate (non-streaming)
    pub async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model,
                prompt,
                stream: false,
                options: GenerateOptions { temperature },
            })
            .send()
            .await
            .map_err(|e| Error::GenerationFailed(format!("ollama: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::GenerationFailed(format!(
                "ollama returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::GenerationFailed(format!("ollama response: {e}")))?;
        Ok(body.response)
    }

    /// GET /api/tags succeeds when the server is up
    pub async fn health_check(&self) -> Result<bool> {
        match self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

/// Ollama embedding provider
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Arc::new(OllamaClient::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?);
        Ok(Self {
            client,
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text).await
    }

    // Ollama has no native batch endpoint; the sequential default applies.

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
}

impl OllamaLlm {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Arc::new(OllamaClient::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?);
        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(&self.model, prompt, self.temperature).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
