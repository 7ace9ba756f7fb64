//! OpenAI-compatible hosted providers
//!
//! Works against any service exposing `/v1/embeddings` and
//! `/v1/chat/completions`, including OpenAI itself and self-hosted gateways.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Internal(format!("http client: {e}")))
}

/// Embedding provider for OpenAI-compatible APIs
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut request = self
            .http
            .post(format!("{}/v1/embeddings", self.base_url))
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("embeddings api: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::EmbeddingFailed(format!(
                "embeddings api returned {}",
                response.status()
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingFailed(format!("embeddings response: {e}")))?;
        if body.data.len() != texts.len() {
            return Err(Error::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_many(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::EmbeddingFailed("empty embeddings response".into()))
    }

    /// Native batch endpoint: one request per batch
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_many(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let mut request = self.http.get(format!("{}/v1/models", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        Ok(request
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// LLM provider for OpenAI-compatible chat completion APIs
pub struct OpenAiLlm {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiLlm {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut request = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                temperature: self.temperature,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::GenerationFailed(format!("chat api: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::GenerationFailed(format!(
                "chat api returned {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::GenerationFailed(format!("chat response: {e}")))?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::GenerationFailed("chat api returned no choices".into()))
    }

    async fn health_check(&self) -> Result<bool> {
        let mut request = self.http.get(format!("{}/v1/models", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        Ok(request
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false))
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
