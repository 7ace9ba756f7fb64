//! Shared context wiring providers, registry, pipeline, and synthesizer

use std::sync::Arc;

use crate::config::{BackendProvider, RagConfig};
use crate::error::Result;
use crate::index::{InMemoryVectorIndex, VectorIndex};
use crate::pipeline::{DocumentRegistry, IngestionPipeline};
use crate::providers::{
    DocumentSource, EmbeddingProvider, LlmProvider, OllamaEmbedder, OllamaLlm, OpenAiEmbedder,
    OpenAiLlm,
};
use crate::retrieval::AnswerSynthesizer;

/// Owns every long-lived collaborator of the core. Construct once at startup
/// and share; there is no implicit global state.
pub struct RagContext {
    config: RagConfig,
    registry: Arc<DocumentRegistry>,
    index: Arc<dyn VectorIndex>,
    pipeline: Arc<IngestionPipeline>,
    synthesizer: Arc<AnswerSynthesizer>,
}

impl RagContext {
    /// Build a context with backends selected from the configuration and an
    /// in-memory vector index
    pub fn new(config: RagConfig, source: Arc<dyn DocumentSource>) -> Result<Self> {
        config.validate()?;
        let (embedder, llm) = build_providers(&config)?;
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new());
        Self::with_providers(config, source, embedder, llm, index)
    }

    /// Build a context from explicit providers (tests, custom backends)
    pub fn with_providers(
        config: RagConfig,
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        let registry = Arc::new(DocumentRegistry::new());
        let pipeline = Arc::new(IngestionPipeline::new(
            config.clone(),
            source,
            embedder.clone(),
            index.clone(),
            registry.clone(),
        ));
        let synthesizer = Arc::new(AnswerSynthesizer::new(
            config.clone(),
            embedder,
            index.clone(),
            llm,
        ));
        Ok(Self {
            config,
            registry,
            index,
            pipeline,
            synthesizer,
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DocumentRegistry> {
        &self.registry
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn pipeline(&self) -> &Arc<IngestionPipeline> {
        &self.pipeline
    }

    pub fn synthesizer(&self) -> &Arc<AnswerSynthesizer> {
        &self.synthesizer
    }
}

/// Select embedding/LLM adapters once, per configuration
fn build_providers(
    config: &RagConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    match config.backend {
        BackendProvider::Ollama => Ok((
            Arc::new(OllamaEmbedder::new(&config.embeddings)?),
            Arc::new(OllamaLlm::new(&config.llm)?),
        )),
        BackendProvider::OpenAi => Ok((
            Arc::new(OpenAiEmbedder::new(&config.embeddings)?),
            Arc::new(OpenAiLlm::new(&config.llm)?),
        )),
    }
}
