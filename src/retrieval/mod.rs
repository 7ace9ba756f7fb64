//! Question answering over the indexed corpus

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{highlight_terms, truncate_excerpt, PromptBuilder};
use crate::index::{QueryFilter, VectorIndex};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::types::{AnswerResult, Source};

/// Embeds a question, retrieves top-K chunks, and synthesizes a cited answer.
///
/// A pure read path: documents and chunks are never mutated here, and
/// backend failures surface as errors instead of fabricated answers.
pub struct AnswerSynthesizer {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LlmProvider>,
}

impl AnswerSynthesizer {
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            config,
            embedder,
            index,
            llm,
        }
    }

    /// Answer `question`, optionally restricted to the given document ids
    pub async fn answer(&self, question: &str, scope: Option<Vec<Uuid>>) -> Result<AnswerResult> {
        let start = Instant::now();
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidQuestion);
        }

        let retrieval = &self.config.retrieval;
        let query_embedding = self.embedder.embed(question).await?;

        let filter = scope.map(|ids| QueryFilter {
            document_ids: Some(ids),
            public_only: false,
        });
        let mut results = self
            .index
            .query(&query_embedding, retrieval.top_k, filter.as_ref())
            .await?;
        results.retain(|r| r.similarity >= retrieval.similarity_threshold);
        let chunks_retrieved = results.len();

        // Nothing relevant: answer without consulting the model.
        if results.is_empty() {
            tracing::info!(question, "no relevant chunks retrieved");
            return Ok(AnswerResult::no_matches(start.elapsed().as_millis() as u64));
        }

        let terms: Vec<&str> = question.split_whitespace().collect();
        let sources: Vec<Source> = results
            .iter()
            .map(|r| {
                let excerpt = truncate_excerpt(&r.chunk.text, retrieval.excerpt_chars);
                let excerpt_highlighted = highlight_terms(&excerpt, &terms);
                Source {
                    document_id: r.chunk.document_id,
                    document_title: r.document_title.clone(),
                    chunk_index: r.chunk.chunk_index,
                    excerpt,
                    excerpt_highlighted,
                    relevance: r.similarity.clamp(0.0, 1.0),
                }
            })
            .collect();

        let context = PromptBuilder::build_context(&results, retrieval.max_context_chars);
        let prompt = PromptBuilder::build_answer_prompt(question, &context);

        let llm_timeout = Duration::from_secs(self.config.llm.timeout_secs);
        let answer = match timeout(llm_timeout, self.llm.generate(&prompt)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::GenerationFailed(format!(
                    "model call exceeded {}s",
                    self.config.llm.timeout_secs
                )))
            }
        };

        // Confidence mirrors the best retrieval hit.
        let confidence = sources.first().map(|s| s.relevance);
        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(elapsed_ms, sources = sources.len(), "answer synthesized");

        Ok(AnswerResult {
            answer,
            sources,
            confidence,
            elapsed_ms,
            chunks_retrieved,
        })
    }
}
