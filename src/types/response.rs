//! Answer payload types returned to the chat layer

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cited source backing an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Owning document
    pub document_id: Uuid,
    /// Document title for display
    pub document_title: String,
    /// Index of the cited chunk within its document
    pub chunk_index: u32,
    /// Excerpt of the chunk text, truncated at a word boundary
    pub excerpt: String,
    /// Excerpt with query terms wrapped in `<mark>` tags
    pub excerpt_highlighted: String,
    /// Similarity-derived relevance in [0, 1]
    pub relevance: f32,
}

/// Result of answering a question against the indexed corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Generated answer text
    pub answer: String,
    /// Sources ordered by descending relevance
    pub sources: Vec<Source>,
    /// Relevance of the best source; absent when nothing was retrieved
    pub confidence: Option<f32>,
    /// Retrieval plus generation latency
    pub elapsed_ms: u64,
    /// Chunks retrieved before context assembly
    pub chunks_retrieved: usize,
}

impl AnswerResult {
    pub(crate) const NO_MATCH_ANSWER: &'static str =
        "I couldn't find relevant information in the documents to answer this question.";

    /// Result for a question that matched no indexed content.
    /// The language model is never consulted on this path.
    pub fn no_matches(elapsed_ms: u64) -> Self {
        Self {
            answer: Self::NO_MATCH_ANSWER.to_string(),
            sources: Vec::new(),
            confidence: None,
            elapsed_ms,
            chunks_retrieved: 0,
        }
    }
}
