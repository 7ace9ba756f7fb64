//! Vector index: chunk storage and nearest-neighbor queries

mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Chunk, DocumentMeta};

pub use memory::InMemoryVectorIndex;

/// Filter applied to index queries
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Restrict results to these document ids
    pub document_ids: Option<Vec<Uuid>>,
    /// Only return chunks from public documents
    pub public_only: bool,
}

/// A chunk matched by a similarity query
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Title of the owning document, for citations
    pub document_title: String,
    /// Cosine similarity against the query vector
    pub similarity: f32,
}

/// Storage and similarity search over chunk embeddings.
///
/// `upsert` replaces all entries for a document atomically; queries never
/// observe a partially written batch.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Replace all entries for `meta.id` with `chunks`.
    /// Every chunk must carry a non-empty embedding.
    async fn upsert(&self, meta: &DocumentMeta, chunks: Vec<Chunk>) -> Result<()>;

    /// Top-k most similar chunks, descending; ties broken by insertion order.
    /// An empty index yields an empty result, not an error.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<ScoredChunk>>;

    /// Remove all chunks for a document; returns how many were removed.
    /// Removing an absent document is a no-op.
    async fn delete(&self, document_id: &Uuid) -> Result<usize>;

    /// Total number of stored chunks
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
