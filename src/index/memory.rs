//! In-process vector index with cosine similarity

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, DocumentMeta};

use super::{QueryFilter, ScoredChunk, VectorIndex};

struct StoredChunk {
    chunk: Chunk,
    /// Precomputed vector norm
    norm: f32,
    /// Monotone insertion sequence, the tie-break in queries
    seq: u64,
}

struct DocumentEntries {
    title: String,
    is_public: bool,
    chunks: Vec<StoredChunk>,
}

#[derive(Default)]
struct Inner {
    documents: HashMap<Uuid, DocumentEntries>,
    next_seq: u64,
}

/// In-memory index guarded by a single lock; per-document mutation is atomic
/// and concurrent queries share the read side.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    inner: RwLock<Inner>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn vector_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_similarity(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, meta: &DocumentMeta, chunks: Vec<Chunk>) -> Result<()> {
        for chunk in &chunks {
            if chunk.embedding.is_empty() {
                return Err(Error::Index(format!(
                    "chunk {} of document {} has no embedding",
                    chunk.chunk_index, meta.id
                )));
            }
        }

        let mut inner = self.inner.write();
        let mut stored = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let norm = vector_norm(&chunk.embedding);
            let seq = inner.next_seq;
            inner.next_seq += 1;
            stored.push(StoredChunk { chunk, norm, seq });
        }
        inner.documents.insert(
            meta.id,
            DocumentEntries {
                title: meta.title.clone(),
                is_public: meta.is_public,
                chunks: stored,
            },
        );
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query_norm = vector_norm(vector);
        let inner = self.inner.read();

        let mut results: Vec<(ScoredChunk, u64)> = Vec::new();
        for (doc_id, entries) in &inner.documents {
            if let Some(filter) = filter {
                if filter.public_only && !entries.is_public {
                    continue;
                }
                if let Some(ids) = &filter.document_ids {
                    if !ids.contains(doc_id) {
                        continue;
                    }
                }
            }
            for stored in &entries.chunks {
                if stored.chunk.embedding.len() != vector.len() {
                    continue;
                }
                let similarity =
                    cosine_similarity(vector, query_norm, &stored.chunk.embedding, stored.norm);
                results.push((
                    ScoredChunk {
                        chunk: stored.chunk.clone(),
                        document_title: entries.title.clone(),
                        similarity,
                    },
                    stored.seq,
                ));
            }
        }

        results.sort_by(|a, b| {
            b.0.similarity
                .partial_cmp(&a.0.similarity)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        results.truncate(top_k);
        Ok(results.into_iter().map(|(r, _)| r).collect())
    }

    async fn delete(&self, document_id: &Uuid) -> Result<usize> {
        let mut inner = self.inner.write();
        Ok(inner
            .documents
            .remove(document_id)
            .map(|e| e.chunks.len())
            .unwrap_or(0))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().documents.values().map(|e| e.chunks.len()).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;

    fn meta(id: Uuid, title: &str, is_public: bool) -> DocumentMeta {
        DocumentMeta {
            id,
            title: title.to_string(),
            file_ref: format!("{title}.txt"),
            file_type: FileType::Txt,
            size_bytes: 0,
            is_public,
        }
    }

    fn chunk(document_id: Uuid, index: u32, embedding: Vec<f32>) -> Chunk {
        let mut c = Chunk::new(document_id, index, format!("chunk {index}"), 0, 0);
        c.embedding = embedding;
        c
    }

    #[tokio::test]
    async fn test_empty_index_query_returns_empty() {
        let index = InMemoryVectorIndex::new();
        let results = index.query(&[1.0, 0.0], 5, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_query_returns_descending_and_capped() {
        let index = InMemoryVectorIndex::new();
        let id = Uuid::new_v4();
        index
            .upsert(
                &meta(id, "doc", false),
                vec![
                    chunk(id, 0, vec![1.0, 0.0]),
                    chunk(id, 1, vec![0.0, 1.0]),
                    chunk(id, 2, vec![0.7, 0.7]),
                ],
            )
            .await
            .unwrap();

        let results = index.query(&[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].similarity >= results[1].similarity);
        assert_eq!(results[0].chunk.chunk_index, 0);

        let all = index.query(&[1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_insertion_order() {
        let index = InMemoryVectorIndex::new();
        let id = Uuid::new_v4();
        index
            .upsert(
                &meta(id, "doc", false),
                vec![
                    chunk(id, 0, vec![1.0, 0.0]),
                    chunk(id, 1, vec![2.0, 0.0]),
                    chunk(id, 2, vec![3.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        // Cosine similarity of parallel vectors is identical.
        let results = index.query(&[1.0, 0.0], 3, None).await.unwrap();
        let order: Vec<u32> = results.iter().map(|r| r.chunk.chunk_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_document_chunks() {
        let index = InMemoryVectorIndex::new();
        let id = Uuid::new_v4();
        let m = meta(id, "doc", false);
        index
            .upsert(&m, vec![chunk(id, 0, vec![1.0]), chunk(id, 1, vec![1.0])])
            .await
            .unwrap();
        assert_eq!(index.len().await.unwrap(), 2);

        index.upsert(&m, vec![chunk(id, 0, vec![1.0])]).await.unwrap();
        assert_eq!(index.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_noop_safe() {
        let index = InMemoryVectorIndex::new();
        let id = Uuid::new_v4();
        assert_eq!(index.delete(&id).await.unwrap(), 0);

        index
            .upsert(&meta(id, "doc", false), vec![chunk(id, 0, vec![1.0])])
            .await
            .unwrap();
        assert_eq!(index.delete(&id).await.unwrap(), 1);
        assert!(index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_rejects_missing_embedding() {
        let index = InMemoryVectorIndex::new();
        let id = Uuid::new_v4();
        let err = index
            .upsert(&meta(id, "doc", false), vec![Chunk::new(id, 0, "text".into(), 0, 4)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }

    #[tokio::test]
    async fn test_document_id_filter() {
        let index = InMemoryVectorIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        index
            .upsert(&meta(a, "a", false), vec![chunk(a, 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        index
            .upsert(&meta(b, "b", false), vec![chunk(b, 0, vec![1.0, 0.0])])
            .await
            .unwrap();

        let filter = QueryFilter {
            document_ids: Some(vec![a]),
            public_only: false,
        };
        let results = index.query(&[1.0, 0.0], 10, Some(&filter)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.document_id, a);
    }

    #[tokio::test]
    async fn test_public_only_filter() {
        let index = InMemoryVectorIndex::new();
        let public = Uuid::new_v4();
        let private = Uuid::new_v4();
        index
            .upsert(&meta(public, "pub", true), vec![chunk(public, 0, vec![1.0])])
            .await
            .unwrap();
        index
            .upsert(&meta(private, "priv", false), vec![chunk(private, 0, vec![1.0])])
            .await
            .unwrap();

        let filter = QueryFilter {
            document_ids: None,
            public_only: true,
        };
        let results = index.query(&[1.0], 10, Some(&filter)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.document_id, public);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_skipped() {
        let index = InMemoryVectorIndex::new();
        let id = Uuid::new_v4();
        index
            .upsert(&meta(id, "doc", false), vec![chunk(id, 0, vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();
        let results = index.query(&[1.0, 0.0], 5, None).await.unwrap();
        assert!(results.is_empty());
    }
}
