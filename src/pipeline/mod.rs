//! Ingestion pipeline: extract, chunk, embed, and index documents

pub mod registry;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::ingestion::{extract_text, TextChunker};
use crate::providers::{DocumentSource, EmbeddingProvider};
use crate::types::{Chunk, DocumentMeta};

pub use registry::{DocumentRegistry, ProgressEvent};

/// Outcome of a processing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// All chunks embedded and indexed
    Completed { chunk_count: usize },
    /// The document was deleted while the run was in flight; nothing remains
    /// queryable
    Cancelled,
}

/// Orchestrates per-document processing runs.
///
/// Runs for different documents proceed in parallel up to a worker-pool
/// limit; a second run for the same document is rejected up front.
pub struct IngestionPipeline {
    config: RagConfig,
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    registry: Arc<DocumentRegistry>,
    permits: Arc<Semaphore>,
}

impl IngestionPipeline {
    pub fn new(
        config: RagConfig,
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        registry: Arc<DocumentRegistry>,
    ) -> Self {
        let parallel = config.processing.effective_parallel_documents();
        Self {
            config,
            source,
            embedder,
            index,
            registry,
            permits: Arc::new(Semaphore::new(parallel)),
        }
    }

    pub fn registry(&self) -> &Arc<DocumentRegistry> {
        &self.registry
    }

    /// Process a registered document end to end
    pub async fn process(&self, document_id: Uuid) -> Result<ProcessOutcome> {
        let meta = self.registry.begin_processing(&document_id)?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Internal(format!("worker pool closed: {e}")))?;

        tracing::info!(document = %document_id, title = %meta.title, "processing started");

        match self.run(&meta).await {
            Ok(ProcessOutcome::Completed { chunk_count }) => {
                tracing::info!(document = %document_id, chunks = chunk_count, "processing completed");
                Ok(ProcessOutcome::Completed { chunk_count })
            }
            Ok(ProcessOutcome::Cancelled) => {
                tracing::info!(document = %document_id, "processing cancelled by deletion");
                Ok(ProcessOutcome::Cancelled)
            }
            Err(e) => {
                tracing::error!(document = %document_id, error = %e, "processing failed");
                self.registry.mark_failed(&document_id, &e.to_string());
                Err(e)
            }
        }
    }

    /// Reprocess a document, replacing any previously indexed chunks
    pub async fn reprocess(&self, document_id: Uuid) -> Result<ProcessOutcome> {
        self.registry.reset(&document_id)?;
        let removed = self.index.delete(&document_id).await?;
        if removed > 0 {
            tracing::info!(document = %document_id, removed, "removed stale chunks before reprocessing");
        }
        self.process(document_id).await
    }

    /// Delete a document: tombstone the record and purge its chunks.
    /// Safe to call while a processing run is in flight.
    pub async fn delete_document(&self, document_id: Uuid) -> Result<usize> {
        self.registry.mark_deleted(&document_id);
        let removed = self.index.delete(&document_id).await?;
        self.registry.remove(&document_id);
        tracing::info!(document = %document_id, removed, "document deleted");
        Ok(removed)
    }

    async fn run(&self, meta: &DocumentMeta) -> Result<ProcessOutcome> {
        let document_id = meta.id;

        let bytes = self.source.fetch(meta).await?;
        let file_type = meta.file_type;
        let extracted = tokio::task::spawn_blocking(move || extract_text(file_type, &bytes))
            .await
            .map_err(|e| Error::Internal(format!("extraction task: {e}")))??;
        self.registry.set_progress(&document_id, 5);

        let chunker = TextChunker::new(
            self.config.chunking.chunk_size,
            self.config.chunking.chunk_overlap,
        );
        let spans = chunker.chunk(&extracted.content);
        if spans.is_empty() {
            return Err(Error::NoContentExtracted);
        }

        let mut chunks: Vec<Chunk> = spans
            .into_iter()
            .enumerate()
            .map(|(i, span)| Chunk::new(document_id, i as u32, span.text, span.start, span.end))
            .collect();
        let total = chunks.len();
        tracing::debug!(document = %document_id, chunks = total, "chunking finished");

        // Embed in batches, advancing progress after each.
        let batch_size = self.config.embeddings.batch_size;
        let mut embedded = 0usize;
        for batch in chunks.chunks_mut(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embed_with_retry(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(Error::EmbeddingFailed(format!(
                    "backend returned {} embeddings for {} inputs",
                    embeddings.len(),
                    batch.len()
                )));
            }
            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
            embedded += batch.len();
            let progress = 5 + (embedded * 94 / total) as u8;
            self.registry.set_progress(&document_id, progress);
        }

        // A deletion that raced the run wins: leave nothing queryable behind.
        if self.registry.is_deleted(&document_id) {
            self.index.delete(&document_id).await?;
            return Ok(ProcessOutcome::Cancelled);
        }

        self.index.upsert(meta, chunks).await?;

        if self.registry.is_deleted(&document_id) {
            self.index.delete(&document_id).await?;
            return Ok(ProcessOutcome::Cancelled);
        }

        self.registry
            .mark_completed(&document_id, total as u32, extracted.content_hash);
        Ok(ProcessOutcome::Completed { chunk_count: total })
    }

    /// Embed one batch, retrying transient backend failures with backoff
    async fn embed_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let cfg = &self.config.embeddings;
        let call_timeout = Duration::from_secs(cfg.timeout_secs);
        let mut attempt = 0u32;
        loop {
            let result = match timeout(call_timeout, self.embedder.embed_batch(texts)).await {
                Ok(inner) => inner,
                Err(_) => Err(Error::BackendUnavailable(format!(
                    "embedding call exceeded {}s",
                    cfg.timeout_secs
                ))),
            };
            match result {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) if e.is_retryable() && attempt < cfg.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(cfg.retry_backoff_ms << attempt.min(6));
                    tracing::warn!(error = %e, attempt, ?backoff, "embedding batch failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagConfig;
    use crate::index::InMemoryVectorIndex;
    use crate::types::{FileType, ProcessingStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        content: Vec<u8>,
    }

    #[async_trait]
    impl DocumentSource for StaticSource {
        async fn fetch(&self, _meta: &DocumentMeta) -> Result<Vec<u8>> {
            Ok(self.content.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl DocumentSource for FailingSource {
        async fn fetch(&self, _meta: &DocumentMeta) -> Result<Vec<u8>> {
            Err(Error::ExtractionFailed("file unreadable".into()))
        }
    }

    /// Deterministic embedder: fails the first `failures` batch calls with a
    /// retryable error, optionally delays, and counts every batch call.
    struct MockEmbedder {
        batch_calls: AtomicUsize,
        failures: AtomicUsize,
        delay: Duration,
    }

    impl MockEmbedder {
        fn new() -> Self {
            Self {
                batch_calls: AtomicUsize::new(0),
                failures: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn failing_first(failures: usize) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                ..Self::new()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }

        fn embedding_for(text: &str) -> Vec<f32> {
            let sum = text.bytes().map(|b| b as f32).sum::<f32>();
            vec![1.0, text.len() as f32, sum % 97.0, 0.5]
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(Self::embedding_for(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(Error::BackendUnavailable("mock outage".into()));
            }
            Ok(texts.iter().map(|t| Self::embedding_for(t)).collect())
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn test_config() -> RagConfig {
        let mut config = RagConfig::default();
        config.chunking.chunk_size = 60;
        config.chunking.chunk_overlap = 10;
        config.embeddings.batch_size = 2;
        config.embeddings.max_retries = 2;
        config.embeddings.retry_backoff_ms = 1;
        config.embeddings.timeout_secs = 5;
        config
    }

    fn build(
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> (Arc<IngestionPipeline>, Arc<InMemoryVectorIndex>, Arc<DocumentRegistry>) {
        let index = Arc::new(InMemoryVectorIndex::new());
        let registry = Arc::new(DocumentRegistry::new());
        let pipeline = Arc::new(IngestionPipeline::new(
            test_config(),
            source,
            embedder,
            index.clone(),
            registry.clone(),
        ));
        (pipeline, index, registry)
    }

    fn register(registry: &DocumentRegistry) -> Uuid {
        let id = Uuid::new_v4();
        registry.register(DocumentMeta {
            id,
            title: "handbook".to_string(),
            file_ref: "handbook.txt".to_string(),
            file_type: FileType::Txt,
            size_bytes: 100,
            is_public: false,
        });
        id
    }

    fn sample_text() -> Vec<u8> {
        b"Employees accrue leave monthly. Requests go to the manager. \
          Unused days carry over once. Sick leave needs a note. \
          Remote work requires approval in advance."
            .to_vec()
    }

    #[tokio::test]
    async fn test_process_completes_and_indexes() {
        let (pipeline, index, registry) = build(
            Arc::new(StaticSource { content: sample_text() }),
            Arc::new(MockEmbedder::new()),
        );
        let id = register(&registry);

        let outcome = pipeline.process(id).await.unwrap();
        let ProcessOutcome::Completed { chunk_count } = outcome else {
            panic!("expected completion");
        };
        assert!(chunk_count > 0);

        let status = registry.status(&id).unwrap();
        assert_eq!(status.status, ProcessingStatus::Completed);
        assert_eq!(status.progress, 100);
        assert_eq!(status.chunk_count as usize, chunk_count);
        assert!(status.content_hash.is_some());
        assert_eq!(index.len().await.unwrap(), chunk_count);
    }

    #[tokio::test]
    async fn test_extraction_failure_marks_failed() {
        let (pipeline, index, registry) =
            build(Arc::new(FailingSource), Arc::new(MockEmbedder::new()));
        let id = register(&registry);

        let err = pipeline.process(id).await.unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));

        let status = registry.status(&id).unwrap();
        assert_eq!(status.status, ProcessingStatus::Failed);
        assert_eq!(status.chunk_count, 0);
        assert!(status.error.is_some());
        assert_eq!(index.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_document_has_no_content() {
        let (pipeline, _index, registry) = build(
            Arc::new(StaticSource { content: b"   \n\n \t ".to_vec() }),
            Arc::new(MockEmbedder::new()),
        );
        let id = register(&registry);

        let err = pipeline.process(id).await.unwrap_err();
        assert!(matches!(err, Error::NoContentExtracted));
        assert_eq!(registry.status(&id).unwrap().status, ProcessingStatus::Failed);
    }

    #[tokio::test]
    async fn test_concurrent_process_admits_exactly_one() {
        let (pipeline, _index, registry) = build(
            Arc::new(StaticSource { content: sample_text() }),
            Arc::new(MockEmbedder::slow(Duration::from_millis(200))),
        );
        let id = register(&registry);

        let first = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.process(id).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = pipeline.process(id).await;
        assert!(matches!(second, Err(Error::AlreadyInProgress(_))));

        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, ProcessOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_reprocess_leaves_no_stale_chunks() {
        let (pipeline, index, registry) = build(
            Arc::new(StaticSource { content: sample_text() }),
            Arc::new(MockEmbedder::new()),
        );
        let id = register(&registry);

        let ProcessOutcome::Completed { chunk_count } = pipeline.process(id).await.unwrap() else {
            panic!("expected completion");
        };
        let ProcessOutcome::Completed { chunk_count: again } =
            pipeline.reprocess(id).await.unwrap()
        else {
            panic!("expected completion");
        };

        assert_eq!(chunk_count, again);
        assert_eq!(index.len().await.unwrap(), chunk_count);
        assert_eq!(registry.status(&id).unwrap().status, ProcessingStatus::Completed);
    }

    #[tokio::test]
    async fn test_reprocess_while_running_is_rejected() {
        let (pipeline, _index, registry) = build(
            Arc::new(StaticSource { content: sample_text() }),
            Arc::new(MockEmbedder::slow(Duration::from_millis(200))),
        );
        let id = register(&registry);

        let first = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.process(id).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(matches!(
            pipeline.reprocess(id).await,
            Err(Error::AlreadyInProgress(_))
        ));
        first.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_delete_during_processing_cancels_run() {
        let (pipeline, index, registry) = build(
            Arc::new(StaticSource { content: sample_text() }),
            Arc::new(MockEmbedder::slow(Duration::from_millis(200))),
        );
        let id = register(&registry);

        let run = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.process(id).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        pipeline.delete_document(id).await.unwrap();

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome, ProcessOutcome::Cancelled);
        assert_eq!(index.len().await.unwrap(), 0);
        assert!(registry.status(&id).is_none());
    }

    #[tokio::test]
    async fn test_transient_embedding_failure_is_retried() {
        let embedder = Arc::new(MockEmbedder::failing_first(1));
        let (pipeline, _index, registry) = build(
            Arc::new(StaticSource { content: b"Short note about onboarding.".to_vec() }),
            embedder.clone(),
        );
        let id = register(&registry);

        let outcome = pipeline.process(id).await.unwrap();
        assert!(matches!(outcome, ProcessOutcome::Completed { .. }));
        // One failed attempt plus the successful retry.
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_the_document() {
        let embedder = Arc::new(MockEmbedder::failing_first(10));
        let (pipeline, index, registry) = build(
            Arc::new(StaticSource { content: b"Short note about onboarding.".to_vec() }),
            embedder.clone(),
        );
        let id = register(&registry);

        let err = pipeline.process(id).await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(_)));
        assert_eq!(registry.status(&id).unwrap().status, ProcessingStatus::Failed);
        assert_eq!(index.len().await.unwrap(), 0);
        // Initial attempt plus max_retries.
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_progress_is_monotone_during_run() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let registry = Arc::new(DocumentRegistry::with_events(tx));
        let index = Arc::new(InMemoryVectorIndex::new());
        let pipeline = IngestionPipeline::new(
            test_config(),
            Arc::new(StaticSource { content: sample_text() }),
            Arc::new(MockEmbedder::new()),
            index,
            registry.clone(),
        );
        let id = register(&registry);

        pipeline.process(id).await.unwrap();

        let mut previous = 0u8;
        let mut completed = false;
        while let Ok(event) = rx.try_recv() {
            assert!(event.progress >= previous || event.status == ProcessingStatus::Processing && event.progress == 0);
            if event.status == ProcessingStatus::Completed {
                assert_eq!(event.progress, 100);
                completed = true;
            } else {
                assert!(event.progress <= 99);
            }
            previous = event.progress;
        }
        assert!(completed);
    }
}
