//! Error types for the ingestion and retrieval core

use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raw text could not be obtained from the stored file
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// Extraction succeeded but produced no chunkable text
    #[error("no content extracted from document")]
    NoContentExtracted,

    /// Embedding backend could not be reached
    #[error("embedding backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Embedding backend rejected the input
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    /// A processing run is already active for this document
    #[error("document {0} is already being processed")]
    AlreadyInProgress(Uuid),

    /// Document id is not registered (or has been deleted)
    #[error("document {0} not found")]
    DocumentNotFound(Uuid),

    /// Question was empty after trimming
    #[error("question must not be empty")]
    InvalidQuestion,

    /// Language-model backend failed during answer synthesis
    #[error("answer generation failed: {0}")]
    GenerationFailed(String),

    /// Vector index operation failed
    #[error("vector index error: {0}")]
    Index(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Transient backend errors eligible for automatic retry inside the
    /// ingestion pipeline. Nothing on the question-answering path retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::BackendUnavailable(_) | Error::EmbeddingFailed(_)
        )
    }
}
