//! docqa: document ingestion and retrieval core for RAG question answering
//!
//! Uploaded documents (PDF/DOCX/TXT/MD) are extracted, chunked, embedded, and
//! stored in a vector index; questions are answered by retrieving the most
//! similar chunks and conditioning a language-model completion on them, with
//! ranked source citations and a confidence score.
//!
//! Web concerns (auth, routing, upload transport, user and document metadata
//! persistence) live outside this crate. Callers register a
//! [`types::DocumentMeta`], trigger [`pipeline::IngestionPipeline::process`],
//! and submit questions through [`retrieval::AnswerSynthesizer::answer`].
//! [`context::RagContext`] wires the pieces together from configuration.

pub mod config;
pub mod context;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use config::RagConfig;
pub use context::RagContext;
pub use error::{Error, Result};
pub use types::{
    AnswerResult, Chunk, DocumentMeta, DocumentStatus, FileType, ProcessingStatus, Source,
};
