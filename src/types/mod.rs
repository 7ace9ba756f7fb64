//! Core data types

pub mod document;
pub mod response;

pub use document::{Chunk, DocumentMeta, DocumentStatus, FileType, ProcessingStatus};
pub use response::{AnswerResult, Source};
