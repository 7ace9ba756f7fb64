//! Document ingestion: raw text extraction and chunking

pub mod chunker;
pub mod extract;

pub use chunker::{ChunkSpan, TextChunker};
pub use extract::{extract_text, ExtractedText};
