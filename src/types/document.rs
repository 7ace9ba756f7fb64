//! Document, chunk, and processing-state types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// Markdown file (read as plain text)
    Md,
}

impl FileType {
    /// Detect file type from an extension; `None` for unsupported formats
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" => Some(Self::Txt),
            "md" | "markdown" => Some(Self::Md),
            _ => None,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Txt => "Text File",
            Self::Md => "Markdown",
        }
    }
}

/// Processing state of a registered document.
///
/// Transitions: `Pending -> Processing -> Completed`, or
/// `Processing -> Failed`; `Failed -> Processing` only via an explicit
/// reprocess request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Metadata handed over by the storage layer when a document is registered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Unique document id, assigned by the storage layer
    pub id: Uuid,
    /// Title shown in citations
    pub title: String,
    /// Path or handle understood by the configured document source
    pub file_ref: String,
    /// File type
    pub file_type: FileType,
    /// File size in bytes
    pub size_bytes: u64,
    /// Visibility flag, forwarded to the index for query filtering
    #[serde(default)]
    pub is_public: bool,
}

/// Snapshot of a document's processing record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub id: Uuid,
    pub status: ProcessingStatus,
    /// 0-100; stays below 100 until the run completes
    pub progress: u8,
    /// Number of persisted chunks; 0 unless completed
    pub chunk_count: u32,
    /// Failure message when status is `Failed`
    pub error: Option<String>,
    /// SHA-256 of the extracted text from the last completed run
    pub content_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// A bounded segment of extracted document text, the retrieval unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk id
    pub id: Uuid,
    /// Owning document
    pub document_id: Uuid,
    /// 0-based, contiguous within the owning document
    pub chunk_index: u32,
    /// Raw chunk text
    pub text: String,
    /// Byte offset of the chunk start in the extracted text, for citations
    pub byte_start: usize,
    /// Byte offset one past the chunk end
    pub byte_end: usize,
    /// Embedding vector; filled in by the pipeline before indexing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a chunk without an embedding
    pub fn new(
        document_id: Uuid,
        chunk_index: u32,
        text: String,
        byte_start: usize,
        byte_end: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            chunk_index,
            text,
            byte_start,
            byte_end,
            embedding: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_extension("pdf"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("DOCX"), Some(FileType::Docx));
        assert_eq!(FileType::from_extension("markdown"), Some(FileType::Md));
        assert_eq!(FileType::from_extension("xlsx"), None);
        assert_eq!(FileType::from_extension(""), None);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProcessingStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(serde_json::to_string(&FileType::Pdf).unwrap(), "\"pdf\"");
    }

    #[test]
    fn test_chunk_embedding_is_omitted_when_empty() {
        let chunk = Chunk::new(Uuid::new_v4(), 0, "text".into(), 0, 4);
        let json = serde_json::to_value(&chunk).unwrap();
        assert!(json.get("embedding").is_none());
        assert_eq!(json["chunk_index"], 0);
        assert_eq!(json["byte_start"], 0);
        assert_eq!(json["byte_end"], 4);
    }
}
