//! Document byte-source abstraction over the storage layer

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::DocumentMeta;

/// Fetches raw file bytes for a registered document.
///
/// The storage layer lives outside this crate; `file_ref` is whatever handle
/// it assigned at upload time.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, meta: &DocumentMeta) -> Result<Vec<u8>>;
}

/// Reads documents from a directory on the local filesystem
pub struct LocalDocumentSource {
    root: PathBuf,
}

impl LocalDocumentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentSource for LocalDocumentSource {
    async fn fetch(&self, meta: &DocumentMeta) -> Result<Vec<u8>> {
        let path = self.root.join(&meta.file_ref);
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::ExtractionFailed(format!("cannot read '{}': {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;
    use uuid::Uuid;

    fn meta(file_ref: &str) -> DocumentMeta {
        DocumentMeta {
            id: Uuid::new_v4(),
            title: file_ref.to_string(),
            file_ref: file_ref.to_string(),
            file_type: FileType::Txt,
            size_bytes: 0,
            is_public: false,
        }
    }

    #[tokio::test]
    async fn test_fetch_reads_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("note.txt"), b"contents").unwrap();

        let source = LocalDocumentSource::new(dir.path());
        let bytes = source.fetch(&meta("note.txt")).await.unwrap();
        assert_eq!(bytes, b"contents");
    }

    #[tokio::test]
    async fn test_missing_file_is_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalDocumentSource::new(dir.path());
        let err = source.fetch(&meta("absent.txt")).await.unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }
}
