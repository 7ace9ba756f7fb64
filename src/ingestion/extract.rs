//! Raw text extraction per file type

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Text extracted from a stored file
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Full extracted content
    pub content: String,
    /// SHA-256 of the content, recorded for change detection
    pub content_hash: String,
}

/// Extract raw text from file bytes according to the file type.
///
/// CPU-bound; callers on the async path should wrap this in
/// `spawn_blocking`.
pub fn extract_text(file_type: FileType, data: &[u8]) -> Result<ExtractedText> {
    let content = match file_type {
        FileType::Pdf => extract_pdf(data)?,
        FileType::Docx => extract_docx(data)?,
        FileType::Txt | FileType::Md => extract_plain(data)?,
    };
    let content_hash = hash_content(&content);
    Ok(ExtractedText {
        content,
        content_hash,
    })
}

fn extract_pdf(data: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| Error::ExtractionFailed(format!("pdf: {e}")))?;
    Ok(normalize_pdf_text(&text))
}

/// Replace typographic characters that PDF fonts commonly emit with ASCII
/// equivalents so chunk boundaries and term highlighting behave predictably.
fn normalize_pdf_text(text: &str) -> String {
    text.replace('\u{2010}', "-")
        .replace('\u{2011}', "-")
        .replace('\u{2013}', "-")
        .replace('\u{2014}', "--")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
}

fn extract_docx(data: &[u8]) -> Result<String> {
    let doc =
        docx_rs::read_docx(data).map_err(|e| Error::ExtractionFailed(format!("docx: {e}")))?;

    let mut content = String::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            let mut text = String::new();
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            if !text.trim().is_empty() {
                content.push_str(&text);
                content.push_str("\n\n");
            }
        }
    }
    Ok(content)
}

fn extract_plain(data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec())
        .map_err(|_| Error::ExtractionFailed("file is not valid UTF-8".into()))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let extracted = extract_text(FileType::Txt, b"hello world").unwrap();
        assert_eq!(extracted.content, "hello world");
        assert_eq!(extracted.content_hash.len(), 64);
    }

    #[test]
    fn test_markdown_read_as_plain_text() {
        let extracted = extract_text(FileType::Md, b"# Title\n\nBody text.").unwrap();
        assert_eq!(extracted.content, "# Title\n\nBody text.");
    }

    #[test]
    fn test_invalid_utf8_fails_extraction() {
        let err = extract_text(FileType::Txt, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = extract_text(FileType::Txt, b"same content").unwrap();
        let b = extract_text(FileType::Txt, b"same content").unwrap();
        let c = extract_text(FileType::Txt, b"other content").unwrap();
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash);
    }

    #[test]
    fn test_pdf_typography_normalization() {
        let normalized = normalize_pdf_text("\u{201C}quoted\u{201D} \u{2013} e\u{FB03}");
        assert!(normalized.starts_with("\"quoted\""));
        let normalized = normalize_pdf_text("don\u{2019}t \u{2026} \u{FB01}le");
        assert_eq!(normalized, "don't ... file");
    }

    #[test]
    fn test_corrupt_pdf_fails_extraction() {
        let err = extract_text(FileType::Pdf, b"not a pdf at all").unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }
}
