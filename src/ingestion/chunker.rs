//! Text chunking with exact offset tracking

use unicode_segmentation::UnicodeSegmentation;

/// A chunk of source text with its byte offsets
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSpan {
    /// Untrimmed slice of the source text
    pub text: String,
    /// Byte offset of the span start in the source text
    pub start: usize,
    /// Byte offset one past the span end
    pub end: usize,
}

/// Splits text into overlapping, bounded-size segments.
///
/// Splitting prefers natural boundaries (sentence ends, paragraph breaks) in
/// the second half of the size window and falls back to a hard cut when a
/// single unit exceeds the maximum. Adjacent spans share `overlap` characters
/// and together cover the whole input; spans that are pure whitespace are
/// dropped after coverage is established.
pub struct TextChunker {
    max_chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(max_chunk_size: usize, overlap: usize) -> Self {
        assert!(max_chunk_size > 0, "max_chunk_size must be positive");
        assert!(overlap < max_chunk_size, "overlap must be smaller than max_chunk_size");
        Self {
            max_chunk_size,
            overlap,
        }
    }

    /// Chunk `text` into spans
    pub fn chunk(&self, text: &str) -> Vec<ChunkSpan> {
        let len = text.len();
        let mut spans = Vec::new();
        let mut start = 0usize;

        while start < len {
            let end = self.span_end(text, start);
            let slice = &text[start..end];
            if !slice.trim().is_empty() {
                spans.push(ChunkSpan {
                    text: slice.to_string(),
                    start,
                    end,
                });
            }
            if end >= len {
                break;
            }

            let mut next = end.saturating_sub(self.overlap);
            while next > start && !text.is_char_boundary(next) {
                next -= 1;
            }
            // A short natural break combined with a large overlap must not
            // stall the walk.
            if next <= start {
                next = end;
            }
            start = next;
        }
        spans
    }

    /// End offset for a span starting at `start`: the hard size limit, pulled
    /// back to the last natural boundary in the second half of the window.
    fn span_end(&self, text: &str, start: usize) -> usize {
        let len = text.len();
        if start + self.max_chunk_size >= len {
            return len;
        }

        let mut hard = start + self.max_chunk_size;
        while hard > start && !text.is_char_boundary(hard) {
            hard -= 1;
        }
        // A character wider than the size limit: take it whole so the span
        // always advances.
        if hard == start {
            hard = start + 1;
            while hard < len && !text.is_char_boundary(hard) {
                hard += 1;
            }
        }

        let window = &text[start..hard];
        let mut best = 0usize;
        for (offset, _) in window.split_sentence_bound_indices() {
            if offset > window.len() / 2 {
                best = best.max(offset);
            }
        }
        if best == 0 {
            if let Some(pos) = window.rfind("\n\n") {
                if pos > window.len() / 2 {
                    best = pos + 2;
                }
            }
        }

        if best > 0 {
            start + best
        } else {
            hard
        }
    }
}
