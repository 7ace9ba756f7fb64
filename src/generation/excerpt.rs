//! Source excerpt shaping for citations

/// Truncate to at most `max_len` bytes at a word boundary, appending an
/// ellipsis. Short text is returned unchanged.
pub fn truncate_excerpt(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    if let Some(pos) = text[..end].rfind(' ') {
        return format!("{}...", text[..pos].trim_end());
    }
    format!("{}...", &text[..end])
}

/// Wrap occurrences of each query term in `<mark>` tags, case-insensitively.
/// Terms shorter than three characters are skipped to avoid marking noise.
pub fn highlight_terms(text: &str, terms: &[&str]) -> String {
    let mut highlighted = text.to_string();
    for term in terms {
        if term.len() < 3 {
            continue;
        }
        let pattern = regex::RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build();
        if let Ok(re) = pattern {
            highlighted = re
                .replace_all(&highlighted, |caps: &regex::Captures| {
                    format!("<mark>{}</mark>", &caps[0])
                })
                .to_string();
        }
    }
    highlighted
}
