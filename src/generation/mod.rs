//! Answer generation support: prompt assembly and source excerpts

pub mod excerpt;
pub mod prompt;

pub use excerpt::{highlight_terms, truncate_excerpt};
pub use prompt::PromptBuilder;
