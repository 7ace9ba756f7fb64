//! Prompt templates for grounded answer generation

use crate::index::ScoredChunk;

/// Prompt builder for question answering
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block from results ordered by descending relevance.
    ///
    /// Chunks are added until `max_chars` would be exceeded; if even the
    /// first chunk does not fit it is truncated rather than dropped so the
    /// model always sees the best match.
    pub fn build_context(results: &[ScoredChunk], max_chars: usize) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            let block = format!(
                "[{}] {} (chunk {})\n\nContent:\n{}\n\n---\n\n",
                i + 1,
                result.document_title,
                result.chunk.chunk_index,
                result.chunk.text
            );
            if context.len() + block.len() > max_chars {
                if context.is_empty() {
                    let mut cut = max_chars.min(block.len());
                    while cut > 0 && !block.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    context.push_str(&block[..cut]);
                }
                break;
            }
            context.push_str(&block);
        }

        context
    }

    /// Build the full question-answering prompt with strict grounding
    pub fn build_answer_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a document-grounded assistant that ONLY uses information from provided documents.

GROUNDING RULES - FOLLOW THESE EXACTLY:
1. ONLY use information that is EXPLICITLY stated in the CONTEXT below
2. If the answer is not in the context: respond with "This information is not available in the provided documents."
3. NEVER use external knowledge, general knowledge, or training data
4. NEVER make inferences or educated guesses beyond what is explicitly stated
5. Reference the numbered source supporting each claim, e.g. [1]
6. Do NOT paraphrase in ways that change meaning - stay close to the source text

CONTEXT FROM DOCUMENTS:
{context}

QUESTION: {question}

Provide a grounded answer using ONLY the document content above:"#,
            context = context,
            question = question
        )
    }
}
