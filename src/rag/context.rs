//! Context formatting for RAG prompts.

use crate::index::ScoredChunk;

/// Join retrieved chunk texts into the context block of a prompt.
pub fn format_context_for_prompt(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format retrieved chunks for display to the user.
pub fn format_sources_for_display(chunks: &[ScoredChunk], preview_len: usize) -> String {
    chunks
        .iter()
        .map(|c| {
            let preview: String = c.chunk.text.chars().take(preview_len).collect();
            let ellipsis = if c.chunk.char_len() > preview_len { "..." } else { "" };
            format!(
                "[chunk {} @ char {}] (score: {:.2})\n  {}{}",
                c.chunk.order + 1,
                c.chunk.char_start,
                c.score,
                preview.replace('\n', " "),
                ellipsis
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
