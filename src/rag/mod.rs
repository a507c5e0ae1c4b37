//! RAG (Retrieval-Augmented Generation) for question answering.
//!
//! Retrieves the chunks of a video's transcript most relevant to a question and
//! asks a language model to answer from them alone.

pub mod context;
mod response;

pub use context::{format_context_for_prompt, format_sources_for_display};
pub use response::{format_bullets, Answer, QuestionAnswerer};

#[cfg(test)]
pub(crate) use response::testing;
