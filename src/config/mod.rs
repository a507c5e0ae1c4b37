//! Configuration module for VidQuery.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    CacheSettings, ChunkingSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings,
    LlmSettings, PromptSettings, RagSettings, ServerSettings, Settings, TranscriptSettings,
};
