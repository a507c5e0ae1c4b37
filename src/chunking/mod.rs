//! Content chunking for breaking transcripts into searchable segments.
//!
//! Transcripts are split into overlapping, bounded windows of text that end on
//! natural boundaries where possible.

mod splitter;

pub use splitter::TextSplitter;

use serde::{Deserialize, Serialize};

/// A contiguous slice of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Position of this chunk in the sequence.
    pub order: usize,
    /// Offset of the first character in the source text, in characters.
    pub char_start: usize,
}

impl Chunk {
    pub fn new(text: String, order: usize, char_start: usize) -> Self {
        Self {
            text,
            order,
            char_start,
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}
