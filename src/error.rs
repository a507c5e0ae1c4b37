//! Error types for VidQuery.

use thiserror::Error;

/// Library-level error type for VidQuery operations.
#[derive(Error, Debug)]
pub enum VidQueryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("No transcript found for video {video_id} in any of the requested languages ({})", .languages.join(", "))]
    NoTranscriptFound {
        video_id: String,
        languages: Vec<String>,
    },

    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("Error fetching transcript: {0}")]
    Transcript(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Language model error: {0}")]
    LanguageModel(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Timed out during {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// How an error is surfaced to callers at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The requested transcript does not exist or is disabled.
    NotFound,
    /// The request itself was malformed.
    InvalidInput,
    /// Anything else.
    Internal,
}

impl VidQueryError {
    /// Classify this error for the request boundary.
    pub fn class(&self) -> ErrorClass {
        match self {
            VidQueryError::TranscriptsDisabled(_) | VidQueryError::NoTranscriptFound { .. } => {
                ErrorClass::NotFound
            }
            VidQueryError::InvalidInput(_) => ErrorClass::InvalidInput,
            _ => ErrorClass::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }
}

/// Result type alias for VidQuery operations.
pub type Result<T> = std::result::Result<T, VidQueryError>;
