//! Configuration settings for VidQuery.

use crate::error::{Result, VidQueryError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub transcript: TranscriptSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub cache: CacheSettings,
    pub rag: RagSettings,
    pub llm: LlmSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Per-request deadline in seconds (0 disables it).
    pub request_timeout_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_seconds: 120,
        }
    }
}

impl ServerSettings {
    /// The request deadline, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_seconds > 0).then(|| Duration::from_secs(self.request_timeout_seconds))
    }
}

/// Transcript retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred transcript languages, in order. First success wins.
    pub languages: Vec<String>,
    /// Timeout for requests to YouTube, in seconds.
    pub http_timeout_seconds: u64,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["hi".to_string(), "en".to_string()],
            http_timeout_seconds: 30,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible embeddings API.
    #[default]
    OpenAI,
    /// Local feature-hashing embedder (no network).
    Hashing,
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::Hashing => write!(f, "hashing"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, hashing).
    pub provider: EmbeddingProvider,
    /// Embedding model to use (openai provider).
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Retriever cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of video indexes kept in memory.
    pub capacity: usize,
    /// Optional time-to-live for an index, in seconds.
    pub ttl_seconds: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 64,
            ttl_seconds: None,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used to answer questions.
    pub model: String,
    /// Base URL of an OpenAI-compatible API (None = OpenAI).
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Timeout for a single API request, in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.7,
            timeout_seconds: 300,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(VidQueryError::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(VidQueryError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.cache.capacity == 0 {
            return Err(VidQueryError::Config("cache.capacity must be at least 1".to_string()));
        }
        if self.rag.top_k == 0 {
            return Err(VidQueryError::Config("rag.top_k must be at least 1".to_string()));
        }
        if self.embedding.dimensions == 0 {
            return Err(VidQueryError::Config("embedding.dimensions must be positive".to_string()));
        }
        if self.transcript.languages.iter().all(|l| l.trim().is_empty()) {
            return Err(VidQueryError::Config(
                "transcript.languages must name at least one language".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VidQueryError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidquery")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Read the language model API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.llm.api_key_env;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(VidQueryError::Config(format!(
                "{} is empty. Set it with: export {}='...'",
                var, var
            ))),
            Err(_) => Err(VidQueryError::Config(format!(
                "{} not set. Set it with: export {}='...'",
                var, var
            ))),
        }
    }
}
