//! VidQuery - Question answering over YouTube transcripts
//!
//! Fetches a video's transcript, indexes it for similarity search, and answers
//! questions with a language model grounded in the most relevant passages.
//!
//! # Overview
//!
//! VidQuery allows you to:
//! - Fetch transcripts in an ordered list of preferred languages
//! - Ask questions about a video and get bulleted answers
//! - Serve the same pipeline over HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `transcript` - Transcript sources and language fallback
//! - `chunking` - Overlapping fixed-size text splitting
//! - `embedding` - Embedding generation
//! - `index` - In-memory vector index per video
//! - `cache` - Per-video index cache with LRU eviction
//! - `llm` - Language model access
//! - `rag` - Grounded answer generation
//! - `deadline` - Per-request time budgets
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use vidquery::config::Settings;
//! use vidquery::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let answer = orchestrator
//!         .ask("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "What is the song about?")
//!         .await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod deadline;
pub mod embedding;
pub mod error;
pub mod index;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod transcript;

pub use error::{Result, VidQueryError};
