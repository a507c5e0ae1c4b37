//! Embedding generation for semantic search and retrieval.

mod hashing;
mod openai;

pub use hashing::HashingEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, Settings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
///
/// Implementations must be deterministic: the same input always maps to the
/// same vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder selected in the settings.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let dimensions = settings.embedding.dimensions as usize;
    Ok(match settings.embedding.provider {
        EmbeddingProvider::OpenAI => Arc::new(OpenAIEmbedder::with_client(
            crate::openai::create_client(settings)?,
            &settings.embedding.model,
            dimensions,
        )),
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(dimensions)),
    })
}
