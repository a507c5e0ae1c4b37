//! In-memory vector index over the chunks of one transcript.

use crate::chunking::{Chunk, TextSplitter};
use crate::embedding::Embedder;
use crate::error::{Result, VidQueryError};
use crate::transcript::Transcript;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A chunk paired with its similarity to a query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Searchable embeddings for one video.
pub struct VectorIndex {
    video_id: String,
    entries: Vec<IndexedChunk>,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("video_id", &self.video_id)
            .field("chunks", &self.entries.len())
            .field("dimensions", &self.embedder.dimensions())
            .finish()
    }
}

impl VectorIndex {
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chunks in their original order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Embed the query and return the `k` most similar chunks.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed(query).await?;
        Ok(self.search_by_embedding(&query_embedding, k))
    }

    /// Return the `k` chunks most similar to an embedding.
    ///
    /// Results are ordered by descending score; equal scores keep chunk order.
    pub fn search_by_embedding(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        // Stable sort keeps chunk order for ties.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);
        results
    }
}

/// Builds vector indexes from transcripts.
pub struct Indexer {
    splitter: TextSplitter,
    embedder: Arc<dyn Embedder>,
}

impl Indexer {
    pub fn new(splitter: TextSplitter, embedder: Arc<dyn Embedder>) -> Self {
        Self { splitter, embedder }
    }

    /// Split a transcript and index its chunks.
    #[instrument(skip(self, transcript), fields(video_id = %transcript.video_id))]
    pub async fn index_transcript(&self, transcript: &Transcript) -> Result<VectorIndex> {
        let chunks = self.splitter.split(&transcript.text);
        debug!("Split transcript into {} chunks", chunks.len());
        self.build(&transcript.video_id, chunks).await
    }

    /// Embed chunks into a new index.
    pub async fn build(&self, video_id: &str, chunks: Vec<Chunk>) -> Result<VectorIndex> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(VidQueryError::Index(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = self.embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(VidQueryError::Index(format!(
                "expected {}-dimensional embeddings, got {}",
                dimensions,
                bad.len()
            )));
        }

        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        info!("Indexed {} chunks for {}", entries.len(), video_id);

        Ok(VectorIndex {
            video_id: video_id.to_string(),
            entries,
            embedder: self.embedder.clone(),
        })
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
