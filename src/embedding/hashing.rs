//! Local feature-hashing embedder.
//!
//! Maps lowercase word unigrams and bigrams into a fixed number of buckets with
//! FNV-1a and L2-normalizes the result. Needs no model download or network, so
//! it serves offline deployments and tests.

use super::Embedder;
use crate::error::{Result, VidQueryError};
use async_trait::async_trait;
use tracing::{debug, instrument};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embed synchronously. Used on the blocking pool.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let words = tokenize(text);

        for word in &words {
            self.add_feature(&mut vector, word.as_bytes(), 1.0);
        }
        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut vector, bigram.as_bytes(), 0.5);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimensions as u64) as usize;
        // The top bit picks the sign so collisions tend to cancel out.
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embedder = self.clone();
        let texts = texts.to_vec();
        let embeddings = tokio::task::spawn_blocking(move || {
            texts.iter().map(|t| embedder.embed_sync(t)).collect::<Vec<_>>()
        })
        .await
        .map_err(|e| VidQueryError::Embedding(format!("Embedding worker failed: {}", e)))?;

        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::cosine_similarity;

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_sync("The quick brown fox");
        let b = embedder.embed_sync("the QUICK brown fox!");

        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::default();
        assert!(embedder.embed_sync("  ...  ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_related_texts_score_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed_sync("how do rockets reach orbit");
        let related = embedder.embed_sync("rockets burn fuel to reach orbit around the earth");
        let unrelated = embedder.embed_sync("a recipe for banana bread with walnuts");

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = HashingEmbedder::new(128);
        let texts = vec!["first text".to_string(), "second text".to_string()];

        let batch = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("first text").await.unwrap());
        assert_eq!(batch[1], embedder.embed("second text").await.unwrap());
    }
}
