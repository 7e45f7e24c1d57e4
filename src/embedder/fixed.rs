//! Deterministic in-process embedder used by tests and by the default
//! fully-fake dependency container (no live embedder required to run the
//! §8 end-to-end scenarios).

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::EmbedderClient;
use crate::error::EmbedderError;

/// Embeds text by hashing overlapping word shingles into a fixed-size
/// vector, then normalising. Two calls on the same text return the same
/// vector (unlike a real model, but that is consistent with §4.2's
/// idempotence requirement and makes tests exact rather than probabilistic).
#[derive(Debug, Clone)]
pub struct FixedEmbedder {
    dimensions: usize,
}

impl FixedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for FixedEmbedder {
    fn default() -> Self {
        Self::new(768)
    }
}

fn embed_one(text: &str, dimensions: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimensions];
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vector;
    }
    for window in words.windows(2.min(words.len())) {
        let mut hasher = DefaultHasher::new();
        window.hash(&mut hasher);
        let bucket = (hasher.finish() as usize) % dimensions;
        vector[bucket] += 1.0;
    }
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

#[async_trait]
impl EmbedderClient for FixedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        Ok(texts.iter().map(|t| embed_one(t, self.dimensions)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let embedder = FixedEmbedder::new(64);
        let a = embedder.embed(&["hello world".to_string()]).await.unwrap();
        let b = embedder.embed(&["hello world".to_string()]).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn vectors_have_configured_dimension() {
        let embedder = FixedEmbedder::new(64);
        let out = embedder.embed(&["some text here".to_string()]).await.unwrap();
        assert_eq!(out[0].len(), 64);
    }

    #[tokio::test]
    async fn similar_text_scores_higher_cosine_than_dissimilar() {
        let embedder = FixedEmbedder::new(256);
        let base = "the quick brown fox jumps over the lazy dog";
        let similar = "the quick brown fox jumps over a lazy dog";
        let different = "completely unrelated sentence about something else entirely";

        let vectors = embedder
            .embed(&[base.to_string(), similar.to_string(), different.to_string()])
            .await
            .unwrap();

        let cosine = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b).map(|(x, y)| x * y).sum()
        };

        assert!(cosine(&vectors[0], &vectors[1]) > cosine(&vectors[0], &vectors[2]));
    }
}
