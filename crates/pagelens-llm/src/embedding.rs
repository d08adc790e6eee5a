//! Offline Embeddings
//!
//! [`HashEmbedder`] produces deterministic vectors without a network call. It
//! uses feature hashing over lowercase alphanumeric tokens, so texts that
//! share words land close together. This is enough for tests and offline
//! development runs; it carries no semantics beyond word overlap.
//!
//! # Examples
//!
//! ```
//! use pagelens_llm::{cosine_similarity, EmbeddingModel, HashEmbedder};
//!
//! # async fn example() -> Result<(), pagelens_llm::LlmError> {
//! let model = HashEmbedder::new(256);
//! let texts = vec!["Invoice #42".to_string(), "weather report".to_string()];
//! let vectors = model.embed(&texts).await?;
//! let query = model.embed(&["invoice number".to_string()]).await?;
//!
//! assert!(cosine_similarity(&query[0], &vectors[0]) > cosine_similarity(&query[0], &vectors[1]));
//! # Ok(())
//! # }
//! ```

use crate::{EmbeddingModel, LlmError};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic feature-hashing embedder
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashEmbedder {
    /// Create an embedder producing vectors of `dimension` values
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("hash-{}", dimension),
        }
    }

    /// Length of produced vectors
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed one text
    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if text.trim().is_empty() {
            return Err(LlmError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;

        for token in tokenize(text) {
            let hash = hash_with_seed(&token, 0);
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
            tokens += 1;
        }

        // No word characters at all: spread the raw text over every slot
        if tokens == 0 {
            for (i, value) in embedding.iter_mut().enumerate() {
                let hash = hash_with_seed(text, i as u64);
                *value = ((hash as f64 / u64::MAX as f64) * 2.0 - 1.0) as f32;
            }
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingModel for HashEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        texts.iter().map(|text| self.embed_one(text)).collect()
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn hash_with_seed(text: &str, seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    seed.hash(&mut hasher);
    hasher.finish()
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in `[-1, 1]`; `0.0` when either vector has zero length.
///
/// # Panics
///
/// Panics if vectors have different lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have same length");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
