//! Local feature-hashing embedder.
//!
//! Maps lower-cased alphanumeric tokens and adjacent-token bigrams into a
//! fixed number of signed buckets and L2-normalises the result. Texts that
//! share vocabulary get a positive cosine similarity; identical texts get
//! exactly 1.0. No model download or network access is involved.
//!
//! Similarity is purely lexical: `"Zn + HCl"` and `"zinc and hydrochloric
//! acid"` share no tokens and score 0. Use it for tests and offline runs; the
//! server defaults to the MiniLM model in the `onnx` module when built with the
//! `onnx` feature.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Default dimensionality, matching common sentence-embedding models.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// A deterministic, offline [`EmbeddingProvider`].
///
/// ```rust
/// use chemlab_rag::HashingEmbeddingProvider;
///
/// let provider = HashingEmbeddingProvider::new(64).unwrap();
/// let v = provider.embed_text("Zn + HCl");
/// assert_eq!(v.len(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing vectors of `dimensions` length.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::Config("embedding dimensions must be greater than zero".into()));
        }
        Ok(Self { dimensions })
    }

    /// Synchronously embed a text.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut embedding = vec![0.0f32; self.dimensions];

        for token in &tokens {
            self.accumulate(&mut embedding, token.as_bytes(), 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut embedding, bigram.as_bytes(), 0.5);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        embedding
    }

    fn accumulate(&self, embedding: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: DEFAULT_DIMENSIONS }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
        (acc ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    fn name(&self) -> &str {
        "Hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(HashingEmbeddingProvider::new(0).is_err());
    }

    #[test]
    fn identical_texts_have_unit_similarity() {
        let provider = HashingEmbeddingProvider::default();
        let a = provider.embed_text("Zn + HCl -> ZnCl2 + H2");
        let b = provider.embed_text("Zn + HCl -> ZnCl2 + H2");
        assert_eq!(a, b);
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn tokenization_ignores_case_and_punctuation() {
        assert_eq!(tokenize("Zn + HCl -> ZnCl2"), ["zn", "hcl", "zncl2"]);
    }

    #[test]
    fn shared_vocabulary_scores_higher_than_unrelated_text() {
        let provider = HashingEmbeddingProvider::default();
        let query = provider.embed_text("Zn + HCl");
        let related = provider.embed_text("Zn + HCl -> ZnCl2 + H2");
        let unrelated = provider.embed_text("Photosynthesis converts light into sugar");
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn text_without_tokens_embeds_to_zero_vector() {
        let provider = HashingEmbeddingProvider::new(8).unwrap();
        assert!(provider.embed_text(" -> + ").iter().all(|x| *x == 0.0));
    }
}
