//! Vector store trait for storing and searching vector embeddings.

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for vector embeddings with similarity search.
///
/// Collections hold [`Chunk`]s in insertion order. Adding a chunk whose ID is
/// already present appends a second entry; stores never de-duplicate.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name used in logs and errors.
    fn backend(&self) -> &str;

    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Append chunks to a collection. Chunks must have embeddings set.
    async fn add(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score. An empty
    /// collection yields an empty `Vec`.
    async fn search(&self, collection: &str, embedding: &[f32], top_k: usize)
    -> Result<Vec<SearchResult>>;

    /// Number of chunks stored in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Exhaustive nearest-neighbour scan. Ties keep insertion order.
pub(crate) fn rank<'a>(
    chunks: impl Iterator<Item = &'a Chunk>,
    embedding: &[f32],
    top_k: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = chunks
        .map(|chunk| SearchResult {
            chunk: chunk.clone(),
            score: cosine_similarity(&chunk.embedding, embedding),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}
