//! Configuration for chunking and retrieval.

use serde::{Deserialize, Serialize};

use crate::chunking::{Chunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, FixedSizeChunker, RecursiveChunker};
use crate::error::{RagError, Result};

/// Default number of chunks returned by a search.
pub const DEFAULT_TOP_K: usize = 3;

/// Default collection name for the knowledge base.
pub const DEFAULT_COLLECTION: &str = "rag_documents";

/// Which [`Chunker`] the knowledge base splits documents with.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Sliding window of fixed character length.
    #[default]
    Fixed,
    /// Paragraph / sentence / word aware splitting.
    Recursive,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "recursive" => Ok(Self::Recursive),
            other => Err(RagError::Config(format!("unknown chunking strategy '{other}'"))),
        }
    }
}

/// Configuration parameters for the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks returned from vector search.
    pub top_k: usize,
    /// Results scoring below this cosine similarity are dropped. `None` keeps all.
    pub similarity_threshold: Option<f32>,
    /// Chunking strategy.
    pub chunking: ChunkingStrategy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            similarity_threshold: None,
            chunking: ChunkingStrategy::Fixed,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Build the chunker this configuration describes.
    pub fn chunker(&self) -> Result<Box<dyn Chunker>> {
        Ok(match self.chunking {
            ChunkingStrategy::Fixed => Box::new(FixedSizeChunker::new(self.chunk_size, self.chunk_overlap)?),
            ChunkingStrategy::Recursive => {
                Box::new(RecursiveChunker::new(self.chunk_size, self.chunk_overlap)?)
            }
        })
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks returned from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Drop search results whose similarity is below `threshold`.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Choose the chunking strategy.
    pub fn chunking(mut self, strategy: ChunkingStrategy) -> Self {
        self.config.chunking = strategy;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
        assert_eq!((config.chunk_size, config.chunk_overlap, config.top_k), (600, 100, 3));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(RagConfig::builder().chunk_size(100).chunk_overlap(100).build().is_err());
        assert!(RagConfig::builder().top_k(0).build().is_err());
    }

    #[test]
    fn parses_chunking_strategy() {
        assert_eq!("Recursive".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Recursive);
        assert!("semantic".parse::<ChunkingStrategy>().is_err());
    }
}
