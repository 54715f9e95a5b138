//! Error types for the `chemlab-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, indexing or searching documents.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A document could not be read or its text could not be extracted.
    #[error("Failed to load {}: {message}", path.display())]
    Loader {
        /// The offending file or directory.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure in the persistence layer.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A persisted index snapshot could not be encoded or decoded.
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
