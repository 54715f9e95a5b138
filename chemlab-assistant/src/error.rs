//! Error types for chemlab-assistant.

use chemlab_model::ModelError;
use chemlab_rag::RagError;
use thiserror::Error;

/// Errors returned by [`Assistant`](crate::Assistant).
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Retrieval failed (embedding or vector store).
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RagError),

    /// The LLM backend could not be configured or called.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The builder was missing a required component.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for [`AssistantError`].
pub type Result<T> = std::result::Result<T, AssistantError>;
