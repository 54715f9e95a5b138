//! Error types for chemlab-model.

use thiserror::Error;

/// Errors raised while selecting or calling an LLM backend.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No usable backend could be configured (e.g. no API key present).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The HTTP request to the provider failed.
    #[error("Request to {provider} failed: {message}")]
    Request {
        /// Provider name.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("{provider} API returned {status}: {message}")]
    Api {
        /// Provider name.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Error detail from the response body.
        message: String,
    },

    /// The provider answered successfully but without any generated text.
    #[error("{provider} returned no content")]
    EmptyResponse {
        /// Provider name.
        provider: String,
    },
}

/// Result type alias for [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;
