//! Embedding provider for a local Ollama server.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::http::post_json;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

const PROVIDER: &str = "Ollama";
const DEFAULT_MODEL: &str = "nomic-embed-text";
const DEFAULT_DIMENSIONS: usize = 768;

/// An [`EmbeddingProvider`] calling `POST {base_url}/api/embeddings`.
///
/// Ollama embeds one prompt per request, so batches use the sequential
/// default of [`EmbeddingProvider::embed_batch`].
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Create a provider for `nomic-embed-text` on the default endpoint.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_OLLAMA_URL.into(),
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Use a different Ollama server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a different embedding model and its output dimensionality.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }
}

impl Default for OllamaEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, model = %self.model, text_len = text.len(), "embedding text");

        let request = self.client.post(format!("{}/api/embeddings", self.base_url));
        let reply: EmbedResponse =
            post_json(request, PROVIDER, &EmbedRequest { model: &self.model, prompt: text }).await?;
        Ok(reply.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
