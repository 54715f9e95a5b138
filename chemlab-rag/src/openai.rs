//! OpenAI embeddings (`POST {base_url}/embeddings`).
//!
//! Only available with the `openai` feature.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::http::{embedding_error, post_json};

const PROVIDER: &str = "OpenAI";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMENSIONS: usize = 1536;

/// An [`EmbeddingProvider`] for OpenAI or any server speaking its embeddings API.
///
/// Defaults to `text-embedding-3-small` (1536 dimensions). A whole batch is
/// sent in one request and the replies are put back in input order.
///
/// ```rust,ignore
/// use chemlab_rag::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::from_env()?.with_dimensions(512);
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    /// Sent as `dimensions` only when overridden.
    requested_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`](crate::RagError::Embedding) for an empty key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(embedding_error(PROVIDER, "API key must not be empty"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            requested_dimensions: None,
        })
    }

    /// Read the key from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) => Self::new(key),
            Err(_) => Err(embedding_error(PROVIDER, "OPENAI_API_KEY is not set")),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Ask the API for shortened vectors of `dims` length.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.requested_dimensions = Some(dims);
        self
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| embedding_error(PROVIDER, "API returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = PROVIDER, model = %self.model, batch_size = texts.len(), "embedding batch");

        let request = self.client.post(format!("{}/embeddings", self.base_url)).bearer_auth(&self.api_key);
        let body = EmbeddingsRequest { model: &self.model, input: texts, dimensions: self.requested_dimensions };
        let mut response: EmbeddingsResponse = post_json(request, PROVIDER, &body).await?;

        if response.data.len() != texts.len() {
            return Err(embedding_error(
                PROVIDER,
                format!("expected {} embeddings, got {}", texts.len(), response.data.len()),
            ));
        }
        response.data.sort_by_key(|item| item.index);
        Ok(response.data.into_iter().map(|item| item.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(OpenAIEmbeddingProvider::new(" "), Err(RagError::Embedding { .. })));
    }

    #[test]
    fn builder_overrides_apply() {
        let provider = OpenAIEmbeddingProvider::new("sk-test")
            .unwrap()
            .with_model("text-embedding-3-large")
            .with_base_url("http://localhost:9000/v1/")
            .with_dimensions(256);
        assert_eq!(provider.model, "text-embedding-3-large");
        assert_eq!(provider.base_url, "http://localhost:9000/v1");
        assert_eq!(provider.dimensions(), 256);
        assert_eq!(provider.requested_dimensions, Some(256));
    }
}
