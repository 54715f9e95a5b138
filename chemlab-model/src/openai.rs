//! OpenAI-compatible chat completions client.
//!
//! Serves both OpenAI itself and Groq, whose API speaks the same
//! `/chat/completions` protocol.
//!
//! # Example
//!
//! ```rust,ignore
//! use chemlab_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let groq = OpenAIClient::new(OpenAIConfig::groq(std::env::var("GROQ_API_KEY")?))?;
//! let openai = OpenAIClient::new(OpenAIConfig::new(std::env::var("OPENAI_API_KEY")?, "gpt-4o-mini"))?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::llm::{Llm, LlmRequest};

/// OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Groq's OpenAI-compatible API base URL.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Default OpenAI chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default Groq chat model.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Provider label used in logs and errors.
    pub provider: String,
    /// Bearer token.
    pub api_key: String,
    /// Chat model name.
    pub model: String,
    /// API base URL without trailing slash.
    pub base_url: String,
}

impl OpenAIConfig {
    /// OpenAI with the given model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: "OpenAI".into(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_BASE.into(),
        }
    }

    /// Groq with `llama-3.1-8b-instant`.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self {
            provider: "Groq".into(),
            api_key: api_key.into(),
            model: DEFAULT_GROQ_MODEL.into(),
            base_url: GROQ_API_BASE.into(),
        }
    }

    /// Any other OpenAI-compatible server.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider: "OpenAI-compatible".into(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Client for `/chat/completions` on an OpenAI-compatible API.
pub struct OpenAIClient {
    client: reqwest::Client,
    config: OpenAIConfig,
}

impl OpenAIClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] if the API key is empty.
    pub fn new(mut config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::Configuration(format!("{} API key must not be empty", config.provider)));
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { client: reqwest::Client::new(), config })
    }

    /// Provider label (`OpenAI`, `Groq`, ...).
    pub fn provider(&self) -> &str {
        &self.config.provider
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl Llm for OpenAIClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: &LlmRequest) -> Result<String> {
        let provider = self.config.provider.as_str();
        debug!(provider, model = %self.config.model, prompt_len = request.user.len(), "chat completion");

        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider, error = %e, "request failed");
                ModelError::Request { provider: provider.to_string(), message: e.to_string() }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message =
                serde_json::from_str::<ErrorResponse>(&text).map(|e| e.error.message).unwrap_or(text);
            error!(provider, %status, "API error");
            return Err(ModelError::Api { provider: provider.to_string(), status: status.as_u16(), message });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| ModelError::Request {
            provider: provider.to_string(),
            message: format!("failed to parse response: {e}"),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::EmptyResponse { provider: provider.to_string() })
    }
}
