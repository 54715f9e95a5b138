//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::llm::{Llm, LlmRequest};

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const PROVIDER: &str = "Gemini";

/// Client for the Gemini REST API.
///
/// ```rust,ignore
/// use chemlab_model::GeminiClient;
///
/// let model = GeminiClient::new(std::env::var("GOOGLE_API_KEY")?, "gemini-2.0-flash")?;
/// ```
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for `model`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Configuration`] if the API key is empty.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ModelError::Configuration("Gemini API key must not be empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: GEMINI_API_BASE.into(),
        })
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
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
impl Llm for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &LlmRequest) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = request.user.len(), "generate content");

        let body = GenerateRequest {
            system_instruction: Content { role: None, parts: [Part { text: &request.system }] },
            contents: [Content { role: Some("user"), parts: [Part { text: &request.user }] }],
            generation_config: request.temperature.map(|temperature| GenerationConfig { temperature }),
        };

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                ModelError::Request { provider: PROVIDER.into(), message: e.to_string() }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message =
                serde_json::from_str::<ErrorResponse>(&text).map(|e| e.error.message).unwrap_or(text);
            error!(provider = PROVIDER, %status, "API error");
            return Err(ModelError::Api { provider: PROVIDER.into(), status: status.as_u16(), message });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| ModelError::Request {
            provider: PROVIDER.into(),
            message: format!("failed to parse response: {e}"),
        })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ModelError::EmptyResponse { provider: PROVIDER.into() });
        }
        Ok(text)
    }
}
