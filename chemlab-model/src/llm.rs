//! The LLM capability consumed by the assistant.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A two-message prompt: a system instruction and a user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// System instruction.
    pub system: String,
    /// User turn.
    pub user: String,
    /// Sampling temperature; provider default when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Create a request with the provider's default temperature.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self { system: system.into(), user: user.into(), temperature: None }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A hosted (or mocked) language model that turns a prompt into text.
///
/// Calls are synchronous from the caller's point of view: the returned future
/// resolves once the full completion is available. Implementations do not
/// retry.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Model identifier, e.g. `llama-3.1-8b-instant`.
    fn name(&self) -> &str;

    /// Generate a completion for `request`.
    async fn generate(&self, request: &LlmRequest) -> Result<String>;
}
