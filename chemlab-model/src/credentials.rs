//! Backend selection from API-key credentials.
//!
//! Keys are looked up in a fixed priority order: `GROQ_API_KEY`, then
//! `OPENAI_API_KEY`, then `GOOGLE_API_KEY`. The first non-empty one wins.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::error::{ModelError, Result};
use crate::gemini::{DEFAULT_GEMINI_MODEL, GeminiClient};
use crate::llm::Llm;
use crate::openai::{DEFAULT_GROQ_MODEL, DEFAULT_OPENAI_MODEL, OpenAIClient, OpenAIConfig};

/// A hosted LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    OpenAI,
    Gemini,
}

impl Provider {
    /// Providers in resolution priority order.
    pub const PRIORITY: [Provider; 3] = [Provider::Groq, Provider::OpenAI, Provider::Gemini];

    /// Environment variable holding this provider's API key.
    pub fn env_var(self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Gemini => "GOOGLE_API_KEY",
        }
    }

    /// Default chat model for this provider.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Groq => DEFAULT_GROQ_MODEL,
            Provider::OpenAI => DEFAULT_OPENAI_MODEL,
            Provider::Gemini => DEFAULT_GEMINI_MODEL,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Groq => "Groq",
            Provider::OpenAI => "OpenAI",
            Provider::Gemini => "Gemini",
        };
        f.write_str(name)
    }
}

/// A resolved backend: which provider, with which key and model.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedBackend {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for ResolvedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBackend")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl ResolvedBackend {
    /// Use a different model than the provider default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Construct the client for this backend.
    pub fn build(&self) -> Result<Arc<dyn Llm>> {
        let llm: Arc<dyn Llm> = match self.provider {
            Provider::Groq => Arc::new(OpenAIClient::new(
                OpenAIConfig::groq(&self.api_key).with_model(&self.model),
            )?),
            Provider::OpenAI => {
                Arc::new(OpenAIClient::new(OpenAIConfig::new(&self.api_key, &self.model))?)
            }
            Provider::Gemini => Arc::new(GeminiClient::new(&self.api_key, &self.model)?),
        };
        Ok(llm)
    }
}

/// Pick a backend using `lookup` to read credentials.
///
/// Empty or whitespace-only values count as absent.
///
/// # Errors
///
/// Returns [`ModelError::Configuration`] when no key is available.
pub fn resolve_backend<F>(lookup: F) -> Result<ResolvedBackend>
where
    F: Fn(&str) -> Option<String>,
{
    for provider in Provider::PRIORITY {
        if let Some(key) = lookup(provider.env_var()).filter(|k| !k.trim().is_empty()) {
            info!(%provider, model = provider.default_model(), "selected LLM backend");
            return Ok(ResolvedBackend {
                provider,
                api_key: key.trim().to_string(),
                model: provider.default_model().to_string(),
            });
        }
    }

    let names: Vec<&str> = Provider::PRIORITY.iter().map(|p| p.env_var()).collect();
    Err(ModelError::Configuration(format!("no LLM API key found; set one of {}", names.join(", "))))
}

/// [`resolve_backend`] against the process environment.
pub fn resolve_from_env() -> Result<ResolvedBackend> {
    resolve_backend(|name| std::env::var(name).ok())
}
