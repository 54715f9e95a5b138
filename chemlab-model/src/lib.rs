//! # chemlab-model
//!
//! Hosted LLM backends for the chemlab assistant.
//!
//! Every backend implements [`Llm`]: one system instruction plus one user
//! turn in, the full completion text out.
//!
//! - [`OpenAIClient`]: OpenAI and Groq (OpenAI-compatible chat completions)
//! - [`GeminiClient`]: Google Gemini `generateContent`
//! - [`MockLlm`]: canned answers for tests
//!
//! [`resolve_from_env`] picks a backend from `GROQ_API_KEY`,
//! `OPENAI_API_KEY` or `GOOGLE_API_KEY`, in that order.

pub mod credentials;
pub mod error;
pub mod gemini;
pub mod llm;
pub mod mock;
pub mod openai;

pub use credentials::{Provider, ResolvedBackend, resolve_backend, resolve_from_env};
pub use error::{ModelError, Result};
pub use gemini::GeminiClient;
pub use llm::{Llm, LlmRequest};
pub use mock::MockLlm;
pub use openai::{OpenAIClient, OpenAIConfig};
