//! # chemlab-assistant
//!
//! Retrieval-grounded chemistry question answering.
//!
//! An [`Assistant`] retrieves passages from a [`Retriever`](chemlab_rag::Retriever),
//! frames them in a mode-specific prompt and asks an [`Llm`](chemlab_model::Llm).
//! In [`AssistantMode::Strict`] it refuses when the knowledge base has nothing
//! relevant and discards hedged answers; in [`AssistantMode::Creative`] it may
//! reason beyond the retrieved context.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chemlab_assistant::{Assistant, AssistantMode, reaction_query};
//!
//! let assistant = Assistant::from_env(AssistantMode::Strict, Arc::new(knowledge_base))?;
//! println!("{}", assistant.invoke(&reaction_query("Zn", "HCl")).await?);
//! ```

pub mod assistant;
pub mod error;
pub mod guard;
pub mod mode;
pub mod prompt;

pub use assistant::{Assistant, AssistantBuilder, DEFAULT_TOP_K, REFUSAL, reaction_query};
pub use error::{AssistantError, Result};
pub use guard::{AnswerGuard, GuardVerdict, HEDGING_TERMS, HedgingGuard};
pub use mode::AssistantMode;
