//! The question-answering facade: retrieve, prompt, generate, guard.

use std::sync::Arc;

use chemlab_model::{Llm, LlmRequest, resolve_from_env};
use chemlab_rag::Retriever;
use tracing::{debug, info, warn};

use crate::error::{AssistantError, Result};
use crate::guard::{AnswerGuard, GuardVerdict, HedgingGuard};
use crate::mode::AssistantMode;
use crate::prompt::{render_user_turn, system_instruction};

/// Returned in strict mode when the knowledge base cannot support an answer.
pub const REFUSAL: &str = "No known reaction found in current knowledge base.";

/// Number of passages retrieved per question unless overridden.
pub const DEFAULT_TOP_K: usize = 3;

/// Retrieved passages at or below this many characters (after trimming) are
/// dropped from the context.
pub const MIN_PASSAGE_CHARS: usize = 20;

/// The query the lab UI sends for a pair of reactants.
pub fn reaction_query(reactant_a: &str, reactant_b: &str) -> String {
    format!("Reaction between {reactant_a} + {reactant_b}")
}

/// A retrieval-grounded chemistry assistant bound to one [`AssistantMode`].
///
/// Immutable after construction and safe to share behind an [`Arc`].
///
/// ```rust,ignore
/// let assistant = Assistant::builder()
///     .mode(AssistantMode::Strict)
///     .llm(llm)
///     .retriever(Arc::new(knowledge_base))
///     .build()?;
/// let answer = assistant.invoke(&reaction_query("Zn", "HCl")).await?;
/// ```
pub struct Assistant {
    mode: AssistantMode,
    llm: Arc<dyn Llm>,
    retriever: Arc<dyn Retriever>,
    top_k: usize,
    refusal: String,
    system: String,
    guards: Vec<Box<dyn AnswerGuard>>,
}

impl Assistant {
    /// Start building an assistant. See [`AssistantBuilder`] for defaults.
    pub fn builder() -> AssistantBuilder {
        AssistantBuilder::default()
    }

    /// Build an assistant whose LLM is chosen from `GROQ_API_KEY`,
    /// `OPENAI_API_KEY` or `GOOGLE_API_KEY`.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when none of the keys is set.
    pub fn from_env(mode: AssistantMode, retriever: Arc<dyn Retriever>) -> Result<Self> {
        let llm = resolve_from_env()?.build()?;
        Self::builder().mode(mode).llm(llm).retriever(retriever).build()
    }

    /// The mode this assistant answers in.
    pub fn mode(&self) -> AssistantMode {
        self.mode
    }

    /// The sentence returned when an answer cannot be grounded.
    pub fn refusal(&self) -> &str {
        &self.refusal
    }

    /// The system instruction sent with every request.
    pub fn system_instruction(&self) -> &str {
        &self.system
    }

    /// Answer `question` from the knowledge base.
    ///
    /// In strict mode an empty context short-circuits to the refusal sentence
    /// without calling the LLM, and an answer rejected by a guard is replaced
    /// by the refusal sentence.
    ///
    /// # Errors
    ///
    /// Retrieval and LLM failures are propagated unchanged; nothing is retried.
    pub async fn invoke(&self, question: &str) -> Result<String> {
        let passages = self.retriever.search(question, self.top_k).await?;
        let context = build_context(&passages);
        debug!(mode = %self.mode, retrieved = passages.len(), context_len = context.len(), "context assembled");

        if self.mode == AssistantMode::Strict && context.is_empty() {
            info!(mode = %self.mode, "no usable context; refusing");
            return Ok(self.refusal.clone());
        }

        let request = LlmRequest::new(self.system.clone(), render_user_turn(&context, question));
        let answer = self.llm.generate(&request).await?.trim().to_string();

        if self.mode == AssistantMode::Strict {
            for guard in &self.guards {
                if let GuardVerdict::Reject { reason } = guard.check(&answer) {
                    warn!(guard = guard.name(), %reason, "answer rejected; substituting refusal");
                    return Ok(self.refusal.clone());
                }
            }
        }

        Ok(answer)
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("mode", &self.mode)
            .field("llm", &self.llm.name())
            .field("top_k", &self.top_k)
            .field("guards", &self.guards.len())
            .finish()
    }
}

/// Trimmed passages longer than [`MIN_PASSAGE_CHARS`], separated by a blank line.
fn build_context(passages: &[String]) -> String {
    passages
        .iter()
        .map(|p| p.trim())
        .filter(|p| p.chars().count() > MIN_PASSAGE_CHARS)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builder for [`Assistant`].
///
/// The LLM and retriever are required. Defaults: strict mode, `top_k` of 3,
/// [`REFUSAL`], and a single [`HedgingGuard`].
#[derive(Default)]
pub struct AssistantBuilder {
    mode: AssistantMode,
    llm: Option<Arc<dyn Llm>>,
    retriever: Option<Arc<dyn Retriever>>,
    top_k: Option<usize>,
    refusal: Option<String>,
    guards: Option<Vec<Box<dyn AnswerGuard>>>,
}

impl AssistantBuilder {
    /// Strict (the default) or creative answering.
    pub fn mode(mut self, mode: AssistantMode) -> Self {
        self.mode = mode;
        self
    }

    /// The model that writes answers. Required.
    pub fn llm(mut self, llm: Arc<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Where context passages come from. Required.
    pub fn retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Passages retrieved per question.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Replace the refusal sentence.
    pub fn refusal(mut self, refusal: impl Into<String>) -> Self {
        self.refusal = Some(refusal.into());
        self
    }

    /// Replace the default guard list. An empty list disables guarding.
    pub fn guards(mut self, guards: Vec<Box<dyn AnswerGuard>>) -> Self {
        self.guards = Some(guards);
        self
    }

    /// Validate the settings and render the system instruction.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the LLM or retriever is missing,
    /// `top_k` is zero, or the refusal sentence is blank.
    pub fn build(self) -> Result<Assistant> {
        let llm = self.llm.ok_or_else(|| AssistantError::Config("llm is required".to_string()))?;
        let retriever =
            self.retriever.ok_or_else(|| AssistantError::Config("retriever is required".to_string()))?;
        let top_k = self.top_k.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(AssistantError::Config("top_k must be greater than 0".to_string()));
        }
        let refusal = self.refusal.unwrap_or_else(|| REFUSAL.to_string());
        if refusal.trim().is_empty() {
            return Err(AssistantError::Config("refusal sentence must not be empty".to_string()));
        }
        let guards = self.guards.unwrap_or_else(|| vec![Box::new(HedgingGuard::default())]);
        let system = system_instruction(self.mode, &refusal);

        info!(mode = %self.mode, llm = llm.name(), top_k, "assistant ready");
        Ok(Assistant { mode: self.mode, llm, retriever, top_k, refusal, system, guards })
    }
}

#[cfg(test)]
mod tests {
    use chemlab_model::MockLlm;
    use chemlab_rag::StaticRetriever;

    use super::*;

    const ZINC: &str = "Zinc reacts with hydrochloric acid: Zn + 2HCl -> ZnCl2 + H2.";

    fn assistant(mode: AssistantMode, llm: Arc<MockLlm>, passages: &[&str]) -> Assistant {
        Assistant::builder()
            .mode(mode)
            .llm(llm)
            .retriever(Arc::new(StaticRetriever::new(passages.iter().copied())))
            .build()
            .unwrap()
    }

    #[test]
    fn reaction_query_format() {
        assert_eq!(reaction_query("Zn", "HCl"), "Reaction between Zn + HCl");
    }

    #[test]
    fn short_passages_are_dropped() {
        let passages = vec!["  tiny  ".to_string(), format!("  {ZINC}  "), "exactly twenty chars".to_string()];
        assert_eq!(build_context(&passages), ZINC);
    }

    #[test]
    fn build_validates() {
        let llm: Arc<dyn Llm> = Arc::new(MockLlm::new("x"));
        assert!(matches!(Assistant::builder().llm(llm.clone()).build(), Err(AssistantError::Config(_))));
        let retriever: Arc<dyn Retriever> = Arc::new(StaticRetriever::default());
        let err = Assistant::builder().llm(llm).retriever(retriever).top_k(0).build().unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[tokio::test]
    async fn strict_refuses_on_short_only_context() {
        let llm = Arc::new(MockLlm::new("Zinc chloride."));
        let assistant = assistant(AssistantMode::Strict, llm.clone(), &["H2", "too short"]);

        assert_eq!(assistant.invoke("Zn + HCl").await.unwrap(), REFUSAL);
        assert_eq!(llm.call_count().await, 0);
    }

    #[tokio::test]
    async fn strict_sends_context_and_trims_answer() {
        let llm = Arc::new(MockLlm::new("  Zinc chloride and hydrogen gas.\n"));
        let assistant = assistant(AssistantMode::Strict, llm.clone(), &[ZINC]);

        let answer = assistant.invoke("Reaction between Zn + HCl").await.unwrap();
        assert_eq!(answer, "Zinc chloride and hydrogen gas.");

        let requests = llm.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, assistant.system_instruction());
        assert!(requests[0].user.starts_with(&format!("Context:\n{ZINC}\n\nUser Question:\n")));
    }

    #[tokio::test]
    async fn creative_calls_llm_without_context() {
        let llm = Arc::new(MockLlm::new("Based on known chemistry, it may form a salt."));
        let assistant = assistant(AssistantMode::Creative, llm.clone(), &[]);

        let answer = assistant.invoke("Fe + S").await.unwrap();
        assert_eq!(answer, "Based on known chemistry, it may form a salt.");
        assert!(llm.requests().await[0].user.contains("No context available"));
    }

    #[tokio::test]
    async fn custom_refusal_and_no_guards() {
        let llm = Arc::new(MockLlm::new("It likely forms ZnCl2."));
        let assistant = Assistant::builder()
            .llm(llm)
            .retriever(Arc::new(StaticRetriever::new([ZINC])))
            .refusal("Keine Reaktion bekannt.")
            .guards(Vec::new())
            .build()
            .unwrap();

        assert_eq!(assistant.invoke("Zn + HCl").await.unwrap(), "It likely forms ZnCl2.");
        assert!(assistant.system_instruction().contains("Keine Reaktion bekannt."));
    }

    #[tokio::test]
    async fn custom_refusal_on_empty_context() {
        let assistant = Assistant::builder()
            .llm(Arc::new(MockLlm::new("unused")))
            .retriever(Arc::new(StaticRetriever::default()))
            .refusal("Keine Reaktion bekannt.")
            .build()
            .unwrap();

        assert_eq!(assistant.invoke("Zn + HCl").await.unwrap(), "Keine Reaktion bekannt.");
    }
}
