//! Post-generation answer checks applied in strict mode.

/// Words whose presence marks an answer as speculative.
pub const HEDGING_TERMS: &[&str] = &["however", "may", "likely", "suggests", "possibly"];

/// Outcome of an [`AnswerGuard`] check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Pass,
    /// The answer must not be returned; `reason` is logged.
    Reject { reason: String },
}

impl GuardVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, GuardVerdict::Pass)
    }
}

/// Inspects a generated answer before it is returned.
pub trait AnswerGuard: Send + Sync {
    /// Name used in logs when the guard rejects an answer.
    fn name(&self) -> &str;

    fn check(&self, answer: &str) -> GuardVerdict;
}

/// Rejects answers containing any banned term (case-insensitive substring).
///
/// Matching is by substring, so `"may"` also matches
/// `"dismay"`.
#[derive(Debug, Clone)]
pub struct HedgingGuard {
    name: String,
    terms: Vec<String>,
}

impl HedgingGuard {
    /// Guard over a custom term list.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: "hedging".to_string(),
            terms: terms.into_iter().map(|t| t.as_ref().to_lowercase()).filter(|t| !t.is_empty()).collect(),
        }
    }

    /// Override the name reported in logs (default `hedging`).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The lower-cased banned terms.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl Default for HedgingGuard {
    fn default() -> Self {
        Self::new(HEDGING_TERMS)
    }
}

impl AnswerGuard for HedgingGuard {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, answer: &str) -> GuardVerdict {
        let lowered = answer.to_lowercase();
        match self.terms.iter().find(|term| lowered.contains(term.as_str())) {
            Some(term) => GuardVerdict::Reject { reason: format!("contains hedging term '{term}'") },
            None => GuardVerdict::Pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_any_case() {
        let guard = HedgingGuard::default();
        for answer in ["This LIKELY forms ZnCl2.", "It possibly reacts", "However, no."] {
            assert!(!guard.check(answer).is_pass(), "{answer}");
        }
    }

    #[test]
    fn passes_plain_statement() {
        let guard = HedgingGuard::default();
        assert_eq!(guard.check("Zn + 2HCl -> ZnCl2 + H2"), GuardVerdict::Pass);
    }

    #[test]
    fn substring_match_is_coarse() {
        assert!(!HedgingGuard::default().check("To the dismay of chemists").is_pass());
    }

    #[test]
    fn custom_terms_replace_defaults() {
        let guard = HedgingGuard::new(["Vielleicht", ""]).with_name("de-hedging");
        assert_eq!(guard.terms(), ["vielleicht"]);
        assert_eq!(guard.name(), "de-hedging");
        assert!(guard.check("It likely works").is_pass());
        assert_eq!(
            guard.check("vielleicht"),
            GuardVerdict::Reject { reason: "contains hedging term 'vielleicht'".into() }
        );
    }
}
