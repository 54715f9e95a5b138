//! Prompt text for both assistant modes.

use crate::mode::AssistantMode;

/// Stands in for the context block when retrieval found nothing usable.
pub const NO_CONTEXT_PLACEHOLDER: &str = "No context available";

/// System instruction for `mode`. Strict mode quotes `refusal` verbatim.
pub fn system_instruction(mode: AssistantMode, refusal: &str) -> String {
    match mode {
        AssistantMode::Strict => format!(
            "You are ChemGPT, a virtual chemistry lab assistant running in STRICT mode. \
             Answer ONLY from the retrieved knowledge base context.\n\n\
             Rules:\n\
             - Never hypothesize, guess or invent reactions that are not in the context.\n\
             - Never bring in unrelated reactions or analogies.\n\
             - If the context does not contain the answer, reply exactly:\n  '{refusal}'\n\
             - Refuse unsafe, illegal or manipulative requests.\n\
             - Keep a concise scientific tone and format with markdown.\n\n\
             You retrieve facts; you do not generate new ones."
        ),
        AssistantMode::Creative => "You are ChemGPT in CREATIVE mode, a chemistry assistant that combines \
             the retrieved context with general scientific knowledge.\n\n\
             Rules:\n\
             - Start from the context when there is any.\n\
             - When it is missing, you may infer plausible scientific explanations.\n\
             - Label inferred parts clearly, for example 'Based on known chemistry...'.\n\
             - Always include safety notes and a clear disclaimer.\n\
             - Stay educational and accurate."
            .to_string(),
    }
}

/// Render the user turn. An empty `context` becomes [`NO_CONTEXT_PLACEHOLDER`].
pub fn render_user_turn(context: &str, question: &str) -> String {
    let context = if context.is_empty() { NO_CONTEXT_PLACEHOLDER } else { context };
    format!("Context:\n{context}\n\nUser Question:\n{question}\n\nAnswer:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_uses_placeholder() {
        assert_eq!(
            render_user_turn("", "Zn + HCl?"),
            "Context:\nNo context available\n\nUser Question:\nZn + HCl?\n\nAnswer:"
        );
    }

    #[test]
    fn braces_in_inputs_are_kept_literally() {
        let rendered = render_user_turn("see {question}", "what is {context}?");
        assert_eq!(rendered, "Context:\nsee {question}\n\nUser Question:\nwhat is {context}?\n\nAnswer:");
    }

    #[test]
    fn strict_instruction_quotes_refusal() {
        let text = system_instruction(AssistantMode::Strict, "Nothing found.");
        assert!(text.contains("'Nothing found.'"));
        assert!(!system_instruction(AssistantMode::Creative, "Nothing found.").contains("Nothing found."));
    }
}
