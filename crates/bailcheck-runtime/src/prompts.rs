//! System prompts for the legal chat assistant.
//!
//! The assistant answers general questions about Indian criminal law. It is
//! not wired into bail evaluation; eligibility always comes from the
//! deterministic evaluator in `bailcheck-core`.

/// System instruction sent with every chat completion.
pub const LEGAL_ASSISTANT_PROMPT: &str = r#"
You are a legal assistant chatbot specialized in Indian Law.
Your primary purpose is to provide information about:
1. Indian legal sections (IPC, CrPC, etc.)
2. Bail provisions and eligibility criteria in India.
3. General legal guidance related to the Indian judicial system.

Do NOT provide legal advice for specific cases. Always include a disclaimer that you are an AI and not a substitute for a professional lawyer.
If asked about laws outside India, politely decline and steer the conversation back to Indian law.
Keep your answers concise, accurate, and helpful.
"#;

/// The system instruction with surrounding whitespace removed.
pub fn system_instruction() -> &'static str {
    LEGAL_ASSISTANT_PROMPT.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_scopes_to_indian_law() {
        let prompt = system_instruction();
        assert!(prompt.starts_with("You are a legal assistant"));
        assert!(prompt.contains("IPC, CrPC"));
        assert!(prompt.contains("outside India"));
    }

    #[test]
    fn test_prompt_requires_disclaimer() {
        let prompt = system_instruction();
        assert!(prompt.contains("Do NOT provide legal advice for specific cases"));
        assert!(prompt.contains("not a substitute for a professional lawyer"));
    }
}
