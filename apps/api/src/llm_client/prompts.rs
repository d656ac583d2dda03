// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Base persona for every quiz-related call.
pub const TEACHER_PERSONA: &str = "You are a professional Japanese teacher \
    who writes JLPT practice material for learners.";

/// Appended to system prompts whose output is parsed line by line.
pub const PLAIN_TEXT_ONLY: &str = "Respond in plain text only. \
    Do NOT use markdown formatting or code fences. \
    Do NOT add greetings, explanations, or closing remarks.";

/// Joins the persona with an output-format rule into one system prompt.
pub fn plain_text_system(role: &str) -> String {
    format!("{TEACHER_PERSONA} {role} {PLAIN_TEXT_ONLY}")
}
