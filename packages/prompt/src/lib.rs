#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Fixed prompt templates.
//!
//! Every function here is a pure function of its inputs.

use promptlift_ai_provider_models::Level;

/// Characters of a code base embedded in an enhance-code message.
pub const MAX_CODE_BASE_CHARS: usize = 8000;

/// Split a prompt into three reasoning-style variants.
#[must_use]
pub fn decompose(prompt: &str, level: Level) -> [String; 3] {
    [
        format!("Chain-of-Thought: Step-by-step breakdown of {prompt} at {level} level."),
        format!("Tree-of-Thoughts: Explore multiple paths for {prompt}."),
        format!(
            "Decomposition: Sub-tasks for {prompt}: 1. Analyze, 2. Plan, 3. Implement at {level}."
        ),
    ]
}

#[must_use]
pub fn enhance_prompt_message(decomposition: &str, level: Level) -> String {
    format!("Enhance this decomposed prompt for code generation at {level} level: {decomposition}")
}

/// The three enhance messages for `prompt`, in decomposition order.
#[must_use]
pub fn enhance_prompt_messages(prompt: &str, level: Level) -> [String; 3] {
    decompose(prompt, level).map(|decomposition| enhance_prompt_message(&decomposition, level))
}

#[must_use]
pub fn generate_code_message(prompt: &str, level: Level) -> String {
    format!(
        "Generate production-ready code based on this prompt: {prompt}. Apply best practices at {level} level: clean code, error handling, security."
    )
}

/// Embeds at most [`MAX_CODE_BASE_CHARS`] characters of `code_base`.
#[must_use]
pub fn enhance_code_message(code_base: &str, level: Level) -> String {
    let code_base = truncate_chars(code_base, MAX_CODE_BASE_CHARS);
    format!(
        "Take this code base: {code_base}. Make it production-ready at {level} level: apply best practices like error handling, optimization, security fixes."
    )
}

/// The first `max_chars` characters of `s`.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    s.char_indices().nth(max_chars).map_or(s, |(idx, _)| &s[..idx])
}
