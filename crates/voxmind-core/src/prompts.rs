//! Prompt file helpers.

/// Prompt sent alongside the voice note to get a verbatim transcript.
pub const TRANSCRIBE_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/transcribe.md"
));

/// Prompt for grammar correction and Persian → English translation.
pub const CORRECT_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/correct.md"
));

/// Builds the correction request text for a transcript.
pub fn correction_input(original_text: &str) -> String {
    format!("{}\nInput: {}", CORRECT_PROMPT.trim_end(), original_text)
}
