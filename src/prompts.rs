//! Extraction prompts for the AI tiers.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the JSON contract the models are asked
//!    to emit appears exactly once and is shared by all three AI tiers.
//!
//! 2. **Testability** — unit tests can inspect prompt construction
//!    (notably the capped-prefix rule) without calling a provider.

use crate::sanitize::snippet;

/// The JSON shape every AI tier is instructed to fill in.
///
/// This is the wire contract, not a schema the pipeline validates
/// against: the only programmatic acceptance check on text-tier output
/// is a non-empty `name` field.
pub const RESUME_JSON_SHAPE: &str = r#"{"name":"","email":"","phone":"","title":"","location":"","linkedin":"","summary":"","experience":[{"company":"","title":"","duration":"","description":""}],"degree":"","institution":"","gradYear":"","cgpa":"","skills":"","projects":""}"#;

/// Instruction sent with the page images to the vision tier.
pub const VISION_PROMPT: &str = r#"You are a resume parser. Extract ALL information from these resume page image(s) into JSON. There may be multiple pages — combine all data into one JSON object.

Respond with ONLY valid JSON. No markdown, no code blocks.

{"name":"","email":"","phone":"","title":"","location":"","linkedin":"","summary":"","experience":[{"company":"","title":"","duration":"","description":""}],"degree":"","institution":"","gradYear":"","cgpa":"","skills":"","projects":""}

Fill every field you can see across all pages. Use "" for missing fields."#;

/// System message for the primary text tier.
pub const TEXT_SYSTEM_PROMPT: &str = "You are a resume parser. Respond with ONLY valid JSON.";

/// User message for the primary text tier (system prompt sent separately).
pub fn text_primary_prompt(text: &str, cap: usize) -> String {
    format!(
        "Parse this resume into JSON:\n\n{}\n\nFormat:\n{}",
        snippet(text, cap),
        RESUME_JSON_SHAPE
    )
}

/// Single user message for the secondary text tier, which folds the
/// parser instruction into the user turn.
pub fn text_secondary_prompt(text: &str, cap: usize) -> String {
    format!(
        "You are a resume parser. Extract data from this resume text into JSON.\n\nText:\n{}\n\nOutput strictly this JSON structure:\n{}",
        snippet(text, cap),
        RESUME_JSON_SHAPE
    )
}
