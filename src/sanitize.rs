//! JSON recovery from free-form model output.
//!
//! Language models asked for "ONLY valid JSON" still wrap their answer in
//! prose, markdown fences, or leave a trailing comma behind. Every
//! AI-backed tier funnels its raw response through [`recover_json`] so
//! the rules for what counts as acceptable output live in exactly one
//! place.
//!
//! Recovery steps, each applied to the output of the previous:
//!
//! 1. Strip ```json / ``` fence markers.
//! 2. Slice from the first `{` to the last `}` (drops surrounding prose).
//! 3. Remove trailing commas immediately before `}` or `]`.
//! 4. Strict `serde_json` parse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

static RE_TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());

/// Recover a JSON value from text that may be wrapped in prose or fences.
///
/// Returns `None` when no parseable object can be salvaged; never panics.
/// The caller keeps the original text, so on failure only a truncated
/// snippet is logged for provider-drift diagnostics.
pub fn recover_json(raw: &str) -> Option<Value> {
    let stripped = raw.replace("```json", "").replace("```", "");

    let sliced = match (stripped.find('{'), stripped.rfind('}')) {
        (Some(first), Some(last)) if last > first => &stripped[first..=last],
        _ => stripped.as_str(),
    };

    let repaired = RE_TRAILING_COMMA.replace_all(sliced, "$1");

    match serde_json::from_str(&repaired) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("JSON recovery failed: {} (raw: {:?})", e, snippet(raw, 200));
            None
        }
    }
}

/// First `max` characters of `s`, char-boundary safe.
pub(crate) fn snippet(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_clean_json() {
        let v = recover_json(r#"{"name":"Jane"}"#).unwrap();
        assert_eq!(v, json!({"name": "Jane"}));
    }

    #[test]
    fn strips_json_fences() {
        let raw = "```json\n{\"name\":\"Jane\"}\n```";
        assert_eq!(recover_json(raw).unwrap(), json!({"name": "Jane"}));
    }

    #[test]
    fn slices_surrounding_prose() {
        let raw = "Sure! Here is the extracted data:\n{\"name\":\"Jane\"}\nLet me know if you need more.";
        assert_eq!(recover_json(raw).unwrap(), json!({"name": "Jane"}));
    }

    #[test]
    fn removes_trailing_commas() {
        let raw = r#"{"skills": ["a", "b",], "name": "Jane",}"#;
        assert_eq!(
            recover_json(raw).unwrap(),
            json!({"skills": ["a", "b"], "name": "Jane"})
        );
    }

    #[test]
    fn round_trips_embedded_object() {
        let original = json!({"name": "Jane", "experience": [{"company": "Acme"}]});
        let raw = format!("Model says:\n```json\n{}\n```\nDone.", original);
        assert_eq!(recover_json(&raw).unwrap(), original);
    }

    #[test]
    fn idempotent_on_own_output() {
        let raw = "prose {\"a\": 1,} prose";
        let first = recover_json(raw).unwrap();
        let second = recover_json(&first.to_string()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fails_cleanly_on_garbage() {
        assert!(recover_json("I could not read the resume, sorry.").is_none());
    }

    #[test]
    fn fails_cleanly_on_empty() {
        assert!(recover_json("").is_none());
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let s = "héllo wörld";
        assert_eq!(snippet(s, 3), "hél");
        assert_eq!(snippet(s, 100), s);
    }
}
