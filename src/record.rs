//! The canonical resume record and the field normaliser.
//!
//! Every tier — AI or deterministic — funnels its raw output through
//! [`ResumeRecord::from_value`] before the pipeline returns, so callers
//! can rely on the full field set existing (possibly empty) and on
//! `experience` holding at least one entry. The placeholder entry is a
//! consumer-facing contract: form UIs bind to `experience[0]` and expect
//! it to exist even for a blank record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shown in `summary` when a record is returned without any extracted
/// content and no more specific explanation applies.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Please fill in your details manually.";

/// One position in the work-experience list. All fields default to "".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
}

/// The structured output of the extraction pipeline.
///
/// Field names serialise in the camelCase wire form the AI tiers are
/// instructed to emit (`gradYear`), so a provider response that already
/// matches the contract round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "placeholder_experience")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub grad_year: String,
    #[serde(default)]
    pub cgpa: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub projects: String,
}

fn placeholder_experience() -> Vec<ExperienceEntry> {
    vec![ExperienceEntry::default()]
}

impl Default for ResumeRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            title: String::new(),
            location: String::new(),
            linkedin: String::new(),
            summary: String::new(),
            experience: placeholder_experience(),
            degree: String::new(),
            institution: String::new(),
            grad_year: String::new(),
            cgpa: String::new(),
            skills: String::new(),
            projects: String::new(),
        }
    }
}

impl ResumeRecord {
    /// A structurally complete, semantically empty record carrying an
    /// explanatory message in `summary`.
    pub fn fallback(message: &str) -> Self {
        Self {
            summary: if message.is_empty() {
                DEFAULT_FALLBACK_MESSAGE.to_string()
            } else {
                message.to_string()
            },
            ..Self::default()
        }
    }

    /// Coerce any tier's raw success payload into the fixed schema.
    ///
    /// Pure and total: unknown shapes degrade to empty strings, array
    /// values for scalar fields are joined, and `experience` always ends
    /// up with at least the placeholder entry.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).map(coerce_string).unwrap_or_default();

        let mut experience: Vec<ExperienceEntry> = value
            .get("experience")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(coerce_experience).collect())
            .unwrap_or_default();
        if experience.is_empty() {
            experience.push(ExperienceEntry::default());
        }

        Self {
            name: field("name"),
            email: field("email"),
            phone: field("phone"),
            title: field("title"),
            location: field("location"),
            linkedin: field("linkedin"),
            summary: field("summary"),
            experience,
            degree: field("degree"),
            institution: field("institution"),
            grad_year: field("gradYear"),
            cgpa: field("cgpa"),
            skills: field("skills"),
            projects: field("projects"),
        }
    }
}

fn coerce_experience(entry: &Value) -> ExperienceEntry {
    match entry {
        Value::Object(_) => {
            let field = |key: &str| entry.get(key).map(coerce_string).unwrap_or_default();
            ExperienceEntry {
                company: field("company"),
                title: field("title"),
                duration: field("duration"),
                description: field("description"),
            }
        }
        // A bare string in the experience array is kept as a description.
        other => ExperienceEntry {
            description: coerce_string(other),
            ..ExperienceEntry::default()
        },
    }
}

/// Flatten an arbitrary JSON value into a display string.
///
/// Providers occasionally return `skills` as an array or `cgpa` as a
/// number; rather than rejecting the whole record, the value is joined
/// or stringified.
fn coerce_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(coerce_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .values()
            .map(coerce_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}
