//! The deterministic fallback parser: pure pattern matching, no AI.
//!
//! This tier is total — same input, same record, and it cannot fail —
//! which is what makes it a legal terminal state for the pipeline. The
//! price is fidelity: it sections the resume on a fixed set of heading
//! patterns, pulls contact fields with fixed regexes, and guesses the
//! name from the first line. The city and degree lists are short and
//! locale-biased (inherited from the product's original market); they
//! bound what the fallback can recognise, not what the AI tiers can.

use once_cell::sync::Lazy;
use regex::Regex;

use async_trait::async_trait;

use super::{RunContext, Tier, TierOutcome};
use crate::record::{ExperienceEntry, ResumeRecord};
use crate::sanitize::snippet;

/// Explanation placed in `summary` when there is nothing to parse.
pub const NO_TEXT_MESSAGE: &str =
    "Could not extract text. Please try a different file format.";

pub struct OfflineTier;

#[async_trait]
impl Tier for OfflineTier {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn provider(&self) -> String {
        "local".to_string()
    }

    async fn attempt(&self, ctx: &mut RunContext<'_>) -> TierOutcome {
        // Local and cheap: runs to completion even for cancelled requests
        // so the caller contract (always a record) holds.
        let record = parse_resume_text(ctx.document_text().await);
        TierOutcome::Success(serde_json::to_value(&record).unwrap_or_default())
    }
}

// ── Patterns ─────────────────────────────────────────────────────────────

static RE_BROKEN_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([a-z0-9._%+-])\s+(@)\s+([a-z0-9.-])").unwrap());
static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());
static RE_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\+]?[(]?[0-9]{1,4}[)]?[-\s.]?[0-9]{3,}[-\s.]?[0-9]{3,}[-\s.]?[0-9]{2,}").unwrap()
});
static RE_LINKEDIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)linkedin\.com/in/[\w-]+").unwrap());

static RE_NAME_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[|,\t]|\s{3,}").unwrap());
static RE_NAME_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Hyderabad|Mumbai|Bangalore|Delhi|India|Pune|Chennai|UK|USA)\b").unwrap()
});
static RE_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Hyderabad|New York|London|Bangalore|Pune|Delhi)[^|\n]*").unwrap()
});

static RE_DEGREE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:B\.Tech|Bachelor|M\.Tech|Master|B\.S\.|M\.S\.)[\s\w]*").unwrap()
});
static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
static RE_CGPA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d\.\d").unwrap());

// ── Sectioniser ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Experience,
    Education,
    Skills,
    Projects,
    Summary,
}

/// Section-title patterns, checked in this order; the first match wins.
static SECTION_TITLES: Lazy<Vec<(Section, Regex)>> = Lazy::new(|| {
    vec![
        (
            Section::Experience,
            Regex::new(r"(?i)experience|work history|employment").unwrap(),
        ),
        (
            Section::Education,
            Regex::new(r"(?i)education|academic|qualification").unwrap(),
        ),
        (
            Section::Skills,
            Regex::new(r"(?i)skills|technical skills|competencies|technologies").unwrap(),
        ),
        (
            Section::Projects,
            Regex::new(r"(?i)projects|academic projects").unwrap(),
        ),
        (
            Section::Summary,
            Regex::new(r"(?i)summary|profile|about me|objective").unwrap(),
        ),
    ]
});

/// Accumulated text per section. A section that never appeared stays
/// empty, which downstream field derivation treats the same as absent.
#[derive(Debug, Default)]
struct Sections {
    header: String,
    experience: String,
    education: String,
    skills: String,
    projects: String,
    summary: String,
}

impl Sections {
    fn bucket(&mut self, section: Section) -> &mut String {
        match section {
            Section::Header => &mut self.header,
            Section::Experience => &mut self.experience,
            Section::Education => &mut self.education,
            Section::Skills => &mut self.skills,
            Section::Projects => &mut self.projects,
            Section::Summary => &mut self.summary,
        }
    }
}

/// Scan lines in order, switching the active section on short
/// heading-shaped lines. A heading contributes no text itself and resets
/// its section, so a repeated heading starts the section over.
fn sectionize(lines: &[&str]) -> Sections {
    let mut sections = Sections::default();
    let mut active = Section::Header;

    for line in lines {
        let heading = SECTION_TITLES
            .iter()
            .find(|(_, re)| re.is_match(line) && line.chars().count() < 40)
            .map(|(section, _)| *section);

        if let Some(section) = heading {
            active = section;
            sections.bucket(active).clear();
        } else {
            let bucket = sections.bucket(active);
            bucket.push_str(line);
            bucket.push('\n');
        }
    }
    sections
}

// ── Parser ───────────────────────────────────────────────────────────────

/// Parse raw resume text into a record. Pure, deterministic, and total:
/// it never signals failure upward.
pub fn parse_resume_text(text: &str) -> ResumeRecord {
    if text.trim().len() < 10 {
        return ResumeRecord::fallback(NO_TEXT_MESSAGE);
    }

    let normalized = normalize_text(text);
    let lines: Vec<&str> = normalized
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let sections = sectionize(&lines);

    let first_match =
        |re: &Regex, haystack: &str| re.find(haystack).map(|m| m.as_str().to_string());
    let first_line = |s: &str| s.split('\n').next().unwrap_or("").to_string();

    let experience = if sections.experience.is_empty() {
        vec![ExperienceEntry::default()]
    } else {
        vec![ExperienceEntry {
            company: first_line(&sections.experience),
            title: String::new(),
            duration: String::new(),
            description: snippet(&sections.experience, 1500).to_string(),
        }]
    };

    ResumeRecord {
        name: derive_name(lines.first().copied().unwrap_or("")),
        email: first_match(&RE_EMAIL, &normalized).unwrap_or_default(),
        phone: first_match(&RE_PHONE, &normalized).unwrap_or_default(),
        title: String::new(),
        location: first_match(&RE_LOCATION, &normalized).unwrap_or_default(),
        linkedin: first_match(&RE_LINKEDIN, &normalized)
            .map(|handle| format!("https://{handle}"))
            .unwrap_or_default(),
        summary: snippet(
            &sections
                .summary
                .split('\n')
                .take(3)
                .collect::<Vec<_>>()
                .join(" "),
            500,
        )
        .trim_end()
        .to_string(),
        experience,
        degree: first_match(&RE_DEGREE, &sections.education).unwrap_or_default(),
        institution: first_line(&sections.education),
        grad_year: first_match(&RE_YEAR, &sections.education).unwrap_or_default(),
        cgpa: first_match(&RE_CGPA, &sections.education).unwrap_or_default(),
        skills: snippet(&sections.skills.replace('\n', ", "), 800).to_string(),
        projects: snippet(&sections.projects, 2000).to_string(),
    }
}

/// Repair emails broken by stray whitespace around `@`, normalise line
/// endings, and collapse runs of blank lines.
fn normalize_text(text: &str) -> String {
    let repaired = RE_BROKEN_EMAIL.replace_all(text, "${1}${2}${3}");
    let unified = repaired.replace('\r', "\n");
    RE_BLANK_RUNS.replace_all(&unified, "\n\n").to_string()
}

/// First line → candidate name: cut at the first pipe/comma/tab or
/// 3+-space column gap, strip known city/country words, cap at 50 chars.
fn derive_name(first_line: &str) -> String {
    let mut name = first_line.to_string();
    if RE_NAME_SEPARATOR.is_match(&name) {
        name = RE_NAME_SEPARATOR
            .split(&name)
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
    }
    let name = RE_NAME_NOISE.replace_all(&name, "").trim().to_string();
    snippet(&name, 50).to_string()
}
