//! # resume2json
//!
//! Extract structured resume data from uploaded PDF, image, or
//! plain-text documents using tiered AI providers with a deterministic
//! fallback.
//!
//! ## Why tiers?
//!
//! No single extraction strategy survives contact with real resumes. A
//! vision model reads multi-column layouts and scans that text
//! extraction mangles — but it gets rate limited and needs credentials.
//! Text models are cheap and accurate on clean PDFs — but useless when
//! the text layer is broken. Plain regex always works — but only
//! shallowly. So the pipeline tries each strategy in priority order and
//! the deterministic parser guarantees that *something* structurally
//! valid always comes back: provider outages degrade answer quality,
//! never availability.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (bytes + media type)
//!  │
//!  ├─ 1. Vision   rasterise ≤3 pages via pdfium → JPEG → Gemini
//!  │              (2 models × 2 attempts, 5 s backoff on rate limit)
//!  ├─ 2. Text A   extract text (lopdf / OCR) → DigitalOcean Qwen3
//!  ├─ 3. Text B   same text (cached) → NVIDIA Kimi
//!  ├─ 4. Regex    deterministic section/contact parsing — cannot fail
//!  └─ Normalise   fixed 13-field record, placeholder experience entry
//! ```
//!
//! Every AI response passes through one shared JSON sanitizer
//! ([`sanitize::recover_json`]) and every tier's payload through one
//! normaliser ([`ResumeRecord::from_value`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume2json::{extract_resume, PipelineConfig, UploadedDocument};
//!
//! #[tokio::main]
//! async fn main() {
//!     let bytes = std::fs::read("resume.pdf").expect("readable file");
//!     let doc = UploadedDocument::new(bytes, "application/pdf", "resume.pdf");
//!     // Credentials from GEMINI_API_KEY / DO_API_KEY / NVIDIA_API_KEY;
//!     // with none set, only the regex tier runs.
//!     let config = PipelineConfig::from_env();
//!     let record = extract_resume(&doc, &config).await;
//!     println!("{}", serde_json::to_string_pretty(&record).unwrap());
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume2json` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod ocr;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod record;
pub mod sanitize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, TextTierConfig, DEFAULT_VISION_MODELS};
pub use document::{DocumentKind, UploadedDocument};
pub use error::{RasterError, TierError};
pub use extract::{extract_resume, extract_resume_with_cancel};
pub use providers::{ChatClient, ProviderError, VisionClient};
pub use record::{ExperienceEntry, ResumeRecord};
