//! Extraction tiers and the state they share within one pipeline run.
//!
//! Each submodule implements exactly one extraction strategy behind the
//! common [`Tier`] trait, so the driver in [`crate::extract`] is a plain
//! priority-ordered loop with no provider knowledge:
//!
//! ```text
//! vision ──▶ text_model (A) ──▶ text_model (B) ──▶ offline
//! (Gemini)   (DigitalOcean)     (NVIDIA)           (regex, total)
//! ```
//!
//! 1. [`raster`]     — document → bounded page-image sequence (pdfium)
//! 2. [`textract`]   — document → best-effort plain text (lopdf / OCR)
//! 3. [`vision`]     — page images → vision model → JSON
//! 4. [`text_model`] — extracted text → chat completion → JSON
//! 5. [`offline`]    — extracted text → deterministic regex parse; the
//!    guaranteed terminal tier
//!
//! Tiers run strictly sequentially: each is costly (network + inference)
//! and the order is a priority, not a race.

pub mod offline;
pub mod raster;
pub mod textract;
pub mod text_model;
pub mod vision;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::PipelineConfig;
use crate::document::UploadedDocument;
use crate::error::TierError;

/// Result of one tier's attempt at the document.
#[derive(Debug)]
pub enum TierOutcome {
    /// The tier produced a usable record payload; the pipeline stops here.
    Success(Value),
    /// The tier declined to run (precondition not met); no cost incurred.
    Skip(&'static str),
    /// The tier ran and failed; the pipeline advances.
    Fail(TierError),
}

/// One extraction strategy, attempted in priority order.
#[async_trait]
pub trait Tier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Provider label for the attempt log.
    fn provider(&self) -> String {
        self.name().to_string()
    }

    async fn attempt(&self, ctx: &mut RunContext<'_>) -> TierOutcome;
}

/// Per-run shared state: the document, the config, the cancellation
/// token, and the lazily extracted document text.
///
/// Text extraction (PDF walk or OCR) is the most expensive deterministic
/// step and its result cannot change between tiers, so it runs at most
/// once per pipeline run and is cached here for tiers A, B, and the
/// offline parser.
pub struct RunContext<'a> {
    pub doc: &'a UploadedDocument,
    pub config: &'a PipelineConfig,
    pub cancel: CancellationToken,
    text: Option<String>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        doc: &'a UploadedDocument,
        config: &'a PipelineConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            doc,
            config,
            cancel,
            text: None,
        }
    }

    /// Best-effort document text, extracted on first use and cached for
    /// the rest of the run. Empty string means extraction failed.
    pub async fn document_text(&mut self) -> &str {
        if self.text.is_none() {
            let text = textract::extract_text(self.doc, &self.config.ocr_language).await;
            self.text = Some(text);
        }
        self.text.as_deref().unwrap_or_default()
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Transient record of one tier attempt, for control flow and logs only.
/// Never persisted, never returned to the caller.
#[derive(Debug)]
pub struct ExtractionAttempt {
    pub tier: &'static str,
    pub provider: String,
    pub outcome: AttemptOutcome,
    pub latency: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Skipped,
    InvalidJson,
    TransportError,
    RateLimited,
    Timeout,
    Cancelled,
}

impl ExtractionAttempt {
    pub(crate) fn record(tier: &'static str, provider: &str, outcome: &TierOutcome, started: Instant) {
        let attempt = Self {
            tier,
            provider: provider.to_string(),
            outcome: match outcome {
                TierOutcome::Success(_) => AttemptOutcome::Success,
                TierOutcome::Skip(_) => AttemptOutcome::Skipped,
                TierOutcome::Fail(err) => classify(err),
            },
            latency: started.elapsed(),
        };
        info!(
            "tier {} ({}) -> {:?} in {}ms",
            attempt.tier,
            attempt.provider,
            attempt.outcome,
            attempt.latency.as_millis()
        );
    }
}

fn classify(err: &TierError) -> AttemptOutcome {
    use crate::providers::ProviderError;
    match err {
        TierError::InvalidResponse { .. } => AttemptOutcome::InvalidJson,
        TierError::Timeout { .. } => AttemptOutcome::Timeout,
        TierError::Cancelled => AttemptOutcome::Cancelled,
        TierError::Provider(ProviderError::RateLimited { .. }) => AttemptOutcome::RateLimited,
        TierError::Provider(ProviderError::Timeout { .. }) => AttemptOutcome::Timeout,
        _ => AttemptOutcome::TransportError,
    }
}
