//! The extraction entry point and tier driver.
//!
//! [`extract_resume`] is the one function upload handlers call. It is
//! **infallible from the caller's perspective**: every tier failure is
//! recovered by advancing to the next tier, and the final regex tier is
//! total, so the worst possible outcome is a structurally complete
//! record whose `summary` explains what went wrong. Provider outages
//! degrade the quality of the answer, never the availability of one.
//!
//! The driver is a plain loop over an ordered tier list; which tiers are
//! in the list depends only on which providers the config says exist.
//! With no credentials and no injected clients at all, the list is just
//! the regex tier and the run makes zero outbound calls.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{valid_key, PipelineConfig};
use crate::document::UploadedDocument;
use crate::pipeline::offline::OfflineTier;
use crate::pipeline::text_model::TextModelTier;
use crate::pipeline::vision::VisionTier;
use crate::pipeline::{ExtractionAttempt, RunContext, Tier, TierOutcome};
use crate::providers::{ChatClient, ChatCompletionsClient, GeminiClient, VisionClient};
use crate::record::ResumeRecord;

/// Extract a structured resume record from an uploaded document.
///
/// Tiers run strictly in priority order — vision, text tier A, text
/// tier B, regex — and the first success wins. Never returns an error.
pub async fn extract_resume(doc: &UploadedDocument, config: &PipelineConfig) -> ResumeRecord {
    extract_resume_with_cancel(doc, config, CancellationToken::new()).await
}

/// [`extract_resume`] with a caller-owned cancellation token.
///
/// Cancelling the token aborts in-flight provider calls and the vision
/// tier's backoff wait; remaining AI tiers are skipped. The run still
/// terminates through the regex tier, so a cancelled extraction returns
/// a (possibly sparse) record rather than hanging or erroring — callers
/// superseding an old upload with a new one just drop the old future's
/// result.
pub async fn extract_resume_with_cancel(
    doc: &UploadedDocument,
    config: &PipelineConfig,
    cancel: CancellationToken,
) -> ResumeRecord {
    info!(
        "extracting resume from '{}' ({}, {} bytes)",
        doc.filename,
        doc.media_type,
        doc.len()
    );

    let mut tiers: Vec<Box<dyn Tier>> = Vec::new();
    if let Some(client) = resolve_vision_client(config) {
        tiers.push(Box::new(VisionTier::new(client)));
    }
    if let Some(client) = resolve_text_client_a(config) {
        tiers.push(Box::new(TextModelTier::primary(
            client,
            config.text_tier_a.clone(),
        )));
    }
    if let Some(client) = resolve_text_client_b(config) {
        tiers.push(Box::new(TextModelTier::secondary(
            client,
            config.text_tier_b.clone(),
        )));
    }
    tiers.push(Box::new(OfflineTier));
    debug!(
        "tier order: {:?}",
        tiers.iter().map(|t| t.name()).collect::<Vec<_>>()
    );

    let mut ctx = RunContext::new(doc, config, cancel);
    for tier in &tiers {
        let started = Instant::now();
        let outcome = tier.attempt(&mut ctx).await;
        ExtractionAttempt::record(tier.name(), &tier.provider(), &outcome, started);

        if let TierOutcome::Success(value) = outcome {
            return ResumeRecord::from_value(&value);
        }
    }

    // The regex tier always returns Success, so this is only reachable
    // if the tier list were somehow empty.
    ResumeRecord::fallback("An error occurred while processing your resume.")
}

// ── Provider resolution ──────────────────────────────────────────────────
//
// An injected client always wins over a credential; a credential builds
// the real reqwest-backed client. `None` means the tier is not entered
// at all.

fn resolve_vision_client(config: &PipelineConfig) -> Option<Arc<dyn VisionClient>> {
    if let Some(client) = &config.vision_client {
        return Some(Arc::clone(client));
    }
    valid_key(&config.gemini_api_key)
        .map(|key| Arc::new(GeminiClient::new(key)) as Arc<dyn VisionClient>)
}

fn resolve_text_client_a(config: &PipelineConfig) -> Option<Arc<dyn ChatClient>> {
    if let Some(client) = &config.text_client_a {
        return Some(Arc::clone(client));
    }
    valid_key(&config.do_api_key).map(|key| {
        Arc::new(ChatCompletionsClient::new(
            config.text_tier_a.provider.clone(),
            config.text_tier_a.endpoint.clone(),
            key,
        )) as Arc<dyn ChatClient>
    })
}

fn resolve_text_client_b(config: &PipelineConfig) -> Option<Arc<dyn ChatClient>> {
    if let Some(client) = &config.text_client_b {
        return Some(Arc::clone(client));
    }
    valid_key(&config.nvidia_api_key).map(|key| {
        Arc::new(ChatCompletionsClient::new(
            config.text_tier_b.provider.clone(),
            config.text_tier_b.endpoint.clone(),
            key,
        )) as Arc<dyn ChatClient>
    })
}
