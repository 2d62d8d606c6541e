//! The vision tier: rasterised pages → vision model → JSON.
//!
//! Highest-priority tier because it reads the resume the way a human
//! does — broken text layers, multi-column layouts, and scanned images
//! all survive rasterisation, where text extraction would return
//! garbage.
//!
//! ## Retry discipline
//!
//! Two model identifiers are attempted in order, and the primary is
//! always exhausted (including its rate-limit retry) before the
//! secondary is touched. Within a model:
//!
//! * rate-limit-class error → wait the fixed backoff, retry the **same**
//!   model once more;
//! * any other error, or an unparseable response → abandon the model
//!   immediately and move to the next.
//!
//! The backoff sleep races the run's cancellation token, so an
//! abandoned request never pins its task for the full backoff window.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{raster, RunContext, Tier, TierOutcome};
use crate::error::TierError;
use crate::providers::VisionClient;
use crate::prompts::VISION_PROMPT;
use crate::sanitize::recover_json;

pub struct VisionTier {
    client: Arc<dyn VisionClient>,
}

impl VisionTier {
    pub fn new(client: Arc<dyn VisionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tier for VisionTier {
    fn name(&self) -> &'static str {
        "vision"
    }

    fn provider(&self) -> String {
        "gemini".to_string()
    }

    async fn attempt(&self, ctx: &mut RunContext<'_>) -> TierOutcome {
        if ctx.cancelled() {
            return TierOutcome::Skip("cancelled");
        }

        // Rasterisation failure of any kind means "vision unavailable";
        // no retry, straight to the next tier.
        let pages = match raster::rasterize(ctx.doc, ctx.config).await {
            Ok(pages) => pages,
            Err(e) => {
                warn!("vision tier unavailable: {}", e);
                return TierOutcome::Fail(e.into());
            }
        };

        let attempts_per_model = ctx.config.vision_attempts_per_model;
        let backoff = ctx.config.rate_limit_backoff;
        let mut last_err: Option<TierError> = None;

        for model in &ctx.config.vision_models {
            let mut attempt = 0;
            while attempt < attempts_per_model {
                attempt += 1;
                if ctx.cancelled() {
                    return TierOutcome::Fail(TierError::Cancelled);
                }
                debug!("vision: {} (attempt {}/{})", model, attempt, attempts_per_model);

                match self.client.generate(model, VISION_PROMPT, &pages).await {
                    Ok(text) => match recover_json(&text) {
                        Some(value) => {
                            debug!("vision success with {}", model);
                            return TierOutcome::Success(value);
                        }
                        None => {
                            last_err = Some(TierError::InvalidResponse {
                                provider: model.clone(),
                            });
                            break; // unusable output, next model
                        }
                    },
                    Err(e) if e.is_rate_limit() && attempt < attempts_per_model => {
                        warn!(
                            "vision {} rate limited, waiting {}s before retry",
                            model,
                            backoff.as_secs()
                        );
                        last_err = Some(e.into());
                        tokio::select! {
                            _ = tokio::time::sleep(backoff) => {}
                            _ = ctx.cancel.cancelled() => {
                                return TierOutcome::Fail(TierError::Cancelled);
                            }
                        }
                        // retry the same model
                    }
                    Err(e) => {
                        warn!("vision {} attempt {} failed: {}", model, attempt, e);
                        last_err = Some(e.into());
                        break; // next model
                    }
                }
            }
        }

        TierOutcome::Fail(TierError::Exhausted {
            last: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no vision models configured".to_string()),
        })
    }
}
