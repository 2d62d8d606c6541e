//! The text tiers: extracted document text → chat completion → JSON.
//!
//! Tiers A and B share one implementation parameterised by endpoint
//! config and message style; they differ only in provider, prompt cap,
//! deadline, and how the parser instruction is delivered (tier A sends a
//! system/user pair, tier B folds everything into a single user turn).
//!
//! A parsed object is accepted only when it carries a non-empty `name` —
//! a syntactically valid but semantically empty `{}` from a confused
//! model must not short-circuit the remaining tiers. (This knowingly
//! rejects resumes whose name the model could not read; the check lives
//! in one place, [`has_name`], should that trade-off change.)

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{RunContext, Tier, TierOutcome};
use crate::config::TextTierConfig;
use crate::error::TierError;
use crate::prompts::{text_primary_prompt, text_secondary_prompt, TEXT_SYSTEM_PROMPT};
use crate::providers::{ChatClient, ChatMessage, ChatRequest};
use crate::sanitize::{recover_json, snippet};

/// How the extraction instruction reaches the model.
enum MessageStyle {
    /// System prompt plus user prompt (tier A).
    SystemUser,
    /// Everything in one user turn (tier B).
    UserOnly,
}

pub struct TextModelTier {
    name: &'static str,
    client: Arc<dyn ChatClient>,
    tier: TextTierConfig,
    style: MessageStyle,
    top_p: Option<f32>,
}

impl TextModelTier {
    /// Tier A wiring: DigitalOcean-style system/user pair.
    pub fn primary(client: Arc<dyn ChatClient>, tier: TextTierConfig) -> Self {
        Self {
            name: "text-a",
            client,
            tier,
            style: MessageStyle::SystemUser,
            top_p: None,
        }
    }

    /// Tier B wiring: NVIDIA-style single user turn with `top_p` pinned.
    pub fn secondary(client: Arc<dyn ChatClient>, tier: TextTierConfig) -> Self {
        Self {
            name: "text-b",
            client,
            tier,
            style: MessageStyle::UserOnly,
            top_p: Some(1.0),
        }
    }
}

#[async_trait]
impl Tier for TextModelTier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn provider(&self) -> String {
        self.tier.provider.clone()
    }

    async fn attempt(&self, ctx: &mut RunContext<'_>) -> TierOutcome {
        if ctx.cancelled() {
            return TierOutcome::Skip("cancelled");
        }

        let min_chars = ctx.config.min_text_chars;
        let temperature = ctx.config.temperature;

        let text = ctx.document_text().await;
        if text.trim().len() <= min_chars {
            debug!("{}: insufficient text ({} chars)", self.name, text.trim().len());
            return TierOutcome::Skip("insufficient text");
        }

        let messages = match self.style {
            MessageStyle::SystemUser => vec![
                ChatMessage::system(TEXT_SYSTEM_PROMPT),
                ChatMessage::user(text_primary_prompt(text, self.tier.prompt_cap)),
            ],
            MessageStyle::UserOnly => vec![ChatMessage::user(text_secondary_prompt(
                text,
                self.tier.prompt_cap,
            ))],
        };

        let request = ChatRequest {
            model: self.tier.model.clone(),
            messages,
            max_tokens: self.tier.max_tokens,
            temperature,
            top_p: self.top_p,
        };

        debug!("{}: trying {} ({})", self.name, self.tier.provider, self.tier.model);

        let response = tokio::select! {
            _ = ctx.cancel.cancelled() => return TierOutcome::Fail(TierError::Cancelled),
            r = tokio::time::timeout(self.tier.timeout, self.client.complete(&request)) => r,
        };

        let content = match response {
            Err(_) => {
                warn!("{} ({}) timed out", self.name, self.tier.provider);
                return TierOutcome::Fail(TierError::Timeout {
                    secs: self.tier.timeout.as_secs(),
                });
            }
            Ok(Err(e)) => {
                warn!("{} ({}) failed: {}", self.name, self.tier.provider, e);
                return TierOutcome::Fail(e.into());
            }
            Ok(Ok(content)) => content,
        };

        match recover_json(&content) {
            Some(value) if has_name(&value) => {
                debug!("{} success ({})", self.name, self.tier.provider);
                TierOutcome::Success(value)
            }
            _ => {
                warn!(
                    "{} ({}) returned invalid JSON. Raw (first 200 chars): {}",
                    self.name,
                    self.tier.provider,
                    snippet(&content, 200)
                );
                TierOutcome::Fail(TierError::InvalidResponse {
                    provider: self.tier.provider.clone(),
                })
            }
        }
    }
}

/// Acceptance check for text-tier output: the object must carry a
/// non-empty `name` string.
fn has_name(value: &Value) -> bool {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(|name| !name.is_empty())
        .unwrap_or(false)
}
