//! Pipeline configuration.
//!
//! All extraction behaviour is controlled through [`PipelineConfig`],
//! built via its [`PipelineConfigBuilder`]. The config is loaded once at
//! process start and read-only afterwards; every pipeline run borrows it
//! and none mutates it, so it can be shared freely across request tasks.
//!
//! Credentials are threaded in explicitly rather than read from the
//! process environment inside the pipeline — [`PipelineConfig::from_env`]
//! exists as a convenience constructor for binaries, but tests can build
//! a config that simulates "only tier B configured" without touching
//! global state. Pre-built provider clients may also be injected and take
//! precedence over credentials, which is how the test suite substitutes
//! fakes.

use crate::providers::{ChatClient, VisionClient};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default vision model identifiers, tried in order.
pub const DEFAULT_VISION_MODELS: [&str; 2] = ["gemini-2.0-flash-lite", "gemini-2.0-flash"];

/// Endpoint and tuning for one text-completion tier.
#[derive(Debug, Clone)]
pub struct TextTierConfig {
    /// Short provider label used in logs and errors.
    pub provider: String,
    /// Full chat-completions URL.
    pub endpoint: String,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Maximum number of characters of extracted text sent to the model.
    pub prompt_cap: usize,
    /// Per-call deadline.
    pub timeout: Duration,
    /// Completion token budget.
    pub max_tokens: u32,
}

impl TextTierConfig {
    /// Tier A: DigitalOcean serverless inference. Smaller prompt cap and
    /// deadline for a smaller, faster model.
    pub fn digitalocean() -> Self {
        Self {
            provider: "digitalocean".to_string(),
            endpoint: "https://inference.do-ai.run/v1/chat/completions".to_string(),
            model: "alibaba-qwen3-32b".to_string(),
            prompt_cap: 8000,
            timeout: Duration::from_secs(45),
            max_tokens: 3000,
        }
    }

    /// Tier B: NVIDIA integrate endpoint. Larger model, larger prompt cap,
    /// double the deadline.
    pub fn nvidia() -> Self {
        Self {
            provider: "nvidia".to_string(),
            endpoint: "https://integrate.api.nvidia.com/v1/chat/completions".to_string(),
            model: "moonshotai/kimi-k2.5".to_string(),
            prompt_cap: 10_000,
            timeout: Duration::from_secs(90),
            max_tokens: 4000,
        }
    }
}

/// Process-wide extraction configuration.
#[derive(Clone)]
pub struct PipelineConfig {
    /// Gemini API key for the vision tier. Placeholder values
    /// (containing `your_`) count as absent.
    pub gemini_api_key: Option<String>,
    /// DigitalOcean API key for text tier A.
    pub do_api_key: Option<String>,
    /// NVIDIA API key for text tier B.
    pub nvidia_api_key: Option<String>,

    /// Pre-built vision client; takes precedence over `gemini_api_key`.
    pub vision_client: Option<Arc<dyn VisionClient>>,
    /// Pre-built chat client for tier A; takes precedence over `do_api_key`.
    pub text_client_a: Option<Arc<dyn ChatClient>>,
    /// Pre-built chat client for tier B; takes precedence over `nvidia_api_key`.
    pub text_client_b: Option<Arc<dyn ChatClient>>,

    /// Vision model identifiers, attempted in order (primary first).
    pub vision_models: Vec<String>,
    /// Calls allowed per vision model (the second call only happens after
    /// a rate-limit backoff). Default: 2.
    pub vision_attempts_per_model: u32,
    /// Fixed wait before retrying a rate-limited vision model. Default: 5 s.
    pub rate_limit_backoff: Duration,

    /// Page cap for rasterisation. Resumes longer than this are cut off
    /// to bound request size and vision token cost. Default: 3.
    pub max_vision_pages: usize,
    /// Base render scale passed to pdfium. Default: 1.0.
    pub raster_scale: f32,
    /// JPEG quality for rendered pages (1–100). Default: 80 — small
    /// enough to upload, legible enough for a vision model to read.
    pub jpeg_quality: u8,

    /// Sampling temperature for the text tiers. Low values keep the
    /// extraction deterministic and faithful. Default: 0.1.
    pub temperature: f32,
    /// Minimum trimmed text length before a text tier will run. Default: 10.
    pub min_text_chars: usize,

    pub text_tier_a: TextTierConfig,
    pub text_tier_b: TextTierConfig,

    /// Language hint passed to OCR. Default: "eng".
    pub ocr_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            do_api_key: None,
            nvidia_api_key: None,
            vision_client: None,
            text_client_a: None,
            text_client_b: None,
            vision_models: DEFAULT_VISION_MODELS.iter().map(|s| s.to_string()).collect(),
            vision_attempts_per_model: 2,
            rate_limit_backoff: Duration::from_secs(5),
            max_vision_pages: 3,
            raster_scale: 1.0,
            jpeg_quality: 80,
            temperature: 0.1,
            min_text_chars: 10,
            text_tier_a: TextTierConfig::digitalocean(),
            text_tier_b: TextTierConfig::nvidia(),
            ocr_language: "eng".to_string(),
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<set>"))
            .field("do_api_key", &self.do_api_key.as_ref().map(|_| "<set>"))
            .field("nvidia_api_key", &self.nvidia_api_key.as_ref().map(|_| "<set>"))
            .field("vision_client", &self.vision_client.as_ref().map(|_| "<dyn VisionClient>"))
            .field("text_client_a", &self.text_client_a.as_ref().map(|_| "<dyn ChatClient>"))
            .field("text_client_b", &self.text_client_b.as_ref().map(|_| "<dyn ChatClient>"))
            .field("vision_models", &self.vision_models)
            .field("vision_attempts_per_model", &self.vision_attempts_per_model)
            .field("rate_limit_backoff", &self.rate_limit_backoff)
            .field("max_vision_pages", &self.max_vision_pages)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read credentials from `GEMINI_API_KEY`, `DO_API_KEY`, and
    /// `NVIDIA_API_KEY`. Intended for binaries; library callers should
    /// build the config explicitly.
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            do_api_key: std::env::var("DO_API_KEY").ok(),
            nvidia_api_key: std::env::var("NVIDIA_API_KEY").ok(),
            ..Self::default()
        }
    }

    /// Whether the vision tier should be entered at all.
    pub fn vision_configured(&self) -> bool {
        self.vision_client.is_some() || valid_key(&self.gemini_api_key).is_some()
    }

    pub fn text_a_configured(&self) -> bool {
        self.text_client_a.is_some() || valid_key(&self.do_api_key).is_some()
    }

    pub fn text_b_configured(&self) -> bool {
        self.text_client_b.is_some() || valid_key(&self.nvidia_api_key).is_some()
    }
}

/// Filter out empty and placeholder ("your_…") credential values.
pub(crate) fn valid_key(key: &Option<String>) -> Option<&str> {
    key.as_deref()
        .filter(|k| !k.is_empty() && !k.contains("your_"))
}

/// Builder for [`PipelineConfig`]. Setters clamp out-of-range values
/// rather than erroring.
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini_api_key = Some(key.into());
        self
    }

    pub fn do_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.do_api_key = Some(key.into());
        self
    }

    pub fn nvidia_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.nvidia_api_key = Some(key.into());
        self
    }

    pub fn vision_client(mut self, client: Arc<dyn VisionClient>) -> Self {
        self.config.vision_client = Some(client);
        self
    }

    pub fn text_client_a(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.config.text_client_a = Some(client);
        self
    }

    pub fn text_client_b(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.config.text_client_b = Some(client);
        self
    }

    pub fn vision_models(mut self, models: Vec<String>) -> Self {
        if !models.is_empty() {
            self.config.vision_models = models;
        }
        self
    }

    pub fn vision_attempts_per_model(mut self, n: u32) -> Self {
        self.config.vision_attempts_per_model = n.max(1);
        self
    }

    pub fn rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.config.rate_limit_backoff = backoff;
        self
    }

    pub fn max_vision_pages(mut self, n: usize) -> Self {
        self.config.max_vision_pages = n.max(1);
        self
    }

    pub fn raster_scale(mut self, scale: f32) -> Self {
        self.config.raster_scale = scale.clamp(0.1, 4.0);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn text_tier_a(mut self, tier: TextTierConfig) -> Self {
        self.config.text_tier_a = tier;
        self
    }

    pub fn text_tier_b(mut self, tier: TextTierConfig) -> Self {
        self.config.text_tier_b = tier;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
