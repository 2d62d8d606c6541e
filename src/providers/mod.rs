//! Outbound AI provider clients.
//!
//! The pipeline talks to providers through two narrow traits so that
//! tests can substitute fakes and the tier logic stays independent of
//! any vendor SDK:
//!
//! * [`VisionClient`] — a text instruction plus ordered page images in,
//!   free-form text out.
//! * [`ChatClient`] — an OpenAI-compatible chat-completion request in,
//!   the first choice's message content out.
//!
//! Both real implementations are plain `reqwest` clients. Rate-limit
//! classification happens here, at the provider boundary, because each
//! vendor signals it differently; the tiers only need
//! [`ProviderError::is_rate_limit`].

pub mod chat;
pub mod gemini;

pub use chat::{ChatCompletionsClient, ChatMessage, ChatRequest};
pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

/// One rasterised page ready for a vision model: canonical media type
/// plus base64 payload.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

/// Errors from an outbound provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider throttled the request; transient, worth one retry
    /// after a backoff.
    #[error("{provider} rate limited the request")]
    RateLimited { provider: String },

    /// Network-level failure (DNS, TLS, connection reset).
    #[error("transport error from {provider}: {detail}")]
    Transport { provider: String, detail: String },

    /// The provider answered with a non-success status.
    #[error("{provider} API error (status {status}): {detail}")]
    Api {
        provider: String,
        status: u16,
        detail: String,
    },

    /// The HTTP call exceeded the client's deadline.
    #[error("request to {provider} timed out")]
    Timeout { provider: String },

    /// A success status with no usable content in the body.
    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },
}

impl ProviderError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

/// A vision-capable generative model service.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Send `instruction` plus all page images to `model`; return the
    /// model's free-form text response.
    async fn generate(
        &self,
        model: &str,
        instruction: &str,
        pages: &[PageImage],
    ) -> Result<String, ProviderError>;
}

/// A text-completion service speaking the OpenAI chat-completion shape.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run one chat completion; return the first choice's content.
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError>;
}

/// Map a `reqwest` send-level error into the provider taxonomy.
pub(crate) fn classify_transport(provider: &str, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
        }
    } else {
        ProviderError::Transport {
            provider: provider.to_string(),
            detail: err.to_string(),
        }
    }
}
