//! Google Generative Language client for the vision tier.
//!
//! Calls `models/{model}:generateContent` with the extraction instruction
//! followed by every page image as an inline base64 part. Gemini signals
//! throttling three ways — HTTP 429, a `RESOURCE_EXHAUSTED` status, or a
//! "quota" message — and all three are folded into
//! [`ProviderError::RateLimited`] so the vision tier can apply its fixed
//! backoff-and-retry rule.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{classify_transport, PageImage, ProviderError, VisionClient};
use crate::sanitize::snippet;

const PROVIDER: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Vision client backed by the Generative Language REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (self-hosted proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData(InlineData<'a>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl VisionClient for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        instruction: &str,
        pages: &[PageImage],
    ) -> Result<String, ProviderError> {
        let mut parts = vec![Part::Text(instruction)];
        parts.extend(pages.iter().map(|page| {
            Part::InlineData(InlineData {
                mime_type: &page.media_type,
                data: &page.data,
            })
        }));

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!("Gemini request: {} with {} image part(s)", model, pages.len());

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateRequest {
                contents: vec![Content { parts }],
            })
            .send()
            .await
            .map_err(|e| classify_transport(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429
                || body.contains("RESOURCE_EXHAUSTED")
                || body.contains("quota")
            {
                return Err(ProviderError::RateLimited {
                    provider: PROVIDER.to_string(),
                });
            }
            return Err(ProviderError::Api {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                detail: snippet(&body, 200).to_string(),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| classify_transport(PROVIDER, e))?;

        let text: String = body
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse {
                provider: PROVIDER.to_string(),
            });
        }
        Ok(text)
    }
}
