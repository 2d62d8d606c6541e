//! OpenAI-compatible chat-completion client for the text tiers.
//!
//! Both text providers (DigitalOcean serverless inference and NVIDIA's
//! integrate endpoint) expose the same `/v1/chat/completions` contract
//! with bearer-token auth:
//!
//! `{model, messages:[{role,content}], max_tokens, temperature}` →
//! `{choices:[{message:{content}}]}`
//!
//! so one client serves both tiers, parameterised only by endpoint and
//! credential.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{classify_transport, ChatClient, ProviderError};
use crate::sanitize::snippet;

/// Chat client for any OpenAI-compatible completion endpoint.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    provider: String,
}

impl ChatCompletionsClient {
    /// `provider` is a short label used in errors and logs
    /// (e.g. `"digitalocean"`, `"nvidia"`).
    pub fn new(
        provider: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            provider: provider.into(),
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

/// One message in a chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// A chat-completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ChatClient for ChatCompletionsClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        debug!("{} request: model {}", self.provider, request.model);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_transport(&self.provider, e))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited {
                provider: self.provider.clone(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: self.provider.clone(),
                status: status.as_u16(),
                detail: snippet(&body, 200).to_string(),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| classify_transport(&self.provider, e))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(ProviderError::EmptyResponse {
                provider: self.provider.clone(),
            });
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialises_contract_shape() {
        let req = ChatRequest {
            model: "alibaba-qwen3-32b".into(),
            messages: vec![
                ChatMessage::system("You are a resume parser."),
                ChatMessage::user("Parse this."),
            ],
            max_tokens: 3000,
            temperature: 0.1,
            top_p: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "alibaba-qwen3-32b");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Parse this.");
        assert_eq!(json["max_tokens"], 3000);
        // top_p omitted entirely when unset
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn request_includes_top_p_when_set() {
        let req = ChatRequest {
            model: "moonshotai/kimi-k2.5".into(),
            messages: vec![ChatMessage::user("hi")],
            max_tokens: 4000,
            temperature: 0.1,
            top_p: Some(1.0),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["top_p"], 1.0);
    }

    #[test]
    fn response_deserialises_first_choice() {
        let raw = r#"{"choices":[{"message":{"content":"{\"name\":\"J\"}"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.choices[0].message.as_ref().unwrap().content, "{\"name\":\"J\"}");
    }

    #[test]
    fn response_tolerates_empty_choices() {
        let resp: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.choices.is_empty());
    }
}
