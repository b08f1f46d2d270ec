// Anthropic Messages API provider implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::retry::with_retry;
use super::types::{ProviderRequest, ProviderResponse};
use super::LlmProvider;
use crate::config::constants::{DEFAULT_CLAUDE_MODEL, DEFAULT_MAX_RETRIES};
use crate::errors::WorldSimError;

const CLAUDE_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 180;

#[derive(Clone)]
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    max_attempts: u32,
}

impl ClaudeProvider {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: CLAUDE_BASE_URL.to_string(),
            default_model: DEFAULT_CLAUDE_MODEL.to_string(),
            max_attempts: DEFAULT_MAX_RETRIES,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    fn to_claude_request<'a>(&'a self, request: &'a ProviderRequest) -> MessageRequest<'a> {
        MessageRequest {
            model: request.model_or(&self.default_model),
            max_tokens: request.max_tokens,
            system: request.system.as_deref(),
            temperature: request.temperature,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        }
    }

    /// Send a single message request (no retry)
    async fn send_message_once(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = self.to_claude_request(request);

        tracing::debug!(
            model = body.model,
            prompt_chars = request.prompt.len(),
            "Sending request to Claude API"
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Claude API")?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(WorldSimError::Api {
                provider: "Claude".to_string(),
                status: status.as_u16(),
                body: error_body,
            }
            .into());
        }

        let message_response: MessageResponse = response
            .json()
            .await
            .context("Failed to parse Claude API response")?;

        message_response.into_provider_response()
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        with_retry(self.max_attempts, || self.send_message_once(request)).await
    }

    fn name(&self) -> &str {
        "claude"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// Claude API types

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

/// Only text blocks matter here; anything else is ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl MessageResponse {
    fn into_provider_response(self) -> Result<ProviderResponse> {
        let text = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(WorldSimError::EmptyResponse("Claude".to_string()).into());
        }

        Ok(ProviderResponse {
            text,
            model: self.model,
            stop_reason: self.stop_reason,
            provider: "claude".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let provider = ClaudeProvider::new("test-key".to_string());
        assert!(provider.is_ok());
    }

    #[test]
    fn test_message_request_creation() {
        let provider = ClaudeProvider::new("test-key".to_string()).unwrap();
        let request = ProviderRequest::new("Hello").with_system("Be brief");
        let body = serde_json::to_value(provider.to_claude_request(&request)).unwrap();

        assert_eq!(body["model"], DEFAULT_CLAUDE_MODEL);
        assert_eq!(body["system"], "Be brief");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_text_blocks_joined_and_others_skipped() {
        let response: MessageResponse = serde_json::from_str(
            r#"{"model":"claude-x","stop_reason":"end_turn","content":[
                {"type":"text","text":"one"},
                {"type":"thinking","thinking":"..."},
                {"type":"text","text":"two"}]}"#,
        )
        .unwrap();
        let parsed = response.into_provider_response().unwrap();
        assert_eq!(parsed.text, "one\ntwo");
        assert_eq!(parsed.provider, "claude");
    }
}
