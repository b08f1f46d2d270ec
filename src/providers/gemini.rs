// Google Gemini API provider implementation
//
// Gemini takes `contents` of role/parts pairs and returns `candidates`;
// the system prompt travels separately as `systemInstruction`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::retry::with_retry;
use super::types::{ProviderRequest, ProviderResponse};
use super::LlmProvider;
use crate::config::constants::{DEFAULT_GEMINI_MODEL, DEFAULT_MAX_RETRIES};
use crate::errors::WorldSimError;

const REQUEST_TIMEOUT_SECS: u64 = 180;
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini API provider
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    max_attempts: u32,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            default_model: DEFAULT_GEMINI_MODEL.to_string(),
            max_attempts: DEFAULT_MAX_RETRIES,
        })
    }

    /// Create with custom default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Point at a different endpoint (proxy or mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Convert ProviderRequest to Gemini API format
    fn to_gemini_request(&self, request: &ProviderRequest) -> GeminiRequest {
        let model = request.model_or(&self.default_model).to_string();

        let system_instruction = request.system.as_ref().map(|system| GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: system.clone(),
            }],
        });

        GeminiRequest {
            model,
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction,
            generation_config: Some(GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: Some(i32::try_from(request.max_tokens).unwrap_or(i32::MAX)),
            }),
        }
    }

    /// Convert Gemini response to ProviderResponse
    fn from_gemini_response(
        &self,
        response: GeminiResponse,
        model: String,
    ) -> Result<ProviderResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| WorldSimError::EmptyResponse("Gemini".to_string()))?;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(WorldSimError::EmptyResponse("Gemini".to_string()).into());
        }

        Ok(ProviderResponse {
            text,
            model,
            stop_reason: candidate.finish_reason,
            provider: "gemini".to_string(),
        })
    }

    /// Send a single message request (no retry)
    async fn send_message_once(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let gemini_request = self.to_gemini_request(request);
        let model = gemini_request.model.clone();

        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        tracing::debug!(
            model = %model,
            prompt_chars = request.prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&gemini_request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(WorldSimError::Api {
                provider: "Gemini".to_string(),
                status: status.as_u16(),
                body: error_body,
            }
            .into());
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        self.from_gemini_response(gemini_response, model)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        with_retry(self.max_attempts, || self.send_message_once(request)).await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// Gemini API types

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip)]
    model: String, // Used in URL, not in body
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>, // "user" or "model"
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_provider_creation() {
        let provider = GeminiProvider::new("test-key".to_string());
        assert!(provider.is_ok());
    }

    #[test]
    fn test_provider_name_and_default_model() {
        let provider = GeminiProvider::new("test-key".to_string()).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.default_model(), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_custom_model() {
        let provider = GeminiProvider::new("test-key".to_string())
            .unwrap()
            .with_model("gemini-pro");
        assert_eq!(provider.default_model(), "gemini-pro");
    }

    #[test]
    fn test_request_body_shape() {
        let provider = GeminiProvider::new("k".to_string()).unwrap();
        let request = ProviderRequest::new("Narrate")
            .with_system("You are the narrator")
            .with_max_tokens(100)
            .with_temperature(Some(0.9));
        let body = serde_json::to_value(provider.to_gemini_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Narrate");
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are the narrator"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 100);
        assert!(body.get("model").is_none());
    }

    #[test]
    fn test_parts_are_joined() {
        let provider = GeminiProvider::new("k".to_string()).unwrap();
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello, "},{"text":"world"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        let parsed = provider
            .from_gemini_response(response, "gemini-1.5-pro".to_string())
            .unwrap();
        assert_eq!(parsed.text, "Hello, world");
        assert_eq!(parsed.stop_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_blocked_response_is_empty_error() {
        let provider = GeminiProvider::new("k".to_string()).unwrap();
        let response: GeminiResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        let err = provider
            .from_gemini_response(response, "m".to_string())
            .unwrap_err();
        assert!(err.downcast_ref::<WorldSimError>().is_some());
    }
}
