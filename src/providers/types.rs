// Provider-agnostic request/response types

use serde::{Deserialize, Serialize};

/// A single-turn prompt sent to a provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderRequest {
    /// User prompt text
    pub prompt: String,

    /// Model name (empty = provider default)
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// System instruction (sent natively where the API supports it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Temperature (provider default when None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ProviderRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: String::new(),
            max_tokens: 4096,
            system: None,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Model to use, falling back to the provider's default
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.model.is_empty() {
            default
        } else {
            &self.model
        }
    }
}

/// Text response from a provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderResponse {
    /// Concatenated text parts of the reply
    pub text: String,

    /// Model that generated the response
    pub model: String,

    /// Why the model stopped generating
    pub stop_reason: Option<String>,

    /// Provider name (e.g., "gemini", "claude")
    pub provider: String,
}

impl ProviderResponse {
    /// True when generation hit the token ceiling and the text is cut short
    pub fn is_truncated(&self) -> bool {
        matches!(
            self.stop_reason.as_deref(),
            Some("max_tokens") | Some("MAX_TOKENS")
        )
    }
}
