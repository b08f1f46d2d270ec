// Configuration structs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::constants::*;
use crate::errors::WorldSimError;

/// Which model API narrates the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Claude,
}

impl ProviderKind {
    /// Environment variables consulted for the API key, in priority order
    pub fn api_key_env_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Gemini => &[ENV_GEMINI_API_KEY, ENV_GOOGLE_API_KEY],
            ProviderKind::Claude => &[ENV_ANTHROPIC_API_KEY],
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => DEFAULT_GEMINI_MODEL,
            ProviderKind::Claude => DEFAULT_CLAUDE_MODEL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = WorldSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            other => Err(WorldSimError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Model API used for every request in a run
    pub provider: ProviderKind,

    /// API key for `provider`
    pub api_key: String,

    /// Model override (provider default when None)
    pub model: Option<String>,

    /// Custom API endpoint (tests and proxies)
    pub base_url: Option<String>,

    /// Maximum tokens to generate per request
    pub max_tokens: u32,

    /// Sampling temperature (provider default when None)
    pub temperature: Option<f32>,

    /// Upper bound on expert sub-prompts per step (1..=5)
    pub max_experts: usize,

    /// Attempts per request, including the first one
    pub max_retries: u32,

    /// Directory of ground-truth text files
    pub ground_truth_dir: PathBuf,

    /// Optional JSONL log of every prompt/response exchange
    pub exchange_log: Option<PathBuf>,
}

impl Config {
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: None,
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            max_experts: MAX_EXPERTS,
            max_retries: DEFAULT_MAX_RETRIES,
            ground_truth_dir: PathBuf::from(DEFAULT_GROUND_TRUTH_DIR),
            exchange_log: None,
        }
    }

    /// The model actually sent to the provider
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> Result<(), WorldSimError> {
        if self.api_key.trim().is_empty() {
            return Err(WorldSimError::MissingApiKey {
                provider: self.provider.to_string(),
                env_var: self.provider.api_key_env_vars()[0],
            });
        }

        if self.max_experts == 0 || self.max_experts > MAX_EXPERTS {
            return Err(WorldSimError::InvalidConfig {
                field: "max_experts",
                reason: format!("must be between 1 and {}, got {}", MAX_EXPERTS, self.max_experts),
            });
        }

        if self.max_tokens == 0 || self.max_tokens > MAX_TOKENS_LIMIT {
            return Err(WorldSimError::InvalidConfig {
                field: "max_tokens",
                reason: format!(
                    "must be between 1 and {}, got {}",
                    MAX_TOKENS_LIMIT, self.max_tokens
                ),
            });
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(WorldSimError::InvalidConfig {
                    field: "temperature",
                    reason: format!("must be between 0.0 and 2.0, got {}", t),
                });
            }
        }

        if self.max_retries == 0 {
            return Err(WorldSimError::InvalidConfig {
                field: "max_retries",
                reason: "must be at least 1".to_string(),
            });
        }

        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(WorldSimError::InvalidConfig {
                    field: "model",
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}
