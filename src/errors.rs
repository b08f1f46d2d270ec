// Domain errors
//
// Most of the crate propagates `anyhow::Error` with context. These are the
// failures a caller may want to match on (tests do).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldSimError {
    #[error("No API key for provider '{provider}'. Set {env_var} or add api_key to the config file")]
    MissingApiKey {
        provider: String,
        env_var: &'static str,
    },

    #[error("Unknown provider '{0}' (expected 'gemini' or 'claude')")]
    UnknownProvider(String),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("{provider} API request failed (status {status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{0} returned an empty response")]
    EmptyResponse(String),

    #[error("Ground truth directory not found: {0}")]
    GroundTruthMissing(String),
}

impl WorldSimError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Rate limits and server-side failures are transient; other 4xx
    /// responses will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorldSimError::Api { status, .. } => *status == 429 || *status >= 500,
            WorldSimError::EmptyResponse(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let api = |status| WorldSimError::Api {
            provider: "gemini".to_string(),
            status,
            body: String::new(),
        };
        assert!(api(429).is_retryable());
        assert!(api(503).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!api(401).is_retryable());
        assert!(!WorldSimError::UnknownProvider("x".into()).is_retryable());
    }

    #[test]
    fn test_missing_key_message_names_env_var() {
        let err = WorldSimError::MissingApiKey {
            provider: "claude".to_string(),
            env_var: "ANTHROPIC_API_KEY",
        };
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }
}
