// Provider factory
//
// Creates the LLM provider a run will use from the loaded configuration

use anyhow::Result;
use std::sync::Arc;

use super::claude::ClaudeProvider;
use super::gemini::GeminiProvider;
use super::LlmProvider;
use crate::config::{Config, ProviderKind};

/// Create the configured `LlmProvider`
pub fn create_provider(config: &Config) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::Gemini => {
            let mut provider = GeminiProvider::new(config.api_key.clone())?
                .with_max_attempts(config.max_retries);
            if let Some(m) = &config.model {
                provider = provider.with_model(m.clone());
            }
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url.clone());
            }
            Arc::new(provider)
        }

        ProviderKind::Claude => {
            let mut provider = ClaudeProvider::new(config.api_key.clone())?
                .with_max_attempts(config.max_retries);
            if let Some(m) = &config.model {
                provider = provider.with_model(m.clone());
            }
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url.clone());
            }
            Arc::new(provider)
        }
    };

    tracing::info!(
        provider = provider.name(),
        model = provider.default_model(),
        "Created LLM provider"
    );

    Ok(provider)
}
