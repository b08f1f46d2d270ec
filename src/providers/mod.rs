// LLM provider abstraction
//
// One trait over the model APIs the simulation can narrate with. A run uses a
// single provider for every request, narrator and experts alike.

use anyhow::Result;
use async_trait::async_trait;

pub mod claude;
pub mod factory;
pub mod gemini;
pub mod retry;
pub mod types;

pub use claude::ClaudeProvider;
pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use types::{ProviderRequest, ProviderResponse};

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a prompt and wait for the complete response
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Provider name (e.g., "gemini", "claude")
    fn name(&self) -> &str;

    /// Model used when the request does not name one
    fn default_model(&self) -> &str;
}
