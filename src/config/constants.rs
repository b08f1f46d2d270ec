// Project-wide constants
//
// Centralised here so defaults have one source of truth.
// Import via `use crate::config::constants::*;`.

/// Default maximum tokens per model request.
pub const DEFAULT_MAX_TOKENS: u32 = 8000;

/// Largest token limit accepted (Gemini takes a signed 32-bit count).
pub const MAX_TOKENS_LIMIT: u32 = i32::MAX as u32;

/// Hard ceiling on expert sub-prompts per simulation step.
pub const MAX_EXPERTS: usize = 5;

/// Default number of attempts for a single model request (1 = no retry).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ground truth directory used when neither CLI nor config names one.
pub const DEFAULT_GROUND_TRUTH_DIR: &str = "ground_truth";

/// Config file location, relative to the home directory.
pub const CONFIG_RELATIVE_PATH: &str = ".worldsim/config.toml";

/// Default models per provider.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

/// Environment variables.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_PROVIDER: &str = "WORLDSIM_PROVIDER";
pub const ENV_MODEL: &str = "WORLDSIM_MODEL";
