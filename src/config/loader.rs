// Configuration loader
// Loads settings from ~/.worldsim/config.toml, then environment, then CLI overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::*;
use super::settings::{Config, ProviderKind};

/// Values supplied on the command line. They win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub max_experts: Option<usize>,
    pub ground_truth_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    provider: Option<ProviderKind>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    max_experts: Option<usize>,
    #[serde(default)]
    max_retries: Option<u32>,
    #[serde(default)]
    ground_truth_dir: Option<PathBuf>,
    #[serde(default)]
    exchange_log: Option<PathBuf>,
}

/// Load configuration from the process environment
pub fn load_config(overrides: &ConfigOverrides) -> Result<Config> {
    load_config_with_env(overrides, |key| std::env::var(key).ok())
}

/// Load configuration with an injectable environment lookup
pub fn load_config_with_env<F>(overrides: &ConfigOverrides, env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match &overrides.config_path {
        // An explicitly named file must exist
        Some(path) => read_toml(path)?
            .with_context(|| format!("Config file not found: {}", path.display()))?,
        None => match default_config_path() {
            Some(path) => read_toml(&path)?.unwrap_or_default(),
            None => TomlConfig::default(),
        },
    };

    let env_nonempty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let provider = match overrides.provider {
        Some(p) => p,
        None => match env_nonempty(ENV_PROVIDER) {
            Some(name) => name.parse::<ProviderKind>()?,
            None => file.provider.unwrap_or_default(),
        },
    };

    // The file's key belongs to the file's provider
    let file_provider = file.provider.unwrap_or_default();
    let api_key = provider
        .api_key_env_vars()
        .iter()
        .find_map(|var| env_nonempty(*var))
        .or(file.api_key.filter(|_| file_provider == provider))
        .unwrap_or_default();

    let mut config = Config::new(provider, api_key);

    config.model = overrides
        .model
        .clone()
        .or_else(|| env_nonempty(ENV_MODEL))
        .or(file.model);
    config.base_url = file.base_url;
    if let Some(max_tokens) = file.max_tokens {
        config.max_tokens = max_tokens;
    }
    config.temperature = file.temperature;
    if let Some(max_experts) = overrides.max_experts.or(file.max_experts) {
        config.max_experts = max_experts;
    }
    if let Some(max_retries) = file.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(dir) = overrides.ground_truth_dir.clone().or(file.ground_truth_dir) {
        config.ground_truth_dir = dir;
    }
    config.exchange_log = file.exchange_log;

    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::debug!(
        provider = %config.provider,
        model = config.effective_model(),
        max_experts = config.max_experts,
        "Configuration loaded"
    );

    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_RELATIVE_PATH))
}

fn read_toml(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let parsed: TomlConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(Some(parsed))
}
