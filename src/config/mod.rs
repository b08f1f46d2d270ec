// Configuration module
// Public interface for configuration loading

pub mod constants;
mod loader;
mod settings;

pub use loader::{load_config, load_config_with_env, ConfigOverrides};
pub use settings::{Config, ProviderKind};
