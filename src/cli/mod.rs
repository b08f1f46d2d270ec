// CLI module
// Argument parsing and the single `worldsim` command

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;

use crate::config::{load_config, ConfigOverrides, ProviderKind};
use crate::providers::create_provider;
use crate::simulation::{RunOptions, RunOutput, Simulation};

#[derive(Parser, Debug)]
#[command(name = "worldsim")]
#[command(about = "Advance an LLM-narrated world simulation by one week")]
#[command(version)]
pub struct Cli {
    /// Directory for the snapshot and report (created if absent)
    #[arg(long, value_name = "DIR")]
    pub output: PathBuf,

    /// Previous snapshot to continue from (JSON written by worldsim, or any text file)
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Directory of ground-truth text files [default: ground_truth]
    #[arg(long = "ground-truth", value_name = "DIR")]
    pub ground_truth: Option<PathBuf>,

    /// Model API: gemini or claude
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// Model name override
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum experts consulted per week (1-5)
    #[arg(long, value_name = "N")]
    pub max_experts: Option<usize>,

    /// Config file [default: ~/.worldsim/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            provider: self.provider,
            model: self.model.clone(),
            max_experts: self.max_experts,
            ground_truth_dir: self.ground_truth.clone(),
        }
    }
}

/// Load configuration, build the provider and run one simulation step
pub async fn execute(cli: Cli) -> Result<RunOutput> {
    let config = load_config(&cli.overrides())?;
    let provider = create_provider(&config)?;

    let options = RunOptions {
        output_dir: cli.output,
        snapshot: cli.snapshot,
        ground_truth_dir: config.ground_truth_dir.clone(),
        today: Local::now().date_naive(),
    };

    Simulation::new(config, provider).run(&options).await
}
