// Simulation run: load inputs, narrate one week, write snapshot and report

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::ground_truth::load_ground_truth;
use crate::logging::ExchangeLogger;
use crate::narrator::{Narrator, NarratorSettings, StepInput};
use crate::providers::LlmProvider;
use crate::report::{compose_snapshot_content, render_report, ReportContext};
use crate::snapshot::{report_file_name, Snapshot, SourceRef};

/// Per-invocation options (mostly from the command line)
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory for the snapshot and report, created if absent
    pub output_dir: PathBuf,

    /// Prior snapshot to continue from
    pub snapshot: Option<PathBuf>,

    pub ground_truth_dir: PathBuf,

    /// Date stamped on the output files
    pub today: NaiveDate,
}

/// What a run wrote
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub week: u32,
    pub snapshot_path: PathBuf,
    pub report_path: PathBuf,
    pub experts: usize,
}

pub struct Simulation {
    config: Config,
    provider: Arc<dyn LlmProvider>,
    narrator: Narrator,
}

impl Simulation {
    pub fn new(config: Config, provider: Arc<dyn LlmProvider>) -> Self {
        let narrator = Narrator::new(provider.clone(), NarratorSettings::from(&config));
        Self {
            config,
            provider,
            narrator,
        }
    }

    /// Advance the simulation by one week
    pub async fn run(&self, options: &RunOptions) -> Result<RunOutput> {
        fs::create_dir_all(&options.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                options.output_dir.display()
            )
        })?;

        let ground_truth = load_ground_truth(&options.ground_truth_dir)?;

        let previous = options
            .snapshot
            .as_deref()
            .map(Snapshot::load)
            .transpose()?;

        let week = Snapshot::next_week(previous.as_ref());
        info!(week, date = %options.today, "Starting simulation step");

        let outcome = self
            .narrator
            .step(StepInput {
                week,
                date: options.today,
                ground_truth: &ground_truth,
                previous: previous.as_ref(),
            })
            .await?;

        let snapshot = Snapshot::new(
            week,
            options.today,
            compose_snapshot_content(&outcome),
            ground_truth.iter().map(SourceRef::from).collect(),
        );
        let snapshot_path = snapshot.save(&options.output_dir)?;

        let model = outcome
            .exchanges
            .first()
            .map(|e| e.model.as_str())
            .unwrap_or_else(|| self.provider.default_model());

        let report = render_report(&ReportContext {
            week,
            date: options.today,
            outcome: &outcome,
            ground_truth: &ground_truth,
            previous: previous.as_ref(),
            provider: self.provider.name(),
            model,
        });
        let report_path = options.output_dir.join(report_file_name(options.today));
        fs::write(&report_path, report)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;

        if let Some(log_path) = &self.config.exchange_log {
            let mut logger = ExchangeLogger::new(log_path.clone())?;
            logger.log_step(week, &outcome.exchanges);
            logger.flush()?;
        }

        info!(
            week,
            snapshot = %snapshot_path.display(),
            report = %report_path.display(),
            "Simulation step complete"
        );

        Ok(RunOutput {
            week,
            snapshot_path,
            report_path,
            experts: outcome.expert_reports.len(),
        })
    }
}
