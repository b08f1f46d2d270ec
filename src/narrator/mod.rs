// Narrator: one simulation step against the model
//
// The narrator prompt goes out first. Its reply is split into a world-state
// overview and expert briefs; every expert is then consulted concurrently and
// the step fails if any consultation fails.

pub mod parser;
pub mod prompts;

pub use parser::{parse_narration, ExpertBrief, Narration, EXPERT_DELIMITER};
pub use prompts::{build_expert_prompt, build_narrator_prompt};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::constants::{DEFAULT_MAX_TOKENS, MAX_EXPERTS};
use crate::config::Config;
use crate::ground_truth::GroundTruth;
use crate::providers::{LlmProvider, ProviderRequest, ProviderResponse};
use crate::snapshot::Snapshot;

/// Generation settings shared by narrator and expert requests
#[derive(Debug, Clone)]
pub struct NarratorSettings {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub max_experts: usize,
}

impl Default for NarratorSettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            max_experts: MAX_EXPERTS,
        }
    }
}

impl From<&Config> for NarratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_experts: config.max_experts,
        }
    }
}

/// Everything the narrator needs for one step
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub week: u32,
    pub date: NaiveDate,
    pub ground_truth: &'a [GroundTruth],
    pub previous: Option<&'a Snapshot>,
}

/// One prompt/response pair, kept for the exchange log
#[derive(Debug, Clone)]
pub struct Exchange {
    /// "narrator" or "expert:<name>"
    pub role: String,
    pub prompt: String,
    pub response: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ExpertReport {
    pub name: String,
    pub brief: String,
    pub response: String,
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub narration: Narration,
    pub expert_reports: Vec<ExpertReport>,
    pub exchanges: Vec<Exchange>,
}

pub struct Narrator {
    provider: Arc<dyn LlmProvider>,
    settings: NarratorSettings,
}

impl Narrator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: NarratorSettings) -> Self {
        Self { provider, settings }
    }

    /// Run the narrator prompt, then consult every expert it names
    pub async fn step(&self, input: StepInput<'_>) -> Result<StepOutcome> {
        let prompt = build_narrator_prompt(
            input.week,
            input.date,
            input.ground_truth,
            input.previous,
            self.settings.max_experts,
        );

        info!(
            week = input.week,
            prompt_chars = prompt.len(),
            provider = self.provider.name(),
            "Consulting narrator"
        );

        let response = self
            .send(&prompt, prompts::NARRATOR_SYSTEM)
            .await
            .context("Narrator request failed")?;

        let narration = parse_narration(&response.text, self.settings.max_experts);
        info!(
            experts = narration.experts.len(),
            names = ?narration.experts.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            "Narrator replied"
        );

        let mut exchanges = vec![Exchange {
            role: "narrator".to_string(),
            prompt,
            response: response.text.clone(),
            model: response.model.clone(),
        }];

        let consulted = self
            .consult_experts(&narration, input.week, input.date)
            .await?;

        let mut expert_reports = Vec::with_capacity(consulted.len());
        for (report, exchange) in consulted {
            expert_reports.push(report);
            exchanges.push(exchange);
        }

        Ok(StepOutcome {
            narration,
            expert_reports,
            exchanges,
        })
    }

    /// Issue every expert request at once and wait for all of them
    ///
    /// Results come back in brief order. One failure fails the batch.
    pub async fn consult_experts(
        &self,
        narration: &Narration,
        week: u32,
        date: NaiveDate,
    ) -> Result<Vec<(ExpertReport, Exchange)>> {
        if narration.experts.is_empty() {
            return Ok(Vec::new());
        }

        info!(count = narration.experts.len(), "Consulting experts");

        let calls = narration.experts.iter().map(|expert| async move {
            let prompt = build_expert_prompt(expert, &narration.overview, week, date);
            let response = self
                .send(&prompt, prompts::EXPERT_SYSTEM)
                .await
                .with_context(|| format!("Expert '{}' request failed", expert.name))?;

            info!(expert = %expert.name, chars = response.text.len(), "Expert replied");

            let exchange = Exchange {
                role: format!("expert:{}", expert.name),
                prompt,
                response: response.text.clone(),
                model: response.model,
            };
            let report = ExpertReport {
                name: expert.name.clone(),
                brief: expert.brief.clone(),
                response: response.text,
            };
            Ok::<_, anyhow::Error>((report, exchange))
        });

        try_join_all(calls).await
    }

    async fn send(&self, prompt: &str, system: &str) -> Result<ProviderResponse> {
        let request = ProviderRequest::new(prompt)
            .with_system(system)
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature);

        let response = self.provider.send_message(&request).await?;

        if response.is_truncated() {
            warn!(
                provider = %response.provider,
                max_tokens = self.settings.max_tokens,
                "Response hit the token limit and is truncated"
            );
        }

        Ok(response)
    }
}
