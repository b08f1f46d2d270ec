// Prompt templates for the narrator and its experts

use chrono::NaiveDate;

use super::parser::{ExpertBrief, EXPERT_DELIMITER};
use crate::ground_truth::GroundTruth;
use crate::snapshot::Snapshot;

pub const NARRATOR_SYSTEM: &str = "You are the Narrator of a rolling world simulation. \
Each turn you advance the world by one week. Ground truth documents are facts and must never \
be contradicted. The previous snapshot is the state of the world you continue from. Write in \
clear, concrete prose.";

pub const EXPERT_SYSTEM: &str = "You are a domain expert consulted by the Narrator of a rolling \
world simulation. Analyse only your domain, stay consistent with the world state you are given, \
and be specific about actors, quantities and consequences.";

/// Build the narrator prompt for one simulation step
///
/// Ground-truth and snapshot text are inserted exactly as loaded.
pub fn build_narrator_prompt(
    week: u32,
    date: NaiveDate,
    ground_truth: &[GroundTruth],
    previous: Option<&Snapshot>,
    max_experts: usize,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Narrate week {} of the world simulation ({}).\n\n",
        week, date
    ));

    prompt.push_str("## Ground truth\n\n");
    if ground_truth.is_empty() {
        prompt.push_str("No ground truth files were supplied.\n");
    } else {
        prompt.push_str(
            "The following files are factual. Everything you write must be consistent with them.\n\n",
        );
        for record in ground_truth {
            prompt.push_str(&format!(
                "=== {} ({}) ===\n",
                record.relative_path,
                record.date_label()
            ));
            push_block(&mut prompt, &record.content);
        }
    }

    match previous {
        Some(snapshot) => {
            prompt.push_str(&format!(
                "\n## Previous snapshot (week {}, {})\n\n",
                snapshot.week, snapshot.date
            ));
            push_block(&mut prompt, &snapshot.content);
        }
        None => {
            prompt.push_str("\n## Previous snapshot\n\n");
            prompt.push_str(
                "None. This is the first week of the simulation; establish the initial state of the world.\n",
            );
        }
    }

    prompt.push_str("\n## Instructions\n\n");
    prompt.push_str(
        "1. Write the world state at the end of this week as prose. Advance events from the \
         previous snapshot and weave in the ground truth.\n",
    );
    prompt.push_str(&format!(
        "2. Then name up to {} domains (for example economy, politics, climate) where specialist \
         analysis would deepen the simulation. Start each on its own line with exactly\n\n\
         {} <domain>\n\n\
         followed by two or three sentences telling that expert what to examine.\n",
        max_experts, EXPERT_DELIMITER
    ));
    prompt.push_str("3. Put nothing after the last domain section.\n");

    prompt
}

/// Build the prompt for a single expert consultation
pub fn build_expert_prompt(
    expert: &ExpertBrief,
    overview: &str,
    week: u32,
    date: NaiveDate,
) -> String {
    let brief = if expert.brief.trim().is_empty() {
        "(no brief given; cover the most significant developments in your domain)"
    } else {
        expert.brief.as_str()
    };

    format!(
        "Expert brief: {name}\n\
         Week {week} ({date})\n\n\
         ## Current world state\n\n\
         {overview}\n\n\
         ## Your brief\n\n\
         {brief}\n\n\
         Respond with your analysis of how the {name} domain evolves this week. \
         Do not restate the world state.\n",
        name = expert.name,
        week = week,
        date = date,
        overview = overview.trim(),
        brief = brief,
    )
}

/// Append `text` unchanged, then a newline if it did not end with one
fn push_block(prompt: &mut String, text: &str) {
    prompt.push_str(text);
    if !text.ends_with('\n') {
        prompt.push('\n');
    }
}
