// Markdown report and next-step snapshot text

use chrono::NaiveDate;

use crate::ground_truth::GroundTruth;
use crate::narrator::StepOutcome;
use crate::snapshot::Snapshot;

/// Inputs for rendering a step report
pub struct ReportContext<'a> {
    pub week: u32,
    pub date: NaiveDate,
    pub outcome: &'a StepOutcome,
    pub ground_truth: &'a [GroundTruth],
    pub previous: Option<&'a Snapshot>,
    pub provider: &'a str,
    pub model: &'a str,
}

/// Render the human-readable Markdown report for one step
pub fn render_report(ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();

    out.push_str(&format!("# World Simulation Report: Week {}\n\n", ctx.week));
    out.push_str(&format!("- **Date:** {}\n", ctx.date));
    out.push_str(&format!("- **Model:** {} ({})\n", ctx.model, ctx.provider));
    match ctx.previous {
        Some(prev) => out.push_str(&format!(
            "- **Continues from:** week {} ({})\n",
            prev.week, prev.date
        )),
        None => out.push_str("- **Continues from:** new simulation\n"),
    }

    out.push_str("\n## Narrator\n\n");
    if ctx.outcome.narration.overview.is_empty() {
        out.push_str("_The narrator gave no overview._\n");
    } else {
        out.push_str(&ctx.outcome.narration.overview);
        out.push('\n');
    }

    out.push_str("\n## Expert Reports\n\n");
    if ctx.outcome.expert_reports.is_empty() {
        out.push_str("_No experts were consulted this week._\n");
    }
    for report in &ctx.outcome.expert_reports {
        out.push_str(&format!("### {}\n\n", report.name));
        if !report.brief.is_empty() {
            out.push_str(&format!("> **Brief:** {}\n\n", quote_lines(&report.brief)));
        }
        out.push_str(report.response.trim());
        out.push_str("\n\n");
    }

    out.push_str("## Sources\n\n");
    if ctx.ground_truth.is_empty() {
        out.push_str("_No ground truth files._\n");
    }
    for record in ctx.ground_truth {
        out.push_str(&format!(
            "- `{}` ({})\n",
            record.relative_path,
            record.date_label()
        ));
    }

    out
}

/// Text carried forward as the next step's snapshot
pub fn compose_snapshot_content(outcome: &StepOutcome) -> String {
    let mut content = outcome.narration.overview.clone();

    for report in &outcome.expert_reports {
        if !content.is_empty() {
            content.push_str("\n\n");
        }
        content.push_str(&format!("### {}\n\n{}", report.name, report.response.trim()));
    }

    content.push('\n');
    content
}

/// Continue a blockquote across line breaks
fn quote_lines(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("\n> ")
}
