// Splitting the narrator's reply into overview and expert sections
//
// The narrator is asked to start each section with a literal delimiter line.
// Models drift from instructions, so when the delimiter is missing a looser
// regex accepts other heading levels, bold labels and dash separators.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::constants::MAX_EXPERTS;

pub const EXPERT_DELIMITER: &str = "### Expert:";

static LOOSE_EXPERT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?[ \t]*expert[ \t]*(?:\*\*)?[ \t]*[:\-–][ \t]*(?P<name>[^\n]*?)[ \t]*\r?$",
    )
    .unwrap()
});

/// A domain the narrator wants a specialist to examine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpertBrief {
    pub name: String,
    pub brief: String,
}

/// The narrator's reply, split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
    /// World-state prose before the first expert section
    pub overview: String,
    pub experts: Vec<ExpertBrief>,
}

/// Parse a narrator reply into overview and at most `max_experts` expert briefs
pub fn parse_narration(reply: &str, max_experts: usize) -> Narration {
    let (overview, raw_sections) = match split_on_delimiter(reply) {
        Some(split) => split,
        None => split_on_regex(reply).unwrap_or_else(|| (reply.to_string(), Vec::new())),
    };

    let limit = max_experts.min(MAX_EXPERTS);
    let mut seen = HashSet::new();
    let mut experts = Vec::new();

    for (raw_name, brief) in raw_sections {
        let name = clean_name(&raw_name);
        if name.is_empty() {
            debug!("Dropping expert section with empty name");
            continue;
        }
        if !seen.insert(name.to_lowercase()) {
            debug!(expert = %name, "Dropping duplicate expert section");
            continue;
        }
        if experts.len() == limit {
            warn!(
                expert = %name,
                limit,
                "Narrator requested more experts than allowed, dropping"
            );
            continue;
        }
        experts.push(ExpertBrief {
            name,
            brief: brief.trim().to_string(),
        });
    }

    Narration {
        overview: overview.trim().to_string(),
        experts,
    }
}

type Sections = (String, Vec<(String, String)>);

/// Split on lines beginning with the literal delimiter
fn split_on_delimiter(reply: &str) -> Option<Sections> {
    // Leading newline so a delimiter on the very first line is found too
    let text = format!("\n{}", reply);
    let marker = format!("\n{}", EXPERT_DELIMITER);

    let mut parts = text.split(marker.as_str());
    let overview = parts.next().unwrap_or_default().to_string();

    let sections: Vec<(String, String)> = parts
        .map(|section| match section.split_once('\n') {
            Some((name, body)) => (name.to_string(), body.to_string()),
            None => (section.to_string(), String::new()),
        })
        .collect();

    if sections.is_empty() {
        None
    } else {
        Some((overview, sections))
    }
}

/// Best-effort split on anything that looks like an expert header
fn split_on_regex(reply: &str) -> Option<Sections> {
    let headers: Vec<(usize, usize, String)> = LOOSE_EXPERT_HEADER
        .captures_iter(reply)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.name("name")?.as_str().to_string();
            Some((whole.start(), whole.end(), name))
        })
        .collect();

    if headers.is_empty() {
        return None;
    }

    debug!(
        sections = headers.len(),
        "Expert delimiter missing, using loose header match"
    );

    let overview = reply[..headers[0].0].to_string();
    let sections = headers
        .iter()
        .enumerate()
        .map(|(i, (_, end, name))| {
            let body_end = headers.get(i + 1).map(|h| h.0).unwrap_or(reply.len());
            (name.clone(), reply[*end..body_end].to_string())
        })
        .collect();

    Some((overview, sections))
}

fn clean_name(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '*' || c == '#' || c == '"' || c == '\'' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_literal_delimiter() {
        let reply = "The world turns.\nRivers rise.\n\n### Expert: Economy\nWatch grain.\n\n### Expert: Politics\nWatch the council.\n";
        let narration = parse_narration(reply, 5);

        assert_eq!(narration.overview, "The world turns.\nRivers rise.");
        assert_eq!(
            narration.experts,
            vec![
                ExpertBrief {
                    name: "Economy".to_string(),
                    brief: "Watch grain.".to_string()
                },
                ExpertBrief {
                    name: "Politics".to_string(),
                    brief: "Watch the council.".to_string()
                },
            ]
        );
    }

    #[test]
    fn delimiter_on_first_line() {
        let narration = parse_narration("### Expert: Climate\nStorms.", 5);
        assert_eq!(narration.overview, "");
        assert_eq!(narration.experts.len(), 1);
        assert_eq!(narration.experts[0].name, "Climate");
    }

    #[test]
    fn no_sections_means_no_experts() {
        let narration = parse_narration("  Just prose about the world.  \n", 5);
        assert_eq!(narration.overview, "Just prose about the world.");
        assert!(narration.experts.is_empty());
    }

    #[test]
    fn loose_headers_are_accepted() {
        let reply = "Overview here.\n\n**Expert: Trade**\nShipping lanes.\n\n## expert - Health\nThe fever spreads.\n\nEXPERT: Military\nBorder forts.";
        let narration = parse_narration(reply, 5);

        assert_eq!(narration.overview, "Overview here.");
        let names: Vec<&str> = narration.experts.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Trade", "Health", "Military"]);
        assert_eq!(narration.experts[1].brief, "The fever spreads.");
    }

    #[test]
    fn bold_label_with_name_outside() {
        let narration = parse_narration("World.\n**Expert:** Energy\nCoal shortage.", 5);
        assert_eq!(narration.experts[0].name, "Energy");
        assert_eq!(narration.experts[0].brief, "Coal shortage.");
    }

    #[test]
    fn expertise_is_not_a_header() {
        let narration = parse_narration("Expertise: none needed.\nCalm week.", 5);
        assert!(narration.experts.is_empty());
    }

    #[test]
    fn caps_at_limit_and_hard_maximum() {
        let reply: String = (1..=7)
            .map(|i| format!("### Expert: Domain{}\nbrief {}\n", i, i))
            .collect();

        assert_eq!(parse_narration(&reply, 2).experts.len(), 2);
        let narration = parse_narration(&reply, 50);
        assert_eq!(narration.experts.len(), MAX_EXPERTS);
        assert_eq!(narration.experts[4].name, "Domain5");
    }

    #[test]
    fn duplicates_and_empty_names_dropped() {
        let reply = "x\n### Expert: Economy\na\n### Expert:   \nb\n### Expert: economy\nc\n### Expert: **Law**\nd";
        let narration = parse_narration(reply, 5);
        let names: Vec<&str> = narration.experts.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Economy", "Law"]);
        assert_eq!(narration.experts[0].brief, "a");
    }
}
