// World-state snapshots
//
// A snapshot is the text one simulation step produced, plus the week counter
// and the ground truth it was built from. Snapshots written by this tool are
// JSON; any other file is accepted as freeform text and used as-is.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::ground_truth::{infer_date, GroundTruth};

/// Reference to a ground-truth file that fed a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub sha256: String,
}

impl From<&GroundTruth> for SourceRef {
    fn from(record: &GroundTruth) -> Self {
        Self {
            path: record.relative_path.clone(),
            date: record.date,
            sha256: record.digest(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulation step counter (0 for imported freeform text)
    pub week: u32,

    /// Date the snapshot was produced
    pub date: NaiveDate,

    /// World-state text, passed verbatim to the next step
    pub content: String,

    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

pub fn snapshot_file_name(date: NaiveDate) -> String {
    format!("snapshot-{}.json", date.format("%Y-%m-%d"))
}

pub fn report_file_name(date: NaiveDate) -> String {
    format!("report-{}.md", date.format("%Y-%m-%d"))
}

impl Snapshot {
    pub fn new(week: u32, date: NaiveDate, content: String, sources: Vec<SourceRef>) -> Self {
        Self {
            week,
            date,
            content,
            sources,
        }
    }

    /// Week number following `previous` (1 when starting fresh)
    pub fn next_week(previous: Option<&Snapshot>) -> u32 {
        previous.map(|s| s.week.saturating_add(1)).unwrap_or(1)
    }

    /// Load a snapshot written by this tool, or wrap any text file as one
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;

        if let Ok(snapshot) = serde_json::from_str::<Snapshot>(&raw) {
            info!(
                week = snapshot.week,
                date = %snapshot.date,
                "Resuming from snapshot {}",
                path.display()
            );
            return Ok(snapshot);
        }

        debug!("{} is not a JSON snapshot, using it as freeform text", path.display());

        let date = match path.file_name().and_then(|n| n.to_str()).and_then(infer_date) {
            Some(date) => date,
            None => modified_date(path)?,
        };

        info!(
            date = %date,
            chars = raw.len(),
            "Resuming from freeform snapshot {}",
            path.display()
        );

        Ok(Self::new(0, date, raw, Vec::new()))
    }

    /// Write as pretty JSON into `dir`, returning the file path
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(snapshot_file_name(self.date));
        let json = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(path)
    }
}

fn modified_date(path: &Path) -> Result<NaiveDate> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
    Ok(DateTime::<Local>::from(modified).date_naive())
}
