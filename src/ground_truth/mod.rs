// Ground truth loading
//
// Every regular file under the ground-truth directory is factual input for the
// narrator. Contents are kept exactly as read; the only derived value is a
// date guessed from the file name.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::WorldSimError;

/// One user-supplied text file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundTruth {
    /// Path on disk
    pub path: PathBuf,

    /// Path relative to the ground-truth root, `/`-separated
    pub relative_path: String,

    /// Raw file content, unmodified
    pub content: String,

    /// Date inferred from the file name
    pub date: Option<NaiveDate>,
}

impl GroundTruth {
    /// SHA-256 of the content, hex encoded
    pub fn digest(&self) -> String {
        content_digest(&self.content)
    }

    /// ISO date or "undated"
    pub fn date_label(&self) -> String {
        self.date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "undated".to_string())
    }
}

pub fn content_digest(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Date patterns tried in order. The first one that matches decides.
static DATE_PATTERNS: Lazy<Vec<(Regex, bool)>> = Lazy::new(|| {
    vec![
        // 2024-03-15, 2024_03_15, 2024.03.15
        (
            Regex::new(r"(?:^|[^0-9])(\d{4})[-_.](\d{2})[-_.](\d{2})(?:[^0-9]|$)").unwrap(),
            true,
        ),
        // 20240315
        (
            Regex::new(r"(?:^|[^0-9])(\d{4})(\d{2})(\d{2})(?:[^0-9]|$)").unwrap(),
            true,
        ),
        // 2024-03 (first of month)
        (
            Regex::new(r"(?:^|[^0-9])(\d{4})[-_.](\d{2})(?:[^0-9]|$)").unwrap(),
            false,
        ),
    ]
});

/// Guess a date from a file name
pub fn infer_date(file_name: &str) -> Option<NaiveDate> {
    for (pattern, has_day) in DATE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(file_name) {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = if *has_day { caps[3].parse().ok()? } else { 1 };
            return NaiveDate::from_ymd_opt(year, month, day);
        }
    }
    None
}

/// Recursively load every text file under `dir`
///
/// Hidden files and directories are skipped, as are files that are not
/// valid UTF-8. Dated files come first in date order, then undated ones;
/// ties are broken by relative path.
pub fn load_ground_truth(dir: &Path) -> Result<Vec<GroundTruth>> {
    if !dir.is_dir() {
        return Err(WorldSimError::GroundTruthMissing(dir.display().to_string()).into());
    }

    let mut records = Vec::new();

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(err).with_context(|| {
                    format!("Failed to walk ground truth directory {}", dir.display())
                });
            }
            Err(err) => {
                // Dangling symlinks and link loops
                warn!("Skipping unreadable ground truth entry: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read ground truth file {}", path.display()))?;

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                warn!("Skipping non-UTF-8 ground truth file: {}", path.display());
                continue;
            }
        };

        let relative_path = relative_label(dir, path);
        let date = entry.file_name().to_str().and_then(infer_date);

        debug!(
            file = %relative_path,
            bytes = content.len(),
            date = ?date,
            "Loaded ground truth"
        );

        records.push(GroundTruth {
            path: path.to_path_buf(),
            relative_path,
            content,
            date,
        });
    }

    records.sort_by(|a, b| {
        (a.date.is_none(), a.date, &a.relative_path).cmp(&(b.date.is_none(), b.date, &b.relative_path))
    });

    if records.is_empty() {
        warn!("No ground truth files found in {}", dir.display());
    } else {
        info!(
            files = records.len(),
            dated = records.iter().filter(|r| r.date.is_some()).count(),
            "Loaded ground truth from {}",
            dir.display()
        );
    }

    Ok(records)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

fn relative_label(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn infers_separated_dates() {
        assert_eq!(infer_date("2024-03-15-news.txt"), ymd(2024, 3, 15));
        assert_eq!(infer_date("report_2023_12_01.md"), ymd(2023, 12, 1));
        assert_eq!(infer_date("notes.2022.07.04.txt"), ymd(2022, 7, 4));
    }

    #[test]
    fn infers_compact_and_month_dates() {
        assert_eq!(infer_date("brief-20240102.txt"), ymd(2024, 1, 2));
        assert_eq!(infer_date("2024-05 summary.txt"), ymd(2024, 5, 1));
    }

    #[test]
    fn invalid_or_missing_dates_are_none() {
        assert_eq!(infer_date("2024-02-30.txt"), None);
        assert_eq!(infer_date("readme.txt"), None);
        assert_eq!(infer_date("build-123456789.log"), None);
    }

    #[test]
    fn loads_recursively_in_date_order() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("sub/deeper")).unwrap();
        fs::write(tmp.path().join("undated.txt"), "u").unwrap();
        fs::write(tmp.path().join("sub/2024-02-01.txt"), "b").unwrap();
        fs::write(tmp.path().join("sub/deeper/2024-01-01.txt"), "a").unwrap();

        let records = load_ground_truth(tmp.path()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.relative_path.as_str()).collect();
        assert_eq!(
            names,
            vec!["sub/deeper/2024-01-01.txt", "sub/2024-02-01.txt", "undated.txt"]
        );
    }

    #[test]
    fn skips_hidden_and_binary_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(tmp.path().join(".DS_Store"), "x").unwrap();
        fs::write(tmp.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(tmp.path().join("facts.txt"), "fact").unwrap();

        let records = load_ground_truth(tmp.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative_path, "facts.txt");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("facts.txt"), "fact").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.txt"), tmp.path().join("link.txt"))
            .unwrap();

        let records = load_ground_truth(tmp.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative_path, "facts.txt");
    }

    #[test]
    fn empty_directory_loads_nothing() {
        let tmp = TempDir::new().unwrap();
        let records = load_ground_truth(tmp.path()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_ground_truth(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorldSimError>(),
            Some(WorldSimError::GroundTruthMissing(_))
        ));
    }

    #[test]
    fn digest_is_stable_sha256() {
        assert_eq!(
            content_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
