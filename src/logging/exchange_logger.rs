// Exchange log: every prompt/response pair of a run as JSONL

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use crate::narrator::Exchange;

/// A single logged exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique ID for this entry
    pub id: String,

    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,

    /// Simulation week the exchange belongs to
    pub week: u32,

    /// "narrator" or "expert:<name>"
    pub role: String,

    /// Model that produced the response
    pub model: String,

    pub prompt: String,

    pub response: String,
}

impl LogEntry {
    pub fn new(week: u32, exchange: &Exchange) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            week,
            role: exchange.role.clone(),
            model: exchange.model.clone(),
            prompt: exchange.prompt.clone(),
            response: exchange.response.clone(),
        }
    }
}

/// Buffers entries and appends them to a JSONL file
pub struct ExchangeLogger {
    log_path: PathBuf,
    buffer: Vec<LogEntry>,
}

impl ExchangeLogger {
    /// Create a new logger, creating the parent directory if needed
    pub fn new(log_path: PathBuf) -> Result<Self> {
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create exchange log directory")?;
            }
        }

        Ok(Self {
            log_path,
            buffer: Vec::new(),
        })
    }

    /// Queue every exchange of a step
    pub fn log_step(&mut self, week: u32, exchanges: &[Exchange]) {
        self.buffer
            .extend(exchanges.iter().map(|exchange| LogEntry::new(week, exchange)));
    }

    /// Append buffered entries to disk
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        debug!("Flushing {} exchange log entries", self.buffer.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open exchange log {}", self.log_path.display()))?;

        for entry in &self.buffer {
            let json = serde_json::to_string(entry).context("Failed to serialize log entry")?;
            writeln!(file, "{}", json).context("Failed to write log entry")?;
        }

        self.buffer.clear();
        Ok(())
    }
}

impl Drop for ExchangeLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!("Failed to flush exchange log on drop: {:#}", e);
        }
    }
}
