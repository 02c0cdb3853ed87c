//! Run status reporting
//!
//! Provides a simple API for surfacing pipeline state to the operator:
//! - Current phase (Fetching, Extracting, Truncating, Loading)
//! - Progress (current/total with a label)
//! - A serializable summary of the finished run

use serde::Serialize;
use std::path::Path;

use crate::error::{Error, Result};

/// Pipeline phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetching,
    Extracting,
    Truncating,
    Loading,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Fetching => write!(f, "Downloading dump"),
            Phase::Extracting => write!(f, "Extracting archive"),
            Phase::Truncating => write!(f, "Truncating tables"),
            Phase::Loading => write!(f, "Loading tables"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Trait for reporter implementations - allows both logging and silent/test modes
pub trait Reporter {
    fn set_phase(&mut self, phase: Phase);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
}

/// Forwards phases and progress to `tracing`
#[derive(Debug, Default)]
pub struct LogReporter {
    /// Last progress decile logged, so long transfers log ten lines, not thousands
    last_decile: Option<u64>,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for LogReporter {
    fn set_phase(&mut self, phase: Phase) {
        self.last_decile = None;
        tracing::info!(phase = %phase, "phase started");
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        if total == 0 {
            tracing::trace!(current, "{}", label.into());
            return;
        }
        let decile = current.saturating_mul(10) / total;
        if self.last_decile != Some(decile) {
            self.last_decile = Some(decile);
            tracing::info!(percent = decile * 10, "{}", label.into());
        }
    }
}

/// Silent reporter implementation for testing and library use
#[derive(Debug, Default)]
pub struct SilentReporter;

impl SilentReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for SilentReporter {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
}

/// Per-table outcome of a load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows_loaded: u64,
    pub sentinels_inserted: u64,
    /// Upstream rows dropped because they reuse a sentinel id
    pub reserved_dropped: u64,
    pub placeholders_inserted: u64,
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub url: Option<String>,
    pub archive_bytes: Option<u64>,
    pub source_root: Option<String>,
    pub commit_mode: String,
    pub tables: Vec<TableReport>,
    pub elapsed_secs: f64,
}

impl RunReport {
    pub fn total_rows(&self) -> u64 {
        self.tables
            .iter()
            .map(|t| t.rows_loaded + t.sentinels_inserted + t.placeholders_inserted)
            .sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::io("Failed to serialize run report", e.into()))?;
        std::fs::write(path, json)
            .map_err(|e| Error::io(format!("Failed to write run report: {:?}", path), e))
    }
}
