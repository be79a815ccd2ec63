//! Decision report for a migration run
//! Author: kartik4091
//! Created: 2025-06-05
//!
//! Every decision the reconcilers make is numbered, narrated on the console
//! and kept here so it can be written out once the run is over.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::types::{ChangeSummary, LoadStats};

pub mod generator;

pub use generator::ReportGenerator;

/// Report configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub output_path: PathBuf,
    pub format: ReportFormat,
}

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    PlainText,
    Json,
}

/// Report severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportSeverity {
    Info,
    Warning,
    Error,
}

/// What happened to a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Target already had the desired value
    Matched,
    /// Target value replaced
    Changed,
    /// Value synthesized from a renamed setting
    Renamed,
    /// Setting is obsolete on the target
    Obsolete,
    /// Setting had no placeholder and was appended
    Appended,
    /// Setting could not be carried over
    Skipped,
    /// An operation failed
    Failed,
}

/// Individual numbered decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub seq: usize,
    pub timestamp: String,
    pub severity: ReportSeverity,
    pub decision: Decision,
    pub setting: Option<String>,
    pub message: String,
}

/// Complete report data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportData {
    pub entries: Vec<ReportEntry>,
    pub metadata: ReportMetadata,
}

/// Report metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generation_time: Option<String>,
    pub tool_version: String,
    pub source: String,
    pub target: String,
    pub dry_run: bool,
    pub load: LoadStats,
    pub changes: ChangeSummary,
}

impl ReportData {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            metadata: ReportMetadata {
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
        }
    }

    /// Records a decision, narrates it and returns its sequence number.
    pub fn record(&mut self, decision: Decision, setting: Option<&str>, message: String) -> usize {
        let seq = self.entries.len() + 1;
        let severity = match decision {
            Decision::Failed => ReportSeverity::Error,
            Decision::Skipped | Decision::Obsolete => ReportSeverity::Warning,
            _ => ReportSeverity::Info,
        };

        match severity {
            ReportSeverity::Info => info!("{:>4}: {}", seq, message),
            ReportSeverity::Warning => warn!("{:>4}: {}", seq, message),
            ReportSeverity::Error => error!("{:>4}: {}", seq, message),
        }

        self.entries.push(ReportEntry {
            seq,
            timestamp: chrono::Utc::now().to_rfc3339(),
            severity,
            decision,
            setting: setting.map(str::to_string),
            message,
        });
        seq
    }

    pub fn count(&self, decision: Decision) -> usize {
        self.entries.iter().filter(|e| e.decision == decision).count()
    }

    pub fn finalize(&mut self, load: LoadStats, changes: ChangeSummary) {
        self.metadata.load = load;
        self.metadata.changes = changes;
        self.metadata.generation_time = Some(chrono::Utc::now().to_rfc3339());
    }
}
