//! Report generator implementation
//! Author: kartik4091
//! Created: 2025-06-05

use std::fs;

use super::{ReportConfig, ReportData, ReportFormat};
use crate::error::Result;

/// Writes collected decisions to disk
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate(data: &ReportData, config: &ReportConfig) -> Result<()> {
        let content = Self::render(data, config.format)?;
        fs::write(&config.output_path, content)?;
        Ok(())
    }

    pub fn render(data: &ReportData, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::PlainText => Ok(Self::format_as_text(data)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        }
    }

    fn format_as_text(data: &ReportData) -> String {
        let meta = &data.metadata;
        let mut content = String::new();
        content.push_str("Settings Migration Report\n");
        content.push_str("=========================\n\n");

        content.push_str(&format!(
            "Generated: {}\n",
            meta.generation_time.as_deref().unwrap_or("Unknown")
        ));
        content.push_str(&format!("Tool Version: {}\n", meta.tool_version));
        content.push_str(&format!("Source: {}\n", meta.source));
        content.push_str(&format!("Target: {}\n", meta.target));
        if meta.dry_run {
            content.push_str("Mode: dry run (target untouched)\n");
        }
        content.push('\n');

        content.push_str("Summary:\n");
        content.push_str(&format!("- Non-default settings found: {}\n", meta.load.non_default));
        content.push_str(&format!("- Overridden while loading: {}\n", meta.load.overridden));
        content.push_str(&format!("- Already matching: {}\n", meta.changes.matched));
        content.push_str(&format!("- Changed: {}\n", meta.changes.changed));
        content.push_str(&format!("- Renamed: {}\n", meta.changes.renamed));
        content.push_str(&format!("- Obsolete: {}\n", meta.changes.obsolete));
        content.push_str(&format!("- Appended: {}\n\n", meta.changes.appended));

        content.push_str("Decisions:\n");
        content.push_str("----------\n");
        for entry in &data.entries {
            content.push_str(&format!(
                "{:>4} [{:?}] {:?}: {}\n",
                entry.seq, entry.severity, entry.decision, entry.message
            ));
        }

        content
    }
}
