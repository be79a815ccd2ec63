//! Configuration types and validation for a migration run
//! Author: kartik4091
//! Created: 2025-06-03

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::report::ReportConfig;

/// Where the old settings come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// Old `postgresql.conf`, optionally followed by its `postgresql.auto.conf`
    File {
        path: PathBuf,
        auto_path: Option<PathBuf>,
    },
    /// Running server reporting its non-default settings
    Server { conninfo: String },
}

/// Where the settings are carried to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetConfig {
    /// New `postgresql.conf`, rewritten in place
    File { path: PathBuf },
    /// Running server updated through `ALTER SYSTEM`
    Server { conninfo: String },
}

/// Global migration config
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source: SourceConfig,
    pub target: TargetConfig,
    /// Work out every decision without touching the target
    pub dry_run: bool,
    pub report: Option<ReportConfig>,
}

impl MigrationConfig {
    pub fn new(source: SourceConfig, target: TargetConfig) -> Self {
        Self {
            source,
            target,
            dry_run: false,
            report: None,
        }
    }

    /// Rejects combinations that would make the run destroy its own input.
    pub fn validate(&self) -> Result<()> {
        if let (SourceConfig::File { path, auto_path }, TargetConfig::File { path: target }) =
            (&self.source, &self.target)
        {
            if path == target {
                return Err(Error::ConfigError(format!(
                    "old and new configuration file are the same: {}",
                    target.display()
                )));
            }
            if auto_path.as_ref() == Some(target) {
                return Err(Error::ConfigError(format!(
                    "old auto configuration file is the new configuration file: {}",
                    target.display()
                )));
            }
        }

        if let Some(report) = &self.report {
            if let TargetConfig::File { path } = &self.target {
                if &report.output_path == path {
                    return Err(Error::ConfigError(
                        "report would overwrite the new configuration file".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn source_label(&self) -> String {
        match &self.source {
            SourceConfig::File { path, auto_path: Some(auto) } => {
                format!("{} + {}", path.display(), auto.display())
            }
            SourceConfig::File { path, auto_path: None } => path.display().to_string(),
            SourceConfig::Server { .. } => "live server".to_string(),
        }
    }

    pub fn target_label(&self) -> String {
        match &self.target {
            TargetConfig::File { path } => path.display().to_string(),
            TargetConfig::Server { .. } => "live server".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportFormat;

    fn file_source(path: &str) -> SourceConfig {
        SourceConfig::File {
            path: PathBuf::from(path),
            auto_path: None,
        }
    }

    #[test]
    fn test_validate_accepts_distinct_files() {
        let config = MigrationConfig::new(
            file_source("/old/postgresql.conf"),
            TargetConfig::File { path: PathBuf::from("/new/postgresql.conf") },
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_same_file() {
        let config = MigrationConfig::new(
            file_source("/pg/postgresql.conf"),
            TargetConfig::File { path: PathBuf::from("/pg/postgresql.conf") },
        );
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_report_over_target() {
        let mut config = MigrationConfig::new(
            SourceConfig::Server { conninfo: "host=old".into() },
            TargetConfig::File { path: PathBuf::from("/new/postgresql.conf") },
        );
        config.report = Some(ReportConfig {
            output_path: PathBuf::from("/new/postgresql.conf"),
            format: ReportFormat::Json,
        });
        assert!(config.validate().is_err());
    }
}
