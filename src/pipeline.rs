//! Settings Migration Pipeline
//! Author: kartik4091
//! Created: 2025-06-05
//!
//! Load the old settings, reconcile them into the new target, report.
//! Only an invalid configuration stops the run; every other failure is
//! logged and the run still finishes with its counts.

use tracing::{error, info, instrument, warn};

use crate::{
    config::{MigrationConfig, SourceConfig, TargetConfig},
    error::Result,
    loader::SourceLoader,
    reconciler::{reconcile_file, reconcile_server},
    report::{Decision, ReportData, ReportGenerator},
    server::PgServer,
    types::{ChangeSummary, LoadStats, SettingsMap},
};

/// Counts produced by a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub load: LoadStats,
    pub changes: ChangeSummary,
}

/// Orchestrates loading and reconciliation for one source and one target
#[derive(Debug)]
pub struct Pipeline {
    config: MigrationConfig,
    report_data: ReportData,
}

impl Pipeline {
    pub fn new(config: MigrationConfig) -> Self {
        let mut report_data = ReportData::new();
        report_data.metadata.source = config.source_label();
        report_data.metadata.target = config.target_label();
        report_data.metadata.dry_run = config.dry_run;

        Self {
            config,
            report_data,
        }
    }

    /// Runs the migration end to end.
    #[instrument(skip(self))]
    pub async fn execute(&mut self) -> Result<MigrationSummary> {
        self.config.validate()?;

        info!("🚦 Loading settings from {}", self.config.source_label());
        let (mut settings, load) = self.load_source().await.into_parts();
        info!("📊 Non-default settings found: {}", load.non_default);

        info!("🚦 Applying settings to {}", self.config.target_label());
        let changes = self.apply_target(&mut settings).await;

        self.report_data.finalize(load, changes);
        self.write_report();

        Ok(MigrationSummary { load, changes })
    }

    async fn load_source(&self) -> SourceLoader {
        let mut loader = SourceLoader::new();
        match &self.config.source {
            SourceConfig::File { path, auto_path } => {
                loader.load_files(path, auto_path.as_deref());
            }
            SourceConfig::Server { conninfo } => {
                loader.load_conninfo(conninfo).await;
            }
        }
        loader
    }

    async fn apply_target(&mut self, settings: &mut SettingsMap) -> ChangeSummary {
        let dry_run = self.config.dry_run;
        let report = &mut self.report_data;

        match &self.config.target {
            TargetConfig::File { path } => match reconcile_file(path, settings, report, dry_run) {
                Ok(summary) => summary,
                Err(e) => {
                    report.record(
                        Decision::Failed,
                        None,
                        format!("Cannot update {}: {}", path.display(), e),
                    );
                    ChangeSummary::default()
                }
            },
            TargetConfig::Server { conninfo } => {
                let mut server = match PgServer::connect(conninfo).await {
                    Ok(server) => server,
                    Err(e) => {
                        report.record(
                            Decision::Failed,
                            None,
                            format!("Cannot connect to target server: {}", e),
                        );
                        return ChangeSummary::default();
                    }
                };

                let summary = match reconcile_server(&mut server, settings, report, dry_run).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        report.record(Decision::Failed, None, e.to_string());
                        ChangeSummary::default()
                    }
                };

                if let Err(e) = server.close().await {
                    error!("❌ Error closing target connection: {}", e);
                }

                if summary.has_changes() && !dry_run {
                    warn!("⚠️  Settings written with ALTER SYSTEM live in postgresql.auto.conf and override postgresql.conf");
                    warn!("   Run SELECT pg_reload_conf() or restart the server to activate them");
                }
                summary
            }
        }
    }

    fn write_report(&self) {
        let Some(report_config) = &self.config.report else { return };
        match ReportGenerator::generate(&self.report_data, report_config) {
            Ok(()) => info!("📋 Report generated: {}", report_config.output_path.display()),
            Err(e) => error!("❌ Failed to generate report: {}", e),
        }
    }

    pub fn get_report_data(&self) -> &ReportData {
        &self.report_data
    }
}
