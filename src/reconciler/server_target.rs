//! Reconciling a live server target through `ALTER SYSTEM`

use tracing::{info, instrument};

use super::{commit, compare, resolve_for_version, Outcome, Resolution};
use crate::error::{Error, Result};
use crate::report::{Decision, ReportData};
use crate::server::{GucServer, MIN_ALTER_SYSTEM_VERSION};
use crate::types::{ChangeSummary, SettingsMap, WriteState};

/// Pushes every loaded setting to `server`.
///
/// Fails without touching the server when it predates `ALTER SYSTEM`. A
/// server error inside the loop stops it; the statements already issued stay
/// in effect and the counts so far are returned.
#[instrument(skip_all)]
pub async fn reconcile_server<S: GucServer + ?Sized>(
    server: &mut S,
    settings: &mut SettingsMap,
    report: &mut ReportData,
    dry_run: bool,
) -> Result<ChangeSummary> {
    let version = server.version_num().await?;
    if version < MIN_ALTER_SYSTEM_VERSION {
        return Err(Error::UnsupportedServerVersion {
            found: version,
            required: MIN_ALTER_SYSTEM_VERSION,
        });
    }
    info!("🗄️  Target server version {}", version);

    let mut summary = ChangeSummary::default();
    if let Err(e) = apply_all(server, settings, report, &mut summary, version, dry_run).await {
        report.record(
            Decision::Failed,
            None,
            format!("Stopped applying settings to target server: {}", e),
        );
    }
    Ok(summary)
}

async fn apply_all<S: GucServer + ?Sized>(
    server: &mut S,
    settings: &mut SettingsMap,
    report: &mut ReportData,
    summary: &mut ChangeSummary,
    version: i32,
    dry_run: bool,
) -> Result<()> {
    for name in settings.names() {
        let Some(setting) = settings.get(&name).cloned() else { continue };
        if !setting.is_unwritten() {
            continue;
        }

        let mut rename_note = None;
        let (target_name, desired) = match resolve_for_version(&setting, version) {
            Resolution::Keep { name, value } => (name, value),
            Resolution::Redirect { name: successor, value, obsoleted_after } => {
                if settings.contains(&successor) {
                    settings.mark(&name, WriteState::ObsoleteNoted);
                    summary.obsolete += 1;
                    report.record(
                        Decision::Obsolete,
                        Some(&name),
                        format!(
                            "{} is obsolete after {} and {} is set explicitly, ignoring {}",
                            name, obsoleted_after, successor, setting.value
                        ),
                    );
                    continue;
                }
                rename_note = Some(format!(
                    "{} = {} is obsolete after {}, using {} = {}",
                    name, setting.value, obsoleted_after, successor, value
                ));
                (successor, value)
            }
            Resolution::Obsolete { obsoleted_after } => {
                settings.mark(&name, WriteState::ObsoleteNoted);
                summary.obsolete += 1;
                report.record(
                    Decision::Obsolete,
                    Some(&name),
                    format!(
                        "{} is obsolete after {}, would have been set to {}",
                        name, obsoleted_after, setting.value
                    ),
                );
                continue;
            }
            Resolution::Unscalable { reason } => {
                settings.mark(&name, WriteState::ObsoleteNoted);
                report.record(
                    Decision::Failed,
                    Some(&name),
                    format!("{} skipped: {}", name, reason),
                );
                continue;
            }
        };

        let current = server.current_value(&target_name).await?;
        if current.is_none() && !target_name.contains('.') {
            settings.mark(&name, WriteState::ObsoleteNoted);
            report.record(
                Decision::Skipped,
                Some(&target_name),
                format!("{} is not known to the target server, skipping", target_name),
            );
            continue;
        }

        let outcome = compare(&desired, current.as_deref());
        match outcome {
            Outcome::Matched => {
                report.record(
                    Decision::Matched,
                    Some(&target_name),
                    format!("{} = {} already set, no change", target_name, desired),
                );
            }
            Outcome::Changed => {
                if !dry_run {
                    server.alter_system(&target_name, &desired).await?;
                }
                if let Some(note) = rename_note {
                    summary.renamed += 1;
                    report.record(Decision::Renamed, Some(&target_name), note);
                }
                report.record(
                    Decision::Changed,
                    Some(&target_name),
                    format!(
                        "{}: {} -> {} (from {})",
                        target_name,
                        current.as_deref().unwrap_or("unset"),
                        desired,
                        setting.source
                    ),
                );
            }
        }

        if let Some(entry) = settings.get_mut(&name) {
            commit(entry, outcome, summary);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportSeverity;
    use crate::server::ServerSetting;
    use crate::types::Setting;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryServer {
        version: i32,
        values: HashMap<String, String>,
        altered: Vec<(String, String)>,
        fail_on: Option<String>,
    }

    impl MemoryServer {
        fn new(version: i32, values: &[(&str, &str)]) -> Self {
            Self {
                version,
                values: values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl GucServer for MemoryServer {
        async fn version_num(&mut self) -> Result<i32> {
            Ok(self.version)
        }

        async fn non_default_settings(&mut self) -> Result<Vec<ServerSetting>> {
            Ok(Vec::new())
        }

        async fn current_value(&mut self, name: &str) -> Result<Option<String>> {
            Ok(self.values.get(&name.to_lowercase()).cloned())
        }

        async fn alter_system(&mut self, name: &str, value: &str) -> Result<()> {
            if self.fail_on.as_deref() == Some(name) {
                return Err(Error::ConfigError(format!("permission denied to set {}", name)));
            }
            self.altered.push((name.to_string(), value.to_string()));
            Ok(())
        }
    }

    fn settings(pairs: &[(&str, &str)]) -> SettingsMap {
        let mut map = SettingsMap::new();
        for (name, value) in pairs {
            map.insert(Setting::new(name, value, "old.conf"));
        }
        map
    }

    #[tokio::test]
    async fn test_old_server_is_rejected() {
        let mut server = MemoryServer::new(90300, &[("work_mem", "1MB")]);
        let mut map = settings(&[("work_mem", "4MB")]);
        let mut report = ReportData::new();

        let result = reconcile_server(&mut server, &mut map, &mut report, false).await;
        assert!(matches!(
            result,
            Err(Error::UnsupportedServerVersion { found: 90300, required: 90400 })
        ));
        assert!(server.altered.is_empty());
    }

    #[tokio::test]
    async fn test_only_differences_are_altered() {
        let mut server = MemoryServer::new(160000, &[("work_mem", "4MB"), ("shared_buffers", "128MB")]);
        let mut map = settings(&[("work_mem", "4MB"), ("Shared_Buffers", "256MB")]);
        let mut report = ReportData::new();

        let summary = reconcile_server(&mut server, &mut map, &mut report, false).await.unwrap();
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.matched, 1);
        assert_eq!(server.altered, vec![("shared_buffers".to_string(), "256MB".to_string())]);
        assert_eq!(report.count(Decision::Matched), 1);
    }

    #[tokio::test]
    async fn test_obsolete_without_successor_is_never_written() {
        let mut server = MemoryServer::new(160000, &[("default_with_oids", "off")]);
        let mut map = settings(&[("default_with_oids", "on")]);
        let mut report = ReportData::new();

        let summary = reconcile_server(&mut server, &mut map, &mut report, false).await.unwrap();
        assert!(server.altered.is_empty());
        assert_eq!(summary.obsolete, 1);
        assert!(report.entries[0].message.contains("would have been set to on"));
    }

    #[tokio::test]
    async fn test_obsolete_with_successor_is_redirected() {
        let mut server = MemoryServer::new(130000, &[("max_wal_size", "1GB")]);
        let mut map = settings(&[("checkpoint_segments", "10")]);
        let mut report = ReportData::new();

        let summary = reconcile_server(&mut server, &mut map, &mut report, false).await.unwrap();
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.changed, 1);
        assert_eq!(server.altered, vec![("max_wal_size".to_string(), "160MB".to_string())]);
    }

    #[tokio::test]
    async fn test_redirect_already_in_place_is_not_a_rename() {
        let mut server = MemoryServer::new(130000, &[("max_wal_size", "160MB")]);
        let mut map = settings(&[("checkpoint_segments", "10")]);
        let mut report = ReportData::new();

        let summary = reconcile_server(&mut server, &mut map, &mut report, false).await.unwrap();
        assert_eq!(summary.renamed, 0);
        assert_eq!(summary.matched, 1);
        assert_eq!(report.count(Decision::Renamed), 0);
        assert!(server.altered.is_empty());
    }

    #[tokio::test]
    async fn test_unscalable_predecessor_is_an_error() {
        let mut server = MemoryServer::new(130000, &[("max_wal_size", "1GB")]);
        let mut map = settings(&[("checkpoint_segments", "1000000000000000000")]);
        let mut report = ReportData::new();

        let summary = reconcile_server(&mut server, &mut map, &mut report, false).await.unwrap();
        assert_eq!(summary.changed, 0);
        assert!(server.altered.is_empty());
        assert_eq!(report.count(Decision::Failed), 1);
        assert_eq!(report.entries[0].severity, ReportSeverity::Error);
        assert!(report.entries[0].message.contains("checkpoint_segments skipped"));
    }

    #[tokio::test]
    async fn test_explicit_successor_wins_over_redirect() {
        let mut server = MemoryServer::new(130000, &[("max_wal_size", "1GB")]);
        let mut map = settings(&[("checkpoint_segments", "10"), ("max_wal_size", "2GB")]);
        let mut report = ReportData::new();

        reconcile_server(&mut server, &mut map, &mut report, false).await.unwrap();
        assert_eq!(server.altered, vec![("max_wal_size".to_string(), "2GB".to_string())]);
    }

    #[tokio::test]
    async fn test_error_stops_the_loop() {
        let mut server = MemoryServer::new(
            160000,
            &[("work_mem", "1MB"), ("port", "5432"), ("shared_buffers", "128MB")],
        );
        server.fail_on = Some("port".to_string());
        let mut map = settings(&[("work_mem", "4MB"), ("port", "5433"), ("shared_buffers", "1GB")]);
        let mut report = ReportData::new();

        let summary = reconcile_server(&mut server, &mut map, &mut report, false).await.unwrap();
        assert_eq!(summary.changed, 1);
        assert_eq!(server.altered, vec![("work_mem".to_string(), "4MB".to_string())]);
        assert_eq!(report.count(Decision::Failed), 1);
        assert!(map.get("shared_buffers").unwrap().is_unwritten());
    }

    #[tokio::test]
    async fn test_dry_run_issues_nothing() {
        let mut server = MemoryServer::new(160000, &[("work_mem", "1MB")]);
        let mut map = settings(&[("work_mem", "4MB")]);
        let mut report = ReportData::new();

        let summary = reconcile_server(&mut server, &mut map, &mut report, true).await.unwrap();
        assert_eq!(summary.changed, 1);
        assert!(server.altered.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_setting_is_skipped() {
        let mut server = MemoryServer::new(160000, &[]);
        let mut map = settings(&[("made_up_setting", "1")]);
        let mut report = ReportData::new();

        let summary = reconcile_server(&mut server, &mut map, &mut report, false).await.unwrap();
        assert_eq!(summary.changed, 0);
        assert_eq!(report.count(Decision::Skipped), 1);
    }
}
