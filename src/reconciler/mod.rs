//! Target reconciliation
//! Author: kartik4091
//! Created: 2025-06-05
//!
//! Both target modes funnel every setting through [`compare`] and [`commit`]
//! so a file target and a live target reach the same verdict for the same
//! pair of values. Rename and obsolescence handling lives here as well.

use crate::error::Result;
use crate::registry::{obsolete_rule, rename_rule_for};
use crate::types::{ChangeSummary, Setting, SettingsMap, WriteState};
use crate::utils::values_match;

pub mod file_target;
pub mod server_target;

pub use file_target::{reconcile_file, reconcile_lines, FileReconciliation};
pub use server_target::reconcile_server;

/// Verdict for one setting against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Target already carries the desired value.
    Matched,
    /// Target must be updated.
    Changed,
}

/// Compares the desired value with the active target value, if any.
pub fn compare(desired: &str, current: Option<&str>) -> Outcome {
    match current {
        Some(current) if values_match(desired, current) => Outcome::Matched,
        _ => Outcome::Changed,
    }
}

/// Records an outcome: the setting is written and the summary counts it.
pub fn commit(setting: &mut Setting, outcome: Outcome, summary: &mut ChangeSummary) {
    setting.state = WriteState::Written;
    match outcome {
        Outcome::Matched => summary.matched += 1,
        Outcome::Changed => summary.changed += 1,
    }
}

/// A value synthesized for a renamed setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renamed {
    pub new_name: String,
    pub value: String,
    pub old_name: String,
    pub old_value: String,
    /// Release after which the old setting disappeared.
    pub obsoleted_after: Option<String>,
}

impl Renamed {
    /// Comment documenting the old setting next to its replacement.
    pub fn comment(&self) -> String {
        match &self.obsoleted_after {
            Some(version) => format!(
                "# {} was {} (obsolete after {}); mapped to {} = {}",
                self.old_name, self.old_value, version, self.new_name, self.value
            ),
            None => format!(
                "# {} was {}; mapped to {} = {}",
                self.old_name, self.old_value, self.new_name, self.value
            ),
        }
    }
}

/// Derives `name` from its predecessor when only the predecessor was loaded.
///
/// Returns `None` when `name` is already loaded, has no rename rule, or its
/// predecessor is absent. On success the new setting is inserted and the
/// predecessor is marked as noted.
pub fn synthesize_rename(settings: &mut SettingsMap, name: &str) -> Option<Result<Renamed>> {
    if settings.contains(name) {
        return None;
    }
    let rule = rename_rule_for(name)?;
    let old = settings.get(rule.old_name)?.clone();

    let value = match rule.file_value(&old.value) {
        Ok(value) => value,
        Err(e) => return Some(Err(e)),
    };

    let source = format!("mapped from {}", rule.old_name);
    settings.insert(Setting::new(rule.new_name, &value, &source));

    if old.is_unwritten() {
        settings.mark(rule.old_name, WriteState::ObsoleteNoted);
    }

    Some(Ok(Renamed {
        new_name: rule.new_name.to_string(),
        value,
        old_name: old.name,
        old_value: old.value,
        obsoleted_after: obsolete_rule(rule.old_name).map(|r| r.last_version_label()),
    }))
}

/// How a setting maps onto a server of a given version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Write under its own name.
    Keep { name: String, value: String },
    /// Write the successor instead, with a recomputed value.
    Redirect { name: String, value: String, obsoleted_after: String },
    /// Gone from the server with nothing to replace it.
    Obsolete { obsoleted_after: String },
    /// The successor value could not be computed.
    Unscalable { reason: String },
}

/// Resolves a setting against the target server's `server_version_num`.
pub fn resolve_for_version(setting: &Setting, version: i32) -> Resolution {
    let rule = match obsolete_rule(&setting.name) {
        Some(rule) if rule.is_obsolete_for(version) => rule,
        _ => {
            return Resolution::Keep {
                name: setting.name.clone(),
                value: setting.value.clone(),
            }
        }
    };

    let obsoleted_after = rule.last_version_label();
    let Some(successor) = rule.successor else {
        return Resolution::Obsolete { obsoleted_after };
    };
    let Some(rename) = rename_rule_for(successor) else {
        return Resolution::Obsolete { obsoleted_after };
    };

    match rename.live_value(&setting.value) {
        Ok(value) => Resolution::Redirect {
            name: successor.to_string(),
            value,
            obsoleted_after,
        },
        Err(e) => Resolution::Unscalable { reason: e.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_active_values() {
        assert_eq!(compare("4MB", Some("4MB")), Outcome::Matched);
        assert_eq!(compare("'4MB'", Some("4MB")), Outcome::Matched);
        assert_eq!(compare("8MB", Some("4MB")), Outcome::Changed);
        assert_eq!(compare("4MB", None), Outcome::Changed);
    }

    #[test]
    fn test_commit_marks_written() {
        let mut setting = Setting::new("work_mem", "4MB", "old.conf");
        let mut summary = ChangeSummary::default();
        commit(&mut setting, Outcome::Matched, &mut summary);
        assert_eq!(setting.state, WriteState::Written);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.changed, 0);
    }

    #[test]
    fn test_synthesize_rename() {
        let mut settings = SettingsMap::new();
        settings.insert(Setting::new("checkpoint_segments", "10", "old.conf"));

        let renamed = synthesize_rename(&mut settings, "max_wal_size").unwrap().unwrap();
        assert_eq!(renamed.value, "160MB");
        assert_eq!(renamed.obsoleted_after.as_deref(), Some("9.4"));
        assert_eq!(
            renamed.comment(),
            "# checkpoint_segments was 10 (obsolete after 9.4); mapped to max_wal_size = 160MB"
        );

        let synthesized = settings.get("max_wal_size").unwrap();
        assert_eq!(synthesized.source, "mapped from checkpoint_segments");
        assert!(synthesized.is_unwritten());
        assert_eq!(
            settings.get("checkpoint_segments").unwrap().state,
            WriteState::ObsoleteNoted
        );
    }

    #[test]
    fn test_synthesize_rename_not_applicable() {
        let mut settings = SettingsMap::new();
        assert!(synthesize_rename(&mut settings, "max_wal_size").is_none());

        settings.insert(Setting::new("max_wal_size", "2GB", "old.conf"));
        settings.insert(Setting::new("checkpoint_segments", "10", "old.conf"));
        assert!(synthesize_rename(&mut settings, "max_wal_size").is_none());
        assert!(synthesize_rename(&mut settings, "work_mem").is_none());
    }

    #[test]
    fn test_synthesize_rename_bad_value() {
        let mut settings = SettingsMap::new();
        settings.insert(Setting::new("checkpoint_segments", "many", "old.conf"));
        assert!(synthesize_rename(&mut settings, "max_wal_size").unwrap().is_err());
        assert!(!settings.contains("max_wal_size"));
        assert!(settings.get("checkpoint_segments").unwrap().is_unwritten());
    }

    #[test]
    fn test_resolve_for_version() {
        let segments = Setting::new("checkpoint_segments", "10", "old.conf");
        assert_eq!(
            resolve_for_version(&segments, 90400),
            Resolution::Keep { name: "checkpoint_segments".into(), value: "10".into() }
        );
        assert_eq!(
            resolve_for_version(&segments, 160000),
            Resolution::Redirect {
                name: "max_wal_size".into(),
                value: "160MB".into(),
                obsoleted_after: "9.4".into(),
            }
        );

        let oids = Setting::new("default_with_oids", "on", "old.conf");
        assert_eq!(
            resolve_for_version(&oids, 160000),
            Resolution::Obsolete { obsoleted_after: "11".into() }
        );

        let bad = Setting::new("checkpoint_segments", "lots", "old.conf");
        assert!(matches!(resolve_for_version(&bad, 160000), Resolution::Unscalable { .. }));
    }
}
