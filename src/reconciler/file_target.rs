//! Reconciling a configuration file target
//! Author: kartik4091
//!
//! The new file is rewritten line by line. For every setting name the target
//! mentions, one anchor line is picked: the last active assignment if there is
//! one, otherwise the first commented-out default. Only anchor lines are ever
//! touched, so a second run against the output finds everything in place.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{info, instrument, warn};

use super::{commit, compare, synthesize_rename, Outcome, Renamed};
use crate::error::Result;
use crate::registry::obsolete_rule;
use crate::report::{Decision, ReportData};
use crate::types::{ChangeSummary, SettingsMap, WriteState};
use crate::utils::{create_backup, parse_setting_line, read_text, write_text, SettingLine};

/// Result of reconciling a target file in memory.
#[derive(Debug, Clone)]
pub struct FileReconciliation {
    pub lines: Vec<String>,
    pub summary: ChangeSummary,
}

/// Picks the anchor line index for every setting name in the target.
fn find_anchors(parsed: &[Option<SettingLine>]) -> HashMap<String, usize> {
    let mut active: HashMap<String, usize> = HashMap::new();
    let mut commented: HashMap<String, usize> = HashMap::new();

    for (idx, line) in parsed.iter().enumerate() {
        let Some(line) = line else { continue };
        if line.commented {
            commented.entry(line.name.clone()).or_insert(idx);
        } else {
            active.insert(line.name.clone(), idx);
        }
    }

    for (name, idx) in commented {
        active.entry(name).or_insert(idx);
    }
    active
}

/// Merges `settings` into the lines of a target file.
///
/// `timestamp` goes into the banner of the trailing block.
pub fn reconcile_lines(
    lines: &[String],
    settings: &mut SettingsMap,
    report: &mut ReportData,
    timestamp: &str,
) -> FileReconciliation {
    let parsed: Vec<Option<SettingLine>> = lines.iter().map(|l| parse_setting_line(l)).collect();
    let anchors = find_anchors(&parsed);
    let mut output = Vec::with_capacity(lines.len() + settings.len());
    let mut summary = ChangeSummary::default();

    for (idx, line) in lines.iter().enumerate() {
        let Some(target) = &parsed[idx] else {
            output.push(line.clone());
            continue;
        };
        if anchors.get(&target.name) != Some(&idx) {
            output.push(line.clone());
            continue;
        }

        // An unscalable predecessor stays unwritten and is reported with the
        // leftovers, where its old value is kept as a note.
        let renamed = match synthesize_rename(settings, &target.name) {
            Some(Ok(renamed)) => Some(renamed),
            Some(Err(_)) | None => None,
        };

        let Some(setting) = settings.get_mut(&target.name) else {
            output.push(line.clone());
            continue;
        };
        if !setting.is_unwritten() {
            output.push(line.clone());
            continue;
        }

        let current = (!target.commented).then_some(target.value.as_str());
        let desired = setting.value.clone();
        let outcome = compare(&desired, current);

        match outcome {
            Outcome::Matched => {
                output.push(line.clone());
                report.record(
                    Decision::Matched,
                    Some(&setting.name),
                    format!("{} = {} already set, no change", setting.name, desired),
                );
            }
            Outcome::Changed => {
                if let Some(renamed) = &renamed {
                    record_rename(renamed, &mut summary, report);
                    output.push(renamed.comment());
                }
                if target.commented {
                    output.push(line.clone());
                } else {
                    output.push(format!("#{}", line));
                }
                output.push(format!("{} = {}", setting.name, desired));
                report.record(
                    Decision::Changed,
                    Some(&setting.name),
                    format!(
                        "{}: {} -> {} (from {})",
                        setting.name,
                        if target.commented { "default" } else { target.value.as_str() },
                        desired,
                        setting.source
                    ),
                );
            }
        }
        commit(setting, outcome, &mut summary);
    }

    let trailer = leftover_block(lines, settings, &mut summary, report);
    if !trailer.is_empty() {
        output.push(String::new());
        output.push(format!("# Settings carried over from the old configuration on {}", timestamp));
        output.extend(trailer);
    }

    FileReconciliation {
        lines: output,
        summary,
    }
}

fn record_rename(renamed: &Renamed, summary: &mut ChangeSummary, report: &mut ReportData) {
    summary.renamed += 1;
    report.record(
        Decision::Renamed,
        Some(&renamed.new_name),
        format!(
            "{} = {} replaces {} = {}",
            renamed.new_name, renamed.value, renamed.old_name, renamed.old_value
        ),
    );
}

/// Lines for settings that never found an anchor in the target.
fn leftover_block(
    lines: &[String],
    settings: &mut SettingsMap,
    summary: &mut ChangeSummary,
    report: &mut ReportData,
) -> Vec<String> {
    let existing: HashSet<&str> = lines.iter().map(String::as_str).collect();
    let mut block = Vec::new();

    for name in settings.names() {
        if !settings.get(&name).is_some_and(|s| s.is_unwritten()) {
            continue;
        }

        if let Some(rule) = obsolete_rule(&name) {
            if let Some(successor) = rule.successor {
                match synthesize_rename(settings, successor) {
                    Some(Ok(renamed)) => {
                        record_rename(&renamed, summary, report);
                        block.push(renamed.comment());
                        if let Some(new_setting) = settings.get_mut(successor) {
                            block.push(format!("{} = {}", new_setting.name, new_setting.value));
                            commit(new_setting, Outcome::Changed, summary);
                            summary.appended += 1;
                        }
                        continue;
                    }
                    Some(Err(e)) => {
                        report.record(Decision::Failed, Some(&name), format!("{}: {}", name, e));
                    }
                    None => {}
                }
            }

            let Some(setting) = settings.get_mut(&name) else { continue };
            let note = format!(
                "# obsolete after {}: {} = {}",
                rule.last_version_label(),
                setting.name,
                setting.value
            );
            if !existing.contains(note.as_str()) {
                block.push(note);
            }
            setting.state = WriteState::ObsoleteNoted;
            summary.obsolete += 1;
            report.record(
                Decision::Obsolete,
                Some(&name),
                format!(
                    "{} = {} is obsolete after {}, left commented out",
                    name,
                    setting.value,
                    rule.last_version_label()
                ),
            );
            continue;
        }

        let Some(setting) = settings.get_mut(&name) else { continue };
        block.push(format!("{} = {}", setting.name, setting.value));
        report.record(
            Decision::Appended,
            Some(&name),
            format!(
                "{} = {} has no place in the new file, appended (from {})",
                setting.name, setting.value, setting.source
            ),
        );
        commit(setting, Outcome::Changed, summary);
        summary.appended += 1;
    }

    block
}

/// Reconciles the target file at `path` in place.
///
/// The previous contents are copied to `<path>.bak` first. Nothing is written
/// when the merge leaves the file unchanged or when `dry_run` is set.
#[instrument(skip(settings, report))]
pub fn reconcile_file(
    path: &Path,
    settings: &mut SettingsMap,
    report: &mut ReportData,
    dry_run: bool,
) -> Result<ChangeSummary> {
    let file = read_text(path)?;
    let lines = file.lines;
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let result = reconcile_lines(&lines, settings, report, &timestamp);

    if result.lines == lines {
        info!("✅ {} already up to date", path.display());
        return Ok(result.summary);
    }

    if dry_run {
        info!("🔍 Dry run - {} left untouched", path.display());
        return Ok(result.summary);
    }

    match create_backup(path) {
        Ok(backup) => info!("📁 Saved previous version as {}", backup.display()),
        Err(e) => warn!("⚠️  Could not back up {}: {}", path.display(), e),
    }

    write_text(path, &result.lines, file.encoding)?;
    info!("💾 Wrote {}", path.display());
    Ok(result.summary)
}
