//! Rename and obsolescence registry
//! Author: kartik4091
//! Created: 2025-06-04
//!
//! Static tables describing settings that were replaced by a successor with a
//! different name and scale, and settings that were removed in a given server
//! release. Version numbers use the `server_version_num` encoding
//! (`90400` for 9.4, `120000` for 12).

use crate::error::{Error, Result};
use crate::utils::trim_quotes;

/// A setting whose value is derived from an older, differently scaled one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameRule {
    pub new_name: &'static str,
    pub old_name: &'static str,
    /// Factor applied to the old integer value.
    pub multiplier: i64,
    /// Unit appended to the scaled number.
    pub unit: &'static str,
    /// Divisor applied on the live-server path only.
    pub internal_divisor: i64,
}

/// A setting that no longer exists after `last_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObsoleteRule {
    pub name: &'static str,
    /// Last server release that still accepts the setting.
    pub last_version: i32,
    pub successor: Option<&'static str>,
}

/// Rename rules shipped with the tool.
pub const RENAME_RULES: &[RenameRule] = &[RenameRule {
    new_name: "max_wal_size",
    old_name: "checkpoint_segments",
    multiplier: 16,
    unit: "MB",
    internal_divisor: 1,
}];

/// Settings removed from the server, oldest first.
pub const OBSOLETE_RULES: &[ObsoleteRule] = &[
    ObsoleteRule { name: "checkpoint_segments", last_version: 90400, successor: Some("max_wal_size") },
    ObsoleteRule { name: "sql_inheritance", last_version: 90600, successor: None },
    ObsoleteRule { name: "min_parallel_relation_size", last_version: 90600, successor: None },
    ObsoleteRule { name: "replacement_sort_tuples", last_version: 100000, successor: None },
    ObsoleteRule { name: "default_with_oids", last_version: 110000, successor: None },
    ObsoleteRule { name: "wal_keep_segments", last_version: 120000, successor: None },
    ObsoleteRule { name: "operator_precedence_warning", last_version: 130000, successor: None },
    ObsoleteRule { name: "vacuum_cleanup_index_scale_factor", last_version: 130000, successor: None },
    ObsoleteRule { name: "stats_temp_directory", last_version: 140000, successor: None },
    ObsoleteRule { name: "promote_trigger_file", last_version: 150000, successor: None },
    ObsoleteRule { name: "force_parallel_mode", last_version: 150000, successor: None },
    ObsoleteRule { name: "db_user_namespace", last_version: 160000, successor: None },
    ObsoleteRule { name: "old_snapshot_threshold", last_version: 160000, successor: None },
];

/// Rename rule producing `new_name`, if any.
pub fn rename_rule_for(new_name: &str) -> Option<&'static RenameRule> {
    RENAME_RULES
        .iter()
        .find(|rule| rule.new_name.eq_ignore_ascii_case(new_name))
}

/// Obsolescence rule for `name`, if any.
pub fn obsolete_rule(name: &str) -> Option<&'static ObsoleteRule> {
    OBSOLETE_RULES
        .iter()
        .find(|rule| rule.name.eq_ignore_ascii_case(name))
}

/// Multiplies an integer setting value and appends a unit.
///
/// `scaled_bytes("10", 16, "MB")` is `"160MB"`.
pub fn scaled_bytes(old_value: &str, multiplier: i64, unit: &str) -> Result<String> {
    let number = parse_integer(old_value)?;
    let scaled = number
        .checked_mul(multiplier)
        .ok_or_else(|| unscalable(old_value))?;
    Ok(format!("{}{}", scaled, unit))
}

fn unscalable(value: &str) -> Error {
    Error::ScaleError {
        name: String::new(),
        value: value.to_string(),
    }
}

fn parse_integer(value: &str) -> Result<i64> {
    trim_quotes(value)
        .parse::<i64>()
        .map_err(|_| unscalable(value))
}

impl RenameRule {
    /// Value written into a configuration file.
    pub fn file_value(&self, old_value: &str) -> Result<String> {
        scaled_bytes(old_value, self.multiplier, self.unit).map_err(|e| self.name_error(e))
    }

    /// Value sent to a live server.
    pub fn live_value(&self, old_value: &str) -> Result<String> {
        let number = parse_integer(old_value).map_err(|e| self.name_error(e))?;
        let divisor = self.internal_divisor.max(1);
        let scaled = number
            .checked_mul(self.multiplier)
            .ok_or_else(|| self.name_error(unscalable(old_value)))?;
        Ok(format!("{}{}", scaled / divisor, self.unit))
    }

    fn name_error(&self, err: Error) -> Error {
        match err {
            Error::ScaleError { value, .. } => Error::ScaleError {
                name: self.old_name.to_string(),
                value,
            },
            other => other,
        }
    }
}

impl ObsoleteRule {
    /// Whether a server at `version` no longer knows the setting.
    pub fn is_obsolete_for(&self, version: i32) -> bool {
        major_version(version) > major_version(self.last_version)
    }

    /// Human readable release after which the setting disappeared.
    pub fn last_version_label(&self) -> String {
        version_label(self.last_version)
    }
}

/// Strips the minor part of a `server_version_num`.
pub fn major_version(version: i32) -> i32 {
    if version >= 100000 {
        version / 10000 * 10000
    } else {
        version / 100 * 100
    }
}

/// Formats a `server_version_num` as a release label (`9.4`, `12`).
pub fn version_label(version: i32) -> String {
    if version >= 100000 {
        format!("{}", version / 10000)
    } else {
        format!("{}.{}", version / 10000, version / 100 % 100)
    }
}
