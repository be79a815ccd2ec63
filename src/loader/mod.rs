//! Source loading
//! Author: kartik4091
//! Created: 2025-06-04
//!
//! Harvests the customized settings of the old installation into a
//! [`SettingsMap`]. Loading never aborts the run: unreadable files and
//! failing servers are reported and whatever was collected so far is kept.

use tracing::{debug, warn};

use crate::types::{LoadStats, Setting, SettingsMap};

pub mod file_loader;
pub mod server_loader;

/// Accumulates settings from one or more sources.
#[derive(Debug, Default)]
pub struct SourceLoader {
    settings: SettingsMap,
    stats: LoadStats,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a setting; a later value for the same name wins.
    pub fn add(&mut self, name: &str, value: &str, source: &str) {
        let setting = Setting::new(name, value, source);
        debug!("Found {}", setting);

        match self.settings.insert(setting) {
            Some(previous) => {
                self.stats.overridden += 1;
                warn!(
                    "⚠️  {} = {} from {} overrides {} from {}",
                    previous.name, value, source, previous.value, previous.source
                );
            }
            None => self.stats.non_default += 1,
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.stats.failures += 1;
    }

    pub(crate) fn record_malformed(&mut self) {
        self.stats.malformed += 1;
    }

    pub fn settings(&self) -> &SettingsMap {
        &self.settings
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn into_parts(self) -> (SettingsMap, LoadStats) {
        (self.settings, self.stats)
    }
}
