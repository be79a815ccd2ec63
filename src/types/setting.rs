//! Setting and settings map definitions
//! Author: kartik4091
//! Created: 2025-06-04

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a setting is in the reconciliation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteState {
    /// Not yet placed in the target.
    #[default]
    Unwritten,
    /// Placed in the target, or already matching there.
    Written,
    /// Documented as an obsoleted setting; never written as an active line.
    ObsoleteNoted,
}

/// A single configuration setting harvested from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub name: String,
    pub value: String,
    /// Provenance for diagnostics: a file path, a server sourcefile or a
    /// `mapped from` annotation.
    pub source: String,
    pub state: WriteState,
}

impl Setting {
    pub fn new(name: &str, value: &str, source: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            value: value.to_string(),
            source: source.to_string(),
            state: WriteState::Unwritten,
        }
    }

    pub fn is_unwritten(&self) -> bool {
        self.state == WriteState::Unwritten
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} (from {})", self.name, self.value, self.source)
    }
}

/// Insertion-ordered map of setting name to [`Setting`].
///
/// Names are case-insensitive; overwriting keeps the original position.
#[derive(Debug, Clone, Default)]
pub struct SettingsMap {
    entries: Vec<Setting>,
    index: HashMap<String, usize>,
}

impl SettingsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a setting, returning the entry it replaced.
    pub fn insert(&mut self, setting: Setting) -> Option<Setting> {
        match self.index.get(&setting.name) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos], setting)),
            None => {
                self.index.insert(setting.name.clone(), self.entries.len());
                self.entries.push(setting);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.index
            .get(&name.to_lowercase())
            .map(|&pos| &self.entries[pos])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Setting> {
        match self.index.get(&name.to_lowercase()) {
            Some(&pos) => Some(&mut self.entries[pos]),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Updates the write state of `name`, if present.
    pub fn mark(&mut self, name: &str, state: WriteState) {
        if let Some(setting) = self.get_mut(name) {
            setting.state = state;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.entries.iter()
    }

    /// Setting names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|s| s.name.clone()).collect()
    }

    /// Settings that were never placed in the target.
    pub fn unwritten(&self) -> impl Iterator<Item = &Setting> {
        self.entries.iter().filter(|s| s.is_unwritten())
    }
}
