use serde::{Deserialize, Serialize};

/// Counters collected while loading the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Distinct non-default settings found.
    pub non_default: usize,
    /// Settings that replaced an earlier value for the same name.
    pub overridden: usize,
    /// Files or servers that could not be read.
    pub failures: usize,
    /// Assignment lines whose name could not be parsed.
    pub malformed: usize,
}

/// Counters collected while reconciling the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Settings whose target value already matched.
    pub matched: usize,
    /// Settings written or updated in the target.
    pub changed: usize,
    /// Values synthesized through a rename rule.
    pub renamed: usize,
    /// Obsolete settings that were commented out or skipped.
    pub obsolete: usize,
    /// Settings with no home in the target, appended at the end.
    pub appended: usize,
}

impl ChangeSummary {
    pub fn has_changes(&self) -> bool {
        self.changed > 0
    }
}
