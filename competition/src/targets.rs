//! Competition targets and their limit entries

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::limits::MetricLimit;

/// Identity of a benchmark target, unique within one competition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TargetId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A target paired with its current limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetLimitEntry {
    pub target: TargetId,
    pub limit: MetricLimit,
    /// Limit differs from what the annotation store holds.
    #[serde(default)]
    pub changed: bool,
}

impl TargetLimitEntry {
    pub fn new(target: impl Into<TargetId>, limit: MetricLimit) -> Self {
        Self {
            target: target.into(),
            limit,
            changed: false,
        }
    }
}

/// In-memory limit map for one competition, ordered by target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitionTargets {
    entries: BTreeMap<TargetId, TargetLimitEntry>,
}

impl CompetitionTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from pre-existing annotations. Seeded entries are clean.
    pub fn seed(&mut self, entries: impl IntoIterator<Item = TargetLimitEntry>) {
        for mut entry in entries {
            entry.changed = false;
            self.entries.insert(entry.target.clone(), entry);
        }
    }

    pub fn get(&self, target: &TargetId) -> Option<&TargetLimitEntry> {
        self.entries.get(target)
    }

    /// Current limit of a target, empty when none is known.
    pub fn limit_or_empty(&self, target: &TargetId) -> MetricLimit {
        self.entries
            .get(target)
            .map(|e| e.limit)
            .unwrap_or(MetricLimit::EMPTY)
    }

    /// Replace a target's limit and mark it changed.
    pub fn set_changed(&mut self, target: &TargetId, limit: MetricLimit) {
        self.entries.insert(
            target.clone(),
            TargetLimitEntry {
                target: target.clone(),
                limit,
                changed: true,
            },
        );
    }

    /// Merge entries returned by the annotation store; they become clean.
    pub fn merge_annotated(&mut self, entries: impl IntoIterator<Item = TargetLimitEntry>) {
        for mut entry in entries {
            entry.changed = false;
            self.entries.insert(entry.target.clone(), entry);
        }
    }

    /// Entries whose limit changed since the last annotation.
    pub fn changed_entries(&self) -> Vec<TargetLimitEntry> {
        self.entries.values().filter(|e| e.changed).cloned().collect()
    }

    pub fn has_changes(&self) -> bool {
        self.entries.values().any(|e| e.changed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetLimitEntry> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(min: f64, max: f64) -> MetricLimit {
        MetricLimit::try_new(min, max).unwrap()
    }

    #[test]
    fn test_seed_entries_are_clean() {
        let mut targets = CompetitionTargets::new();
        let mut entry = TargetLimitEntry::new("a", limit(1.0, 2.0));
        entry.changed = true;
        targets.seed([entry]);

        assert_eq!(targets.len(), 1);
        assert!(!targets.has_changes());
        assert_eq!(targets.limit_or_empty(&"a".into()), limit(1.0, 2.0));
        assert_eq!(targets.limit_or_empty(&"missing".into()), MetricLimit::EMPTY);
    }

    #[test]
    fn test_changed_then_merged() {
        let mut targets = CompetitionTargets::new();
        targets.set_changed(&"b".into(), limit(0.5, 0.7));
        targets.set_changed(&"a".into(), limit(1.0, 1.1));

        let changed = targets.changed_entries();
        assert_eq!(changed.len(), 2);
        // ordered by target
        assert_eq!(changed[0].target.as_str(), "a");

        targets.merge_annotated([TargetLimitEntry::new("a", limit(0.9, 1.2))]);
        let changed = targets.changed_entries();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].target.as_str(), "b");
        assert_eq!(targets.limit_or_empty(&"a".into()), limit(0.9, 1.2));
    }

    #[test]
    fn test_target_id_serde_transparent() {
        let id = TargetId::new("Bench.Method");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Bench.Method\"");
    }
}
