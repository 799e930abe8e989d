//! JSON limits file used as the annotation store.
//!
//! The file is a map of target name to `{ "min": .., "max": .. }`. A missing
//! file is an empty store; it is created on the first update.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use competition::{AnnotationStore, MetricLimit, TargetId, TargetLimitEntry};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct JsonLimitsStore {
    path: PathBuf,
    limits: BTreeMap<TargetId, MetricLimit>,
}

impl JsonLimitsStore {
    /// Open the store, reading the file when it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let limits = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .context(format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .context(format!("Failed to parse limits file {}", path.display()))?
        } else {
            debug!(path = %path.display(), "Limits file not found, starting empty");
            BTreeMap::new()
        };
        Ok(Self { path, limits })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, target: &TargetId) -> Option<MetricLimit> {
        self.limits.get(target).copied()
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    fn save(&self) -> Result<()> {
        // JSON has no infinity; serde_json would write `null` and the
        // file could not be read back
        if let Some((target, limit)) = self
            .limits
            .iter()
            .find(|(_, limit)| !limit.min().is_finite() || !limit.max().is_finite())
        {
            return Err(anyhow!("limit {} for {} is not finite", limit, target))
                .context(format!("Failed to write {}", self.path.display()));
        }
        let json = serde_json::to_string_pretty(&self.limits)?;
        std::fs::write(&self.path, json + "\n")
            .context(format!("Failed to write {}", self.path.display()))
    }
}

impl AnnotationStore for JsonLimitsStore {
    fn existing_limits(&self) -> Result<Vec<TargetLimitEntry>> {
        Ok(self
            .limits
            .iter()
            .map(|(target, limit)| TargetLimitEntry::new(target.clone(), *limit))
            .collect())
    }

    fn try_annotate(&mut self, targets: &[TargetLimitEntry]) -> Result<Vec<TargetLimitEntry>> {
        let mut updated = self.limits.clone();
        for entry in targets {
            updated.insert(entry.target.clone(), entry.limit);
        }
        let previous = std::mem::replace(&mut self.limits, updated);
        if let Err(e) = self.save() {
            self.limits = previous;
            return Err(e);
        }

        info!(
            path = %self.path.display(),
            count = targets.len(),
            "Limits file updated"
        );
        Ok(targets
            .iter()
            .map(|entry| TargetLimitEntry::new(entry.target.clone(), entry.limit))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(min: f64, max: f64) -> MetricLimit {
        MetricLimit::try_new(min, max).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLimitsStore::open(dir.path().join("limits.json")).unwrap();
        assert!(store.is_empty());
        assert!(store.existing_limits().unwrap().is_empty());
    }

    #[test]
    fn test_annotate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        let mut store = JsonLimitsStore::open(&path).unwrap();

        let mut entry = TargetLimitEntry::new("Sort.Quick", limit(0.95, 2.1));
        entry.changed = true;
        let stored = store.try_annotate(&[entry]).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].changed);

        let reopened = JsonLimitsStore::open(&path).unwrap();
        assert_eq!(reopened.get(&"Sort.Quick".into()), Some(limit(0.95, 2.1)));
    }

    #[test]
    fn test_reads_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        std::fs::write(
            &path,
            r#"{ "A": { "min": -1.0, "max": 2.0 }, "B": { "min": 0.0, "max": 0.0 } }"#,
        )
        .unwrap();

        let store = JsonLimitsStore::open(&path).unwrap();
        assert!(store.get(&"A".into()).unwrap().ignore_min());
        assert!(store.get(&"B".into()).unwrap().is_empty());
        assert_eq!(store.existing_limits().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        std::fs::write(&path, r#"{ "A": { "min": "x", "max": 2.0 } }"#).unwrap();
        let err = JsonLimitsStore::open(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse limits file"));
    }

    #[test]
    fn test_infinite_limit_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        let mut store = JsonLimitsStore::open(&path).unwrap();
        store
            .try_annotate(&[TargetLimitEntry::new("A", limit(1.0, 2.0))])
            .unwrap();

        let err = store
            .try_annotate(&[TargetLimitEntry::new("B", limit(1.0, f64::INFINITY))])
            .unwrap_err();
        assert!(format!("{:#}", err).contains("not finite"));
        assert!(store.get(&"B".into()).is_none());

        // the file on disk still holds the last good map
        let reopened = JsonLimitsStore::open(&path).unwrap();
        assert_eq!(reopened.get(&"A".into()), Some(limit(1.0, 2.0)));
        assert!(reopened.get(&"B".into()).is_none());
    }

    #[test]
    fn test_huge_observation_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        let mut store = JsonLimitsStore::open(&path).unwrap();

        let observation = competition::RatioObservation::new("Sort.Quick", 1.0, 1e307);
        let update = competition::LimitsUnionEngine::new()
            .union_observation(MetricLimit::EMPTY, &observation)
            .unwrap();
        store
            .try_annotate(&[TargetLimitEntry::new("Sort.Quick", update.updated)])
            .unwrap();

        let reopened = JsonLimitsStore::open(&path).unwrap();
        assert_eq!(reopened.get(&"Sort.Quick".into()), Some(update.updated));
    }

    #[test]
    fn test_failed_write_keeps_previous_limits() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be makes the write fail
        let path = dir.path().join("limits.json");
        std::fs::create_dir(&path).unwrap();
        let mut store = JsonLimitsStore {
            path,
            limits: BTreeMap::new(),
        };

        let err = store
            .try_annotate(&[TargetLimitEntry::new("A", limit(1.0, 2.0))])
            .unwrap_err();
        assert!(err.to_string().contains("Failed to write"));
        assert!(store.is_empty());
    }
}
