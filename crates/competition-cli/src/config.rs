//! Application configuration: TOML file, then environment, then CLI flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use competition::CompetitionConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Top-level config file layout.
///
/// ```toml
/// limits_path = "limits.json"
///
/// [competition]
/// max_rerun_count = 6
/// update_annotations = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub competition: CompetitionConfig,
    /// JSON limits file used as the annotation store.
    pub limits_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&content).context("Failed to parse competition config TOML")?;
        Ok(config)
    }

    /// File (when given) plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply `COMPETITION_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are skipped.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let competition = &mut self.competition;

        if let Some(max) = lookup("COMPETITION_MAX_RERUNS") {
            match max.parse() {
                Ok(n) => competition.max_rerun_count = n,
                Err(_) => debug!(value = %max, "Ignoring unparseable COMPETITION_MAX_RERUNS"),
            }
        }
        if let Some(val) = lookup("COMPETITION_UPDATE_ANNOTATIONS") {
            competition.update_annotations = parse_flag(&val);
        }
        if let Some(val) = lookup("COMPETITION_RERUN_IF_FAILED") {
            competition.rerun_if_limits_failed = parse_flag(&val);
        }
        if let Some(val) = lookup("COMPETITION_WARNINGS_AS_ERRORS") {
            competition.report_warnings_as_errors = parse_flag(&val);
        }
        if let Some(path) = lookup("COMPETITION_LIMITS_PATH") {
            self.limits_path = Some(PathBuf::from(path));
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
limits_path = "limits.json"

[competition]
max_rerun_count = 6
update_annotations = true
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.limits_path, Some(PathBuf::from("limits.json")));
        assert_eq!(config.competition.max_rerun_count, 6);
        assert!(config.competition.update_annotations);
        // untouched keys keep their defaults
        assert!(config.competition.check_limits);
        assert!(config.competition.rerun_after_annotation);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("COMPETITION_MAX_RERUNS", "4"),
            ("COMPETITION_UPDATE_ANNOTATIONS", "1"),
            ("COMPETITION_RERUN_IF_FAILED", "false"),
            ("COMPETITION_WARNINGS_AS_ERRORS", "TRUE"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.competition.max_rerun_count, 4);
        assert!(config.competition.update_annotations);
        assert!(!config.competition.rerun_if_limits_failed);
        assert!(config.competition.report_warnings_as_errors);
        assert!(config.limits_path.is_none());
    }

    #[test]
    fn test_bad_max_reruns_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| (key == "COMPETITION_MAX_RERUNS").then(|| "lots".to_string()));
        assert_eq!(config.competition.max_rerun_count, 10);
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file(Path::new("/nonexistent/competition.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("competition.toml");
        std::fs::write(&path, "[competition]\nmax_rerun_count = 3\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.competition.max_rerun_count, 3);
    }
}
