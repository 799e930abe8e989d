//! Compares observed ratios against current limits

use crate::limits::RatioObservation;
use crate::runner::ValidationFinding;
use crate::targets::CompetitionTargets;

/// Produces validation findings for observations that break their limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitChecker;

impl LimitChecker {
    pub fn new() -> Self {
        Self
    }

    /// Check every observation against its target's limit.
    ///
    /// Out-of-range ratios are critical. A target with no established limit
    /// gets a non-critical finding so the caller knows it went unchecked.
    pub fn check(
        &self,
        targets: &CompetitionTargets,
        observations: &[RatioObservation],
    ) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();

        for obs in observations {
            let limit = targets.limit_or_empty(&obs.target);
            let (min_ratio, max_ratio) = obs.ordered_candidates();

            if limit.is_empty() {
                findings.push(ValidationFinding::warning(
                    format!(
                        "Target {}: no limit set, ratio {:.2}..{:.2} not checked",
                        obs.target, min_ratio, max_ratio
                    ),
                    Some(obs.target.clone()),
                ));
                continue;
            }

            if limit.is_below_min(min_ratio) {
                findings.push(ValidationFinding::critical(
                    format!(
                        "Target {}: ratio {:.2} is below limit {}",
                        obs.target, min_ratio, limit
                    ),
                    Some(obs.target.clone()),
                ));
            }
            if limit.is_above_max(max_ratio) {
                findings.push(ValidationFinding::critical(
                    format!(
                        "Target {}: ratio {:.2} is above limit {}",
                        obs.target, max_ratio, limit
                    ),
                    Some(obs.target.clone()),
                ));
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::MetricLimit;
    use crate::targets::TargetLimitEntry;

    fn targets() -> CompetitionTargets {
        let mut targets = CompetitionTargets::new();
        targets.seed([
            TargetLimitEntry::new("a", MetricLimit::try_new(1.0, 2.0).unwrap()),
            TargetLimitEntry::new("max_only", MetricLimit::try_new(-1.0, 2.0).unwrap()),
        ]);
        targets
    }

    #[test]
    fn test_within_limit_has_no_findings() {
        let observations = [RatioObservation::new("a", 1.1, 1.9)];
        let findings = LimitChecker::new().check(&targets(), &observations);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_both_bounds_violated() {
        let observations = [RatioObservation::new("a", 0.5, 2.5)];
        let findings = LimitChecker::new().check(&targets(), &observations);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.is_critical));
        assert!(findings[0].message.contains("below"));
        assert!(findings[1].message.contains("above"));
    }

    #[test]
    fn test_ignored_min_not_checked() {
        let findings = LimitChecker::new().check(
            &targets(),
            &[RatioObservation::new("max_only", 0.01, 1.5)],
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_unknown_target_is_warning() {
        let observations = [RatioObservation::new("new", 1.0, 1.0)];
        let findings = LimitChecker::new().check(&targets(), &observations);
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].is_critical);
        assert_eq!(findings[0].target.as_ref().map(|t| t.as_str()), Some("new"));
    }
}
