//! Sweep tests for limit widening and the rerun cap
//!
//! Each test walks a fixed grid of limits and candidate ratios rather than
//! random inputs, so failures name the exact case.

use anyhow::Result;
use async_trait::async_trait;
use competition::{
    CompetitionConfig, CompetitionContext, CompetitionRunner, CompetitionTargets, LimitChecker,
    LimitsUnionEngine, MeasurementEngine, MetricLimit, PassContext, PassOutput, RatioObservation,
};

const RATIOS: &[f64] = &[0.004, 0.01, 0.05, 0.1, 0.5, 0.95, 1.0, 1.3, 2.0, 7.5, 100.0];

const RAW_BOUNDS: &[f64] = &[-5.0, -1.0, -0.0, 0.0, 0.01, 0.5, 1.0, 2.0, 40.0];

fn starting_limits() -> Vec<MetricLimit> {
    let mut limits = vec![MetricLimit::EMPTY, MetricLimit::IGNORED];
    for &min in RAW_BOUNDS {
        for &max in RAW_BOUNDS {
            limits.push(MetricLimit::try_new(min, max).unwrap());
        }
    }
    limits
}

fn widen(current: MetricLimit, a: f64, b: f64) -> MetricLimit {
    let observation = RatioObservation::new("Sweep", a, b);
    LimitsUnionEngine::new()
        .union_observation(current, &observation)
        .map(|update| update.updated)
        .unwrap_or(current)
}

fn ordered(limit: &MetricLimit) -> bool {
    limit.min() <= 0.0 || limit.max() <= 0.0 || limit.min() <= limit.max()
}

#[test]
fn test_normalized_limits_are_ordered() {
    for limit in starting_limits() {
        assert!(ordered(&limit), "{limit:?}");
        assert!(limit.min() == -1.0 || limit.min() >= 0.0, "{limit:?}");
        assert!(limit.max() == -1.0 || limit.max() >= 0.0, "{limit:?}");
    }
}

#[test]
fn test_union_never_narrows() {
    for current in starting_limits() {
        for &a in RATIOS {
            for &b in RATIOS {
                let widened = widen(current, a, b);
                let case = format!("{current:?} + ({a}, {b}) -> {widened:?}");

                if current.ignore_min() {
                    assert!(widened.ignore_min(), "{case}");
                } else if !current.min_is_empty() {
                    assert!(widened.min() <= current.min(), "{case}");
                }
                if current.ignore_max() {
                    assert!(widened.ignore_max(), "{case}");
                } else if !current.max_is_empty() {
                    assert!(widened.max() >= current.max(), "{case}");
                }
                assert!(ordered(&widened), "{case}");
            }
        }
    }
}

#[test]
fn test_widened_limit_contains_candidates() {
    for current in starting_limits() {
        for &a in RATIOS {
            for &b in RATIOS {
                let widened = widen(current, a, b);
                assert!(
                    widened.contains(a) && widened.contains(b),
                    "{current:?} + ({a}, {b}) -> {widened:?}"
                );
            }
        }
    }
}

#[test]
fn test_union_is_idempotent() {
    let engine = LimitsUnionEngine::new();
    for current in starting_limits() {
        for &a in RATIOS {
            for &b in RATIOS {
                let widened = widen(current, a, b);
                let observation = RatioObservation::new("Sweep", a, b);
                let again = engine.union_observation(widened, &observation);
                assert!(again.is_none(), "{current:?} + ({a}, {b}) widened twice");
            }
        }
    }
}

#[test]
fn test_margin_is_applied_to_moved_bounds() {
    for &ratio in RATIOS {
        let widened = widen(MetricLimit::EMPTY, ratio, ratio);
        assert!(widened.min() < ratio, "min {ratio} -> {widened:?}");
        assert!(widened.min() > 0.0, "min {ratio} -> {widened:?}");
        assert!(widened.max() > ratio, "max {ratio} -> {widened:?}");
    }
}

#[test]
fn test_checker_accepts_what_union_produced() {
    let engine = LimitsUnionEngine::new();
    let checker = LimitChecker::new();
    for &a in RATIOS {
        for &b in RATIOS {
            let observations = vec![RatioObservation::new("Sweep", a, b)];
            let mut targets = CompetitionTargets::new();
            engine.apply(&mut targets, &observations);

            let findings = checker.check(&targets, &observations);
            assert!(findings.iter().all(|f| !f.is_critical), "({a}, {b}): {findings:?}");
        }
    }
}

#[test]
fn test_negative_candidate_is_noop() {
    for limit in starting_limits() {
        assert_eq!(limit.union_with_min(-1.0), None, "{limit:?}");
        assert_eq!(limit.union_with_max(-1.0), None, "{limit:?}");
        assert_eq!(limit.union_with_min(-0.25), None, "{limit:?}");
    }
}

/// Engine that requests a rerun on each of its first `rerun_passes` passes.
struct RerunEngine {
    rerun_passes: u32,
    calls: u32,
}

#[async_trait]
impl MeasurementEngine for RerunEngine {
    type Summary = ();

    async fn run_pass(&mut self, ctx: PassContext<()>) -> Result<PassOutput<()>> {
        self.calls += 1;
        if ctx.run_number <= self.rerun_passes {
            ctx.state.request_reruns(1, "sweep");
        }
        Ok(PassOutput::new(()))
    }
}

async fn passes_for(max_rerun_count: u32, rerun_passes: u32) -> u32 {
    let config = CompetitionConfig {
        max_rerun_count,
        ..Default::default()
    };
    let engine = RerunEngine {
        rerun_passes,
        calls: 0,
    };
    let mut runner = CompetitionRunner::new(engine);
    let run = runner.run(&CompetitionContext::new("Sweep", config)).await;
    assert_eq!(runner.engine().calls, run.state.passes_completed());
    run.state.passes_completed()
}

#[tokio::test]
async fn test_loop_never_exceeds_cap() {
    for max in 1..=12 {
        assert_eq!(passes_for(max, u32::MAX).await, max, "always rerun, max {max}");
        assert_eq!(passes_for(max, 0).await, 1, "never rerun, max {max}");
        assert_eq!(passes_for(max, 1).await, max.min(3), "one rerun, max {max}");
    }
}
