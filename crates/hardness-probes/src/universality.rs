//! Universality test
//!
//! Repeats the generalization test on many independent instances at the
//! same (n, α). Instances without a backbone are skipped. A sample is
//! consistent when its accuracy exceeds [`CONSISTENT_ACCURACY`].
//!
//! | condition                          | verdict   |
//! |------------------------------------|-----------|
//! | consistent fraction ≥ 0.90         | universal |
//! | mean accuracy ≥ weak threshold     | partial   |
//! | otherwise, or nothing to evaluate  | absent    |

use hardness_core::CancelToken;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProbeError, Result};
use crate::generalization::{evaluate, GeneralizationConfig, GeneralizationDiagnosis, GeneralizationResult};
use crate::instance::InstanceSpec;

/// Accuracy above which a sample is consistent.
pub const CONSISTENT_ACCURACY: f64 = 0.80;
/// Consistent fraction at or above which the leak is universal.
pub const UNIVERSAL_FRACTION: f64 = 0.90;

/// How general the structural leak is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniversalityVerdict {
    /// Nearly every instance leaks its backbone.
    Universal,
    /// Degree helps on average but not reliably.
    Partial,
    /// No systematic leak.
    Absent,
}

impl UniversalityVerdict {
    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            UniversalityVerdict::Universal => {
                "universal: the structural leak holds across instances"
            }
            UniversalityVerdict::Partial => {
                "partial: the leak appears on average but not consistently"
            }
            UniversalityVerdict::Absent => "absent: no systematic structural leak",
        }
    }
}

/// Parameters of [`universality_test`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniversalityConfig {
    /// Per-instance test; its seed is the base seed.
    pub base: GeneralizationConfig,
    /// Number of instances.
    pub samples: usize,
    /// Consistency threshold.
    pub consistent_accuracy: f64,
    /// Universal threshold on the consistent fraction.
    pub universal_fraction: f64,
    /// Evaluate instances on the rayon pool.
    pub parallel: bool,
}

impl Default for UniversalityConfig {
    fn default() -> Self {
        Self {
            base: GeneralizationConfig::default(),
            samples: 20,
            consistent_accuracy: CONSISTENT_ACCURACY,
            universal_fraction: UNIVERSAL_FRACTION,
            parallel: true,
        }
    }
}

impl UniversalityConfig {
    /// Default test at the given point.
    pub fn at(n: usize, alpha: f64, seed: u64) -> Self {
        Self {
            base: GeneralizationConfig::at(n, alpha, seed),
            ..Self::default()
        }
    }
}

/// Accuracy statistics over evaluated samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccuracyStats {
    /// Mean accuracy.
    pub mean: f64,
    /// Lowest accuracy.
    pub min: f64,
    /// Highest accuracy.
    pub max: f64,
}

impl AccuracyStats {
    /// Statistics of `accuracies`; all zero when empty.
    pub fn of(accuracies: &[f64]) -> Self {
        if accuracies.is_empty() {
            return Self::default();
        }
        let mean = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
        let min = accuracies.iter().copied().fold(f64::INFINITY, f64::min);
        let max = accuracies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { mean, min, max }
    }
}

/// Outcome of [`universality_test`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalityResult {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Instances run.
    pub samples: usize,
    /// Instances with a backbone.
    pub evaluated: usize,
    /// Accuracy of each evaluated instance, in sample order.
    pub accuracies: Vec<f64>,
    /// Summary of `accuracies`.
    pub stats: AccuracyStats,
    /// Fraction of evaluated instances above the consistency threshold.
    pub consistent_fraction: f64,
    /// Verdict.
    pub verdict: UniversalityVerdict,
}

/// Classify aggregated accuracies.
pub fn verdict(
    evaluated: usize,
    mean: f64,
    consistent_fraction: f64,
    config: &UniversalityConfig,
) -> UniversalityVerdict {
    if evaluated == 0 {
        UniversalityVerdict::Absent
    } else if consistent_fraction >= config.universal_fraction {
        UniversalityVerdict::Universal
    } else if mean >= config.base.weak_accuracy {
        UniversalityVerdict::Partial
    } else {
        UniversalityVerdict::Absent
    }
}

/// Run the generalization test on `samples` instances derived from
/// `base`, sequentially or on the rayon pool. Order matches sample index.
pub(crate) fn run_samples(
    base: &GeneralizationConfig,
    samples: usize,
    parallel: bool,
    cancel: Option<&CancelToken>,
) -> Result<Vec<GeneralizationResult>> {
    let origin = InstanceSpec::new(base.n, base.alpha, base.seed);
    let run = |i: usize| evaluate(&origin.nth(i as u64), base, cancel);
    if parallel {
        (0..samples).into_par_iter().map(run).collect()
    } else {
        (0..samples).map(run).collect()
    }
}

/// Run the universality test.
pub fn universality_test(
    config: &UniversalityConfig,
    cancel: Option<&CancelToken>,
) -> Result<UniversalityResult> {
    if config.samples == 0 {
        return Err(ProbeError::InvalidParameter(
            "universality needs at least one sample".to_string(),
        ));
    }
    debug!(
        "universality: n={}, alpha={}, {} samples",
        config.base.n, config.base.alpha, config.samples
    );

    let results = run_samples(&config.base, config.samples, config.parallel, cancel)?;
    let accuracies: Vec<f64> = results
        .iter()
        .filter(|r| r.diagnosis != GeneralizationDiagnosis::NoBackbone)
        .map(|r| r.accuracy)
        .collect();
    let evaluated = accuracies.len();
    let stats = AccuracyStats::of(&accuracies);
    let consistent = accuracies
        .iter()
        .filter(|&&a| a > config.consistent_accuracy)
        .count();
    let consistent_fraction = if evaluated == 0 {
        0.0
    } else {
        consistent as f64 / evaluated as f64
    };
    let verdict = verdict(evaluated, stats.mean, consistent_fraction, config);
    info!(
        "universality: {} of {} evaluated, mean {:.2} [{:.2}, {:.2}], consistent {:.2} -> {:?}",
        evaluated, config.samples, stats.mean, stats.min, stats.max, consistent_fraction, verdict
    );

    Ok(UniversalityResult {
        n: config.base.n,
        alpha: config.base.alpha,
        samples: config.samples,
        evaluated,
        accuracies,
        stats,
        consistent_fraction,
        verdict,
    })
}
