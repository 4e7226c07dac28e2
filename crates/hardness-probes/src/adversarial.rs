//! Adversarial scaling
//!
//! Re-runs the generalization test over growing n and fits a line to mean
//! accuracy vs. n. A leak that only exists at small sizes shows up as a
//! negative slope.
//!
//! | slope per variable          | verdict    |
//! |-----------------------------|------------|
//! | ≥ -[`DECAY_SLOPE`]          | robust     |
//! | ≥ -[`COLLAPSE_SLOPE`]       | decaying   |
//! | steeper                     | collapsing |

use hardness_core::{derive_seed, CancelToken};
use hardness_scaling::{linear_fit, LinearFit};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProbeError, Result};
use crate::generalization::{GeneralizationConfig, GeneralizationDiagnosis};
use crate::universality::{run_samples, AccuracyStats};

/// Accuracy loss per added variable tolerated by a robust leak.
pub const DECAY_SLOPE: f64 = 0.002;
/// Accuracy loss per added variable beyond which the leak collapses.
pub const COLLAPSE_SLOPE: f64 = 0.01;

/// Trend of the leak with size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdversarialVerdict {
    /// Accuracy holds as n grows.
    Robust,
    /// Accuracy falls slowly with n.
    Decaying,
    /// Accuracy falls fast with n.
    Collapsing,
}

impl AdversarialVerdict {
    /// Classify a slope.
    pub fn from_slope(slope: f64, decay: f64, collapse: f64) -> Self {
        if slope >= -decay {
            AdversarialVerdict::Robust
        } else if slope >= -collapse {
            AdversarialVerdict::Decaying
        } else {
            AdversarialVerdict::Collapsing
        }
    }

    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            AdversarialVerdict::Robust => "robust: prediction accuracy holds as n grows",
            AdversarialVerdict::Decaying => "decaying: prediction accuracy erodes with n",
            AdversarialVerdict::Collapsing => {
                "collapsing: the leak is a small-size artifact"
            }
        }
    }
}

/// Parameters of [`adversarial_scaling`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdversarialConfig {
    /// Per-instance test; `n` is replaced by each size.
    pub base: GeneralizationConfig,
    /// Sizes, ascending.
    pub sizes: Vec<usize>,
    /// Instances per size.
    pub samples_per_size: usize,
    /// Robust tolerance on the slope.
    pub decay_slope: f64,
    /// Collapse threshold on the slope.
    pub collapse_slope: f64,
    /// Evaluate instances on the rayon pool.
    pub parallel: bool,
}

impl Default for AdversarialConfig {
    fn default() -> Self {
        Self {
            base: GeneralizationConfig::default(),
            sizes: vec![20, 30, 40, 50, 60],
            samples_per_size: 5,
            decay_slope: DECAY_SLOPE,
            collapse_slope: COLLAPSE_SLOPE,
            parallel: true,
        }
    }
}

/// Mean accuracy at one size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeAccuracy {
    /// Number of variables.
    pub n: usize,
    /// Instances with a backbone.
    pub evaluated: usize,
    /// Accuracy statistics over them.
    pub stats: AccuracyStats,
}

/// Outcome of [`adversarial_scaling`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdversarialResult {
    /// Clause ratio.
    pub alpha: f64,
    /// One entry per size with at least one evaluated instance.
    pub points: Vec<SizeAccuracy>,
    /// Line through (n, mean accuracy).
    pub trend: LinearFit,
    /// Verdict.
    pub verdict: AdversarialVerdict,
}

/// Run the adversarial scaling check.
pub fn adversarial_scaling(
    config: &AdversarialConfig,
    cancel: Option<&CancelToken>,
) -> Result<AdversarialResult> {
    if config.samples_per_size == 0 {
        return Err(ProbeError::InvalidParameter(
            "at least one sample per size is required".to_string(),
        ));
    }
    debug!(
        "adversarial scaling: alpha={}, sizes={:?}, {} samples each",
        config.base.alpha, config.sizes, config.samples_per_size
    );

    let mut points = Vec::with_capacity(config.sizes.len());
    for (i, &n) in config.sizes.iter().enumerate() {
        let base = config.base.with_instance(n, derive_seed(config.base.seed, i as u64));
        let results = run_samples(&base, config.samples_per_size, config.parallel, cancel)?;
        let accuracies: Vec<f64> = results
            .iter()
            .filter(|r| r.diagnosis != GeneralizationDiagnosis::NoBackbone)
            .map(|r| r.accuracy)
            .collect();
        if accuracies.is_empty() {
            debug!("adversarial scaling: no backbone at n={}, skipped", n);
            continue;
        }
        points.push(SizeAccuracy {
            n,
            evaluated: accuracies.len(),
            stats: AccuracyStats::of(&accuracies),
        });
    }

    let xs: Vec<f64> = points.iter().map(|p| p.n as f64).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.stats.mean).collect();
    let trend = linear_fit(&xs, &ys)?;
    let verdict = AdversarialVerdict::from_slope(trend.slope, config.decay_slope, config.collapse_slope);
    info!(
        "adversarial scaling: slope {:.5} per variable over {} sizes -> {:?}",
        trend.slope,
        points.len(),
        verdict
    );

    Ok(AdversarialResult {
        alpha: config.base.alpha,
        points,
        trend,
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slope_tiers() {
        let v = |s| AdversarialVerdict::from_slope(s, DECAY_SLOPE, COLLAPSE_SLOPE);
        assert_eq!(v(0.01), AdversarialVerdict::Robust);
        assert_eq!(v(-0.001), AdversarialVerdict::Robust);
        assert_eq!(v(-0.005), AdversarialVerdict::Decaying);
        assert_eq!(v(-0.02), AdversarialVerdict::Collapsing);
    }

    #[test]
    fn test_small_run() {
        let config = AdversarialConfig {
            base: GeneralizationConfig::at(0, 3.5, 77),
            sizes: vec![15, 20, 25],
            samples_per_size: 4,
            parallel: false,
            ..AdversarialConfig::default()
        };
        let result = adversarial_scaling(&config, None).unwrap();
        assert!(result.points.len() >= 2);
        for p in &result.points {
            assert!((0.0..=1.0).contains(&p.stats.mean));
            assert!(p.evaluated <= 4);
        }
        assert_eq!(
            result.verdict,
            AdversarialVerdict::from_slope(result.trend.slope, DECAY_SLOPE, COLLAPSE_SLOPE)
        );
    }

    #[test]
    fn test_unsatisfiable_sizes_have_no_trend() {
        let config = AdversarialConfig {
            base: GeneralizationConfig::at(0, 10.0, 1).exact(100_000),
            sizes: vec![12, 14],
            samples_per_size: 2,
            parallel: false,
            ..AdversarialConfig::default()
        };
        assert!(matches!(
            adversarial_scaling(&config, None),
            Err(ProbeError::Regression(_))
        ));
    }
}
