//! Satisfiability and cost across the clause ratio
//!
//! The macro scan is the baseline picture of the phase transition: the
//! fraction of satisfiable instances falls from 1 to 0 around α ≈ 4.26
//! while the exact-search cost peaks there. The α of peak average cost is
//! what downstream probes are pointed at.

use hardness_core::CancelToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScalingError};
use crate::sampling::{alpha_grid, sweep_alphas, CostSample};

/// One point of the macro scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationDataPoint {
    /// Clause ratio.
    pub alpha: f64,
    /// Mean DPLL steps.
    pub avg_steps: f64,
    /// Largest DPLL step count.
    pub max_steps: u64,
    /// Fraction of satisfiable instances, in [0, 1].
    pub satisfiability_ratio: f64,
    /// Fraction of instances that hit the step ceiling, in [0, 1].
    pub inconclusive_ratio: f64,
}

impl From<&CostSample> for SimulationDataPoint {
    fn from(sample: &CostSample) -> Self {
        SimulationDataPoint {
            alpha: sample.alpha,
            avg_steps: sample.avg_steps,
            max_steps: sample.max_steps,
            satisfiability_ratio: sample.sat_ratio(),
            inconclusive_ratio: sample.inconclusive_ratio(),
        }
    }
}

/// Parameters of the macro scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroScanConfig {
    /// Number of variables.
    pub n: usize,
    /// Smallest α.
    pub alpha_min: f64,
    /// Largest α.
    pub alpha_max: f64,
    /// α increment.
    pub alpha_step: f64,
    /// Instances per α.
    pub samples_per_alpha: usize,
    /// DPLL step ceiling per instance.
    pub step_limit: u64,
    /// Base seed.
    pub seed: u64,
    /// Sweep α values on the rayon pool.
    pub parallel: bool,
}

impl Default for MacroScanConfig {
    fn default() -> Self {
        Self {
            n: 20,
            alpha_min: 2.0,
            alpha_max: 7.0,
            alpha_step: 0.25,
            samples_per_alpha: 20,
            step_limit: 100_000,
            seed: 42,
            parallel: true,
        }
    }
}

impl MacroScanConfig {
    /// Coarse, quick scan.
    pub fn fast() -> Self {
        Self {
            n: 15,
            alpha_step: 0.5,
            samples_per_alpha: 10,
            step_limit: 20_000,
            ..Self::default()
        }
    }
}

/// The scanned curve and its peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroScanResult {
    /// Number of variables.
    pub n: usize,
    /// One point per α, ascending.
    pub points: Vec<SimulationDataPoint>,
    /// α with the highest average cost (first one on ties).
    pub peak_alpha: f64,
    /// Average cost at `peak_alpha`.
    pub peak_avg_steps: f64,
}

/// Run the macro scan.
pub fn macro_scan(config: &MacroScanConfig, cancel: Option<&CancelToken>) -> Result<MacroScanResult> {
    let alphas = alpha_grid(config.alpha_min, config.alpha_max, config.alpha_step)?;
    debug!(
        "macro scan: n={}, {} alpha values in [{}, {}], {} samples each",
        config.n,
        alphas.len(),
        config.alpha_min,
        config.alpha_max,
        config.samples_per_alpha
    );

    let samples = sweep_alphas(
        config.n,
        &alphas,
        config.samples_per_alpha,
        config.step_limit,
        config.seed,
        config.parallel,
        cancel,
    )?;
    let points: Vec<SimulationDataPoint> = samples.iter().map(SimulationDataPoint::from).collect();

    let peak = points
        .iter()
        .fold(None::<&SimulationDataPoint>, |best, p| match best {
            Some(b) if b.avg_steps >= p.avg_steps => Some(b),
            _ => Some(p),
        })
        .ok_or_else(|| ScalingError::InvalidParameter("empty alpha range".to_string()))?;

    let result = MacroScanResult {
        n: config.n,
        peak_alpha: peak.alpha,
        peak_avg_steps: peak.avg_steps,
        points,
    };
    info!(
        "macro scan peak at alpha={:.2} ({:.1} avg steps)",
        result.peak_alpha, result.peak_avg_steps
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_falls_across_transition() {
        let config = MacroScanConfig {
            n: 12,
            alpha_min: 2.0,
            alpha_max: 8.0,
            alpha_step: 3.0,
            samples_per_alpha: 30,
            step_limit: 100_000,
            seed: 1,
            parallel: false,
        };
        let result = macro_scan(&config, None).unwrap();
        assert_eq!(result.points.len(), 3);
        let first = &result.points[0];
        let last = &result.points[2];
        assert!(first.satisfiability_ratio > last.satisfiability_ratio);
        assert!(first.satisfiability_ratio > 0.9);
        assert!(last.satisfiability_ratio < 0.2);
        for p in &result.points {
            assert!((0.0..=1.0).contains(&p.satisfiability_ratio));
            assert_eq!(p.inconclusive_ratio, 0.0);
        }
    }

    #[test]
    fn test_peak_is_maximum() {
        let result = macro_scan(&MacroScanConfig::fast(), None).unwrap();
        let max = result
            .points
            .iter()
            .map(|p| p.avg_steps)
            .fold(f64::MIN, f64::max);
        assert_eq!(result.peak_avg_steps, max);
        assert!(result.points.iter().any(|p| p.alpha == result.peak_alpha));
    }
}
