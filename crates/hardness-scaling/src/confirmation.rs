//! Exponential confirmation ("kill shot")
//!
//! Fits both growth laws over a series of small sizes, then measures the
//! effective branching factor b = steps^(1/n) at one much larger probe size
//! and extrapolates b^n to a target size well beyond anything solvable.
//!
//! ## Verdicts
//!
//! 1. Exponential R² strictly above power-law R²: confirmed exponential.
//! 2. Otherwise, if the extrapolated cost at the target exceeds the
//!    threshold: hidden exponential (the fit is in a grey zone but b says
//!    the cost still explodes).
//! 3. Otherwise: polynomial anomaly.
//!
//! Extrapolated costs overflow `f64` quickly, so they are carried as
//! log10.

use hardness_core::CancelToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScalingError};
use crate::regression::{compare_models, ModelComparison};
use crate::sampling::{cost_curve, measure_cost, point_seed, sweep_sizes, CostSample, StepBudget};
use crate::scaling::{check_sizes, CRITICAL_ALPHA};

/// Extrapolated step count above which a grey-zone fit still counts as
/// exponential.
pub const HIDDEN_EXPONENTIAL_THRESHOLD: f64 = 1e6;

/// Verdict of [`confirm_exponential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationDiagnosis {
    /// The exponential model fits strictly better.
    ConfirmedExponential,
    /// The fit is ambiguous but b^target exceeds the threshold.
    HiddenExponential,
    /// Neither the fit nor the extrapolation indicates exponential cost.
    PolynomialAnomaly,
}

impl ConfirmationDiagnosis {
    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            ConfirmationDiagnosis::ConfirmedExponential => {
                "confirmed exponential: e^(Bn) beats n^B on the measured curve"
            }
            ConfirmationDiagnosis::HiddenExponential => {
                "hidden exponential: fit is ambiguous but extrapolated cost explodes"
            }
            ConfirmationDiagnosis::PolynomialAnomaly => {
                "polynomial anomaly: no exponential signal in fit or extrapolation"
            }
        }
    }
}

/// Parameters of [`confirm_exponential`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Clause ratio held fixed.
    pub alpha: f64,
    /// Sizes for the growth-law fit, ascending.
    pub fit_sizes: Vec<usize>,
    /// Instances per fit size.
    pub fit_samples: usize,
    /// Ceiling schedule over the fit sizes.
    pub fit_budget: StepBudget,
    /// Size at which b is measured.
    pub probe_n: usize,
    /// Instances at the probe size.
    pub probe_samples: usize,
    /// Ceiling at the probe size.
    pub probe_step_limit: u64,
    /// Size the cost is extrapolated to.
    pub target_n: usize,
    /// Extrapolated cost above which the verdict is hidden exponential.
    pub hidden_threshold: f64,
    /// Base seed.
    pub seed: u64,
    /// Measure fit sizes on the rayon pool.
    pub parallel: bool,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            alpha: CRITICAL_ALPHA,
            fit_sizes: vec![10, 14, 18, 22, 26],
            fit_samples: 10,
            fit_budget: StepBudget::doubling(10_000, 500_000),
            probe_n: 50,
            probe_samples: 5,
            probe_step_limit: 5_000_000,
            target_n: 100,
            hidden_threshold: HIDDEN_EXPONENTIAL_THRESHOLD,
            seed: 1337,
            parallel: true,
        }
    }
}

impl ConfirmationConfig {
    /// Probe at n = 30 for a quick run.
    pub fn fast() -> Self {
        Self {
            fit_sizes: vec![10, 14, 18],
            fit_samples: 6,
            probe_n: 30,
            probe_samples: 3,
            probe_step_limit: 500_000,
            ..Self::default()
        }
    }
}

/// Outcome of [`confirm_exponential`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationResult {
    /// Clause ratio.
    pub alpha: f64,
    /// Samples behind the fit.
    pub fit_samples: Vec<CostSample>,
    /// Both fits.
    pub fit: ModelComparison,
    /// Measurement at the probe size.
    pub probe: CostSample,
    /// b = avg_steps^(1/probe_n).
    pub branching_factor: f64,
    /// Extrapolation target.
    pub target_n: usize,
    /// log10 of b^target_n.
    pub extrapolated_log10: f64,
    /// Verdict.
    pub diagnosis: ConfirmationDiagnosis,
}

impl ConfirmationResult {
    /// b^target_n; `f64::INFINITY` once it leaves the representable range.
    pub fn extrapolated_steps(&self) -> f64 {
        10f64.powf(self.extrapolated_log10)
    }
}

/// Fit, probe, extrapolate and classify.
pub fn confirm_exponential(
    config: &ConfirmationConfig,
    cancel: Option<&CancelToken>,
) -> Result<ConfirmationResult> {
    debug!(
        "confirmation: alpha={}, fit sizes {:?}, probe n={}, target n={}",
        config.alpha, config.fit_sizes, config.probe_n, config.target_n
    );
    check_sizes(&config.fit_sizes)?;
    if !(config.hidden_threshold.is_finite() && config.hidden_threshold > 0.0) {
        return Err(ScalingError::InvalidParameter(format!(
            "hidden threshold must be positive and finite, got {}",
            config.hidden_threshold
        )));
    }

    let fit_samples = sweep_sizes(
        config.alpha,
        &config.fit_sizes,
        config.fit_samples,
        &config.fit_budget,
        config.seed,
        config.parallel,
        cancel,
    )?;
    let fit = compare_models(&cost_curve(&fit_samples))?;

    let probe = measure_cost(
        config.probe_n,
        config.alpha,
        config.probe_samples,
        config.probe_step_limit,
        point_seed(config.seed, config.fit_sizes.len()),
        cancel,
    )?;
    let branching_factor = probe.branching_factor();
    let extrapolated_log10 = config.target_n as f64 * branching_factor.log10();
    let diagnosis = diagnose(&fit, extrapolated_log10, config.hidden_threshold);
    info!(
        "confirmation: b={:.4} at n={}, 10^{:.2} steps at n={} -> {:?}",
        branching_factor, config.probe_n, extrapolated_log10, config.target_n, diagnosis
    );

    Ok(ConfirmationResult {
        alpha: config.alpha,
        fit_samples,
        fit,
        probe,
        branching_factor,
        target_n: config.target_n,
        extrapolated_log10,
        diagnosis,
    })
}

fn diagnose(fit: &ModelComparison, extrapolated_log10: f64, threshold: f64) -> ConfirmationDiagnosis {
    if fit.exponential.r_squared > fit.power.r_squared {
        ConfirmationDiagnosis::ConfirmedExponential
    } else if extrapolated_log10 > threshold.log10() {
        ConfirmationDiagnosis::HiddenExponential
    } else {
        ConfirmationDiagnosis::PolynomialAnomaly
    }
}
