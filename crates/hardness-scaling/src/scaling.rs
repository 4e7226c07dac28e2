//! Cost vs. n at fixed α
//!
//! Scaling analysis measures average DPLL steps over a series of sizes and
//! asks whether e^(B·n) or n^B explains the curve better. The stress test
//! repeats the measurement at larger sizes with much higher ceilings and
//! additionally reports when the ceiling, not the instance, bounded the
//! cost.
//!
//! ## Budgets
//!
//! Ceilings escalate with n via [`StepBudget`]. Runs that hit the ceiling
//! are averaged in at the ceiling, which flattens the top of the curve and
//! biases the fit toward the polynomial model; the stress test detects
//! this and reports [`StressDiagnosis::BudgetSaturated`] instead of
//! trusting the fit.

use hardness_core::CancelToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScalingError};
use crate::regression::{compare_models, GrowthModel, ModelComparison};
use crate::sampling::{cost_curve, sweep_sizes, CostSample, StepBudget};

/// Critical clause ratio of random 3-SAT.
pub const CRITICAL_ALPHA: f64 = 4.26;

/// Stress-test fraction of ceiling hits at the largest n above which the
/// fit is not trusted.
pub const SATURATION_THRESHOLD: f64 = 0.5;

/// Which growth law the measured cost follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalingDiagnosis {
    /// e^(B·n) fits at least as well as n^B.
    Exponential,
    /// n^B fits strictly better.
    Polynomial,
}

impl ScalingDiagnosis {
    fn from_comparison(fit: &ModelComparison) -> Self {
        match fit.preferred {
            GrowthModel::Exponential => ScalingDiagnosis::Exponential,
            GrowthModel::Polynomial => ScalingDiagnosis::Polynomial,
        }
    }

    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            ScalingDiagnosis::Exponential => "exponential growth: cost multiplies per added variable",
            ScalingDiagnosis::Polynomial => "polynomial growth: cost follows a power law in n",
        }
    }
}

/// Parameters of [`scaling_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// Clause ratio held fixed.
    pub alpha: f64,
    /// Sizes to measure, ascending.
    pub sizes: Vec<usize>,
    /// Instances per size.
    pub samples_per_size: usize,
    /// Ceiling schedule.
    pub budget: StepBudget,
    /// Base seed.
    pub seed: u64,
    /// Measure sizes on the rayon pool.
    pub parallel: bool,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            alpha: CRITICAL_ALPHA,
            sizes: vec![10, 15, 20, 25, 30, 35],
            samples_per_size: 20,
            budget: StepBudget::doubling(10_000, 1_000_000),
            seed: 42,
            parallel: true,
        }
    }
}

impl ScalingConfig {
    /// Small sizes, few samples.
    pub fn fast() -> Self {
        Self {
            sizes: vec![10, 14, 18, 22],
            samples_per_size: 8,
            budget: StepBudget::doubling(10_000, 200_000),
            ..Self::default()
        }
    }
}

/// Outcome of [`scaling_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingResult {
    /// Clause ratio.
    pub alpha: f64,
    /// One cost sample per size.
    pub samples: Vec<CostSample>,
    /// Both fits over (n, avg_steps).
    pub fit: ModelComparison,
    /// Preferred growth law.
    pub diagnosis: ScalingDiagnosis,
}

pub(crate) fn check_sizes(sizes: &[usize]) -> Result<()> {
    if sizes.len() < 3 {
        return Err(ScalingError::InvalidParameter(format!(
            "need at least 3 sizes to compare growth laws, got {}",
            sizes.len()
        )));
    }
    if sizes.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ScalingError::InvalidParameter(
            "sizes must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

/// Measure cost across `config.sizes` and compare growth laws.
pub fn scaling_analysis(config: &ScalingConfig, cancel: Option<&CancelToken>) -> Result<ScalingResult> {
    check_sizes(&config.sizes)?;
    debug!(
        "scaling analysis: alpha={}, sizes={:?}, {} samples each",
        config.alpha, config.sizes, config.samples_per_size
    );

    let samples = sweep_sizes(
        config.alpha,
        &config.sizes,
        config.samples_per_size,
        &config.budget,
        config.seed,
        config.parallel,
        cancel,
    )?;
    let fit = compare_models(&cost_curve(&samples))?;
    let diagnosis = ScalingDiagnosis::from_comparison(&fit);
    info!(
        "scaling: exp R2={:.4}, power R2={:.4} -> {:?}",
        fit.exponential.r_squared, fit.power.r_squared, diagnosis
    );

    Ok(ScalingResult {
        alpha: config.alpha,
        samples,
        fit,
        diagnosis,
    })
}

/// What the stress test concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressDiagnosis {
    /// Cost keeps multiplying at large n.
    ExponentialWall,
    /// A power law fits the large-n curve better.
    PolynomialAnomaly,
    /// Most runs at the largest n hit the ceiling; the curve is the budget.
    BudgetSaturated,
}

impl StressDiagnosis {
    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            StressDiagnosis::ExponentialWall => {
                "exponential wall: cost keeps multiplying at large n"
            }
            StressDiagnosis::PolynomialAnomaly => {
                "polynomial anomaly: a power law fits the large-n curve better"
            }
            StressDiagnosis::BudgetSaturated => {
                "budget saturated: the step ceiling, not the instance, bounded the cost"
            }
        }
    }
}

/// Parameters of [`stress_test`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressTestConfig {
    /// Clause ratio held fixed.
    pub alpha: f64,
    /// Sizes to measure, ascending.
    pub sizes: Vec<usize>,
    /// Instances per size.
    pub samples_per_size: usize,
    /// Ceiling schedule.
    pub budget: StepBudget,
    /// Ceiling-hit fraction at the largest n that marks saturation.
    pub saturation_threshold: f64,
    /// Base seed.
    pub seed: u64,
    /// Measure sizes on the rayon pool.
    pub parallel: bool,
}

impl Default for StressTestConfig {
    fn default() -> Self {
        Self {
            alpha: CRITICAL_ALPHA,
            sizes: vec![30, 40, 50, 60],
            samples_per_size: 5,
            budget: StepBudget::doubling(100_000, 5_000_000),
            saturation_threshold: SATURATION_THRESHOLD,
            seed: 7,
            parallel: true,
        }
    }
}

impl StressTestConfig {
    /// Pushes to n = 80 with a 20M ceiling.
    pub fn thorough() -> Self {
        Self {
            sizes: vec![30, 40, 50, 60, 70, 80],
            samples_per_size: 10,
            budget: StepBudget::doubling(100_000, 20_000_000),
            ..Self::default()
        }
    }
}

/// Outcome of [`stress_test`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestResult {
    /// Clause ratio.
    pub alpha: f64,
    /// One cost sample per size.
    pub samples: Vec<CostSample>,
    /// Both fits over (n, avg_steps).
    pub fit: ModelComparison,
    /// Ceiling-hit fraction at the largest n.
    pub saturation: f64,
    /// Verdict.
    pub diagnosis: StressDiagnosis,
}

/// Scaling analysis at large n with saturation detection.
pub fn stress_test(config: &StressTestConfig, cancel: Option<&CancelToken>) -> Result<StressTestResult> {
    check_sizes(&config.sizes)?;
    debug!(
        "stress test: alpha={}, sizes={:?}, ceiling up to {}",
        config.alpha, config.sizes, config.budget.max
    );

    let samples = sweep_sizes(
        config.alpha,
        &config.sizes,
        config.samples_per_size,
        &config.budget,
        config.seed,
        config.parallel,
        cancel,
    )?;
    let fit = compare_models(&cost_curve(&samples))?;
    let saturation = samples.last().map_or(0.0, CostSample::inconclusive_ratio);
    let diagnosis = diagnose_stress(&fit, saturation, config.saturation_threshold);
    info!(
        "stress: saturation {:.2}, exp R2={:.4}, power R2={:.4} -> {:?}",
        saturation, fit.exponential.r_squared, fit.power.r_squared, diagnosis
    );

    Ok(StressTestResult {
        alpha: config.alpha,
        samples,
        fit,
        saturation,
        diagnosis,
    })
}

fn diagnose_stress(fit: &ModelComparison, saturation: f64, threshold: f64) -> StressDiagnosis {
    if saturation > threshold {
        StressDiagnosis::BudgetSaturated
    } else {
        match fit.preferred {
            GrowthModel::Exponential => StressDiagnosis::ExponentialWall,
            GrowthModel::Polynomial => StressDiagnosis::PolynomialAnomaly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(points: &[(f64, f64)]) -> ModelComparison {
        compare_models(points).unwrap()
    }

    #[test]
    fn test_rejects_short_or_unsorted_sizes() {
        let mut config = ScalingConfig::fast();
        config.sizes = vec![10, 20];
        assert!(matches!(
            scaling_analysis(&config, None),
            Err(ScalingError::InvalidParameter(_))
        ));
        config.sizes = vec![10, 30, 20];
        assert!(matches!(
            scaling_analysis(&config, None),
            Err(ScalingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_fast_analysis_shape() {
        let config = ScalingConfig::fast();
        let result = scaling_analysis(&config, None).unwrap();
        assert_eq!(result.samples.len(), config.sizes.len());
        for (sample, &n) in result.samples.iter().zip(&config.sizes) {
            assert_eq!(sample.n, n);
            assert_eq!(sample.samples, config.samples_per_size);
        }
        assert!(result.fit.exponential.r_squared <= 1.0 + 1e-12);
        assert_eq!(
            result.diagnosis,
            ScalingDiagnosis::from_comparison(&result.fit)
        );
    }

    #[test]
    fn test_stress_saturation_overrides_fit() {
        let exp = comparison(&[(30.0, 100.0), (40.0, 1_000.0), (50.0, 10_000.0)]);
        assert_eq!(diagnose_stress(&exp, 0.2, 0.5), StressDiagnosis::ExponentialWall);
        assert_eq!(diagnose_stress(&exp, 0.8, 0.5), StressDiagnosis::BudgetSaturated);

        let cubic = comparison(&[(10.0, 5.0), (20.0, 40.0), (30.0, 135.0)]);
        assert_eq!(diagnose_stress(&cubic, 0.0, 0.5), StressDiagnosis::PolynomialAnomaly);
    }

    #[test]
    fn test_stress_with_tiny_ceiling_saturates() {
        let config = StressTestConfig {
            sizes: vec![30, 35, 40],
            samples_per_size: 3,
            budget: StepBudget {
                base: 2,
                growth: 1.0,
                max: 2,
            },
            parallel: false,
            ..StressTestConfig::default()
        };
        let result = stress_test(&config, None).unwrap();
        assert_eq!(result.saturation, 1.0);
        assert_eq!(result.diagnosis, StressDiagnosis::BudgetSaturated);
    }
}
