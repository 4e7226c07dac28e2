//! Hysteresis probe
//!
//! Anneals the same instance twice, once quenched and once slowly cooled,
//! and reads the barrier structure off which runs succeed:
//!
//! | fast    | slow    | diagnosis           |
//! |---------|---------|---------------------|
//! | fail    | fail    | thermal death       |
//! | fail    | success | barrier crossing    |
//! | success | success | glassy but easy     |
//! | success | fail    | inverted hysteresis |
//!
//! A slow rate above [`SLOW_COOLING_RATE`] is a deep scan: the slow run
//! also gets a larger step budget so the schedule has time to cool.

use hardness_core::{anneal, AnnealConfig, AnnealRun, CancelToken, FAST_COOLING_RATE, SLOW_COOLING_RATE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProbeError, Result};
use crate::instance::InstanceSpec;

/// Cooling rate used by [`HysteresisConfig::deep_scan`].
pub const DEEP_SCAN_COOLING_RATE: f64 = 0.9995;

/// Whether `slow_rate` is a deep scan.
pub fn is_deep_scan(slow_rate: f64) -> bool {
    slow_rate > SLOW_COOLING_RATE
}

/// Outcome of one anneal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Geometric cooling rate.
    pub cooling_rate: f64,
    /// Steps taken.
    pub steps: u64,
    /// Whether a satisfying assignment was reached.
    pub success: bool,
    /// Lowest energy seen.
    pub best_energy: usize,
}

impl RunOutcome {
    fn from_run(cooling_rate: f64, run: &AnnealRun) -> Self {
        Self {
            cooling_rate,
            steps: run.steps,
            success: run.solved(),
            best_energy: run.best_energy,
        }
    }
}

/// Which runs crossed the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HysteresisDiagnosis {
    /// Neither schedule solves the instance.
    ThermalDeath,
    /// Only slow cooling solves it: a barrier that patience crosses.
    BarrierCrossing,
    /// Both schedules solve it.
    GlassyButEasy,
    /// Only the quench solves it.
    InvertedHysteresis,
}

impl HysteresisDiagnosis {
    /// Classify by which run succeeded.
    pub fn from_outcomes(fast_success: bool, slow_success: bool) -> Self {
        match (fast_success, slow_success) {
            (false, false) => HysteresisDiagnosis::ThermalDeath,
            (false, true) => HysteresisDiagnosis::BarrierCrossing,
            (true, true) => HysteresisDiagnosis::GlassyButEasy,
            (true, false) => HysteresisDiagnosis::InvertedHysteresis,
        }
    }

    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            HysteresisDiagnosis::ThermalDeath => {
                "thermal death: neither cooling schedule escapes the landscape"
            }
            HysteresisDiagnosis::BarrierCrossing => {
                "barrier crossing: slow cooling crosses a barrier the quench cannot"
            }
            HysteresisDiagnosis::GlassyButEasy => {
                "glassy but easy: both schedules find a solution"
            }
            HysteresisDiagnosis::InvertedHysteresis => {
                "inverted hysteresis: only the quench finds a solution"
            }
        }
    }
}

/// Parameters of [`hysteresis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Instance seed.
    pub seed: u64,
    /// Quench rate.
    pub fast_rate: f64,
    /// Slow rate; above [`SLOW_COOLING_RATE`] it is a deep scan.
    pub slow_rate: f64,
    /// Step budget of each run.
    pub max_steps: u64,
    /// Budget multiplier applied to the slow run in a deep scan.
    pub deep_scan_step_multiplier: u64,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            n: 50,
            alpha: 4.26,
            seed: 0,
            fast_rate: FAST_COOLING_RATE,
            slow_rate: SLOW_COOLING_RATE,
            max_steps: 5_000,
            deep_scan_step_multiplier: 4,
        }
    }
}

impl HysteresisConfig {
    /// Default probe at the given point.
    pub fn at(n: usize, alpha: f64, seed: u64) -> Self {
        Self {
            n,
            alpha,
            seed,
            ..Self::default()
        }
    }

    /// Same probe with the slow run turned into a deep scan.
    pub fn deep_scan(self) -> Self {
        Self {
            slow_rate: DEEP_SCAN_COOLING_RATE,
            ..self
        }
    }

    /// Step budget of the slow run.
    pub fn slow_steps(&self) -> u64 {
        if is_deep_scan(self.slow_rate) {
            self.max_steps.saturating_mul(self.deep_scan_step_multiplier.max(1))
        } else {
            self.max_steps
        }
    }
}

/// Outcome of [`hysteresis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HysteresisResult {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Quenched run.
    pub fast: RunOutcome,
    /// Slowly cooled run.
    pub slow: RunOutcome,
    /// Whether the slow run was a deep scan.
    pub is_deep_scan: bool,
    /// Verdict.
    pub diagnosis: HysteresisDiagnosis,
}

/// Run the hysteresis probe.
pub fn hysteresis(config: &HysteresisConfig, cancel: Option<&CancelToken>) -> Result<HysteresisResult> {
    if config.fast_rate >= config.slow_rate {
        return Err(ProbeError::InvalidParameter(format!(
            "fast rate {} must cool faster than slow rate {}",
            config.fast_rate, config.slow_rate
        )));
    }
    let deep = is_deep_scan(config.slow_rate);
    debug!(
        "hysteresis probe: n={}, alpha={}, fast={}, slow={}{}",
        config.n,
        config.alpha,
        config.fast_rate,
        config.slow_rate,
        if deep { " (deep scan)" } else { "" }
    );

    let spec = InstanceSpec::new(config.n, config.alpha, config.seed);
    let formula = spec.generate()?;

    let fast_schedule = AnnealConfig::fast(config.max_steps).with_cooling_rate(config.fast_rate);
    let fast_run = anneal(&formula, &fast_schedule, &mut spec.search_rng(0), cancel)?;
    let slow_schedule = AnnealConfig::slow(config.slow_steps()).with_cooling_rate(config.slow_rate);
    let slow_run = anneal(&formula, &slow_schedule, &mut spec.search_rng(1), cancel)?;

    let fast = RunOutcome::from_run(config.fast_rate, &fast_run);
    let slow = RunOutcome::from_run(config.slow_rate, &slow_run);
    let diagnosis = HysteresisDiagnosis::from_outcomes(fast.success, slow.success);
    info!(
        "hysteresis: fast {} in {} steps, slow {} in {} steps -> {:?}",
        if fast.success { "solved" } else { "failed" },
        fast.steps,
        if slow.success { "solved" } else { "failed" },
        slow.steps,
        diagnosis
    );

    Ok(HysteresisResult {
        n: config.n,
        alpha: config.alpha,
        fast,
        slow,
        is_deep_scan: deep,
        diagnosis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_table() {
        use HysteresisDiagnosis::*;
        assert_eq!(HysteresisDiagnosis::from_outcomes(false, false), ThermalDeath);
        assert_eq!(HysteresisDiagnosis::from_outcomes(false, true), BarrierCrossing);
        assert_eq!(HysteresisDiagnosis::from_outcomes(true, true), GlassyButEasy);
        assert_eq!(HysteresisDiagnosis::from_outcomes(true, false), InvertedHysteresis);
    }

    #[test]
    fn test_deep_scan_extends_slow_budget() {
        let config = HysteresisConfig::default();
        assert!(!is_deep_scan(config.slow_rate));
        assert_eq!(config.slow_steps(), config.max_steps);

        let deep = config.deep_scan();
        assert!(is_deep_scan(deep.slow_rate));
        assert_eq!(deep.slow_steps(), 4 * deep.max_steps);
    }

    #[test]
    fn test_easy_instance_glassy_but_easy() {
        let result = hysteresis(&HysteresisConfig::at(20, 2.0, 3), None).unwrap();
        assert!(result.fast.success && result.slow.success);
        assert_eq!(result.diagnosis, HysteresisDiagnosis::GlassyButEasy);
        assert!(!result.is_deep_scan);
    }

    #[test]
    fn test_unsatisfiable_density_never_succeeds() {
        // α = 10 at n = 20 is unsatisfiable with overwhelming probability
        let config = HysteresisConfig {
            max_steps: 500,
            ..HysteresisConfig::at(20, 10.0, 5).deep_scan()
        };
        let result = hysteresis(&config, None).unwrap();
        assert_eq!(result.diagnosis, HysteresisDiagnosis::ThermalDeath);
        assert!(result.is_deep_scan);
        assert_eq!(result.fast.steps, 500);
        assert_eq!(result.slow.steps, 2_000);
    }

    #[test]
    fn test_rates_must_be_ordered() {
        let config = HysteresisConfig {
            fast_rate: 0.999,
            slow_rate: 0.95,
            ..HysteresisConfig::default()
        };
        assert!(hysteresis(&config, None).is_err());
    }
}
