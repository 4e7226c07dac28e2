//! Energy-variance probe
//!
//! Runs a lenient anneal (improvements always taken, uphill moves taken
//! with a fixed escape probability) for a fixed budget and looks at the
//! energy over the last steps of the run:
//!
//! | tail statistics          | diagnosis          |
//! |--------------------------|--------------------|
//! | variance < 0.05, mean > 0 | trapped deep well |
//! | variance > 1.0           | chaotic liquid     |
//! | mean == 0                | solved             |
//! | otherwise                | oscillating glassy |
//!
//! Rules are checked in that order. A run that solves early is padded with
//! zero energy up to the budget, so the tail of a solved run reads as
//! solved rather than as the last few steps before the solution.

use hardness_core::{anneal, Acceptance, AnnealConfig, CancelToken, LENIENT_ESCAPE_PROBABILITY};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProbeError, Result};
use crate::instance::InstanceSpec;

/// Steps at the end of the run that are analysed.
pub const TAIL_WINDOW: usize = 200;
/// Tail variance below which a non-zero energy counts as trapped.
pub const TRAPPED_VARIANCE: f64 = 0.05;
/// Tail variance above which the search counts as chaotic.
pub const CHAOTIC_VARIANCE: f64 = 1.0;

/// Shape of the energy tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarianceDiagnosis {
    /// Stuck at a fixed non-zero energy.
    TrappedDeepWell,
    /// Energy jumps widely between steps.
    ChaoticLiquid,
    /// Energy reached zero.
    Solved,
    /// Small fluctuations around a non-zero energy.
    OscillatingGlassy,
}

impl VarianceDiagnosis {
    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            VarianceDiagnosis::TrappedDeepWell => {
                "trapped in a deep well: energy frozen above zero"
            }
            VarianceDiagnosis::ChaoticLiquid => {
                "chaotic liquid: energy fluctuates widely, no structure found"
            }
            VarianceDiagnosis::Solved => "solved: energy settled at zero",
            VarianceDiagnosis::OscillatingGlassy => {
                "oscillating glassy: small fluctuations around a local minimum"
            }
        }
    }

    /// Whether the search looks stuck; the pipeline uses this to switch the
    /// hysteresis probe to a deep scan.
    pub fn is_trap(&self) -> bool {
        matches!(
            self,
            VarianceDiagnosis::TrappedDeepWell | VarianceDiagnosis::OscillatingGlassy
        )
    }
}

/// Parameters of [`energy_variance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarianceConfig {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Instance seed.
    pub seed: u64,
    /// Anneal steps; the history always has this length.
    pub budget: u64,
    /// Steps at the end of the history that are analysed.
    pub tail_window: usize,
    /// Uphill acceptance probability.
    pub escape_probability: f64,
    /// Trapped ceiling on tail variance.
    pub trapped_variance: f64,
    /// Chaotic floor on tail variance.
    pub chaotic_variance: f64,
}

impl Default for VarianceConfig {
    fn default() -> Self {
        Self {
            n: 50,
            alpha: 4.26,
            seed: 0,
            budget: 2_000,
            tail_window: TAIL_WINDOW,
            escape_probability: LENIENT_ESCAPE_PROBABILITY,
            trapped_variance: TRAPPED_VARIANCE,
            chaotic_variance: CHAOTIC_VARIANCE,
        }
    }
}

impl VarianceConfig {
    /// Default probe at the given point.
    pub fn at(n: usize, alpha: f64, seed: u64) -> Self {
        Self {
            n,
            alpha,
            seed,
            ..Self::default()
        }
    }
}

/// Outcome of [`energy_variance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceAnalysisResult {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Energy after every step, zero-padded to the budget.
    pub energy_history: Vec<usize>,
    /// Mean tail energy.
    pub mean_energy: f64,
    /// Lowest energy in the whole history.
    pub min_energy: usize,
    /// Population variance of the tail energy.
    pub variance: f64,
    /// Classification of the tail.
    pub diagnosis: VarianceDiagnosis,
}

/// Mean and population variance.
pub fn mean_and_variance(values: &[usize]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let len = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / len;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / len;
    (mean, variance)
}

/// Classify tail statistics.
pub fn classify(mean: f64, variance: f64, trapped_variance: f64, chaotic_variance: f64) -> VarianceDiagnosis {
    if variance < trapped_variance && mean > 0.0 {
        VarianceDiagnosis::TrappedDeepWell
    } else if variance > chaotic_variance {
        VarianceDiagnosis::ChaoticLiquid
    } else if mean == 0.0 {
        VarianceDiagnosis::Solved
    } else {
        VarianceDiagnosis::OscillatingGlassy
    }
}

/// Run the energy-variance probe.
pub fn energy_variance(config: &VarianceConfig, cancel: Option<&CancelToken>) -> Result<VarianceAnalysisResult> {
    if config.budget == 0 || config.tail_window == 0 {
        return Err(ProbeError::InvalidParameter(
            "budget and tail window must be positive".to_string(),
        ));
    }
    debug!(
        "variance probe: n={}, alpha={}, budget={}, escape={}",
        config.n, config.alpha, config.budget, config.escape_probability
    );

    let spec = InstanceSpec::new(config.n, config.alpha, config.seed);
    let formula = spec.generate()?;
    let schedule = AnnealConfig {
        max_steps: config.budget,
        ..AnnealConfig::default()
    }
    .with_acceptance(Acceptance::Lenient {
        escape_probability: config.escape_probability,
    });
    let run = anneal(&formula, &schedule, &mut spec.search_rng(0), cancel)?;

    let mut energy_history = run.energy_trace;
    energy_history.resize(config.budget as usize, 0);

    let tail_start = energy_history.len().saturating_sub(config.tail_window);
    let (mean_energy, variance) = mean_and_variance(&energy_history[tail_start..]);
    let min_energy = energy_history.iter().copied().min().unwrap_or(0);
    let diagnosis = classify(
        mean_energy,
        variance,
        config.trapped_variance,
        config.chaotic_variance,
    );
    info!(
        "variance probe: tail mean {:.3}, variance {:.4} -> {:?}",
        mean_energy, variance, diagnosis
    );

    Ok(VarianceAnalysisResult {
        n: config.n,
        alpha: config.alpha,
        energy_history,
        mean_energy,
        min_energy,
        variance,
        diagnosis,
    })
}
