//! Structural autopsy
//!
//! Anneals while counting accepted flips per variable. A variable whose
//! flip count stays at or below [`FROZEN_FLIP_FRACTION`] of the steps is
//! frozen; the frozen fraction is the backbone rigidity. If the anneal
//! reached zero energy the difficulty was transient. Otherwise a rigid
//! landscape points at structure (shattered clusters), a fluid one at the
//! algorithm.

use hardness_core::{anneal, AnnealConfig, AnnealRun, CancelToken};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProbeError, Result};
use crate::instance::InstanceSpec;

/// Flip count, as a fraction of steps, at or below which a variable is
/// frozen.
pub const FROZEN_FLIP_FRACTION: f64 = 0.005;
/// Rigidity above which an unsolved instance is structurally shattered.
pub const RIGIDITY_THRESHOLD: f64 = 0.5;
/// Rigidity threshold of the strict variant.
pub const STRICT_RIGIDITY_THRESHOLD: f64 = 0.6;

/// Why the anneal did or did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutopsyDiagnosis {
    /// Zero energy was reached.
    Solvable,
    /// Unsolved with a rigid backbone.
    StructuralShattered,
    /// Unsolved with most variables still moving.
    AlgorithmicTrapping,
}

impl AutopsyDiagnosis {
    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            AutopsyDiagnosis::Solvable => "solvable: the difficulty was transient",
            AutopsyDiagnosis::StructuralShattered => {
                "structural: the solution space is shattered into frozen clusters"
            }
            AutopsyDiagnosis::AlgorithmicTrapping => {
                "algorithmic trapping: variables still move but the search stalls"
            }
        }
    }
}

/// Parameters of [`structural_autopsy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopsyConfig {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Instance seed.
    pub seed: u64,
    /// Anneal schedule.
    pub anneal: AnnealConfig,
    /// Frozen flip fraction.
    pub frozen_fraction: f64,
    /// Rigidity above which an unsolved instance is structural.
    pub rigidity_threshold: f64,
}

impl Default for AutopsyConfig {
    fn default() -> Self {
        Self {
            n: 50,
            alpha: 4.26,
            seed: 0,
            anneal: AnnealConfig::slow(5_000),
            frozen_fraction: FROZEN_FLIP_FRACTION,
            rigidity_threshold: RIGIDITY_THRESHOLD,
        }
    }
}

impl AutopsyConfig {
    /// Default probe at the given point.
    pub fn at(n: usize, alpha: f64, seed: u64) -> Self {
        Self {
            n,
            alpha,
            seed,
            ..Self::default()
        }
    }

    /// Same probe with the stricter rigidity threshold.
    pub fn strict(self) -> Self {
        Self {
            rigidity_threshold: STRICT_RIGIDITY_THRESHOLD,
            ..self
        }
    }
}

/// Outcome of [`structural_autopsy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralResult {
    /// Lowest energy reached.
    pub ground_state_energy: usize,
    /// Frozen fraction, in [0, 1].
    pub backbone_rigidity: f64,
    /// Number of frozen variables.
    pub frozen_vars_count: usize,
    /// Number of variables.
    pub total_vars: usize,
    /// The frozen variables, ascending.
    pub frozen_variables: Vec<u32>,
    /// Anneal steps taken.
    pub steps: u64,
    /// Verdict.
    pub diagnosis: AutopsyDiagnosis,
    /// Verdict with the numbers behind it.
    pub explanation: String,
}

/// Classify an anneal run.
pub fn diagnose(ground_state_energy: usize, rigidity: f64, threshold: f64) -> AutopsyDiagnosis {
    if ground_state_energy == 0 {
        AutopsyDiagnosis::Solvable
    } else if rigidity > threshold {
        AutopsyDiagnosis::StructuralShattered
    } else {
        AutopsyDiagnosis::AlgorithmicTrapping
    }
}

/// Autopsy of an existing run.
pub fn autopsy_of(run: &AnnealRun, frozen_fraction: f64, rigidity_threshold: f64) -> StructuralResult {
    let total_vars = run.flip_counts.len();
    let frozen_variables = run.frozen_variables(frozen_fraction);
    let frozen_vars_count = frozen_variables.len();
    let backbone_rigidity = if total_vars == 0 {
        0.0
    } else {
        frozen_vars_count as f64 / total_vars as f64
    };
    let diagnosis = diagnose(run.best_energy, backbone_rigidity, rigidity_threshold);
    let explanation = format!(
        "{}; ground state energy {}, {} of {} variables frozen (rigidity {:.2}, threshold {:.2})",
        diagnosis.describe(),
        run.best_energy,
        frozen_vars_count,
        total_vars,
        backbone_rigidity,
        rigidity_threshold
    );

    StructuralResult {
        ground_state_energy: run.best_energy,
        backbone_rigidity,
        frozen_vars_count,
        total_vars,
        frozen_variables,
        steps: run.steps,
        diagnosis,
        explanation,
    }
}

/// Run the structural autopsy.
pub fn structural_autopsy(config: &AutopsyConfig, cancel: Option<&CancelToken>) -> Result<StructuralResult> {
    if !(0.0..=1.0).contains(&config.frozen_fraction) {
        return Err(ProbeError::InvalidParameter(format!(
            "frozen fraction must be in [0, 1], got {}",
            config.frozen_fraction
        )));
    }
    debug!(
        "autopsy: n={}, alpha={}, {} steps at rate {}, rigidity threshold {}",
        config.n, config.alpha, config.anneal.max_steps, config.anneal.cooling_rate, config.rigidity_threshold
    );

    let spec = InstanceSpec::new(config.n, config.alpha, config.seed);
    let formula = spec.generate()?;
    let run = anneal(&formula, &config.anneal, &mut spec.search_rng(0), cancel)?;
    let result = autopsy_of(&run, config.frozen_fraction, config.rigidity_threshold);
    info!("autopsy: {}", result.explanation);
    Ok(result)
}
