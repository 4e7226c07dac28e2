//! Backbone-pruning search
//!
//! Uses an anneal to guess the backbone (variables that barely moved),
//! fixes those variables to their values in the best assignment, and
//! solves the reduced formula exactly. The effective branching factor
//! before and after, each per free variable, shows whether the guessed
//! invariants actually cut the search.
//!
//! The pruning is a heuristic: a wrong guess can make a satisfiable
//! instance unsatisfiable, which is reported as a misidentified backbone.

use hardness_core::{anneal, branching_factor, AnnealConfig, CancelToken, DpllSolver, Literal, SolveResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::autopsy::FROZEN_FLIP_FRACTION;
use crate::error::{ProbeError, Result};
use crate::instance::InstanceSpec;

/// Smallest reduction in b, in percent, that counts as a successful prune.
pub const MIN_REDUCTION_PERCENT: f64 = 1.0;

/// What fixing the guessed backbone did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PruneDiagnosis {
    /// Fewer steps and a lower branching factor.
    Prunable,
    /// Fixing the guess did not make the search meaningfully cheaper.
    InvariantResistant,
    /// The guess turned a satisfiable instance unsatisfiable.
    BackboneMisidentified,
    /// The re-solve ran out of budget, so the comparison proves nothing.
    Inconclusive,
}

impl PruneDiagnosis {
    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            PruneDiagnosis::Prunable => "prunable: fixing the frozen variables cuts the search",
            PruneDiagnosis::InvariantResistant => {
                "invariant resistant: the frozen variables do not simplify the search"
            }
            PruneDiagnosis::BackboneMisidentified => {
                "backbone misidentified: fixing the guess destroyed every solution"
            }
            PruneDiagnosis::Inconclusive => {
                "inconclusive: the pruned search hit the step ceiling"
            }
        }
    }
}

/// Parameters of [`millennium_search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Instance seed.
    pub seed: u64,
    /// Schedule of the backbone-guessing anneal.
    pub anneal: AnnealConfig,
    /// Frozen flip fraction.
    pub frozen_fraction: f64,
    /// DPLL ceiling for both exact solves.
    pub step_limit: u64,
    /// Smallest guessed backbone worth calling prunable.
    pub min_backbone_size: usize,
    /// Smallest reduction of b, in percent, worth calling prunable.
    pub min_reduction_percent: f64,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            n: 40,
            alpha: 4.26,
            seed: 0,
            anneal: AnnealConfig::slow(5_000),
            frozen_fraction: FROZEN_FLIP_FRACTION,
            step_limit: 1_000_000,
            min_backbone_size: 1,
            min_reduction_percent: MIN_REDUCTION_PERCENT,
        }
    }
}

impl PruneConfig {
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

/// Outcome of one exact solve in the probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExactSolve {
    /// `Some(true)` with a model, `Some(false)` proved unsatisfiable,
    /// `None` out of budget.
    pub satisfiable: Option<bool>,
    /// Steps taken.
    pub steps: u64,
    /// Variables the search ranged over.
    pub free_vars: usize,
    /// steps^(1/free_vars).
    pub branching_factor: f64,
}

impl ExactSolve {
    fn from_result(result: &SolveResult, free_vars: usize) -> Self {
        let satisfiable = if result.is_satisfiable() {
            Some(true)
        } else if result.is_unsatisfiable() {
            Some(false)
        } else {
            None
        };
        Self {
            satisfiable,
            steps: result.steps,
            free_vars,
            branching_factor: branching_factor(result.steps as f64, free_vars),
        }
    }
}

/// Outcome of [`millennium_search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MillenniumSearchResult {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Guessed backbone as fixed literals.
    pub backbone: Vec<Literal>,
    /// Solve of the full formula.
    pub before: ExactSolve,
    /// Solve of the formula with the backbone fixed.
    pub after: ExactSolve,
    /// Reduction of b, in percent of b before.
    pub reduction_percent: f64,
    /// Verdict.
    pub diagnosis: PruneDiagnosis,
}

/// Classify a prune. Thresholds come from `config`.
///
/// Only a proved unsatisfiable re-solve counts against the guess; a
/// re-solve that ran out of budget makes the comparison inconclusive.
pub fn diagnose(
    before: &ExactSolve,
    after: &ExactSolve,
    backbone_size: usize,
    reduction_percent: f64,
    config: &PruneConfig,
) -> PruneDiagnosis {
    if before.satisfiable == Some(true) && after.satisfiable == Some(false) {
        return PruneDiagnosis::BackboneMisidentified;
    }
    if after.satisfiable.is_none() {
        return PruneDiagnosis::Inconclusive;
    }
    if backbone_size >= config.min_backbone_size
        && after.steps < before.steps
        && reduction_percent > config.min_reduction_percent
    {
        PruneDiagnosis::Prunable
    } else {
        PruneDiagnosis::InvariantResistant
    }
}

/// Guess the backbone, fix it and compare exact search cost.
pub fn millennium_search(config: &PruneConfig, cancel: Option<&CancelToken>) -> Result<MillenniumSearchResult> {
    if !(0.0..=1.0).contains(&config.frozen_fraction) {
        return Err(ProbeError::InvalidParameter(format!(
            "frozen fraction must be in [0, 1], got {}",
            config.frozen_fraction
        )));
    }
    debug!(
        "millennium search: n={}, alpha={}, step limit {}",
        config.n, config.alpha, config.step_limit
    );

    let spec = InstanceSpec::new(config.n, config.alpha, config.seed);
    let formula = spec.generate()?;
    let mut solver = DpllSolver::new(config.step_limit);
    if let Some(token) = cancel {
        solver = solver.with_cancel(token.clone());
    }

    let baseline = solver.solve(&formula);
    let run = anneal(&formula, &config.anneal, &mut spec.search_rng(0), cancel)?;
    let backbone: Vec<Literal> = run
        .frozen_variables(config.frozen_fraction)
        .into_iter()
        .map(|var| run.best_assignment.literal_of(var))
        .collect();

    let reduced = formula.simplify_all(&backbone);
    let pruned = solver.solve(&reduced);
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(hardness_core::Error::Cancelled.into());
    }

    let free_vars = formula.num_vars() - backbone.len();
    let before = ExactSolve::from_result(&baseline, formula.num_vars());
    let after = ExactSolve::from_result(&pruned, free_vars);
    let reduction_percent = if before.branching_factor > 0.0 {
        100.0 * (before.branching_factor - after.branching_factor) / before.branching_factor
    } else {
        0.0
    };
    let diagnosis = diagnose(&before, &after, backbone.len(), reduction_percent, config);
    info!(
        "millennium search: {} fixed, b {:.4} -> {:.4} ({:.1}%), steps {} -> {} -> {:?}",
        backbone.len(),
        before.branching_factor,
        after.branching_factor,
        reduction_percent,
        before.steps,
        after.steps,
        diagnosis
    );

    Ok(MillenniumSearchResult {
        n: config.n,
        alpha: config.alpha,
        backbone,
        before,
        after,
        reduction_percent,
        diagnosis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(satisfiable: Option<bool>, steps: u64, free_vars: usize) -> ExactSolve {
        ExactSolve {
            satisfiable,
            steps,
            free_vars,
            branching_factor: branching_factor(steps as f64, free_vars),
        }
    }

    #[test]
    fn test_wrong_guess_is_misidentified() {
        let config = PruneConfig::default();
        let before = solve(Some(true), 500, 40);
        let after = solve(Some(false), 3, 30);
        assert_eq!(
            diagnose(&before, &after, 10, 50.0, &config),
            PruneDiagnosis::BackboneMisidentified
        );
    }

    #[test]
    fn test_exhausted_resolve_is_inconclusive() {
        let config = PruneConfig::default();
        let before = solve(Some(true), 500, 40);
        let after = solve(None, 1_000_000, 30);
        assert_eq!(
            diagnose(&before, &after, 10, -35.0, &config),
            PruneDiagnosis::Inconclusive
        );
    }

    #[test]
    fn test_cheaper_search_is_prunable() {
        let config = PruneConfig::default();
        let before = solve(Some(false), 5_000, 40);
        let after = solve(Some(false), 40, 30);
        let reduction = 100.0 * (before.branching_factor - after.branching_factor) / before.branching_factor;
        assert_eq!(
            diagnose(&before, &after, 10, reduction, &config),
            PruneDiagnosis::Prunable
        );
        assert_eq!(
            diagnose(&before, &after, 0, reduction, &config),
            PruneDiagnosis::InvariantResistant
        );
    }

    #[test]
    fn test_end_to_end_bookkeeping() {
        let config = PruneConfig::at(25, 4.26, 21);
        let result = millennium_search(&config, None).unwrap();
        assert_eq!(result.after.free_vars, 25 - result.backbone.len());
        assert_eq!(result.before.free_vars, 25);
        let vars: Vec<u32> = result.backbone.iter().map(|l| l.var()).collect();
        assert!(vars.windows(2).all(|w| w[0] < w[1]));
        if result.diagnosis == PruneDiagnosis::Prunable {
            assert!(result.after.steps < result.before.steps);
        }
    }
}
