//! Exact backbone by refutation
//!
//! A variable is in the backbone when it takes the same value in every
//! model. Starting from one model, each variable is tested by adding the
//! unit clause that forces its opposite value: if the strengthened formula
//! is unsatisfiable the variable is frozen. Any second model found along
//! the way also frees every variable on which it disagrees with the first.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::dpll::{DpllSolver, SolveOutcome};
use crate::error::{Error, Result};
use crate::formula::{Assignment, Clause, Formula};

/// Classification of one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackboneStatus {
    /// Same value in every model.
    Frozen(bool),
    /// Both values occur in some model.
    Free,
    /// The refutation check ran out of budget.
    Undetermined,
}

/// Backbone of a formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackboneReport {
    /// `Some(true)` with a model, `Some(false)` when proved unsatisfiable,
    /// `None` when the first search ran out of budget.
    pub satisfiable: Option<bool>,
    /// The first model found.
    pub model: Option<Assignment>,
    /// One entry per variable (empty unless satisfiable).
    pub statuses: Vec<BackboneStatus>,
    /// Solver steps across all checks.
    pub total_steps: u64,
}

impl BackboneReport {
    /// Frozen variables with their forced values, ascending.
    pub fn frozen(&self) -> Vec<(u32, bool)> {
        self.statuses
            .iter()
            .enumerate()
            .filter_map(|(i, status)| match status {
                BackboneStatus::Frozen(value) => Some((i as u32 + 1, *value)),
                _ => None,
            })
            .collect()
    }

    /// Variables whose refutation check ran out of budget, ascending.
    pub fn undetermined(&self) -> Vec<u32> {
        self.statuses
            .iter()
            .enumerate()
            .filter(|(_, status)| **status == BackboneStatus::Undetermined)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    /// Fraction of variables that are frozen.
    pub fn frozen_fraction(&self) -> f64 {
        if self.statuses.is_empty() {
            0.0
        } else {
            self.frozen().len() as f64 / self.statuses.len() as f64
        }
    }
}

/// Compute the backbone, spending at most `step_limit` steps per search.
///
/// `cancel` is polled before every refutation check and handed to the
/// solver; once it fires the whole computation fails with
/// [`Error::Cancelled`].
pub fn exact_backbone(
    formula: &Formula,
    step_limit: u64,
    cancel: Option<&CancelToken>,
) -> Result<BackboneReport> {
    let mut solver = DpllSolver::new(step_limit);
    if let Some(token) = cancel {
        solver = solver.with_cancel(token.clone());
    }
    let cancelled = || cancel.is_some_and(CancelToken::is_cancelled);
    if cancelled() {
        return Err(Error::Cancelled);
    }

    let first = solver.solve(formula);
    if cancelled() {
        return Err(Error::Cancelled);
    }
    let mut total_steps = first.steps;

    let model = match first.outcome {
        SolveOutcome::Satisfiable(model) => model,
        SolveOutcome::Unsatisfiable => {
            return Ok(BackboneReport {
                satisfiable: Some(false),
                model: None,
                statuses: Vec::new(),
                total_steps,
            });
        }
        SolveOutcome::Inconclusive => {
            return Ok(BackboneReport {
                satisfiable: None,
                model: None,
                statuses: Vec::new(),
                total_steps,
            });
        }
    };

    let degrees = formula.variable_degrees();
    let mut statuses: Vec<Option<BackboneStatus>> = degrees
        .iter()
        .map(|&d| (d == 0).then_some(BackboneStatus::Free))
        .collect();

    for var in 1..=formula.num_vars() as u32 {
        if statuses[var as usize - 1].is_some() {
            continue;
        }
        if cancelled() {
            return Err(Error::Cancelled);
        }
        let opposite = model.literal_of(var).negated();
        let strengthened = formula.with_clause(Clause::new(vec![opposite]))?;
        let check = solver.solve(&strengthened);
        if cancelled() {
            return Err(Error::Cancelled);
        }
        total_steps += check.steps;

        let status = match check.outcome {
            SolveOutcome::Unsatisfiable => BackboneStatus::Frozen(model.value(var)),
            SolveOutcome::Inconclusive => BackboneStatus::Undetermined,
            SolveOutcome::Satisfiable(other) => {
                for (i, slot) in statuses.iter_mut().enumerate() {
                    if slot.is_none() && other.values()[i] != model.values()[i] {
                        *slot = Some(BackboneStatus::Free);
                    }
                }
                BackboneStatus::Free
            }
        };
        statuses[var as usize - 1] = Some(status);
    }

    let statuses: Vec<BackboneStatus> = statuses
        .into_iter()
        .map(|s| s.unwrap_or(BackboneStatus::Undetermined))
        .collect();

    let report = BackboneReport {
        satisfiable: Some(true),
        model: Some(model),
        statuses,
        total_steps,
    };
    debug!(
        "exact backbone: {} of {} variables frozen, {} undetermined ({} steps)",
        report.frozen().len(),
        formula.num_vars(),
        report.undetermined().len(),
        report.total_steps
    );
    Ok(report)
}
