//! Exact DPLL search
//!
//! Backtracking search with unit propagation and a greedy branching rule:
//! 1. Empty formula: satisfiable
//! 2. Any empty clause: conflict, backtrack
//! 3. A unit clause: assert its literal and continue
//! 4. Otherwise branch on the most frequent literal (ties go to the
//!    literal seen first), trying it true before false
//!
//! The recursion is unrolled onto an explicit frame stack. Each frame
//! evaluation is one step, the unit of "work" used by every scaling
//! experiment. When the step counter passes the ceiling, or the cancel
//! token fires, the search stops with [`SolveOutcome::Inconclusive`].
//! Only an exhausted stack is a proof of unsatisfiability.

use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::trace;

use crate::cancel::CancelToken;
use crate::formula::{Assignment, Formula};
use crate::literal::Literal;

/// Three-valued result of an exact search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveOutcome {
    /// A model satisfying every clause.
    Satisfiable(Assignment),
    /// The search space was exhausted without a model.
    Unsatisfiable,
    /// The step ceiling or a cancellation stopped the search first.
    Inconclusive,
}

/// Outcome plus the work spent reaching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResult {
    /// Satisfiable, proved unsatisfiable, or out of budget.
    pub outcome: SolveOutcome,
    /// Frames evaluated, i.e. recursive invocations.
    pub steps: u64,
    /// Conflicts that forced a backtrack.
    pub backtracks: u64,
}

impl SolveResult {
    /// Whether a model was found.
    #[inline]
    pub fn is_satisfiable(&self) -> bool {
        matches!(self.outcome, SolveOutcome::Satisfiable(_))
    }

    /// Whether unsatisfiability was proved.
    #[inline]
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self.outcome, SolveOutcome::Unsatisfiable)
    }

    /// Whether the budget ran out before an answer.
    #[inline]
    pub fn is_inconclusive(&self) -> bool {
        matches!(self.outcome, SolveOutcome::Inconclusive)
    }

    /// The model, when satisfiable.
    pub fn model(&self) -> Option<&Assignment> {
        match &self.outcome {
            SolveOutcome::Satisfiable(model) => Some(model),
            _ => None,
        }
    }

    /// Effective per-variable branching factor b = steps^(1/n).
    pub fn branching_factor(&self, num_vars: usize) -> f64 {
        branching_factor(self.steps as f64, num_vars)
    }
}

/// b = steps^(1/n); 1.0 when there are no variables or no work.
pub fn branching_factor(steps: f64, num_vars: usize) -> f64 {
    if num_vars == 0 || steps <= 1.0 {
        1.0
    } else {
        steps.powf(1.0 / num_vars as f64)
    }
}

/// A pending recursive call: assert `decision` on `parent` (or start from
/// `parent` itself when `decision` is `None`).
struct Frame {
    parent: Rc<Formula>,
    decision: Option<Literal>,
    trail: Vec<Literal>,
}

/// DPLL solver with a step ceiling.
#[derive(Debug, Clone)]
pub struct DpllSolver {
    step_limit: u64,
    cancel: Option<CancelToken>,
}

impl DpllSolver {
    /// Solver that gives up after `step_limit` steps.
    pub fn new(step_limit: u64) -> Self {
        DpllSolver {
            step_limit,
            cancel: None,
        }
    }

    /// Solver with no step ceiling.
    pub fn unbounded() -> Self {
        Self::new(u64::MAX)
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// The configured ceiling.
    pub fn step_limit(&self) -> u64 {
        self.step_limit
    }

    /// Search for a model of `formula`.
    pub fn solve(&self, formula: &Formula) -> SolveResult {
        let num_vars = formula.num_vars();
        let mut steps = 0u64;
        let mut backtracks = 0u64;
        let mut stack = vec![Frame {
            parent: Rc::new(formula.clone()),
            decision: None,
            trail: Vec::new(),
        }];

        while let Some(frame) = stack.pop() {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                trace!("dpll cancelled after {} steps", steps);
                return inconclusive(steps, backtracks);
            }
            steps += 1;
            if steps > self.step_limit {
                trace!("dpll step ceiling {} reached", self.step_limit);
                return inconclusive(steps - 1, backtracks);
            }

            let current = match frame.decision {
                Some(lit) => Rc::new(frame.parent.simplify(lit)),
                None => frame.parent,
            };

            if current.is_empty() {
                let model = model_from_trail(num_vars, &frame.trail);
                trace!("dpll found model after {} steps", steps);
                return SolveResult {
                    outcome: SolveOutcome::Satisfiable(model),
                    steps,
                    backtracks,
                };
            }
            if current.has_empty_clause() {
                backtracks += 1;
                continue;
            }

            if let Some(unit) = current.clauses().iter().find_map(|c| c.unit()) {
                let mut trail = frame.trail;
                trail.push(unit);
                stack.push(Frame {
                    parent: current,
                    decision: Some(unit),
                    trail,
                });
                continue;
            }

            let Some(branch) = most_frequent_literal(&current) else {
                // no literals left but clauses remain: only empty clauses,
                // already handled above
                continue;
            };

            let mut false_trail = frame.trail.clone();
            false_trail.push(branch.negated());
            let mut true_trail = frame.trail;
            true_trail.push(branch);

            stack.push(Frame {
                parent: Rc::clone(&current),
                decision: Some(branch.negated()),
                trail: false_trail,
            });
            stack.push(Frame {
                parent: current,
                decision: Some(branch),
                trail: true_trail,
            });
        }

        SolveResult {
            outcome: SolveOutcome::Unsatisfiable,
            steps,
            backtracks,
        }
    }
}

/// Solve `formula` with at most `step_limit` steps.
pub fn solve_exact(formula: &Formula, step_limit: u64) -> SolveResult {
    DpllSolver::new(step_limit).solve(formula)
}

fn inconclusive(steps: u64, backtracks: u64) -> SolveResult {
    SolveResult {
        outcome: SolveOutcome::Inconclusive,
        steps,
        backtracks,
    }
}

fn model_from_trail(num_vars: usize, trail: &[Literal]) -> Assignment {
    let mut model = Assignment::all_false(num_vars);
    for &lit in trail {
        model.set(lit.var(), lit.is_positive());
    }
    model
}

/// Literal occurring most often across the remaining clauses; ties go to
/// the literal encountered first in clause order.
pub fn most_frequent_literal(formula: &Formula) -> Option<Literal> {
    // slot 2*i for +v, 2*i+1 for -v
    let mut counts = vec![0usize; 2 * formula.num_vars()];
    let mut first_seen = Vec::new();
    for clause in formula.clauses() {
        for &lit in clause.literals() {
            let slot = 2 * lit.index() + usize::from(!lit.is_positive());
            if counts[slot] == 0 {
                first_seen.push(lit);
            }
            counts[slot] += 1;
        }
    }

    let mut best: Option<(Literal, usize)> = None;
    for lit in first_seen {
        let count = counts[2 * lit.index() + usize::from(!lit.is_positive())];
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((lit, count));
        }
    }
    best.map(|(lit, _)| lit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimacs::parse_str;
    use crate::formula::Clause;
    use crate::generator::generate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_empty_formula_is_sat_in_one_step() {
        let f = Formula::new(3, vec![]).unwrap();
        let result = solve_exact(&f, 10);
        assert!(result.is_satisfiable());
        assert_eq!(result.steps, 1);
    }

    #[test]
    fn test_contradiction_is_proved_unsat() {
        let f = parse_str("p cnf 1 2\n1 0\n-1 0\n").unwrap();
        let result = DpllSolver::unbounded().solve(&f);
        assert!(result.is_unsatisfiable());
        assert!(result.backtracks >= 1);
    }

    #[test]
    fn test_all_eight_sign_patterns_unsat() {
        let mut text = String::from("p cnf 3 8\n");
        for mask in 0..8 {
            for v in 1..=3 {
                let sign = if mask & (1 << (v - 1)) == 0 { 1 } else { -1 };
                text.push_str(&format!("{} ", sign * v));
            }
            text.push_str("0\n");
        }
        let f = parse_str(&text).unwrap();
        assert!(DpllSolver::unbounded().solve(&f).is_unsatisfiable());
    }

    #[test]
    fn test_step_ceiling_is_inconclusive_not_unsat() {
        let mut text = String::from("p cnf 3 8\n");
        for mask in 0..8 {
            for v in 1..=3 {
                let sign = if mask & (1 << (v - 1)) == 0 { 1 } else { -1 };
                text.push_str(&format!("{} ", sign * v));
            }
            text.push_str("0\n");
        }
        let f = parse_str(&text).unwrap();
        let result = solve_exact(&f, 2);
        assert!(result.is_inconclusive());
        assert_eq!(result.steps, 2);
    }

    #[test]
    fn test_model_satisfies_formula() {
        let f = parse_str("p cnf 3 3\n1 2 0\n-1 2 0\n-2 3 0\n").unwrap();
        let result = solve_exact(&f, 100);
        let model = result.model().expect("satisfiable");
        assert!(f.is_satisfied_by(model));
    }

    #[test]
    fn test_most_frequent_literal_tie_breaks_first_seen() {
        let f = parse_str("p cnf 4 2\n2 1 0\n1 2 -3 0\n").unwrap();
        // +2 and +1 both occur twice; +2 was seen first
        assert_eq!(most_frequent_literal(&f), Some(Literal::positive(2)));
        let g = parse_str("p cnf 4 3\n2 1 0\n1 3 0\n-4 1 0\n").unwrap();
        assert_eq!(most_frequent_literal(&g), Some(Literal::positive(1)));
    }

    #[test]
    fn test_unit_propagation_counts_steps() {
        // 1 forces 2 forces 3: three unit frames plus the final empty one
        let f = Formula::new(
            3,
            vec![
                Clause::new(vec![Literal::positive(1)]),
                Clause::new(vec![Literal::negative(1), Literal::positive(2)]),
                Clause::new(vec![Literal::negative(2), Literal::positive(3)]),
            ],
        )
        .unwrap();
        let result = solve_exact(&f, 100);
        assert!(result.is_satisfiable());
        assert_eq!(result.steps, 4);
        assert_eq!(result.backtracks, 0);
    }

    #[test]
    fn test_cancelled_solver_is_inconclusive() {
        let mut rng = StdRng::seed_from_u64(9);
        let f = generate(30, 128, &mut rng).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let result = DpllSolver::unbounded().with_cancel(token).solve(&f);
        assert!(result.is_inconclusive());
        assert_eq!(result.steps, 0);
    }

    #[test]
    fn test_branching_factor() {
        assert_eq!(branching_factor(1.0, 10), 1.0);
        assert_eq!(branching_factor(100.0, 0), 1.0);
        assert!((branching_factor(1024.0, 10) - 2.0).abs() < 1e-12);
    }
}
