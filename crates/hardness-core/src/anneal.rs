//! Simulated annealing over total assignments
//!
//! ## Move
//! 1. Pick a uniformly random falsified clause
//! 2. Pick a uniformly random literal in it
//! 3. Candidate = current assignment with that literal's variable flipped
//! 4. Energy = number of falsified clauses, recomputed by a full rescan
//!
//! ## Acceptance
//! - Metropolis: always accept an improvement, otherwise accept with
//!   probability exp(-Δ/T)
//! - Lenient: always accept an improvement, otherwise accept with a fixed
//!   escape probability regardless of temperature
//!
//! A rejected move hands back the original assignment untouched. Once no
//! clause is falsified there is no candidate to draw, and the step reports
//! [`StepOutcome::AlreadySatisfied`].

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::formula::{Assignment, Formula};

/// Starting temperature of every schedule unless overridden.
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 2.0;
/// Temperatures never cool below this.
pub const TEMPERATURE_FLOOR: f64 = 0.01;
/// Quench schedule.
pub const FAST_COOLING_RATE: f64 = 0.95;
/// Slow anneal schedule; rates above this count as a deep scan.
pub const SLOW_COOLING_RATE: f64 = 0.999;
/// Uphill acceptance probability of the lenient rule.
pub const LENIENT_ESCAPE_PROBABILITY: f64 = 0.1;

/// Rule deciding whether a non-improving move is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Acceptance {
    /// exp(-Δ/T) for Δ >= 0.
    #[default]
    Metropolis,
    /// A fixed probability for Δ >= 0, ignoring temperature.
    Lenient {
        /// Probability of taking a non-improving move.
        escape_probability: f64,
    },
}

impl Acceptance {
    /// Lenient rule with the default escape probability.
    pub fn lenient() -> Self {
        Acceptance::Lenient {
            escape_probability: LENIENT_ESCAPE_PROBABILITY,
        }
    }

    fn accepts<R: Rng + ?Sized>(self, delta: i64, temperature: f64, rng: &mut R) -> bool {
        if delta < 0 {
            return true;
        }
        let probability = match self {
            Acceptance::Metropolis => {
                if temperature <= 0.0 {
                    return false;
                }
                (-(delta as f64) / temperature).exp()
            }
            Acceptance::Lenient { escape_probability } => escape_probability,
        };
        rng.random::<f64>() < probability
    }
}

/// A single evaluated flip.
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    /// The assignment after the step: the candidate if accepted, otherwise
    /// a copy of the input.
    pub assignment: Assignment,
    /// Falsified clauses under `assignment`.
    pub unsat_clauses: Vec<usize>,
    /// The 1-based variable proposed for flipping.
    pub flipped_var: u32,
    /// Whether the flip was taken.
    pub accepted: bool,
    /// Candidate energy minus current energy.
    pub delta: i64,
}

impl Move {
    /// Energy of the resulting assignment.
    #[inline]
    pub fn energy(&self) -> usize {
        self.unsat_clauses.len()
    }
}

/// Result of asking for one annealing step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// No clause is falsified; the search is done.
    AlreadySatisfied,
    /// A candidate was evaluated.
    Move(Move),
}

/// One Metropolis step.
pub fn anneal_step<R: Rng + ?Sized>(
    formula: &Formula,
    assignment: &Assignment,
    unsat_clauses: &[usize],
    temperature: f64,
    rng: &mut R,
) -> Result<StepOutcome> {
    anneal_step_with(
        formula,
        assignment,
        unsat_clauses,
        temperature,
        Acceptance::Metropolis,
        rng,
    )
}

/// One step under an explicit acceptance rule.
///
/// `unsat_clauses` must index clauses of `formula` and `assignment` must
/// cover its variables; otherwise the step fails instead of guessing.
pub fn anneal_step_with<R: Rng + ?Sized>(
    formula: &Formula,
    assignment: &Assignment,
    unsat_clauses: &[usize],
    temperature: f64,
    acceptance: Acceptance,
    rng: &mut R,
) -> Result<StepOutcome> {
    if assignment.len() != formula.num_vars() {
        return Err(Error::InvalidParameter(format!(
            "assignment covers {} variables, formula has {}",
            assignment.len(),
            formula.num_vars()
        )));
    }
    let Some(&clause_idx) = unsat_clauses.choose(rng) else {
        return Ok(StepOutcome::AlreadySatisfied);
    };
    let clause = formula
        .clauses()
        .get(clause_idx)
        .ok_or(Error::ClauseOutOfRange {
            index: clause_idx,
            num_clauses: formula.num_clauses(),
        })?;
    let Some(&lit) = clause.literals().choose(rng) else {
        // an empty clause can never be repaired by a flip
        return Ok(StepOutcome::AlreadySatisfied);
    };

    let var = lit.var();
    let candidate = assignment.flipped(var);
    let candidate_unsat = formula.unsat_clauses(&candidate);
    let delta = candidate_unsat.len() as i64 - unsat_clauses.len() as i64;
    let accepted = acceptance.accepts(delta, temperature, rng);

    let (assignment, unsat_clauses) = if accepted {
        (candidate, candidate_unsat)
    } else {
        (assignment.clone(), unsat_clauses.to_vec())
    };

    Ok(StepOutcome::Move(Move {
        assignment,
        unsat_clauses,
        flipped_var: var,
        accepted,
        delta,
    }))
}

/// Cooling schedule and budget for a full annealing run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    /// Temperature at step zero.
    pub initial_temperature: f64,
    /// Geometric decay applied after every step.
    pub cooling_rate: f64,
    /// Lower bound on the temperature.
    pub min_temperature: f64,
    /// Step ceiling.
    pub max_steps: u64,
    /// Acceptance rule.
    pub acceptance: Acceptance,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            cooling_rate: SLOW_COOLING_RATE,
            min_temperature: TEMPERATURE_FLOOR,
            max_steps: 5_000,
            acceptance: Acceptance::Metropolis,
        }
    }
}

impl AnnealConfig {
    /// Quench: fast geometric cooling.
    pub fn fast(max_steps: u64) -> Self {
        Self {
            cooling_rate: FAST_COOLING_RATE,
            max_steps,
            ..Self::default()
        }
    }

    /// Slow anneal at the default slow rate.
    pub fn slow(max_steps: u64) -> Self {
        Self {
            cooling_rate: SLOW_COOLING_RATE,
            max_steps,
            ..Self::default()
        }
    }

    /// Same schedule with a different cooling rate.
    pub fn with_cooling_rate(mut self, cooling_rate: f64) -> Self {
        self.cooling_rate = cooling_rate;
        self
    }

    /// Same schedule with a different acceptance rule.
    pub fn with_acceptance(mut self, acceptance: Acceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "cooling rate must be in (0, 1], got {}",
                self.cooling_rate
            )));
        }
        if !(self.initial_temperature >= 0.0 && self.min_temperature >= 0.0) {
            return Err(Error::InvalidParameter(
                "temperatures must be non-negative".to_string(),
            ));
        }
        if let Acceptance::Lenient { escape_probability } = self.acceptance {
            if !(0.0..=1.0).contains(&escape_probability) {
                return Err(Error::InvalidParameter(format!(
                    "escape probability must be in [0, 1], got {escape_probability}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything observed during one annealing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnealRun {
    /// Assignment when the run stopped.
    pub assignment: Assignment,
    /// Lowest-energy assignment seen.
    pub best_assignment: Assignment,
    /// Energy of `best_assignment`.
    pub best_energy: usize,
    /// Energy of `assignment`.
    pub final_energy: usize,
    /// Steps (candidate evaluations) taken.
    pub steps: u64,
    /// Steps whose flip was accepted.
    pub accepted_moves: u64,
    /// Accepted flips per variable, indexed by variable - 1.
    pub flip_counts: Vec<u64>,
    /// Energy after each step.
    pub energy_trace: Vec<usize>,
    /// Temperature when the run stopped.
    pub final_temperature: f64,
}

impl AnnealRun {
    /// Whether a satisfying assignment was reached.
    #[inline]
    pub fn solved(&self) -> bool {
        self.final_energy == 0
    }

    /// Variables flipped at most `fraction` × steps times, ascending.
    pub fn frozen_variables(&self, fraction: f64) -> Vec<u32> {
        let ceiling = fraction * self.steps as f64;
        self.flip_counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count as f64 <= ceiling)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }
}

/// Anneal from a uniformly random starting assignment.
pub fn anneal<R: Rng + ?Sized>(
    formula: &Formula,
    config: &AnnealConfig,
    rng: &mut R,
    cancel: Option<&CancelToken>,
) -> Result<AnnealRun> {
    let start = Assignment::random(formula.num_vars(), rng);
    anneal_from(formula, start, config, rng, cancel)
}

/// Anneal from `start`.
pub fn anneal_from<R: Rng + ?Sized>(
    formula: &Formula,
    start: Assignment,
    config: &AnnealConfig,
    rng: &mut R,
    cancel: Option<&CancelToken>,
) -> Result<AnnealRun> {
    config.validate()?;
    if start.len() != formula.num_vars() {
        return Err(Error::InvalidParameter(format!(
            "assignment covers {} variables, formula has {}",
            start.len(),
            formula.num_vars()
        )));
    }

    let mut unsat = formula.unsat_clauses(&start);
    let mut assignment = start;
    let mut best_assignment = assignment.clone();
    let mut best_energy = unsat.len();
    let mut flip_counts = vec![0u64; formula.num_vars()];
    let mut energy_trace = Vec::new();
    let mut temperature = config.initial_temperature.max(config.min_temperature);
    let mut steps = 0u64;
    let mut accepted_moves = 0u64;

    while steps < config.max_steps {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(Error::Cancelled);
        }
        let step = match anneal_step_with(
            formula,
            &assignment,
            &unsat,
            temperature,
            config.acceptance,
            rng,
        )? {
            StepOutcome::AlreadySatisfied => break,
            StepOutcome::Move(step) => step,
        };

        steps += 1;
        if step.accepted {
            accepted_moves += 1;
            flip_counts[step.flipped_var as usize - 1] += 1;
        }
        assignment = step.assignment;
        unsat = step.unsat_clauses;
        energy_trace.push(unsat.len());

        if unsat.len() < best_energy {
            best_energy = unsat.len();
            best_assignment = assignment.clone();
        }
        temperature = (temperature * config.cooling_rate).max(config.min_temperature);
    }

    trace!(
        "anneal finished: {} steps, best energy {}, final energy {}",
        steps,
        best_energy,
        unsat.len()
    );

    Ok(AnnealRun {
        final_energy: unsat.len(),
        assignment,
        best_assignment,
        best_energy,
        steps,
        accepted_moves,
        flip_counts,
        energy_trace,
        final_temperature: temperature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimacs::parse_str;
    use crate::generator::generate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_satisfied_assignment_is_terminal() {
        let f = parse_str("p cnf 3 1\n1 2 3 0\n").unwrap();
        let a = Assignment::from_values(vec![true, false, false]);
        let mut rng = StdRng::seed_from_u64(1);
        let unsat = f.unsat_clauses(&a);
        assert_eq!(
            anneal_step(&f, &a, &unsat, 1.0, &mut rng).unwrap(),
            StepOutcome::AlreadySatisfied
        );
    }

    #[test]
    fn test_rejected_move_keeps_assignment() {
        // x1 appears positively in many satisfied clauses; flipping it from
        // the broken clause (-1) costs a lot at near-zero temperature
        let f = parse_str("p cnf 3 5\n-1 0\n1 2 0\n1 3 0\n1 -2 0\n1 -3 0\n").unwrap();
        let a = Assignment::from_values(vec![true, false, false]);
        let unsat = f.unsat_clauses(&a);
        assert_eq!(unsat, vec![0]);
        let mut rng = StdRng::seed_from_u64(3);
        let StepOutcome::Move(step) = anneal_step(&f, &a, &unsat, 1e-9, &mut rng).unwrap() else {
            panic!("expected a move");
        };
        assert_eq!(step.flipped_var, 1);
        assert!(step.delta > 0);
        assert!(!step.accepted);
        assert_eq!(step.assignment, a);
        assert_eq!(step.unsat_clauses, unsat);
    }

    #[test]
    fn test_stale_clause_index_is_an_error() {
        let f = parse_str("p cnf 3 2\n1 2 0\n-1 3 0\n").unwrap();
        let a = Assignment::all_false(3);
        let mut rng = StdRng::seed_from_u64(8);
        assert!(matches!(
            anneal_step(&f, &a, &[7], 1.0, &mut rng),
            Err(Error::ClauseOutOfRange {
                index: 7,
                num_clauses: 2
            })
        ));
        assert!(matches!(
            anneal_step(&f, &Assignment::all_false(2), &[0], 1.0, &mut rng),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_improving_move_always_accepted() {
        let f = parse_str("p cnf 3 2\n1 0\n1 2 0\n").unwrap();
        let a = Assignment::from_values(vec![false, false, false]);
        let unsat = f.unsat_clauses(&a);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let StepOutcome::Move(step) = anneal_step(&f, &a, &unsat, 0.0, &mut rng).unwrap() else {
                panic!("expected a move");
            };
            if step.delta < 0 {
                assert!(step.accepted);
                assert!(step.energy() < unsat.len());
            }
        }
    }

    #[test]
    fn test_lenient_zero_escape_never_climbs() {
        let mut rng = StdRng::seed_from_u64(17);
        let f = generate(20, 90, &mut rng).unwrap();
        let config = AnnealConfig::slow(500).with_acceptance(Acceptance::Lenient {
            escape_probability: 0.0,
        });
        let run = anneal(&f, &config, &mut rng, None).unwrap();
        for pair in run.energy_trace.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_anneal_solves_easy_instance() {
        let mut rng = StdRng::seed_from_u64(21);
        let f = generate(20, 40, &mut rng).unwrap();
        let run = anneal(&f, &AnnealConfig::slow(5_000), &mut rng, None).unwrap();
        assert!(run.solved());
        assert!(f.is_satisfied_by(&run.assignment));
        assert_eq!(run.best_energy, 0);
        assert_eq!(run.energy_trace.len() as u64, run.steps);
        assert_eq!(run.flip_counts.iter().sum::<u64>(), run.accepted_moves);
    }

    #[test]
    fn test_invalid_cooling_rate() {
        let f = parse_str("p cnf 3 1\n1 2 3 0\n").unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let config = AnnealConfig::default().with_cooling_rate(1.5);
        assert!(matches!(
            anneal(&f, &config, &mut rng, None),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_cancelled_run() {
        let mut rng = StdRng::seed_from_u64(2);
        let f = generate(20, 86, &mut rng).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let result = anneal(&f, &AnnealConfig::default(), &mut rng, Some(&token));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_frozen_variables_threshold() {
        let run = AnnealRun {
            assignment: Assignment::all_false(4),
            best_assignment: Assignment::all_false(4),
            best_energy: 0,
            final_energy: 0,
            steps: 1000,
            accepted_moves: 0,
            flip_counts: vec![0, 5, 6, 100],
            energy_trace: vec![],
            final_temperature: TEMPERATURE_FLOOR,
        };
        assert_eq!(run.frozen_variables(0.005), vec![1, 2]);
    }
}
