//! Property tests for instance generation and both search engines.

use hardness_core::{
    anneal_step, generate, solve_exact, Assignment, DpllSolver, SolveOutcome, StepOutcome,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

/// Brute-force satisfiability for tiny formulas.
fn brute_force_sat(formula: &hardness_core::Formula) -> bool {
    let n = formula.num_vars();
    (0u32..(1 << n)).any(|mask| {
        let values = (0..n).map(|i| mask & (1 << i) != 0).collect();
        formula.is_satisfied_by(&Assignment::from_values(values))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// m clauses, each with three literals over three distinct variables.
    #[test]
    fn generated_clauses_are_well_formed(n in 3usize..40, m in 0usize..200, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let formula = generate(n, m, &mut rng).unwrap();
        prop_assert_eq!(formula.num_clauses(), m);
        prop_assert_eq!(formula.num_vars(), n);
        for clause in formula.clauses() {
            prop_assert_eq!(clause.len(), 3);
            let vars: HashSet<u32> = clause.literals().iter().map(|l| l.var()).collect();
            prop_assert_eq!(vars.len(), 3);
            prop_assert!(vars.iter().all(|&v| v >= 1 && v as usize <= n));
        }
    }

    /// A reported model satisfies every clause, and simplifying under it
    /// leaves nothing behind.
    #[test]
    fn models_satisfy_formula(n in 3usize..14, ratio in 1.0f64..6.0, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let m = (n as f64 * ratio).round() as usize;
        let formula = generate(n, m, &mut rng).unwrap();
        let result = solve_exact(&formula, 100_000);
        if let SolveOutcome::Satisfiable(model) = &result.outcome {
            prop_assert!(formula.is_satisfied_by(model));
            prop_assert_eq!(formula.count_unsat(model), 0);
            let literals: Vec<_> = (1..=n as u32).map(|v| model.literal_of(v)).collect();
            prop_assert!(formula.simplify_all(&literals).is_empty());
        }
    }

    /// Unbounded search is complete on small instances.
    #[test]
    fn unbounded_search_agrees_with_brute_force(n in 3usize..11, ratio in 2.0f64..7.0, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let m = (n as f64 * ratio).round() as usize;
        let formula = generate(n, m, &mut rng).unwrap();
        let result = DpllSolver::unbounded().solve(&formula);
        prop_assert!(!result.is_inconclusive());
        prop_assert_eq!(result.is_satisfiable(), brute_force_sat(&formula));
    }

    /// Raising the ceiling never loses an answer found under a lower one.
    #[test]
    fn budget_is_monotonic(n in 5usize..16, seed in any::<u64>(), low in 1u64..200) {
        let mut rng = StdRng::seed_from_u64(seed);
        let formula = generate(n, (n as f64 * 4.26).round() as usize, &mut rng).unwrap();
        let small = solve_exact(&formula, low);
        let large = solve_exact(&formula, low * 10);
        if small.is_satisfiable() {
            prop_assert!(large.is_satisfiable());
            prop_assert_eq!(small.steps, large.steps);
        }
        if small.is_unsatisfiable() {
            prop_assert!(large.is_unsatisfiable());
        }
        prop_assert!(small.steps <= low);
    }

    /// Accepted improving moves lower the energy; rejected moves leave the
    /// assignment as it was.
    #[test]
    fn anneal_step_contract(n in 3usize..25, seed in any::<u64>(), temperature in 0.0f64..3.0) {
        let mut rng = StdRng::seed_from_u64(seed);
        let formula = generate(n, n * 4, &mut rng).unwrap();
        let assignment = Assignment::random(n, &mut rng);
        let unsat = formula.unsat_clauses(&assignment);
        match anneal_step(&formula, &assignment, &unsat, temperature, &mut rng).unwrap() {
            StepOutcome::AlreadySatisfied => prop_assert!(unsat.is_empty()),
            StepOutcome::Move(step) => {
                prop_assert_eq!(step.energy(), formula.count_unsat(&step.assignment));
                if step.accepted {
                    prop_assert_eq!(step.energy() as i64, unsat.len() as i64 + step.delta);
                    if step.delta < 0 {
                        prop_assert!(step.energy() < unsat.len());
                    }
                } else {
                    prop_assert_eq!(&step.assignment, &assignment);
                    prop_assert_eq!(&step.unsat_clauses, &unsat);
                }
                if step.delta < 0 {
                    prop_assert!(step.accepted);
                }
            }
        }
    }
}
