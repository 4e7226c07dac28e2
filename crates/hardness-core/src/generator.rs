//! Uniform random 3-SAT generation
//!
//! Each clause draws three distinct variables uniformly from `1..=n`
//! without replacement and negates each independently with probability
//! one half. Duplicate clauses across the formula are allowed.

use rand::seq::index;
use rand::Rng;

use crate::error::{Error, Result};
use crate::formula::{Clause, Formula};
use crate::literal::Literal;

/// Literals per generated clause.
pub const CLAUSE_WIDTH: usize = 3;

/// Clause count for ratio `alpha` over `num_vars` variables: round(n·α).
pub fn clause_count(num_vars: usize, alpha: f64) -> usize {
    (num_vars as f64 * alpha).round().max(0.0) as usize
}

/// Seed for the `stream`-th independent instance drawn from `base`.
///
/// Streams are spread with the golden-ratio increment so neighbouring
/// (point, sample) pairs never share a generator state.
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    base.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Generate a random 3-CNF formula with `num_vars` variables and
/// `num_clauses` clauses.
pub fn generate<R: Rng + ?Sized>(
    num_vars: usize,
    num_clauses: usize,
    rng: &mut R,
) -> Result<Formula> {
    if num_vars < CLAUSE_WIDTH {
        return Err(Error::TooFewVariables { n: num_vars });
    }
    if num_vars > i32::MAX as usize {
        return Err(Error::InvalidParameter(format!(
            "{num_vars} variables exceed the literal range"
        )));
    }

    let clauses = (0..num_clauses)
        .map(|_| {
            let literals = index::sample(rng, num_vars, CLAUSE_WIDTH)
                .into_iter()
                .map(|i| Literal::new(i as u32 + 1, rng.random_bool(0.5)))
                .collect();
            Clause::new(literals)
        })
        .collect();

    Ok(Formula::from_parts(num_vars, clauses))
}

/// Generate at clause ratio `alpha`, i.e. with `round(n·α)` clauses.
pub fn generate_with_alpha<R: Rng + ?Sized>(
    num_vars: usize,
    alpha: f64,
    rng: &mut R,
) -> Result<Formula> {
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "alpha must be finite and >= 0, got {alpha}"
        )));
    }
    generate(num_vars, clause_count(num_vars, alpha), rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_rejects_fewer_than_three_variables() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(generate(2, 5, &mut rng), Err(Error::TooFewVariables { n: 2 })));
        assert!(matches!(generate(0, 0, &mut rng), Err(Error::TooFewVariables { n: 0 })));
    }

    #[test]
    fn test_three_distinct_variables_per_clause() {
        let mut rng = StdRng::seed_from_u64(7);
        let f = generate(3, 200, &mut rng).unwrap();
        assert_eq!(f.num_clauses(), 200);
        for clause in f.clauses() {
            let vars: HashSet<u32> = clause.literals().iter().map(|l| l.var()).collect();
            assert_eq!(vars, HashSet::from([1, 2, 3]));
        }
    }

    #[test]
    fn test_zero_clauses() {
        let mut rng = StdRng::seed_from_u64(3);
        let f = generate(5, 0, &mut rng).unwrap();
        assert!(f.is_empty());
        assert_eq!(f.num_vars(), 5);
    }

    #[test]
    fn test_polarity_roughly_balanced() {
        let mut rng = StdRng::seed_from_u64(11);
        let f = generate(50, 2000, &mut rng).unwrap();
        let positives = f
            .clauses()
            .iter()
            .flat_map(|c| c.literals())
            .filter(|l| l.is_positive())
            .count();
        let ratio = positives as f64 / 6000.0;
        assert!((0.45..0.55).contains(&ratio), "positive ratio {ratio}");
    }

    #[test]
    fn test_alpha_rounding() {
        assert_eq!(clause_count(10, 4.26), 43);
        assert_eq!(clause_count(10, 3.0), 30);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(generate_with_alpha(10, -1.0, &mut rng).is_err());
        assert_eq!(generate_with_alpha(20, 4.26, &mut rng).unwrap().num_clauses(), 85);
    }

    #[test]
    fn test_derived_seeds_differ() {
        let seeds: HashSet<u64> = (0..1000).map(|i| derive_seed(42, i)).collect();
        assert_eq!(seeds.len(), 1000);
        assert_eq!(derive_seed(42, 0), 42);
    }

    #[test]
    fn test_same_seed_same_formula() {
        let a = generate(20, 80, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = generate(20, 80, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }
}
