//! Clauses, formulas and total assignments

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::literal::Literal;

/// A disjunction of literals.
///
/// Generated clauses hold exactly three literals over distinct variables;
/// simplification may shrink a clause down to one literal or to the empty
/// (conflicting) clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Clause(Vec<Literal>);

impl Clause {
    /// Wrap a literal list.
    pub fn new(literals: Vec<Literal>) -> Self {
        Clause(literals)
    }

    /// Literals in clause order.
    #[inline]
    pub fn literals(&self) -> &[Literal] {
        &self.0
    }

    /// Number of literals.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The empty clause is unsatisfiable.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The single literal of a unit clause.
    #[inline]
    pub fn unit(&self) -> Option<Literal> {
        match self.0.as_slice() {
            [lit] => Some(*lit),
            _ => None,
        }
    }

    /// Whether any literal is true under `assignment`.
    #[inline]
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.0.iter().any(|&lit| assignment.satisfies(lit))
    }

    /// Whether the clause mentions `lit` exactly (same polarity).
    #[inline]
    pub fn contains(&self, lit: Literal) -> bool {
        self.0.contains(&lit)
    }
}

impl From<Vec<Literal>> for Clause {
    fn from(literals: Vec<Literal>) -> Self {
        Clause(literals)
    }
}

/// A CNF formula over variables `1..=num_vars`.
///
/// Formulas are never mutated once built; [`Formula::simplify`] returns a
/// fresh formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    num_vars: usize,
    clauses: Vec<Clause>,
}

impl Formula {
    /// Build a formula, checking that every literal names a known variable.
    pub fn new(num_vars: usize, clauses: Vec<Clause>) -> Result<Self> {
        for clause in &clauses {
            for &lit in clause.literals() {
                if lit.var() as usize > num_vars {
                    return Err(Error::VariableOutOfRange {
                        var: lit.var(),
                        num_vars,
                    });
                }
            }
        }
        Ok(Formula { num_vars, clauses })
    }

    /// Build without range checks; callers guarantee the invariant.
    pub(crate) fn from_parts(num_vars: usize, clauses: Vec<Clause>) -> Self {
        Formula { num_vars, clauses }
    }

    /// Number of variables.
    #[inline]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Clauses in generation order.
    #[inline]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Number of clauses.
    #[inline]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// True when no clauses remain (trivially satisfiable).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Clause-to-variable ratio m/n.
    pub fn alpha(&self) -> f64 {
        if self.num_vars == 0 {
            0.0
        } else {
            self.clauses.len() as f64 / self.num_vars as f64
        }
    }

    /// Whether some clause has been emptied by simplification.
    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    /// Energy: the number of clauses falsified by `assignment`.
    pub fn count_unsat(&self, assignment: &Assignment) -> usize {
        self.clauses
            .iter()
            .filter(|c| !c.is_satisfied_by(assignment))
            .count()
    }

    /// Indices of the clauses falsified by `assignment`.
    pub fn unsat_clauses(&self, assignment: &Assignment) -> Vec<usize> {
        self.clauses
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_satisfied_by(assignment))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether `assignment` satisfies every clause.
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.clauses.iter().all(|c| c.is_satisfied_by(assignment))
    }

    /// Assert `lit` true: drop clauses containing it and strike its
    /// negation from the rest.
    pub fn simplify(&self, lit: Literal) -> Formula {
        let negated = lit.negated();
        let clauses = self
            .clauses
            .iter()
            .filter(|c| !c.contains(lit))
            .map(|c| {
                if c.contains(negated) {
                    Clause(c.0.iter().copied().filter(|&l| l != negated).collect())
                } else {
                    c.clone()
                }
            })
            .collect();
        Formula::from_parts(self.num_vars, clauses)
    }

    /// Apply [`Formula::simplify`] for every literal in turn.
    pub fn simplify_all(&self, literals: &[Literal]) -> Formula {
        literals
            .iter()
            .fold(self.clone(), |formula, &lit| formula.simplify(lit))
    }

    /// A copy with one extra clause appended.
    pub fn with_clause(&self, clause: Clause) -> Result<Formula> {
        let mut clauses = self.clauses.clone();
        clauses.push(clause);
        Formula::new(self.num_vars, clauses)
    }

    /// Occurrences of each variable regardless of polarity, indexed by
    /// variable - 1.
    pub fn variable_degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.num_vars];
        for clause in &self.clauses {
            for &lit in clause.literals() {
                degrees[lit.index()] += 1;
            }
        }
        degrees
    }

    /// Positive minus negative occurrences of each variable.
    pub fn polarity_bias(&self) -> Vec<i64> {
        let mut bias = vec![0i64; self.num_vars];
        for clause in &self.clauses {
            for &lit in clause.literals() {
                bias[lit.index()] += if lit.is_positive() { 1 } else { -1 };
            }
        }
        bias
    }

    /// Variables that appear in at least one clause, ascending.
    pub fn active_variables(&self) -> Vec<u32> {
        self.variable_degrees()
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > 0)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }
}

/// A total truth assignment, indexed by variable - 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment(Vec<bool>);

impl Assignment {
    /// All variables false.
    pub fn all_false(num_vars: usize) -> Self {
        Assignment(vec![false; num_vars])
    }

    /// Uniformly random assignment.
    pub fn random<R: Rng + ?Sized>(num_vars: usize, rng: &mut R) -> Self {
        Assignment((0..num_vars).map(|_| rng.random::<bool>()).collect())
    }

    /// Wrap an explicit value vector.
    pub fn from_values(values: Vec<bool>) -> Self {
        Assignment(values)
    }

    /// Number of variables covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for an assignment over zero variables.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of 1-based variable `var`.
    #[inline]
    pub fn value(&self, var: u32) -> bool {
        self.0[var as usize - 1]
    }

    /// Set 1-based variable `var`.
    #[inline]
    pub fn set(&mut self, var: u32, value: bool) {
        self.0[var as usize - 1] = value;
    }

    /// Whether `lit` evaluates to true.
    #[inline]
    pub fn satisfies(&self, lit: Literal) -> bool {
        self.0[lit.index()] == lit.is_positive()
    }

    /// Flip `var` in place.
    #[inline]
    pub fn flip(&mut self, var: u32) {
        let slot = &mut self.0[var as usize - 1];
        *slot = !*slot;
    }

    /// A copy with `var` flipped; `self` is untouched.
    pub fn flipped(&self, var: u32) -> Assignment {
        let mut next = self.clone();
        next.flip(var);
        next
    }

    /// The literal that is true for `var` under this assignment.
    #[inline]
    pub fn literal_of(&self, var: u32) -> Literal {
        Literal::new(var, self.value(var))
    }

    /// Raw values.
    #[inline]
    pub fn values(&self) -> &[bool] {
        &self.0
    }

    /// Number of variables on which two assignments differ.
    pub fn hamming_distance(&self, other: &Assignment) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a != b)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(values: &[i32]) -> Vec<Literal> {
        values
            .iter()
            .map(|&v| Literal::from_dimacs(v).unwrap())
            .collect()
    }

    fn formula(num_vars: usize, clauses: &[&[i32]]) -> Formula {
        Formula::new(
            num_vars,
            clauses.iter().map(|c| Clause::new(lits(c))).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range_variable() {
        let err = Formula::new(2, vec![Clause::new(lits(&[1, -3]))]).unwrap_err();
        assert!(matches!(err, Error::VariableOutOfRange { var: 3, num_vars: 2 }));
    }

    #[test]
    fn test_with_clause_validates_and_keeps_original() {
        let f = formula(2, &[&[1, 2]]);
        let strengthened = f.with_clause(Clause::new(lits(&[-1]))).unwrap();
        assert_eq!(strengthened.num_clauses(), 2);
        assert_eq!(f.num_clauses(), 1);
        assert!(matches!(
            f.with_clause(Clause::new(lits(&[4]))),
            Err(Error::VariableOutOfRange { var: 4, num_vars: 2 })
        ));
    }

    #[test]
    fn test_simplify_removes_and_strikes() {
        let f = formula(3, &[&[1, 2, 3], &[-1, 2, 3], &[2, -3, 1]]);
        let s = f.simplify(Literal::positive(1));
        // clauses with +1 vanish, -1 is struck from the other
        assert_eq!(s.num_clauses(), 1);
        assert_eq!(s.clauses()[0].literals(), &lits(&[2, 3])[..]);
        // original untouched
        assert_eq!(f.num_clauses(), 3);
    }

    #[test]
    fn test_simplify_to_empty_clause() {
        let f = formula(3, &[&[1], &[2, 3, 1]]);
        let s = f.simplify(Literal::negative(1));
        assert!(s.has_empty_clause());
    }

    #[test]
    fn test_count_unsat_and_indices() {
        let f = formula(3, &[&[1, 2, 3], &[-1, -2, -3], &[1, -2, 3]]);
        let a = Assignment::from_values(vec![false, true, false]);
        assert_eq!(f.count_unsat(&a), 1);
        assert_eq!(f.unsat_clauses(&a), vec![2]);
        assert!(!f.is_satisfied_by(&a));
        let b = a.flipped(1);
        assert!(f.is_satisfied_by(&b));
        // flipped copy leaves the source intact
        assert!(!a.value(1));
    }

    #[test]
    fn test_alpha_and_degrees() {
        let f = formula(4, &[&[1, 2, 3], &[-1, 2, -4]]);
        assert!((f.alpha() - 0.5).abs() < 1e-12);
        assert_eq!(f.variable_degrees(), vec![2, 2, 1, 1]);
        assert_eq!(f.polarity_bias(), vec![0, 2, 1, -1]);
        assert_eq!(f.active_variables(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_hamming_distance() {
        let a = Assignment::from_values(vec![true, false, true]);
        let b = Assignment::from_values(vec![false, false, false]);
        assert_eq!(a.hamming_distance(&b), 2);
        assert_eq!(a.literal_of(2), Literal::negative(2));
    }
}
