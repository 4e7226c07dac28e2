//! Signed-integer literals

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A literal: magnitude is the 1-based variable, sign is the polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Literal(i32);

impl Literal {
    /// Literal over 1-based variable `var` with the given polarity.
    #[inline]
    pub fn new(var: u32, positive: bool) -> Self {
        debug_assert!(var > 0 && var <= i32::MAX as u32, "variable {var} out of range");
        let v = var as i32;
        Literal(if positive { v } else { -v })
    }

    /// Positive literal of `var`.
    #[inline]
    pub fn positive(var: u32) -> Self {
        Self::new(var, true)
    }

    /// Negative literal of `var`.
    #[inline]
    pub fn negative(var: u32) -> Self {
        Self::new(var, false)
    }

    /// Parse a DIMACS integer; `0` is the clause terminator, not a literal.
    pub fn from_dimacs(value: i32) -> Result<Self> {
        if value == 0 || value == i32::MIN {
            return Err(Error::ZeroLiteral);
        }
        Ok(Literal(value))
    }

    /// The 1-based variable.
    #[inline]
    pub fn var(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// The 0-based variable index, for indexing assignments.
    #[inline]
    pub fn index(self) -> usize {
        self.var() as usize - 1
    }

    /// True for the un-negated literal.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// The opposite literal over the same variable.
    #[inline]
    pub fn negated(self) -> Self {
        Literal(-self.0)
    }

    /// The signed DIMACS value.
    #[inline]
    pub fn to_dimacs(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
