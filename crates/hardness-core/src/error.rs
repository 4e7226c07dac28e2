//! Error types for instance construction and search

use thiserror::Error;

/// Errors raised by the core engine.
///
/// Running out of search budget is not an error; see
/// [`SolveOutcome::Inconclusive`](crate::SolveOutcome::Inconclusive).
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum Error {
    /// Fewer than three variables cannot host a clause of three distinct ones.
    #[error("random 3-SAT needs at least 3 variables, got {n}")]
    TooFewVariables { n: usize },

    /// A literal names a variable the formula does not have.
    #[error("variable {var} out of range for formula over {num_vars} variables")]
    VariableOutOfRange { var: u32, num_vars: usize },

    /// Zero is reserved as the DIMACS clause terminator.
    #[error("literal 0 is not a valid literal")]
    ZeroLiteral,

    /// A clause index beyond the end of the formula.
    #[error("clause {index} out of range for formula with {num_clauses} clauses")]
    ClauseOutOfRange { index: usize, num_clauses: usize },

    /// Malformed DIMACS text.
    #[error("dimacs parse error at line {line}: {message}")]
    DimacsParse { line: usize, message: String },

    /// A probe or solver parameter outside its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The caller's cancellation token fired.
    #[error("cancelled")]
    Cancelled,
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
