//! Error types for regression and sweeps

use thiserror::Error;

/// Why a least-squares fit could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegressionError {
    /// Fewer than two points.
    #[error("need at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// x and y have different lengths.
    #[error("x has {x} values but y has {y}")]
    LengthMismatch {
        /// Length of x.
        x: usize,
        /// Length of y.
        y: usize,
    },

    /// A log transform met a value <= 0.
    #[error("log-linear fit needs strictly positive samples")]
    NonPositiveSample,

    /// Every x is identical, so the slope is undefined.
    #[error("all x values are identical")]
    DegenerateInput,
}

/// Errors raised by scaling experiments.
#[derive(Debug, Error)]
pub enum ScalingError {
    /// Instance generation or search failed.
    #[error(transparent)]
    Core(#[from] hardness_core::Error),

    /// The cost curve could not be fitted.
    #[error("regression failed: {0}")]
    Regression(#[from] RegressionError),

    /// A sweep parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for scaling experiments
pub type Result<T> = std::result::Result<T, ScalingError>;
