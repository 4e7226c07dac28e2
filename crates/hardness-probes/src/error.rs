//! Probe errors

use hardness_scaling::RegressionError;
use thiserror::Error;

/// Errors raised by a probe. Budget exhaustion is never one of them; it is
/// part of each probe's result.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Instance generation, search or cancellation.
    #[error(transparent)]
    Core(#[from] hardness_core::Error),

    /// A trend could not be fitted.
    #[error("trend fit failed: {0}")]
    Regression(#[from] RegressionError),

    /// A probe parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for probes
pub type Result<T> = std::result::Result<T, ProbeError>;
