//! Runner errors

use std::path::PathBuf;

use hardness_probes::ProbeError;
use hardness_scaling::ScalingError;
use thiserror::Error;

/// Errors raised by the pipeline and the worker.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The engine configuration could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigIo {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The engine configuration is not valid JSON for [`crate::EngineConfig`].
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A scaling phase failed.
    #[error(transparent)]
    Scaling(#[from] ScalingError),

    /// A probe phase failed.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// The run was cancelled.
    #[error("run cancelled")]
    Cancelled,

    /// The worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),

    /// The worker thread has stopped and accepts no more jobs.
    #[error("worker is not running")]
    WorkerStopped,
}

impl RunnerError {
    /// Whether the error is a cancellation, wherever it was raised.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            RunnerError::Cancelled
                | RunnerError::Scaling(ScalingError::Core(hardness_core::Error::Cancelled))
                | RunnerError::Probe(ProbeError::Core(hardness_core::Error::Cancelled))
        )
    }
}

/// Result type for the runner
pub type Result<T> = std::result::Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use hardness_scaling::RegressionError;

    #[test]
    fn test_cancellation_recognised_at_every_layer() {
        let cancelled = || hardness_core::Error::Cancelled;
        assert!(RunnerError::Cancelled.is_cancelled());
        assert!(RunnerError::from(ScalingError::from(cancelled())).is_cancelled());
        assert!(RunnerError::from(ProbeError::from(cancelled())).is_cancelled());
        let fit = ProbeError::from(RegressionError::DegenerateInput);
        assert!(!RunnerError::from(fit).is_cancelled());
        assert!(!RunnerError::WorkerStopped.is_cancelled());
    }
}
