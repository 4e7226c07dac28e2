//! Hardness runner - sequencing the experiments off the caller's thread
//!
//! - [`EngineConfig`]: one JSON document configuring every phase
//! - [`Pipeline`]: runs the selected phases in order, threading the peak α
//!   of the macro scan and the trap flag of the variance probe into the
//!   phases that follow
//! - [`Worker`]: a dedicated thread running pipelines from a job channel,
//!   streaming phase reports back and honouring cancellation
//!
//! The runner never installs a tracing subscriber; binaries do.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod phase;
pub mod pipeline;
pub mod worker;

pub use config::EngineConfig;
pub use error::{Result, RunnerError};
pub use phase::{Phase, PhaseReport};
pub use pipeline::{Pipeline, PipelineEvent, PipelineReport};
pub use worker::{Job, JobId, JobOutput, Worker, WorkerStatus};
