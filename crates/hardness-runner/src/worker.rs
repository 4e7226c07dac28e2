//! Background worker
//!
//! A dedicated thread that runs pipeline jobs one at a time. Jobs go in
//! over an `mpsc` channel; progress and results come back over another.
//! The latest status sits behind a mutex so a host can poll it without
//! draining the output channel.
//!
//! Each job gets its own [`CancelToken`] at submission, kept in an
//! in-flight list until the job finishes. [`Worker::cancel`] fires the
//! token at the head of that list, which is the job running or the one
//! about to start, and leaves later jobs alone.
//! [`Worker::shutdown`] drains the queue before stopping, while dropping
//! the handle cancels the running job and discards the queue.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hardness_core::CancelToken;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{Result, RunnerError};
use crate::phase::{Phase, PhaseReport};
use crate::pipeline::{Pipeline, PipelineEvent, PipelineReport};

/// Identifier of a submitted job.
pub type JobId = u64;

/// Work for the worker thread.
#[derive(Debug, Clone)]
pub struct Job {
    /// Identifier assigned at submission.
    pub id: JobId,
    /// What to run.
    pub config: EngineConfig,
    /// Fires when the job is cancelled.
    pub cancel: CancelToken,
}

/// Message from the worker thread.
#[derive(Debug)]
pub enum JobOutput {
    /// A phase of `job` finished.
    Phase {
        /// Job the phase belongs to.
        job: JobId,
        /// Its report.
        report: Box<PhaseReport>,
    },
    /// `job` finished.
    Finished {
        /// The job.
        job: JobId,
        /// Its outcome.
        result: Result<PipelineReport>,
    },
}

/// What the worker is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Waiting for a job.
    Idle,
    /// Running `phase` of `job`.
    Running {
        /// The job.
        job: JobId,
        /// Phase in progress.
        phase: Phase,
    },
    /// The thread has exited.
    Stopped,
}

struct Shared {
    status: Mutex<WorkerStatus>,
    in_flight: Mutex<VecDeque<(JobId, CancelToken)>>,
    stopping: CancelToken,
}

/// Handle to the worker thread.
pub struct Worker {
    jobs: Option<Sender<Job>>,
    outputs: Receiver<JobOutput>,
    shared: Arc<Shared>,
    next_id: JobId,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start the worker thread.
    pub fn spawn() -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (out_tx, out_rx) = mpsc::channel::<JobOutput>();
        let shared = Arc::new(Shared {
            status: Mutex::new(WorkerStatus::Idle),
            in_flight: Mutex::new(VecDeque::new()),
            stopping: CancelToken::new(),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("hardness-worker".to_string())
            .spawn(move || worker_loop(job_rx, out_tx, thread_shared))
            .map_err(RunnerError::Spawn)?;

        Ok(Self {
            jobs: Some(job_tx),
            outputs: out_rx,
            shared,
            next_id: 0,
            handle: Some(handle),
        })
    }

    /// Queue a pipeline run.
    pub fn submit(&mut self, config: EngineConfig) -> Result<JobId> {
        let id = self.next_id;
        let sender = self.jobs.as_ref().ok_or(RunnerError::WorkerStopped)?;
        let cancel = CancelToken::new();
        {
            let mut in_flight = self.shared.in_flight.lock();
            sender
                .send(Job {
                    id,
                    config,
                    cancel: cancel.clone(),
                })
                .map_err(|_| RunnerError::WorkerStopped)?;
            in_flight.push_back((id, cancel));
        }
        self.next_id += 1;
        debug!("worker: queued job {}", id);
        Ok(id)
    }

    /// Cancel the job currently running, or the next one to start if the
    /// worker has not picked it up yet.
    pub fn cancel(&self) {
        if let Some((id, token)) = self.shared.in_flight.lock().front() {
            debug!("worker: cancelling job {}", id);
            token.cancel();
        }
    }

    /// Latest status.
    pub fn status(&self) -> WorkerStatus {
        *self.shared.status.lock()
    }

    /// Next output, blocking. `None` once the thread has exited and every
    /// output was read.
    pub fn recv(&self) -> Option<JobOutput> {
        self.outputs.recv().ok()
    }

    /// Next output, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<JobOutput> {
        self.outputs.recv_timeout(timeout).ok()
    }

    /// Block until `job` finishes, dropping the phase outputs on the way.
    pub fn wait_for(&self, job: JobId) -> Result<PipelineReport> {
        while let Some(output) = self.recv() {
            if let JobOutput::Finished { job: done, result } = output {
                if done == job {
                    return result;
                }
            }
        }
        Err(RunnerError::WorkerStopped)
    }

    /// Finish queued jobs, then stop the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
        *self.shared.status.lock() = WorkerStatus::Stopped;
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shared.stopping.cancel();
            self.cancel();
            self.stop();
        }
    }
}

fn worker_loop(jobs: Receiver<Job>, outputs: Sender<JobOutput>, shared: Arc<Shared>) {
    for job in jobs {
        if shared.stopping.is_cancelled() {
            debug!("worker: stopping, job {} discarded", job.id);
            break;
        }
        debug!("worker: starting job {}", job.id);

        let pipeline = Pipeline::new(job.config).with_cancel(job.cancel);
        let result = pipeline.run_with(&mut |event| match event {
            PipelineEvent::PhaseStarted(phase) => {
                *shared.status.lock() = WorkerStatus::Running { job: job.id, phase };
            }
            PipelineEvent::PhaseFinished(report) => {
                let output = JobOutput::Phase {
                    job: job.id,
                    report: Box::new(report.clone()),
                };
                if outputs.send(output).is_err() {
                    debug!("worker: output receiver gone, report of job {} dropped", job.id);
                }
            }
        });

        shared.in_flight.lock().retain(|(id, _)| *id != job.id);
        *shared.status.lock() = WorkerStatus::Idle;
        if outputs.send(JobOutput::Finished { job: job.id, result }).is_err() {
            debug!("worker: output receiver gone, stopping");
            break;
        }
    }
    *shared.status.lock() = WorkerStatus::Stopped;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_then_stopped() {
        let worker = Worker::spawn().unwrap();
        assert_eq!(worker.status(), WorkerStatus::Idle);
        worker.shutdown();
    }

    #[test]
    fn test_runs_job_and_streams_phases() {
        let mut worker = Worker::spawn().unwrap();
        let config = EngineConfig::fast().with_phases(&[Phase::MacroScan, Phase::Variance]);
        let job = worker.submit(config).unwrap();

        let mut phases = Vec::new();
        let report = loop {
            match worker.recv().unwrap() {
                JobOutput::Phase { job: j, report } => {
                    assert_eq!(j, job);
                    phases.push(report.phase());
                }
                JobOutput::Finished { job: j, result } => {
                    assert_eq!(j, job);
                    break result.unwrap();
                }
            }
        };
        assert_eq!(phases, vec![Phase::MacroScan, Phase::Variance]);
        assert_eq!(report.reports.len(), 2);
        worker.shutdown();
    }

    #[test]
    fn test_job_ids_increase() {
        let mut worker = Worker::spawn().unwrap();
        let a = worker.submit(EngineConfig::fast().with_phases(&[])).unwrap();
        let b = worker.submit(EngineConfig::fast().with_phases(&[])).unwrap();
        assert_eq!(b, a + 1);
        assert!(worker.wait_for(a).is_ok());
        assert!(worker.wait_for(b).is_ok());
    }

    #[test]
    fn test_cancel_right_after_submit_is_not_lost() {
        let mut worker = Worker::spawn().unwrap();
        let mut heavy = EngineConfig::default().with_phases(&[Phase::Stress]);
        heavy.stress.sizes = vec![150, 175, 200];
        heavy.stress.budget.base = 50_000_000;
        heavy.stress.budget.max = 50_000_000;
        let first = worker.submit(heavy).unwrap();
        let second = worker.submit(EngineConfig::fast().with_phases(&[])).unwrap();
        worker.cancel();

        assert!(matches!(worker.wait_for(first), Err(RunnerError::Cancelled)));
        assert!(worker.wait_for(second).is_ok());
        assert!(worker.shared.in_flight.lock().is_empty());
        worker.shutdown();
    }
}
