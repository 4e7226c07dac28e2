//! Headless pipeline
//!
//! Runs the selected phases in a fixed order. Two scalars flow between
//! phases:
//!
//! - **peak α**: the α of highest cost found by the macro scan. Every
//!   single-instance probe runs there, at `probe_n` variables. Without a
//!   macro scan the configured fallback α is used.
//! - **trap flag**: set when the energy-variance probe reports a trapped
//!   or glassy tail. The hysteresis probe then runs as a deep scan.
//!
//! Sweeps over n or α (scaling, stress, confirmation, boundary) keep their
//! own configured α. Every phase gets its own seed derived from the run
//! seed, so a phase gives the same answer whether or not earlier phases
//! ran, as long as peak α and the trap flag agree.

use hardness_core::{derive_seed, CancelToken};
use hardness_probes::{
    adversarial_scaling, energy_variance, generalization_test, hysteresis, millennium_search,
    spectral_correlation, structural_autopsy, universality_test,
};
use hardness_scaling::{
    confirm_exponential, macro_scan, map_boundary, scaling_analysis, stress_test,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{Result, RunnerError};
use crate::phase::{Phase, PhaseReport};

/// Progress notification from [`Pipeline::run_with`].
#[derive(Debug, Clone, Copy)]
pub enum PipelineEvent<'a> {
    /// A phase is about to run.
    PhaseStarted(Phase),
    /// A phase finished.
    PhaseFinished(&'a PhaseReport),
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// α the probes ran at.
    pub peak_alpha: f64,
    /// Whether the variance probe saw a trap.
    pub trap_detected: bool,
    /// One report per phase run, in order.
    pub reports: Vec<PhaseReport>,
}

impl PipelineReport {
    /// The report of `phase`, if it ran.
    pub fn get(&self, phase: Phase) -> Option<&PhaseReport> {
        self.reports.iter().find(|r| r.phase() == phase)
    }
}

/// Sequences the phases of an [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: EngineConfig,
    cancel: Option<CancelToken>,
}

struct Context {
    peak_alpha: f64,
    trap_detected: bool,
}

impl Pipeline {
    /// Pipeline over `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Stop between and inside phases once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every selected phase.
    pub fn run(&self) -> Result<PipelineReport> {
        self.run_with(&mut |_| {})
    }

    /// Run every selected phase, reporting progress to `observer`.
    pub fn run_with(&self, observer: &mut dyn FnMut(PipelineEvent<'_>)) -> Result<PipelineReport> {
        let mut context = Context {
            peak_alpha: self.config.fallback_alpha,
            trap_detected: false,
        };
        let mut reports = Vec::new();
        info!(
            "pipeline: {} phases, probe n={}, seed={}",
            self.config.phases.len(),
            self.config.probe_n,
            self.config.seed
        );

        for phase in Phase::ALL {
            if !self.config.runs(phase) {
                continue;
            }
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return Err(RunnerError::Cancelled);
            }
            observer(PipelineEvent::PhaseStarted(phase));
            let report = self.run_phase(phase, &mut context).map_err(|e| {
                if e.is_cancelled() {
                    RunnerError::Cancelled
                } else {
                    e
                }
            })?;
            info!("{}: {}", phase.name(), report.summary());
            observer(PipelineEvent::PhaseFinished(&report));
            reports.push(report);
        }

        Ok(PipelineReport {
            peak_alpha: context.peak_alpha,
            trap_detected: context.trap_detected,
            reports,
        })
    }

    fn phase_seed(&self, phase: Phase) -> u64 {
        let index = Phase::ALL.iter().position(|&p| p == phase).unwrap_or(0);
        derive_seed(self.config.seed, index as u64)
    }

    fn run_phase(&self, phase: Phase, context: &mut Context) -> Result<PhaseReport> {
        let config = &self.config;
        let cancel = self.cancel.as_ref();
        let n = config.probe_n;
        let alpha = context.peak_alpha;
        let seed = self.phase_seed(phase);
        debug!("phase {:?}: n={}, alpha={}, seed={}", phase, n, alpha, seed);

        let report = match phase {
            Phase::MacroScan => {
                let mut scan = config.macro_scan.clone();
                scan.seed = seed;
                let result = macro_scan(&scan, cancel)?;
                context.peak_alpha = result.peak_alpha;
                PhaseReport::MacroScan(result)
            }
            Phase::Variance => {
                let mut probe = config.variance.clone();
                (probe.n, probe.alpha, probe.seed) = (n, alpha, seed);
                let result = energy_variance(&probe, cancel)?;
                context.trap_detected = result.diagnosis.is_trap();
                PhaseReport::Variance(result)
            }
            Phase::Hysteresis => {
                let mut probe = config.hysteresis.clone();
                (probe.n, probe.alpha, probe.seed) = (n, alpha, seed);
                if context.trap_detected && !hardness_probes::is_deep_scan(probe.slow_rate) {
                    probe = probe.deep_scan();
                }
                PhaseReport::Hysteresis(hysteresis(&probe, cancel)?)
            }
            Phase::Autopsy => {
                let mut probe = config.autopsy.clone();
                (probe.n, probe.alpha, probe.seed) = (n, alpha, seed);
                PhaseReport::Autopsy(structural_autopsy(&probe, cancel)?)
            }
            Phase::Scaling => {
                let mut sweep = config.scaling.clone();
                sweep.seed = seed;
                PhaseReport::Scaling(scaling_analysis(&sweep, cancel)?)
            }
            Phase::Stress => {
                let mut sweep = config.stress.clone();
                sweep.seed = seed;
                PhaseReport::Stress(stress_test(&sweep, cancel)?)
            }
            Phase::Confirmation => {
                let mut sweep = config.confirmation.clone();
                sweep.seed = seed;
                PhaseReport::Confirmation(confirm_exponential(&sweep, cancel)?)
            }
            Phase::Boundary => {
                let mut sweep = config.boundary.clone();
                sweep.seed = seed;
                PhaseReport::Boundary(map_boundary(&sweep, cancel)?)
            }
            Phase::MillenniumSearch => {
                let mut probe = config.prune.clone();
                (probe.n, probe.alpha, probe.seed) = (n, alpha, seed);
                PhaseReport::MillenniumSearch(millennium_search(&probe, cancel)?)
            }
            Phase::Generalization => {
                let mut probe = config.generalization.clone();
                (probe.n, probe.alpha, probe.seed) = (n, alpha, seed);
                PhaseReport::Generalization(generalization_test(&probe, cancel)?)
            }
            Phase::Universality => {
                let mut probe = config.universality.clone();
                (probe.base.n, probe.base.alpha, probe.base.seed) = (n, alpha, seed);
                PhaseReport::Universality(universality_test(&probe, cancel)?)
            }
            Phase::Adversarial => {
                let mut probe = config.adversarial.clone();
                (probe.base.alpha, probe.base.seed) = (alpha, seed);
                PhaseReport::Adversarial(adversarial_scaling(&probe, cancel)?)
            }
            Phase::Spectral => {
                let mut probe = config.spectral.clone();
                (probe.n, probe.alpha, probe.seed) = (n, alpha, seed);
                PhaseReport::Spectral(spectral_correlation(&probe, cancel)?)
            }
        };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_seeds_differ() {
        let pipeline = Pipeline::new(EngineConfig::default());
        let seeds: Vec<u64> = Phase::ALL.iter().map(|&p| pipeline.phase_seed(p)).collect();
        for (i, a) in seeds.iter().enumerate() {
            assert!(seeds[i + 1..].iter().all(|b| a != b));
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let pipeline = Pipeline::new(EngineConfig::fast()).with_cancel(token);
        assert!(matches!(pipeline.run(), Err(RunnerError::Cancelled)));
    }

    #[test]
    fn test_empty_selection_reports_fallback() {
        let pipeline = Pipeline::new(EngineConfig::fast().with_phases(&[]));
        let report = pipeline.run().unwrap();
        assert!(report.reports.is_empty());
        assert_eq!(report.peak_alpha, EngineConfig::default().fallback_alpha);
        assert!(!report.trap_detected);
    }
}
