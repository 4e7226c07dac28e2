//! Engine configuration
//!
//! One JSON document configures every phase. Missing fields take their
//! defaults, so a config file only lists what it overrides:
//!
//! ```json
//! {
//!   "probe_n": 40,
//!   "phases": ["macro_scan", "variance", "hysteresis"],
//!   "variance": { "budget": 4000 }
//! }
//! ```

use std::path::Path;

use hardness_probes::{
    AdversarialConfig, AutopsyConfig, GeneralizationConfig, HysteresisConfig, PruneConfig,
    SpectralConfig, UniversalityConfig, VarianceConfig,
};
use hardness_scaling::{
    BoundaryConfig, ConfirmationConfig, MacroScanConfig, ScalingConfig, StepBudget,
    StressTestConfig, CRITICAL_ALPHA,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunnerError};
use crate::phase::Phase;

/// Configuration of a full pipeline run.
///
/// The `n`, `alpha` and `seed` of probe configs are overwritten by the
/// pipeline: probes run at `probe_n`, at the peak α found by the macro
/// scan, with seeds derived from `seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Phases to run; always executed in pipeline order.
    pub phases: Vec<Phase>,
    /// Number of variables for single-instance probes.
    pub probe_n: usize,
    /// α used by the probes when the macro scan is not run.
    pub fallback_alpha: f64,
    /// Base seed of the run.
    pub seed: u64,
    /// Macro scan.
    pub macro_scan: MacroScanConfig,
    /// Energy-variance probe.
    pub variance: VarianceConfig,
    /// Hysteresis probe.
    pub hysteresis: HysteresisConfig,
    /// Structural autopsy.
    pub autopsy: AutopsyConfig,
    /// Scaling analysis.
    pub scaling: ScalingConfig,
    /// Stress test.
    pub stress: StressTestConfig,
    /// Exponential confirmation.
    pub confirmation: ConfirmationConfig,
    /// Complexity boundary map.
    pub boundary: BoundaryConfig,
    /// Backbone-pruning search.
    pub prune: PruneConfig,
    /// Topological-generalization test.
    pub generalization: GeneralizationConfig,
    /// Universality test.
    pub universality: UniversalityConfig,
    /// Adversarial scaling.
    pub adversarial: AdversarialConfig,
    /// Spectral-gap correlation.
    pub spectral: SpectralConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            phases: Phase::ALL.to_vec(),
            probe_n: 50,
            fallback_alpha: CRITICAL_ALPHA,
            seed: 42,
            macro_scan: MacroScanConfig::default(),
            variance: VarianceConfig::default(),
            hysteresis: HysteresisConfig::default(),
            autopsy: AutopsyConfig::default(),
            scaling: ScalingConfig::default(),
            stress: StressTestConfig::default(),
            confirmation: ConfirmationConfig::default(),
            boundary: BoundaryConfig::default(),
            prune: PruneConfig::default(),
            generalization: GeneralizationConfig::default(),
            universality: UniversalityConfig::default(),
            adversarial: AdversarialConfig::default(),
            spectral: SpectralConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Small sizes and budgets everywhere; finishes in seconds.
    pub fn fast() -> Self {
        let mut config = Self {
            probe_n: 20,
            macro_scan: MacroScanConfig::fast(),
            scaling: ScalingConfig::fast(),
            confirmation: ConfirmationConfig::fast(),
            ..Self::default()
        };
        config.variance.budget = 1_000;
        config.hysteresis.max_steps = 2_000;
        config.autopsy.anneal.max_steps = 2_000;
        config.stress.sizes = vec![20, 25, 30];
        config.stress.samples_per_size = 3;
        config.stress.budget = StepBudget::doubling(20_000, 200_000);
        config.boundary.n = 16;
        config.boundary.alpha_step = 0.5;
        config.boundary.samples_per_alpha = 5;
        config.boundary.step_limit = 50_000;
        config.prune.step_limit = 100_000;
        config.universality.samples = 6;
        config.adversarial.sizes = vec![15, 20, 25];
        config.adversarial.samples_per_size = 3;
        config.spectral.samples = 4;
        config
    }

    /// Only the given phases.
    pub fn with_phases(mut self, phases: &[Phase]) -> Self {
        self.phases = phases.to_vec();
        self
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RunnerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether `phase` is selected.
    pub fn runs(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }
}
