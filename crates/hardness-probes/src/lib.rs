//! Hardness probes - why critical random 3-SAT instances are hard
//!
//! Each probe generates its own instance from a seed, runs the exact or
//! local search engine on it, and returns a typed result with a
//! categorical diagnosis:
//!
//! - [`variance`]: energy tail of a lenient anneal (trapped, chaotic,
//!   glassy, solved)
//! - [`hysteresis`]: quench vs. slow anneal on the same instance
//! - [`autopsy`]: per-variable flip counts and backbone rigidity
//! - [`prune`]: fix the guessed backbone and re-solve exactly
//! - [`generalization`]: does variable degree predict the backbone
//! - [`universality`]: the same question over many instances
//! - [`adversarial`]: the same question over growing n
//! - [`spectral`]: does the Laplacian spectral gap track rigidity
//!
//! Diagnoses are heuristic classifications against fixed, overridable
//! thresholds. They describe what the search observed, not a proof about
//! the instance.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adversarial;
pub mod autopsy;
pub mod error;
pub mod generalization;
pub mod hysteresis;
pub mod instance;
pub mod prune;
pub mod spectral;
pub mod universality;
pub mod variance;

pub use adversarial::{
    adversarial_scaling, AdversarialConfig, AdversarialResult, AdversarialVerdict, SizeAccuracy,
    COLLAPSE_SLOPE, DECAY_SLOPE,
};
pub use autopsy::{
    autopsy_of, structural_autopsy, AutopsyConfig, AutopsyDiagnosis, StructuralResult,
    FROZEN_FLIP_FRACTION, RIGIDITY_THRESHOLD, STRICT_RIGIDITY_THRESHOLD,
};
pub use error::{ProbeError, Result};
pub use generalization::{
    generalization_test, overlap_accuracy, predict_backbone, BackboneSource, GeneralizationConfig,
    GeneralizationDiagnosis, GeneralizationResult, GroundTruth, LEAK_ACCURACY, WEAK_ACCURACY,
};
pub use hysteresis::{
    hysteresis, is_deep_scan, HysteresisConfig, HysteresisDiagnosis, HysteresisResult, RunOutcome,
    DEEP_SCAN_COOLING_RATE,
};
pub use instance::InstanceSpec;
pub use prune::{
    millennium_search, ExactSolve, MillenniumSearchResult, PruneConfig, PruneDiagnosis,
    MIN_REDUCTION_PERCENT,
};
pub use spectral::{
    pearson_correlation, spectral_correlation, spectral_gap, GapSolver, Incidence, Polarity,
    SpectralConfig, SpectralGap, SpectralResult, SpectralSample, SpectralVerdict, VcGraph,
    SIGNIFICANT_CORRELATION,
};
pub use universality::{
    universality_test, AccuracyStats, UniversalityConfig, UniversalityResult, UniversalityVerdict,
    CONSISTENT_ACCURACY, UNIVERSAL_FRACTION,
};
pub use variance::{
    energy_variance, VarianceAnalysisResult, VarianceConfig, VarianceDiagnosis, CHAOTIC_VARIANCE,
    TAIL_WINDOW, TRAPPED_VARIANCE,
};
