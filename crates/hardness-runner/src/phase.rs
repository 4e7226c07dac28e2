//! Pipeline phases and their reports

use hardness_probes::{
    AdversarialResult, GeneralizationResult, HysteresisResult, MillenniumSearchResult,
    SpectralResult, StructuralResult, UniversalityResult, VarianceAnalysisResult,
};
use hardness_scaling::{
    BoundaryMapResult, ConfirmationResult, MacroScanResult, ScalingResult, StressTestResult,
};
use serde::{Deserialize, Serialize};

/// One experiment of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Satisfiability and cost across α.
    MacroScan,
    /// Energy-variance probe at the peak α.
    Variance,
    /// Quench vs. slow anneal; deep scan when a trap was seen.
    Hysteresis,
    /// Backbone rigidity.
    Autopsy,
    /// Cost vs. n.
    Scaling,
    /// Cost vs. n at large n.
    Stress,
    /// Exponential confirmation.
    Confirmation,
    /// Zones of b across α.
    Boundary,
    /// Backbone pruning.
    MillenniumSearch,
    /// Degree vs. backbone.
    Generalization,
    /// Degree vs. backbone over many instances.
    Universality,
    /// Degree vs. backbone over growing n.
    Adversarial,
    /// Laplacian spectral gap vs. rigidity.
    Spectral,
}

impl Phase {
    /// Every phase in pipeline order.
    pub const ALL: [Phase; 13] = [
        Phase::MacroScan,
        Phase::Variance,
        Phase::Hysteresis,
        Phase::Autopsy,
        Phase::Scaling,
        Phase::Stress,
        Phase::Confirmation,
        Phase::Boundary,
        Phase::MillenniumSearch,
        Phase::Generalization,
        Phase::Universality,
        Phase::Adversarial,
        Phase::Spectral,
    ];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::MacroScan => "macro scan",
            Phase::Variance => "energy variance",
            Phase::Hysteresis => "hysteresis",
            Phase::Autopsy => "structural autopsy",
            Phase::Scaling => "scaling analysis",
            Phase::Stress => "stress test",
            Phase::Confirmation => "exponential confirmation",
            Phase::Boundary => "complexity boundary",
            Phase::MillenniumSearch => "millennium search",
            Phase::Generalization => "topological generalization",
            Phase::Universality => "universality",
            Phase::Adversarial => "adversarial scaling",
            Phase::Spectral => "spectral gap",
        }
    }
}

/// Result of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "result", rename_all = "snake_case")]
#[allow(clippy::large_enum_variant)]
pub enum PhaseReport {
    /// See [`Phase::MacroScan`].
    MacroScan(MacroScanResult),
    /// See [`Phase::Variance`].
    Variance(VarianceAnalysisResult),
    /// See [`Phase::Hysteresis`].
    Hysteresis(HysteresisResult),
    /// See [`Phase::Autopsy`].
    Autopsy(StructuralResult),
    /// See [`Phase::Scaling`].
    Scaling(ScalingResult),
    /// See [`Phase::Stress`].
    Stress(StressTestResult),
    /// See [`Phase::Confirmation`].
    Confirmation(ConfirmationResult),
    /// See [`Phase::Boundary`].
    Boundary(BoundaryMapResult),
    /// See [`Phase::MillenniumSearch`].
    MillenniumSearch(MillenniumSearchResult),
    /// See [`Phase::Generalization`].
    Generalization(GeneralizationResult),
    /// See [`Phase::Universality`].
    Universality(UniversalityResult),
    /// See [`Phase::Adversarial`].
    Adversarial(AdversarialResult),
    /// See [`Phase::Spectral`].
    Spectral(SpectralResult),
}

impl PhaseReport {
    /// The phase that produced this report.
    pub fn phase(&self) -> Phase {
        match self {
            PhaseReport::MacroScan(_) => Phase::MacroScan,
            PhaseReport::Variance(_) => Phase::Variance,
            PhaseReport::Hysteresis(_) => Phase::Hysteresis,
            PhaseReport::Autopsy(_) => Phase::Autopsy,
            PhaseReport::Scaling(_) => Phase::Scaling,
            PhaseReport::Stress(_) => Phase::Stress,
            PhaseReport::Confirmation(_) => Phase::Confirmation,
            PhaseReport::Boundary(_) => Phase::Boundary,
            PhaseReport::MillenniumSearch(_) => Phase::MillenniumSearch,
            PhaseReport::Generalization(_) => Phase::Generalization,
            PhaseReport::Universality(_) => Phase::Universality,
            PhaseReport::Adversarial(_) => Phase::Adversarial,
            PhaseReport::Spectral(_) => Phase::Spectral,
        }
    }

    /// One-line summary with the diagnosis.
    pub fn summary(&self) -> String {
        match self {
            PhaseReport::MacroScan(r) => format!(
                "peak cost {:.1} steps at alpha={:.2} (n={})",
                r.peak_avg_steps, r.peak_alpha, r.n
            ),
            PhaseReport::Variance(r) => format!(
                "{} (tail mean {:.2}, variance {:.3})",
                r.diagnosis.describe(),
                r.mean_energy,
                r.variance
            ),
            PhaseReport::Hysteresis(r) => format!(
                "{} (slow rate {}{})",
                r.diagnosis.describe(),
                r.slow.cooling_rate,
                if r.is_deep_scan { ", deep scan" } else { "" }
            ),
            PhaseReport::Autopsy(r) => r.explanation.clone(),
            PhaseReport::Scaling(r) => format!(
                "{} (exp R2 {:.4}, power R2 {:.4})",
                r.diagnosis.describe(),
                r.fit.exponential.r_squared,
                r.fit.power.r_squared
            ),
            PhaseReport::Stress(r) => format!(
                "{} (saturation {:.2})",
                r.diagnosis.describe(),
                r.saturation
            ),
            PhaseReport::Confirmation(r) => format!(
                "{} (b={:.4}, ~10^{:.1} steps at n={})",
                r.diagnosis.describe(),
                r.branching_factor,
                r.extrapolated_log10,
                r.target_n
            ),
            PhaseReport::Boundary(r) => format!(
                "peak b={:.4} at alpha={:.2} over {} points",
                r.peak_branching_factor,
                r.peak_alpha,
                r.points.len()
            ),
            PhaseReport::MillenniumSearch(r) => format!(
                "{} ({} fixed, b reduced {:.1}%)",
                r.diagnosis.describe(),
                r.backbone.len(),
                r.reduction_percent
            ),
            PhaseReport::Generalization(r) => format!(
                "{} (accuracy {:.2} over {} backbone variables)",
                r.diagnosis.describe(),
                r.accuracy,
                r.ground_truth.len()
            ),
            PhaseReport::Universality(r) => format!(
                "{} (mean accuracy {:.2}, consistent {:.2} of {} evaluated)",
                r.verdict.describe(),
                r.stats.mean,
                r.consistent_fraction,
                r.evaluated
            ),
            PhaseReport::Adversarial(r) => format!(
                "{} (slope {:.5} per variable)",
                r.verdict.describe(),
                r.trend.slope
            ),
            PhaseReport::Spectral(r) => format!(
                "{} (r={}, {} of {} instances)",
                r.verdict.describe(),
                r.correlation
                    .map_or_else(|| "n/a".to_string(), |c| format!("{c:.3}")),
                r.samples.len(),
                r.attempted
            ),
        }
    }
}
