//! Topological-generalization test
//!
//! Can a cheap structural statistic predict the backbone? The ground truth
//! is a set T of backbone variables, by default the variables an anneal
//! barely moved. The prediction P takes the |T| variables of highest
//! degree (occurrences in the formula, ties to the lower index).
//! Accuracy = |P ∩ T| / |T|.
//!
//! | accuracy     | diagnosis              |
//! |--------------|------------------------|
//! | > 0.70       | leak detected          |
//! | 0.40 to 0.70 | weak correlation       |
//! | < 0.40       | cryptographic backbone |
//! | T empty      | no backbone            |

use hardness_core::{anneal, exact_backbone, AnnealConfig, CancelToken, Formula};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::autopsy::FROZEN_FLIP_FRACTION;
use crate::error::Result;
use crate::instance::InstanceSpec;

/// Accuracy above which structure leaks the backbone.
pub const LEAK_ACCURACY: f64 = 0.70;
/// Accuracy at or above which the correlation is weak rather than absent.
pub const WEAK_ACCURACY: f64 = 0.40;

/// How the ground-truth backbone is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BackboneSource {
    /// Variables flipped at most `frozen_fraction` × steps times in one
    /// anneal.
    Annealing {
        /// Anneal schedule.
        anneal: AnnealConfig,
        /// Frozen flip fraction.
        frozen_fraction: f64,
    },
    /// The exact backbone by refutation. Unsatisfiable or out-of-budget
    /// instances have none.
    Exact {
        /// DPLL ceiling per refutation.
        step_limit: u64,
    },
}

impl Default for BackboneSource {
    fn default() -> Self {
        BackboneSource::Annealing {
            anneal: AnnealConfig::slow(5_000),
            frozen_fraction: FROZEN_FLIP_FRACTION,
        }
    }
}

/// Backbone variables from a [`BackboneSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruth {
    /// Backbone variables, ascending.
    pub backbone: Vec<u32>,
    /// Variables the exact refutation ran out of budget on, ascending.
    /// Always empty for the annealing source.
    pub undetermined: Vec<u32>,
}

impl BackboneSource {
    /// Ground-truth backbone of `formula`.
    pub fn backbone<R: Rng + ?Sized>(
        &self,
        formula: &Formula,
        rng: &mut R,
        cancel: Option<&CancelToken>,
    ) -> Result<GroundTruth> {
        match self {
            BackboneSource::Annealing {
                anneal: schedule,
                frozen_fraction,
            } => {
                let run = anneal(formula, schedule, rng, cancel)?;
                Ok(GroundTruth {
                    backbone: run.frozen_variables(*frozen_fraction),
                    undetermined: Vec::new(),
                })
            }
            BackboneSource::Exact { step_limit } => {
                let report = exact_backbone(formula, *step_limit, cancel)?;
                Ok(GroundTruth {
                    backbone: report.frozen().into_iter().map(|(var, _)| var).collect(),
                    undetermined: report.undetermined(),
                })
            }
        }
    }
}

/// How well structure predicts the backbone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneralizationDiagnosis {
    /// Degree predicts most of the backbone.
    LeakDetected,
    /// Degree predicts part of the backbone.
    WeakCorrelation,
    /// Degree says little about the backbone.
    CryptographicBackbone,
    /// There is no backbone to predict.
    NoBackbone,
}

impl GeneralizationDiagnosis {
    /// Classify an accuracy.
    pub fn from_accuracy(accuracy: f64, leak: f64, weak: f64) -> Self {
        if accuracy > leak {
            GeneralizationDiagnosis::LeakDetected
        } else if accuracy >= weak {
            GeneralizationDiagnosis::WeakCorrelation
        } else {
            GeneralizationDiagnosis::CryptographicBackbone
        }
    }

    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            GeneralizationDiagnosis::LeakDetected => {
                "leak detected: variable degree predicts the backbone"
            }
            GeneralizationDiagnosis::WeakCorrelation => {
                "weak correlation: degree predicts part of the backbone"
            }
            GeneralizationDiagnosis::CryptographicBackbone => {
                "cryptographic backbone: structure does not reveal the frozen variables"
            }
            GeneralizationDiagnosis::NoBackbone => "no backbone: nothing to predict",
        }
    }
}

/// Parameters of [`generalization_test`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralizationConfig {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Instance seed.
    pub seed: u64,
    /// Ground truth.
    pub ground_truth: BackboneSource,
    /// Leak threshold.
    pub leak_accuracy: f64,
    /// Weak-correlation threshold.
    pub weak_accuracy: f64,
}

impl Default for GeneralizationConfig {
    fn default() -> Self {
        Self {
            n: 50,
            alpha: 4.26,
            seed: 0,
            ground_truth: BackboneSource::default(),
            leak_accuracy: LEAK_ACCURACY,
            weak_accuracy: WEAK_ACCURACY,
        }
    }
}

impl GeneralizationConfig {
    /// Default probe at the given point.
    pub fn at(n: usize, alpha: f64, seed: u64) -> Self {
        Self {
            n,
            alpha,
            seed,
            ..Self::default()
        }
    }

    /// Same probe against the exact backbone.
    pub fn exact(self, step_limit: u64) -> Self {
        Self {
            ground_truth: BackboneSource::Exact { step_limit },
            ..self
        }
    }

    /// Same parameters on a different instance.
    pub fn with_instance(&self, n: usize, seed: u64) -> Self {
        Self {
            n,
            seed,
            ..self.clone()
        }
    }
}

/// Outcome of [`generalization_test`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralizationResult {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Ground-truth backbone, ascending.
    pub ground_truth: Vec<u32>,
    /// Variables the exact ground truth could not classify.
    pub undetermined: usize,
    /// Highest-degree variables, same size as the ground truth.
    pub predicted: Vec<u32>,
    /// |predicted ∩ ground_truth|.
    pub overlap: usize,
    /// overlap / |ground_truth|; 0 when there is no backbone.
    pub accuracy: f64,
    /// Verdict.
    pub diagnosis: GeneralizationDiagnosis,
}

/// The `k` variables of highest degree, ascending; ties go to the lower
/// index.
pub fn predict_backbone(formula: &Formula, k: usize) -> Vec<u32> {
    let degrees = formula.variable_degrees();
    let mut ranked: Vec<u32> = (1..=degrees.len() as u32).collect();
    ranked.sort_by(|&a, &b| degrees[b as usize - 1].cmp(&degrees[a as usize - 1]).then(a.cmp(&b)));
    ranked.truncate(k);
    ranked.sort_unstable();
    ranked
}

/// Fraction of `truth` that `predicted` contains, with the raw overlap.
pub fn overlap_accuracy(predicted: &[u32], truth: &[u32]) -> (usize, f64) {
    if truth.is_empty() {
        return (0, 0.0);
    }
    let overlap = predicted.iter().filter(|v| truth.contains(*v)).count();
    (overlap, overlap as f64 / truth.len() as f64)
}

/// Run the test on the instance described by `spec`, with the thresholds of `config`.
pub(crate) fn evaluate(
    spec: &InstanceSpec,
    config: &GeneralizationConfig,
    cancel: Option<&CancelToken>,
) -> Result<GeneralizationResult> {
    let formula = spec.generate()?;
    let GroundTruth {
        backbone: ground_truth,
        undetermined,
    } = config
        .ground_truth
        .backbone(&formula, &mut spec.search_rng(0), cancel)?;
    if !undetermined.is_empty() {
        debug!(
            "generalization n={} seed={}: {} variables undetermined",
            spec.n,
            spec.seed,
            undetermined.len()
        );
    }
    let predicted = predict_backbone(&formula, ground_truth.len());
    let (overlap, accuracy) = overlap_accuracy(&predicted, &ground_truth);
    let diagnosis = if ground_truth.is_empty() {
        GeneralizationDiagnosis::NoBackbone
    } else {
        GeneralizationDiagnosis::from_accuracy(accuracy, config.leak_accuracy, config.weak_accuracy)
    };
    trace!(
        "generalization n={} seed={}: {}/{} -> {:?}",
        spec.n,
        spec.seed,
        overlap,
        ground_truth.len(),
        diagnosis
    );

    Ok(GeneralizationResult {
        n: spec.n,
        alpha: spec.alpha,
        ground_truth,
        undetermined: undetermined.len(),
        predicted,
        overlap,
        accuracy,
        diagnosis,
    })
}

/// Run the topological-generalization test.
pub fn generalization_test(
    config: &GeneralizationConfig,
    cancel: Option<&CancelToken>,
) -> Result<GeneralizationResult> {
    let spec = InstanceSpec::new(config.n, config.alpha, config.seed);
    let result = evaluate(&spec, config, cancel)?;
    debug!(
        "generalization: n={}, alpha={}, backbone {} vars, accuracy {:.2} -> {:?}",
        config.n,
        config.alpha,
        result.ground_truth.len(),
        result.accuracy,
        result.diagnosis
    );
    Ok(result)
}
