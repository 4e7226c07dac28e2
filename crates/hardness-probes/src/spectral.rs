//! Spectral gap vs. backbone rigidity
//!
//! Each instance becomes its variable–clause incidence graph: one node per
//! variable, one per clause, and an edge wherever a variable occurs in a
//! clause. The edge remembers the literal's polarity but the Laplacian is
//! built from the unweighted graph. The spectral gap is the second-smallest
//! eigenvalue of the normalized Laplacian `L = I - D^-1/2 A D^-1/2`; it is
//! zero when the graph is disconnected.
//!
//! Rigidity is the exact backbone size over n. Unsatisfiable instances and
//! instances whose backbone did not resolve within the step limit are
//! skipped. The result is the Pearson correlation between gap and
//! rigidity over the remaining samples:
//!
//! | condition                       | verdict      |
//! |---------------------------------|--------------|
//! | fewer than 2 samples, no spread | insufficient |
//! | \|r\| > 0.5                     | significant  |
//! | otherwise                       | weak         |

use hardness_core::{exact_backbone, CancelToken, Formula};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::{ProbeError, Result};
use crate::instance::InstanceSpec;

/// |r| above which gap and rigidity are significantly correlated.
pub const SIGNIFICANT_CORRELATION: f64 = 0.5;

/// Seed of the power iteration's start vector.
const START_VECTOR_SEED: u64 = 0x5eed_f1ed;

/// Polarity with which a variable occurs in a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Only as a positive literal.
    Positive,
    /// Only as a negative literal.
    Negative,
    /// Both, in a tautological clause.
    Mixed,
}

impl Polarity {
    /// +1, -1, or 0 for mixed.
    pub fn sign(self) -> i8 {
        match self {
            Polarity::Positive => 1,
            Polarity::Negative => -1,
            Polarity::Mixed => 0,
        }
    }
}

/// Edge between variable `var` (1-based) and clause `clause` (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incidence {
    /// Variable.
    pub var: u32,
    /// Clause index.
    pub clause: usize,
    /// Literal polarity.
    pub polarity: Polarity,
}

/// Signed bipartite variable–clause graph.
///
/// Variable `v` is node `v - 1`, clause `c` is node `num_vars + c`.
#[derive(Debug, Clone, PartialEq)]
pub struct VcGraph {
    num_vars: usize,
    num_clauses: usize,
    edges: Vec<Incidence>,
    adjacency: Vec<Vec<usize>>,
}

impl VcGraph {
    /// Incidence graph of `formula`; repeated occurrences of a variable in
    /// one clause give a single edge.
    pub fn of(formula: &Formula) -> Self {
        let num_vars = formula.num_vars();
        let num_clauses = formula.num_clauses();
        let mut edges = Vec::new();
        let mut adjacency = vec![Vec::new(); num_vars + num_clauses];
        for (clause, c) in formula.clauses().iter().enumerate() {
            let first = edges.len();
            for lit in c.literals() {
                let polarity = if lit.is_positive() {
                    Polarity::Positive
                } else {
                    Polarity::Negative
                };
                match edges[first..]
                    .iter_mut()
                    .find(|e: &&mut Incidence| e.var == lit.var())
                {
                    Some(edge) if edge.polarity != polarity => edge.polarity = Polarity::Mixed,
                    Some(_) => {}
                    None => {
                        edges.push(Incidence {
                            var: lit.var(),
                            clause,
                            polarity,
                        });
                        let var_node = lit.var() as usize - 1;
                        adjacency[var_node].push(num_vars + clause);
                        adjacency[num_vars + clause].push(var_node);
                    }
                }
            }
        }
        Self {
            num_vars,
            num_clauses,
            edges,
            adjacency,
        }
    }

    /// Variable plus clause nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_vars + self.num_clauses
    }

    /// Every edge, grouped by clause.
    pub fn edges(&self) -> &[Incidence] {
        &self.edges
    }

    /// Node degrees.
    pub fn degrees(&self) -> Vec<usize> {
        self.adjacency.iter().map(Vec::len).collect()
    }

    /// `(2I - L) x` for the normalized Laplacian `L`. Isolated nodes have a
    /// zero Laplacian row.
    fn shifted_apply(&self, inv_sqrt_degree: &Array1<f64>, x: &Array1<f64>) -> Array1<f64> {
        let scaled = inv_sqrt_degree * x;
        self.adjacency
            .iter()
            .enumerate()
            .map(|(i, neighbours)| {
                if neighbours.is_empty() {
                    return 2.0 * x[i];
                }
                let spread: f64 = neighbours.iter().map(|&j| scaled[j]).sum();
                x[i] + inv_sqrt_degree[i] * spread
            })
            .collect()
    }
}

/// Power-iteration settings for [`spectral_gap`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapSolver {
    /// Iteration cap.
    pub max_iterations: usize,
    /// Stop once the eigen-residual norm falls below this.
    pub tolerance: f64,
}

impl Default for GapSolver {
    fn default() -> Self {
        Self {
            max_iterations: 20_000,
            tolerance: 1e-7,
        }
    }
}

/// Estimated spectral gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralGap {
    /// Second-smallest eigenvalue of the normalized Laplacian.
    pub value: f64,
    /// Iterations spent.
    pub iterations: usize,
    /// Whether the residual reached the tolerance.
    pub converged: bool,
}

fn norm(a: &Array1<f64>) -> f64 {
    a.dot(a).sqrt()
}

/// Remove the component along the unit vector `unit`.
fn deflate(x: &mut Array1<f64>, unit: &Array1<f64>) {
    let along = x.dot(unit);
    x.scaled_add(-along, unit);
}

/// Spectral gap of the normalized Laplacian of `graph`.
///
/// Power iteration on `2I - L`, whose spectrum lies in [0, 2], kept
/// orthogonal to the trivial eigenvector `D^1/2 1`. The dominant
/// eigenvalue θ left after deflation gives the gap `2 - θ`.
pub fn spectral_gap(graph: &VcGraph, solver: &GapSolver) -> Result<SpectralGap> {
    if solver.max_iterations == 0 || solver.tolerance.is_nan() || solver.tolerance <= 0.0 {
        return Err(ProbeError::InvalidParameter(format!(
            "gap solver needs iterations and a positive tolerance, got {} and {}",
            solver.max_iterations, solver.tolerance
        )));
    }
    let nodes = graph.num_nodes();
    if nodes < 2 {
        return Err(ProbeError::InvalidParameter(format!(
            "spectral gap needs at least 2 nodes, got {nodes}"
        )));
    }

    let degrees: Array1<f64> = graph.degrees().into_iter().map(|d| d as f64).collect();
    let inv_sqrt_degree = degrees.mapv(|d| if d == 0.0 { 0.0 } else { 1.0 / d.sqrt() });
    let mut trivial = degrees.mapv(f64::sqrt);
    let trivial_norm = norm(&trivial);
    if trivial_norm > 0.0 {
        trivial /= trivial_norm;
    }

    let mut rng = StdRng::seed_from_u64(START_VECTOR_SEED);
    let mut x: Array1<f64> = (0..nodes).map(|_| rng.random_range(-1.0..1.0)).collect();
    deflate(&mut x, &trivial);
    let start_norm = norm(&x);
    if start_norm <= f64::EPSILON {
        return Err(ProbeError::InvalidParameter(
            "start vector vanished after deflation".to_string(),
        ));
    }
    x /= start_norm;

    let mut theta = 0.0;
    for iteration in 1..=solver.max_iterations {
        let mut y = graph.shifted_apply(&inv_sqrt_degree, &x);
        deflate(&mut y, &trivial);
        theta = x.dot(&y);
        let residual = norm(&(&y - &(theta * &x)));
        let y_norm = norm(&y);
        if residual <= solver.tolerance || y_norm <= f64::EPSILON {
            // a vanishing image means the rest of the spectrum is all 2
            let value = if y_norm <= f64::EPSILON { 2.0 } else { 2.0 - theta };
            trace!("spectral gap {} after {} iterations", value, iteration);
            return Ok(SpectralGap {
                value: value.clamp(0.0, 2.0),
                iterations: iteration,
                converged: true,
            });
        }
        x = y / y_norm;
    }
    debug!(
        "spectral gap did not converge in {} iterations",
        solver.max_iterations
    );
    Ok(SpectralGap {
        value: (2.0 - theta).clamp(0.0, 2.0),
        iterations: solver.max_iterations,
        converged: false,
    })
}

/// Pearson correlation of paired series; `None` with fewer than two pairs
/// or when either series is constant.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let len = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / len;
    let mean_y = ys.iter().sum::<f64>() / len;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Strength of the gap–rigidity relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpectralVerdict {
    /// The gap tracks rigidity.
    Significant,
    /// Little linear relation.
    Weak,
    /// Too few samples, or no spread, to correlate.
    Insufficient,
}

impl SpectralVerdict {
    /// Human-readable summary.
    pub fn describe(&self) -> &'static str {
        match self {
            SpectralVerdict::Significant => {
                "significant: the spectral gap tracks backbone rigidity"
            }
            SpectralVerdict::Weak => "weak: the spectral gap says little about rigidity",
            SpectralVerdict::Insufficient => "insufficient: not enough samples to correlate",
        }
    }
}

/// Parameters of [`spectral_correlation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Base seed; instance `i` uses the `i`-th derived seed.
    pub seed: u64,
    /// Instances generated.
    pub samples: usize,
    /// Step ceiling of each exact search during backbone extraction.
    pub step_limit: u64,
    /// Eigenvalue solver.
    pub solver: GapSolver,
    /// Significance threshold on |r|.
    pub significant_correlation: f64,
    /// Evaluate instances on the rayon pool.
    pub parallel: bool,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            n: 40,
            alpha: 4.26,
            seed: 0,
            samples: 10,
            step_limit: 1_000_000,
            solver: GapSolver::default(),
            significant_correlation: SIGNIFICANT_CORRELATION,
            parallel: true,
        }
    }
}

impl SpectralConfig {
    /// Default settings at the given point.
    pub fn at(n: usize, alpha: f64, seed: u64) -> Self {
        Self {
            n,
            alpha,
            seed,
            ..Self::default()
        }
    }
}

/// One evaluated instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralSample {
    /// Index of the instance among the generated samples.
    pub index: usize,
    /// Backbone size over n.
    pub rigidity: f64,
    /// Spectral gap of its incidence graph.
    pub gap: SpectralGap,
}

/// Outcome of [`spectral_correlation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralResult {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Instances generated.
    pub attempted: usize,
    /// Satisfiable instances with a fully resolved backbone.
    pub samples: Vec<SpectralSample>,
    /// Pearson r between rigidity and gap.
    pub correlation: Option<f64>,
    /// Verdict.
    pub verdict: SpectralVerdict,
}

/// Classify a correlation coefficient.
pub fn verdict(correlation: Option<f64>, config: &SpectralConfig) -> SpectralVerdict {
    match correlation {
        None => SpectralVerdict::Insufficient,
        Some(r) if r.abs() > config.significant_correlation => SpectralVerdict::Significant,
        Some(_) => SpectralVerdict::Weak,
    }
}

fn evaluate(
    index: usize,
    spec: &InstanceSpec,
    config: &SpectralConfig,
    cancel: Option<&CancelToken>,
) -> Result<Option<SpectralSample>> {
    let formula = spec.generate()?;
    let report = exact_backbone(&formula, config.step_limit, cancel)?;
    if report.satisfiable != Some(true) || !report.undetermined().is_empty() {
        trace!(
            "spectral sample {} skipped (satisfiable {:?})",
            index,
            report.satisfiable
        );
        return Ok(None);
    }
    let gap = spectral_gap(&VcGraph::of(&formula), &config.solver)?;
    Ok(Some(SpectralSample {
        index,
        rigidity: report.frozen().len() as f64 / config.n as f64,
        gap,
    }))
}

/// Correlate spectral gap with backbone rigidity over `config.samples`
/// instances at (n, α).
pub fn spectral_correlation(
    config: &SpectralConfig,
    cancel: Option<&CancelToken>,
) -> Result<SpectralResult> {
    if config.samples == 0 {
        return Err(ProbeError::InvalidParameter(
            "spectral correlation needs at least one sample".to_string(),
        ));
    }
    debug!(
        "spectral: n={}, alpha={}, {} samples",
        config.n, config.alpha, config.samples
    );

    let origin = InstanceSpec::new(config.n, config.alpha, config.seed);
    let run = |i: usize| evaluate(i, &origin.nth(i as u64), config, cancel);
    let evaluated: Vec<Option<SpectralSample>> = if config.parallel {
        (0..config.samples).into_par_iter().map(run).collect::<Result<_>>()?
    } else {
        (0..config.samples).map(run).collect::<Result<_>>()?
    };
    let samples: Vec<SpectralSample> = evaluated.into_iter().flatten().collect();

    let rigidities: Vec<f64> = samples.iter().map(|s| s.rigidity).collect();
    let gaps: Vec<f64> = samples.iter().map(|s| s.gap.value).collect();
    let correlation = pearson_correlation(&rigidities, &gaps);
    let verdict = verdict(correlation, config);
    info!(
        "spectral: {} of {} evaluated, r={:?} -> {:?}",
        samples.len(),
        config.samples,
        correlation,
        verdict
    );

    Ok(SpectralResult {
        n: config.n,
        alpha: config.alpha,
        attempted: config.samples,
        samples,
        correlation,
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hardness_core::parse_dimacs as parse_str;

    fn gap_of(dimacs: &str) -> f64 {
        let formula = parse_str(dimacs).unwrap();
        let gap = spectral_gap(&VcGraph::of(&formula), &GapSolver::default()).unwrap();
        assert!(gap.converged);
        gap.value
    }

    #[test]
    fn test_graph_records_polarity() {
        let formula = parse_str("p cnf 3 2\n1 -2 0\n2 3 -3 0\n").unwrap();
        let graph = VcGraph::of(&formula);
        assert_eq!(graph.num_nodes(), 5);
        let signs: Vec<(u32, usize, i8)> = graph
            .edges()
            .iter()
            .map(|e| (e.var, e.clause, e.polarity.sign()))
            .collect();
        assert_eq!(signs, vec![(1, 0, 1), (2, 0, -1), (2, 1, 1), (3, 1, 0)]);
        assert_eq!(graph.degrees(), vec![1, 2, 1, 2, 2]);
    }

    #[test]
    fn test_path_gap() {
        // c0 - v1 - c1 - v2 is a 4-node path: eigenvalues 0, 1/2, 3/2, 2
        assert_relative_eq!(gap_of("p cnf 2 2\n1 0\n1 2 0\n"), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_cycle_gap() {
        // K(2,2) is the 4-cycle: eigenvalues 0, 1, 1, 2
        assert_relative_eq!(gap_of("p cnf 2 2\n1 2 0\n-1 2 0\n"), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_single_edge_gap() {
        assert_relative_eq!(gap_of("p cnf 1 1\n1 0\n"), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_disconnected_graph_has_no_gap() {
        assert_relative_eq!(gap_of("p cnf 3 1\n1 2 0\n"), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(
            pearson_correlation(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap(),
            1.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            pearson_correlation(&xs, &[4.0, 3.0, 2.0, 1.0]).unwrap(),
            -1.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            pearson_correlation(&xs, &[1.0, 3.0, 2.0, 4.0]).unwrap(),
            0.8,
            epsilon = 1e-12
        );
        assert_eq!(pearson_correlation(&xs, &[1.0; 4]), None);
        assert_eq!(pearson_correlation(&[1.0], &[1.0]), None);
        assert_eq!(pearson_correlation(&xs, &[1.0, 2.0]), None);
    }

    #[test]
    fn test_verdict_tiers() {
        let config = SpectralConfig::default();
        assert_eq!(verdict(Some(-0.7), &config), SpectralVerdict::Significant);
        assert_eq!(verdict(Some(0.3), &config), SpectralVerdict::Weak);
        assert_eq!(verdict(None, &config), SpectralVerdict::Insufficient);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut config = SpectralConfig::at(16, 4.26, 5);
        config.samples = 5;
        config.parallel = false;
        let sequential = spectral_correlation(&config, None).unwrap();
        config.parallel = true;
        let parallel = spectral_correlation(&config, None).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.attempted, 5);
        for sample in &sequential.samples {
            assert!((0.0..=1.0).contains(&sample.rigidity));
            assert!((0.0..=2.0).contains(&sample.gap.value));
        }
        assert_eq!(sequential.verdict, verdict(sequential.correlation, &config));
    }

    #[test]
    fn test_cancelled_run_fails() {
        let token = CancelToken::new();
        token.cancel();
        let config = SpectralConfig {
            parallel: false,
            ..SpectralConfig::at(16, 4.26, 5)
        };
        assert!(matches!(
            spectral_correlation(&config, Some(&token)),
            Err(ProbeError::Core(hardness_core::Error::Cancelled))
        ));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let config = SpectralConfig {
            samples: 0,
            ..SpectralConfig::default()
        };
        assert!(spectral_correlation(&config, None).is_err());
        let formula = parse_str("p cnf 2 1\n1 2 0\n").unwrap();
        let solver = GapSolver {
            max_iterations: 0,
            ..GapSolver::default()
        };
        assert!(spectral_gap(&VcGraph::of(&formula), &solver).is_err());
    }
}
