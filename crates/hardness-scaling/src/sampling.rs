//! Average exact-search cost at one (n, α) point

use hardness_core::{branching_factor, derive_seed, generate_with_alpha, CancelToken, DpllSolver};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, ScalingError};

/// Cost statistics of DPLL over independent instances at one (n, α).
///
/// Budget-exhausted runs contribute the full ceiling to `avg_steps`, so
/// the average is a lower bound whenever `inconclusive > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSample {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Instances solved.
    pub samples: usize,
    /// Step ceiling per instance.
    pub step_limit: u64,
    /// Mean steps.
    pub avg_steps: f64,
    /// Largest step count.
    pub max_steps: u64,
    /// Instances with a model.
    pub satisfiable: usize,
    /// Instances proved unsatisfiable.
    pub unsatisfiable: usize,
    /// Instances that hit the ceiling.
    pub inconclusive: usize,
}

impl CostSample {
    /// Fraction of instances with a model, in [0, 1].
    pub fn sat_ratio(&self) -> f64 {
        ratio(self.satisfiable, self.samples)
    }

    /// Fraction of instances that hit the ceiling, in [0, 1].
    pub fn inconclusive_ratio(&self) -> f64 {
        ratio(self.inconclusive, self.samples)
    }

    /// Effective branching factor b = avg_steps^(1/n).
    pub fn branching_factor(&self) -> f64 {
        branching_factor(self.avg_steps, self.n)
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Solve `samples` fresh instances at (n, α); instance `i` is generated
/// from `derive_seed(seed, i)`.
pub fn measure_cost(
    n: usize,
    alpha: f64,
    samples: usize,
    step_limit: u64,
    seed: u64,
    cancel: Option<&CancelToken>,
) -> Result<CostSample> {
    if samples == 0 {
        return Err(ScalingError::InvalidParameter(
            "at least one sample per point is required".to_string(),
        ));
    }

    let mut solver = DpllSolver::new(step_limit);
    if let Some(token) = cancel {
        solver = solver.with_cancel(token.clone());
    }

    let mut total_steps = 0u64;
    let mut max_steps = 0u64;
    let mut satisfiable = 0;
    let mut unsatisfiable = 0;
    let mut inconclusive = 0;

    for i in 0..samples {
        let mut rng = StdRng::seed_from_u64(derive_seed(seed, i as u64));
        let formula = generate_with_alpha(n, alpha, &mut rng)?;
        let result = solver.solve(&formula);
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(hardness_core::Error::Cancelled.into());
        }

        total_steps += result.steps;
        max_steps = max_steps.max(result.steps);
        if result.is_satisfiable() {
            satisfiable += 1;
        } else if result.is_unsatisfiable() {
            unsatisfiable += 1;
        } else {
            inconclusive += 1;
        }
    }

    let sample = CostSample {
        n,
        alpha,
        samples,
        step_limit,
        avg_steps: total_steps as f64 / samples as f64,
        max_steps,
        satisfiable,
        unsatisfiable,
        inconclusive,
    };
    trace!(
        "cost n={} alpha={:.3}: avg {:.1} steps, sat {:.2}, inconclusive {}",
        n,
        alpha,
        sample.avg_steps,
        sample.sat_ratio(),
        inconclusive
    );
    Ok(sample)
}

/// Escalating DPLL step ceilings for a size series: the i-th size gets
/// `min(base * growth^i, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepBudget {
    /// Ceiling for the smallest size.
    pub base: u64,
    /// Multiplier per size.
    pub growth: f64,
    /// Hard cap.
    pub max: u64,
}

impl StepBudget {
    /// Budget that starts at `base` and doubles per size up to `max`.
    pub fn doubling(base: u64, max: u64) -> Self {
        Self {
            base,
            growth: 2.0,
            max,
        }
    }

    /// Ceiling for the size at `index`.
    pub fn limit_for(&self, index: usize) -> u64 {
        let scaled = self.base as f64 * self.growth.powi(index.min(i32::MAX as usize) as i32);
        if !scaled.is_finite() || scaled >= self.max as f64 {
            self.max
        } else {
            (scaled as u64).max(1)
        }
    }
}

/// [`measure_cost`] for each n in `sizes` at a fixed α, with the ceiling
/// escalating per [`StepBudget`].
pub(crate) fn sweep_sizes(
    alpha: f64,
    sizes: &[usize],
    samples: usize,
    budget: &StepBudget,
    seed: u64,
    parallel: bool,
    cancel: Option<&CancelToken>,
) -> Result<Vec<CostSample>> {
    let measure = |(point, &n): (usize, &usize)| {
        measure_cost(n, alpha, samples, budget.limit_for(point), point_seed(seed, point), cancel)
    };
    if parallel {
        sizes.par_iter().enumerate().map(measure).collect()
    } else {
        sizes.iter().enumerate().map(measure).collect()
    }
}

/// (n, avg_steps) pairs ready for [`crate::regression::compare_models`].
pub(crate) fn cost_curve(samples: &[CostSample]) -> Vec<(f64, f64)> {
    samples.iter().map(|s| (s.n as f64, s.avg_steps)).collect()
}

/// Seed for the `point`-th point of a sweep; samples inside the point
/// are then derived from it.
pub fn point_seed(base: u64, point: usize) -> u64 {
    derive_seed(base, (point as u64) << 32)
}

/// α values from `min` to `max` inclusive in increments of `step`.
pub fn alpha_grid(min: f64, max: f64, step: f64) -> Result<Vec<f64>> {
    let valid = step > 0.0 && min >= 0.0 && max >= min;
    if !valid {
        return Err(ScalingError::InvalidParameter(format!(
            "bad alpha range [{min}, {max}] step {step}"
        )));
    }
    let count = ((max - min) / step + 1e-9).floor() as usize;
    Ok((0..=count).map(|i| min + i as f64 * step).collect())
}

/// [`measure_cost`] at every α in `alphas` with a fixed n.
pub(crate) fn sweep_alphas(
    n: usize,
    alphas: &[f64],
    samples: usize,
    step_limit: u64,
    seed: u64,
    parallel: bool,
    cancel: Option<&CancelToken>,
) -> Result<Vec<CostSample>> {
    let measure = |(point, &alpha): (usize, &f64)| {
        measure_cost(n, alpha, samples, step_limit, point_seed(seed, point), cancel)
    };
    if parallel {
        alphas.par_iter().enumerate().map(measure).collect()
    } else {
        alphas.iter().enumerate().map(measure).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_partition_samples() {
        let sample = measure_cost(12, 4.26, 20, 10_000, 5, None).unwrap();
        assert_eq!(
            sample.satisfiable + sample.unsatisfiable + sample.inconclusive,
            20
        );
        assert!((0.0..=1.0).contains(&sample.sat_ratio()));
        assert!(sample.avg_steps >= 1.0);
        assert!(sample.max_steps as f64 >= sample.avg_steps);
    }

    #[test]
    fn test_tiny_ceiling_is_inconclusive() {
        let sample = measure_cost(30, 4.26, 5, 1, 9, None).unwrap();
        assert_eq!(sample.inconclusive, 5);
        assert_eq!(sample.avg_steps, 1.0);
    }

    #[test]
    fn test_same_seed_same_sample() {
        let a = measure_cost(15, 4.0, 8, 5_000, 3, None).unwrap();
        let b = measure_cost(15, 4.0, 8, 5_000, 3, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_alpha_grid_inclusive() {
        let grid = alpha_grid(3.0, 6.0, 0.25).unwrap();
        assert_eq!(grid.len(), 13);
        assert!((grid[12] - 6.0).abs() < 1e-9);
        assert!(alpha_grid(3.0, 2.0, 0.5).is_err());
        assert!(alpha_grid(3.0, 4.0, 0.0).is_err());
    }

    #[test]
    fn test_parallel_sweep_matches_sequential() {
        let alphas = [3.0, 4.0, 5.0];
        let seq = sweep_alphas(12, &alphas, 6, 10_000, 11, false, None).unwrap();
        let par = sweep_alphas(12, &alphas, 6, 10_000, 11, true, None).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_step_budget_escalates_and_caps() {
        let budget = StepBudget::doubling(1_000, 5_000);
        assert_eq!(budget.limit_for(0), 1_000);
        assert_eq!(budget.limit_for(1), 2_000);
        assert_eq!(budget.limit_for(2), 4_000);
        assert_eq!(budget.limit_for(3), 5_000);
        assert_eq!(budget.limit_for(60), 5_000);
    }

    #[test]
    fn test_zero_samples_rejected() {
        assert!(matches!(
            measure_cost(10, 3.0, 0, 100, 0, None),
            Err(ScalingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            measure_cost(10, 3.0, 3, 100, 0, Some(&token)),
            Err(ScalingError::Core(hardness_core::Error::Cancelled))
        ));
    }
}
