//! Complexity boundary map
//!
//! Sweeps α at fixed n and computes the effective branching factor
//! b = avg_steps^(1/n) at each point. Points are tagged by b:
//!
//! | zone   | b                              |
//! |--------|--------------------------------|
//! | green  | b < [`GREEN_ZONE_CEILING`]     |
//! | yellow | b < [`YELLOW_ZONE_CEILING`]    |
//! | red    | otherwise                      |
//!
//! The ceilings are calibrated for n ≈ 30; b shrinks slowly as n grows, so
//! larger sweeps should raise them through [`BoundaryConfig`].

use hardness_core::CancelToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScalingError};
use crate::sampling::{alpha_grid, sweep_alphas, CostSample};

/// Upper bound (exclusive) of b in the green zone.
pub const GREEN_ZONE_CEILING: f64 = 1.13;

/// Upper bound (exclusive) of b in the yellow zone.
pub const YELLOW_ZONE_CEILING: f64 = 1.17;

/// Hardness zone of one α point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    /// Search is cheap.
    Green,
    /// Cost is rising.
    Yellow,
    /// Near the transition; search is exponentially expensive.
    Red,
}

impl Zone {
    /// Zone of branching factor `b` under the given ceilings.
    pub fn classify(b: f64, green_ceiling: f64, yellow_ceiling: f64) -> Zone {
        if b < green_ceiling {
            Zone::Green
        } else if b < yellow_ceiling {
            Zone::Yellow
        } else {
            Zone::Red
        }
    }
}

/// Parameters of [`map_boundary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Number of variables.
    pub n: usize,
    /// Smallest α.
    pub alpha_min: f64,
    /// Largest α.
    pub alpha_max: f64,
    /// α increment.
    pub alpha_step: f64,
    /// Instances per α.
    pub samples_per_alpha: usize,
    /// DPLL step ceiling per instance.
    pub step_limit: u64,
    /// Green/yellow split.
    pub green_ceiling: f64,
    /// Yellow/red split.
    pub yellow_ceiling: f64,
    /// Base seed.
    pub seed: u64,
    /// Sweep on the rayon pool.
    pub parallel: bool,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            n: 30,
            alpha_min: 3.0,
            alpha_max: 6.0,
            alpha_step: 0.25,
            samples_per_alpha: 10,
            step_limit: 500_000,
            green_ceiling: GREEN_ZONE_CEILING,
            yellow_ceiling: YELLOW_ZONE_CEILING,
            seed: 2024,
            parallel: true,
        }
    }
}

/// One α point of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPoint {
    /// Clause ratio.
    pub alpha: f64,
    /// Mean DPLL steps.
    pub avg_steps: f64,
    /// avg_steps^(1/n).
    pub branching_factor: f64,
    /// Fraction satisfiable.
    pub sat_ratio: f64,
    /// Tag by `branching_factor`.
    pub zone: Zone,
}

impl BoundaryPoint {
    fn from_sample(sample: &CostSample, config: &BoundaryConfig) -> Self {
        let branching_factor = sample.branching_factor();
        BoundaryPoint {
            alpha: sample.alpha,
            avg_steps: sample.avg_steps,
            branching_factor,
            sat_ratio: sample.sat_ratio(),
            zone: Zone::classify(branching_factor, config.green_ceiling, config.yellow_ceiling),
        }
    }
}

/// The tagged sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryMapResult {
    /// Number of variables.
    pub n: usize,
    /// One point per α, ascending.
    pub points: Vec<BoundaryPoint>,
    /// α of the highest b (first one on ties).
    pub peak_alpha: f64,
    /// Highest b.
    pub peak_branching_factor: f64,
}

impl BoundaryMapResult {
    /// Points in `zone`.
    pub fn count(&self, zone: Zone) -> usize {
        self.points.iter().filter(|p| p.zone == zone).count()
    }
}

/// Sweep α, compute b and tag zones.
pub fn map_boundary(config: &BoundaryConfig, cancel: Option<&CancelToken>) -> Result<BoundaryMapResult> {
    let ordered = config.green_ceiling <= config.yellow_ceiling;
    if !ordered {
        return Err(ScalingError::InvalidParameter(format!(
            "green ceiling {} above yellow ceiling {}",
            config.green_ceiling, config.yellow_ceiling
        )));
    }
    let alphas = alpha_grid(config.alpha_min, config.alpha_max, config.alpha_step)?;
    debug!(
        "boundary map: n={}, {} alpha values in [{}, {}]",
        config.n,
        alphas.len(),
        config.alpha_min,
        config.alpha_max
    );

    let samples = sweep_alphas(
        config.n,
        &alphas,
        config.samples_per_alpha,
        config.step_limit,
        config.seed,
        config.parallel,
        cancel,
    )?;
    let points: Vec<BoundaryPoint> = samples
        .iter()
        .map(|s| BoundaryPoint::from_sample(s, config))
        .collect();

    let (peak_alpha, peak_branching_factor) = points
        .iter()
        .fold(None::<(f64, f64)>, |best, p| match best {
            Some((_, b)) if b >= p.branching_factor => best,
            _ => Some((p.alpha, p.branching_factor)),
        })
        .ok_or_else(|| ScalingError::InvalidParameter("empty alpha range".to_string()))?;

    let result = BoundaryMapResult {
        n: config.n,
        points,
        peak_alpha,
        peak_branching_factor,
    };
    info!(
        "boundary: peak b={:.4} at alpha={:.2} ({} green, {} yellow, {} red)",
        peak_branching_factor,
        peak_alpha,
        result.count(Zone::Green),
        result.count(Zone::Yellow),
        result.count(Zone::Red)
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_thresholds() {
        assert_eq!(Zone::classify(1.0, GREEN_ZONE_CEILING, YELLOW_ZONE_CEILING), Zone::Green);
        assert_eq!(Zone::classify(1.13, GREEN_ZONE_CEILING, YELLOW_ZONE_CEILING), Zone::Yellow);
        assert_eq!(Zone::classify(1.169, GREEN_ZONE_CEILING, YELLOW_ZONE_CEILING), Zone::Yellow);
        assert_eq!(Zone::classify(1.17, GREEN_ZONE_CEILING, YELLOW_ZONE_CEILING), Zone::Red);
        assert_eq!(Zone::classify(1.12, 1.0, 1.1), Zone::Red);
    }

    #[test]
    fn test_inverted_ceilings_rejected() {
        let config = BoundaryConfig {
            green_ceiling: 1.3,
            yellow_ceiling: 1.2,
            ..BoundaryConfig::default()
        };
        assert!(matches!(
            map_boundary(&config, None),
            Err(ScalingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_small_map_peak_and_zones() {
        let config = BoundaryConfig {
            n: 14,
            alpha_min: 2.0,
            alpha_max: 5.0,
            alpha_step: 1.0,
            samples_per_alpha: 6,
            step_limit: 100_000,
            ..BoundaryConfig::default()
        };
        let result = map_boundary(&config, None).unwrap();
        assert_eq!(result.points.len(), 4);
        let max_b = result
            .points
            .iter()
            .map(|p| p.branching_factor)
            .fold(f64::MIN, f64::max);
        assert_eq!(result.peak_branching_factor, max_b);
        assert_eq!(
            result.count(Zone::Green) + result.count(Zone::Yellow) + result.count(Zone::Red),
            4
        );
        for p in &result.points {
            assert!(p.branching_factor >= 1.0);
            assert_eq!(
                p.zone,
                Zone::classify(p.branching_factor, config.green_ceiling, config.yellow_ceiling)
            );
        }
    }
}
