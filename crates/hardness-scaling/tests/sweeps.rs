//! End-to-end sweeps over small instances

use hardness_core::CancelToken;
use hardness_scaling::{
    macro_scan, map_boundary, measure_cost, BoundaryConfig, MacroScanConfig, ScalingConfig,
    ScalingError, StepBudget, StressTestConfig,
};

#[test]
fn test_cost_peaks_near_transition() {
    let config = MacroScanConfig {
        n: 16,
        alpha_min: 2.0,
        alpha_max: 8.0,
        alpha_step: 1.0,
        samples_per_alpha: 30,
        step_limit: 200_000,
        seed: 3,
        parallel: true,
    };
    let result = macro_scan(&config, None).unwrap();
    assert!(
        (3.0..=6.0).contains(&result.peak_alpha),
        "peak at alpha={}",
        result.peak_alpha
    );
    let easy = &result.points[0];
    assert!(result.peak_avg_steps > easy.avg_steps);
}

#[test]
fn test_configs_round_trip_through_json() {
    let config = ScalingConfig::fast();
    let json = serde_json::to_string(&config).unwrap();
    let back: ScalingConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.sizes, config.sizes);
    assert_eq!(back.samples_per_size, config.samples_per_size);
    assert_eq!(back.budget.max, config.budget.max);
    assert!((back.alpha - config.alpha).abs() < 1e-12);

    let partial: StressTestConfig = serde_json::from_str(r#"{"sizes": [20, 25, 30]}"#).unwrap();
    assert_eq!(partial.sizes, vec![20, 25, 30]);
    assert_eq!(partial.saturation_threshold, StressTestConfig::default().saturation_threshold);

    let budget: StepBudget = serde_json::from_str(r#"{"base": 10, "growth": 3.0, "max": 50}"#).unwrap();
    assert_eq!(budget.limit_for(1), 30);
    assert_eq!(budget.limit_for(2), 50);
}

#[test]
fn test_cancelled_sweep_returns_error() {
    let token = CancelToken::new();
    token.cancel();
    let err = map_boundary(&BoundaryConfig::default(), Some(&token)).unwrap_err();
    assert!(matches!(
        err,
        ScalingError::Core(hardness_core::Error::Cancelled)
    ));
}

#[test]
fn test_harder_ratio_costs_more() {
    let easy = measure_cost(20, 2.0, 20, 100_000, 8, None).unwrap();
    let hard = measure_cost(20, 4.26, 20, 100_000, 8, None).unwrap();
    assert!(hard.avg_steps > easy.avg_steps);
    assert!(easy.sat_ratio() > hard.sat_ratio());
}
