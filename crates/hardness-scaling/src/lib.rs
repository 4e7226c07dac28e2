//! Hardness scaling - how exact-search cost grows with n and α
//!
//! Every experiment here measures average DPLL steps on freshly generated
//! instances and reasons about the shape of the resulting curve:
//!
//! - [`sampling`]: average DPLL cost at one (n, α) point and the sweeps
//!   built on it
//! - [`regression`]: least-squares fits of y ≈ A·e^(B·n) and y ≈ A·n^B on
//!   log-transformed data, compared by R²
//! - [`macro_scan`]: the classic satisfiability/cost curve across α
//! - [`scaling`]: cost vs. n at fixed α with escalating step ceilings,
//!   plus the stress variant at larger n
//! - [`confirmation`]: the exponential "kill shot" via the effective
//!   branching factor b = steps^(1/n) and extrapolation to a target n
//! - [`boundary`]: b across an α sweep, tagged into green/yellow/red zones
//!
//! Diagnoses are heuristic classifications against fixed thresholds, not
//! proofs about the asymptotic complexity of 3-SAT.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod confirmation;
pub mod error;
pub mod macro_scan;
pub mod regression;
pub mod sampling;
pub mod scaling;

pub use boundary::{
    map_boundary, BoundaryConfig, BoundaryMapResult, BoundaryPoint, Zone, GREEN_ZONE_CEILING,
    YELLOW_ZONE_CEILING,
};
pub use confirmation::{
    confirm_exponential, ConfirmationConfig, ConfirmationDiagnosis, ConfirmationResult,
    HIDDEN_EXPONENTIAL_THRESHOLD,
};
pub use error::{RegressionError, Result, ScalingError};
pub use macro_scan::{macro_scan, MacroScanConfig, MacroScanResult, SimulationDataPoint};
pub use regression::{
    compare_models, linear_fit, ExponentialFit, GrowthModel, LinearFit, ModelComparison, PowerFit,
};
pub use sampling::{alpha_grid, measure_cost, point_seed, CostSample, StepBudget};
pub use scaling::{
    scaling_analysis, stress_test, ScalingConfig, ScalingDiagnosis, ScalingResult,
    StressDiagnosis, StressTestConfig, StressTestResult, CRITICAL_ALPHA, SATURATION_THRESHOLD,
};
