//! Hardness core - random 3-SAT instances and the two search engines
//!
//! The building blocks every phase-transition experiment is assembled from.
//!
//! ## Instances
//! - Uniform random 3-CNF generation at a chosen (n, m) or clause ratio α
//! - DIMACS export/import for pinning instances in fixtures
//!
//! ## Exact search
//! - DPLL with unit propagation and a most-frequent-literal branching rule
//! - Explicit frame stack instead of call-stack recursion
//! - Step ceiling and cancellation, reported as an `Inconclusive` outcome
//!   distinct from a proved `Unsatisfiable`
//!
//! ## Local search
//! - Single-flip move from a random broken clause
//! - Metropolis or lenient acceptance
//! - Geometric cooling schedule with per-variable flip accounting
//!
//! ## Backbone
//! - Exact backbone by refutation: a variable is frozen when forcing its
//!   opposite value makes the formula unsatisfiable
//!
//! All randomness is drawn from a caller-supplied [`rand::Rng`], so every
//! experiment is reproducible from a seed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod anneal;
pub mod backbone;
pub mod cancel;
pub mod dimacs;
pub mod dpll;
pub mod error;
pub mod formula;
pub mod generator;
pub mod literal;

pub use anneal::{
    anneal, anneal_from, anneal_step, anneal_step_with, Acceptance, AnnealConfig, AnnealRun, Move,
    StepOutcome, DEFAULT_INITIAL_TEMPERATURE, FAST_COOLING_RATE, LENIENT_ESCAPE_PROBABILITY,
    SLOW_COOLING_RATE, TEMPERATURE_FLOOR,
};
pub use backbone::{exact_backbone, BackboneReport, BackboneStatus};
pub use cancel::CancelToken;
pub use dimacs::parse_str as parse_dimacs;
pub use dpll::{branching_factor, solve_exact, DpllSolver, SolveOutcome, SolveResult};
pub use error::{Error, Result};
pub use formula::{Assignment, Clause, Formula};
pub use generator::{clause_count, derive_seed, generate, generate_with_alpha, CLAUSE_WIDTH};
pub use literal::Literal;
