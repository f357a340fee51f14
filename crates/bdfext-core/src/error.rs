//! Error types for construction, stepping and the delegated solve

use thiserror::Error;

/// Invalid run configuration, detected at construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("BDF/EXT order {order} is not supported (expected 1..={max})")]
    UnsupportedOrder { order: usize, max: usize },

    #[error("Stabilization type '{name}' not recognized. Available options: {valid}")]
    UnknownStabilization { name: String, valid: String },

    #[error("Time step must be positive and finite, got {0}")]
    InvalidTimestep(f64),

    #[error("Solver tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),

    #[error("Order {order} needs {order} history entries but only {len} are available")]
    HistoryTooShort { order: usize, len: usize },

    #[error("Boundary condition layout changed after the sub-solvers were built")]
    BoundaryLayoutChanged,

    #[error("Invalid noise schedule: {0}")]
    InvalidNoise(String),
}

/// Failure of the delegated linear solve
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinearSolveError {
    #[error("Singular system in order-{order} solve")]
    Singular { order: usize },

    #[error("Linear solver did not converge after {iterations} iterations (residual {residual:e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },

    #[error("Linear solver broke down after {iterations} iterations")]
    Breakdown { iterations: usize },

    #[error("Solved state has dimension {found}, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Any error surfaced by a time step
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Not enough noise samples generated: sample {index} requested from a schedule of {len}")]
    NoiseExhausted { index: usize, len: usize },

    #[error(transparent)]
    LinearSolve(#[from] LinearSolveError),
}
