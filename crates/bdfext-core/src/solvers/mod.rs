//! Semi-implicit BDF/EXT solvers
//!
//! - Coefficient tables for orders 1-3
//! - The field-equation solver seam and per-step system description
//! - Order-indexed sub-solvers with the startup ramp
//! - Step counts for a simulated duration

mod base;
pub mod coefficients;
mod schedule;
mod subsolver;

pub use base::*;
pub use coefficients::{coefficients, Coefficients, MAX_ORDER};
pub use schedule::steps_for;
pub use subsolver::{StartupPhase, SubSolver, SubSolverSet};
