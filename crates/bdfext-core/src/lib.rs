//! bdfext - Semi-implicit BDF/EXT time integration for forced incompressible flow
//!
//! Advances a mixed velocity/pressure state with a variable-order (1-3)
//! backward-differentiation / extrapolation scheme. The implicit part is a BDF
//! time derivative, the convective velocity is extrapolated from history, and
//! every step is forced by one sample of a pre-generated noise schedule.
//!
//! # Architecture
//!
//! - [`solvers`]: coefficient tables, one sub-solver per order and the
//!   startup ramp
//! - [`HistoryBuffer`]: most-recent-first ring of accepted velocity states
//! - [`NoiseSchedule`]: finite forcing sequence consumed once per step
//! - [`StepController`]: the per-step orchestration with atomic commit
//!
//! Spatial discretisation and the algebraic solve live behind the
//! [`DomainModel`] and [`FieldSolver`](solvers::FieldSolver) traits. A 1-D
//! reference channel and a dense backend are provided in [`reference`].
//!
//! # Example
//!
//! ```rust,no_run
//! use bdfext_core::prelude::*;
//! use bdfext_types::{ChannelSettings, IntegratorSettings};
//!
//! let mut channel = ChannelFlow::new(&ChannelSettings::default());
//! let settings = IntegratorSettings::default();
//! let mut controller = StepController::new(
//!     &settings,
//!     DenseChannelSolver::new(),
//!     NoiseSchedule::zeros(100),
//!     &channel,
//! )?;
//!
//! for _ in 0..100 {
//!     controller.step(&mut channel, None)?;
//! }
//! # Ok::<(), bdfext_core::StepError>(())
//! ```

pub mod actuator;
pub mod controller;
pub mod domain;
pub mod error;
pub mod history;
pub mod noise;
pub mod reference;
pub mod solvers;
pub mod stabilization;
pub mod utils;

pub use actuator::Actuator;
pub use controller::{RunSummary, StepController, StepObserver};
pub use domain::{BoundaryCondition, DomainModel, FieldKind, FlowState};
pub use error::{ConfigError, LinearSolveError, StepError};
pub use history::HistoryBuffer;
pub use noise::NoiseSchedule;
pub use stabilization::Stabilization;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::actuator::Actuator;
    pub use crate::controller::{RunSummary, StepController, StepObserver};
    pub use crate::domain::{BoundaryCondition, DomainModel, FieldKind, FlowState};
    pub use crate::error::{ConfigError, LinearSolveError, StepError};
    pub use crate::history::HistoryBuffer;
    pub use crate::noise::NoiseSchedule;
    pub use crate::reference::{ChannelFlow, DenseChannelSolver};
    pub use crate::solvers::*;
    pub use crate::stabilization::Stabilization;
}
