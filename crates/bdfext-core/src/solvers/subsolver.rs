//! Order-indexed sub-solvers and the startup ramp
//!
//! One sub-solver is built per order `1..=k` once the boundary-condition
//! layout is fixed. During the first `k-1` steps the controller ramps through
//! the lower orders so that no multistep combination reads a history slot that
//! has not yet been filled by a solved state:
//!
//! ```text
//! step:   0   1   ...  k-2   k-1   k   ...
//! order:  1   2   ...  k-1   k     k   ...
//! ```
//!
//! The transition from startup to steady is one-way and depends only on the
//! step index.

use bdfext_types::SolverParameters;

use super::base::{FieldSolver, StepSystem};
use super::coefficients::{coefficients, Coefficients};
use crate::domain::{layout, DomainModel, FieldKind, FlowState};
use crate::error::{ConfigError, LinearSolveError, StepError};
use crate::history::HistoryBuffer;
use crate::stabilization::Stabilization;

/// Phase of the startup state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    /// Lower-order scheme while history fills up
    Startup { order: usize },
    /// Configured order, used for every remaining step
    Steady { order: usize },
}

impl StartupPhase {
    /// Phase of step `step_index` for a scheme of order `k`
    pub fn at(step_index: usize, k: usize) -> Self {
        if step_index + 1 < k {
            StartupPhase::Startup {
                order: step_index + 1,
            }
        } else {
            StartupPhase::Steady { order: k }
        }
    }

    pub fn order(&self) -> usize {
        match *self {
            StartupPhase::Startup { order } | StartupPhase::Steady { order } => order,
        }
    }

    pub fn is_steady(&self) -> bool {
        matches!(self, StartupPhase::Steady { .. })
    }
}

/// Semi-implicit solver of one fixed BDF/EXT order
///
/// Holds the order's coefficients and the frozen boundary-condition layout.
/// History and domain are borrowed per call: history read-only, the domain's
/// current state written with the solution.
#[derive(Debug, Clone)]
pub struct SubSolver {
    coefficients: Coefficients,
    dt: f64,
    stabilization: Stabilization,
    parameters: SolverParameters,
    bc_layout: Vec<(u32, FieldKind)>,
}

impl SubSolver {
    pub fn order(&self) -> usize {
        self.coefficients.order
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub fn stabilization(&self) -> Stabilization {
        self.stabilization
    }

    /// Build this order's linearised system from the current history
    pub fn system<'a>(
        &'a self,
        history: &HistoryBuffer,
        forcing_scale: f64,
    ) -> Result<StepSystem<'a>, ConfigError> {
        let order = self.order();
        Ok(StepSystem {
            order,
            alpha: self.coefficients.alpha,
            dt: self.dt,
            bdf_estimate: history.bdf_estimate(order)?,
            wind: history.wind(order)?,
            forcing_scale,
            stabilization: self.stabilization,
            parameters: &self.parameters,
        })
    }

    /// Solve one step and write the result into the domain's current state
    ///
    /// Errors from the backend are returned unchanged; nothing is retried.
    pub fn solve<D, S>(
        &self,
        history: &HistoryBuffer,
        domain: &mut D,
        backend: &mut S,
        forcing_scale: f64,
    ) -> Result<(), StepError>
    where
        D: DomainModel,
        S: FieldSolver<D> + ?Sized,
    {
        let system = self.system(history, forcing_scale)?;

        let bcs = domain.boundary_conditions();
        if layout(&bcs) != self.bc_layout {
            return Err(ConfigError::BoundaryLayoutChanged.into());
        }

        let solution = backend.assemble_and_solve(&system, domain, &bcs)?;
        check_dimensions(&solution, domain.state())?;

        *domain.state_mut() = solution;
        Ok(())
    }
}

fn check_dimensions(solution: &FlowState, current: &FlowState) -> Result<(), LinearSolveError> {
    let expected = current.velocity.len() + current.pressure.len();
    let found = solution.velocity.len() + solution.pressure.len();
    if solution.velocity.len() != current.velocity.len() || found != expected {
        return Err(LinearSolveError::DimensionMismatch { expected, found });
    }
    Ok(())
}

/// Sub-solvers for orders `1..=k`, indexed by order
#[derive(Debug, Clone)]
pub struct SubSolverSet {
    solvers: Vec<SubSolver>,
}

impl SubSolverSet {
    /// Build one sub-solver per order up to `k`
    ///
    /// The domain's current boundary-condition layout is frozen into every
    /// sub-solver.
    pub fn build<D: DomainModel>(
        k: usize,
        dt: f64,
        stabilization: Stabilization,
        parameters: &SolverParameters,
        domain: &D,
    ) -> Result<Self, ConfigError> {
        // Reject k outside the table before building anything
        coefficients(k)?;

        let bc_layout = layout(&domain.boundary_conditions());
        let solvers = (1..=k)
            .map(|order| {
                Ok(SubSolver {
                    coefficients: coefficients(order)?,
                    dt,
                    stabilization,
                    parameters: parameters.clone(),
                    bc_layout: bc_layout.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { solvers })
    }

    /// Sub-solver of a given order
    pub fn get(&self, order: usize) -> Option<&SubSolver> {
        order.checked_sub(1).and_then(|i| self.solvers.get(i))
    }

    /// Sub-solver for step `step_index` under the startup policy
    pub fn select(&self, step_index: usize) -> &SubSolver {
        let order = StartupPhase::at(step_index, self.max_order()).order();
        &self.solvers[order - 1]
    }

    /// Configured order `k`
    pub fn max_order(&self) -> usize {
        self.solvers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubSolver> {
        self.solvers.iter()
    }
}
