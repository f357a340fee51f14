//! Field-equation solver seam and the per-step linear system description

use bdfext_types::SolverParameters;
use nalgebra::DVector;

use crate::domain::{BoundaryCondition, DomainModel, FlowState};
use crate::error::LinearSolveError;
use crate::stabilization::Stabilization;

/// Linearised semi-implicit problem for one time step
///
/// ```text
/// (alpha * u - bdf_estimate) / dt + (wind · ∇) u + ... = forcing_scale * f
/// ```
#[derive(Debug, Clone)]
pub struct StepSystem<'a> {
    /// Order of the BDF/EXT scheme in use
    pub order: usize,
    /// Weight of the unknown in the time derivative
    pub alpha: f64,
    /// Time step
    pub dt: f64,
    /// `sum(beta_BDF[i] * u^{n-i})`
    pub bdf_estimate: DVector<f64>,
    /// Extrapolated advecting velocity `sum(beta_EXT[i] * u^{n-i})`
    pub wind: DVector<f64>,
    /// Noise sample multiplying the body force
    pub forcing_scale: f64,
    pub stabilization: Stabilization,
    /// Pass-through backend configuration
    pub parameters: &'a SolverParameters,
}

impl StepSystem<'_> {
    /// BDF time derivative `(alpha * u - bdf_estimate) / dt`
    pub fn time_derivative(&self, u: &DVector<f64>) -> DVector<f64> {
        (self.alpha * u - &self.bdf_estimate) / self.dt
    }
}

/// External FEM / linear-algebra backend
///
/// Assembles the linearised weak form for the given domain and solves it.
/// A call is a blocking unit of work; it fails synchronously on
/// non-convergence or singular systems and is never retried.
pub trait FieldSolver<D: DomainModel> {
    fn assemble_and_solve(
        &mut self,
        system: &StepSystem<'_>,
        domain: &D,
        bcs: &[BoundaryCondition],
    ) -> Result<FlowState, LinearSolveError>;
}

impl<D: DomainModel, S: FieldSolver<D> + ?Sized> FieldSolver<D> for Box<S> {
    fn assemble_and_solve(
        &mut self,
        system: &StepSystem<'_>,
        domain: &D,
        bcs: &[BoundaryCondition],
    ) -> Result<FlowState, LinearSolveError> {
        (**self).assemble_and_solve(system, domain, bcs)
    }
}
