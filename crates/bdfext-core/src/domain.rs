//! Domain model seam: flow state, boundary conditions and actuation
//!
//! The domain model owns the current mixed velocity/pressure state. The step
//! controller never stores it; it borrows the domain mutably for the duration
//! of one step, and only the sub-solver `solve()` writes the state.

use nalgebra::DVector;

/// Mixed velocity/pressure state
#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    pub velocity: DVector<f64>,
    pub pressure: DVector<f64>,
}

impl FlowState {
    pub fn new(velocity: DVector<f64>, pressure: DVector<f64>) -> Self {
        Self { velocity, pressure }
    }

    /// Zero state with `n_velocity` and `n_pressure` degrees of freedom
    pub fn zeros(n_velocity: usize, n_pressure: usize) -> Self {
        Self {
            velocity: DVector::zeros(n_velocity),
            pressure: DVector::zeros(n_pressure),
        }
    }
}

/// Field constrained by a boundary condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Velocity,
    Pressure,
}

/// Dirichlet condition on a marked boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryCondition {
    pub marker: u32,
    pub field: FieldKind,
    pub value: f64,
}

impl BoundaryCondition {
    pub fn velocity(marker: u32, value: f64) -> Self {
        Self {
            marker,
            field: FieldKind::Velocity,
            value,
        }
    }

    pub fn pressure(marker: u32, value: f64) -> Self {
        Self {
            marker,
            field: FieldKind::Pressure,
            value,
        }
    }
}

/// Structure of a boundary-condition set, without its values
pub fn layout(bcs: &[BoundaryCondition]) -> Vec<(u32, FieldKind)> {
    bcs.iter().map(|bc| (bc.marker, bc.field)).collect()
}

/// Geometry, boundary conditions, stress operators and actuation of a flow problem
pub trait DomainModel {
    /// Current solution
    fn state(&self) -> &FlowState;

    /// Mutable access to the current solution
    fn state_mut(&mut self) -> &mut FlowState;

    /// Boundary conditions with their current values
    fn boundary_conditions(&self) -> Vec<BoundaryCondition>;

    /// Pass a raw control input through the actuator dynamics
    ///
    /// Returns the boundary-condition scale to apply.
    fn update_actuators(&mut self, control: &[f64], dt: f64) -> Vec<f64>;

    /// Apply a boundary-condition scale computed by [`update_actuators`](Self::update_actuators)
    fn set_control(&mut self, bc_scale: &[f64]);

    /// Symmetric velocity gradient `(grad u + grad u^T) / 2` at the velocity nodes
    ///
    /// Zero unless the model resolves it.
    fn epsilon(&self, u: &DVector<f64>) -> DVector<f64> {
        DVector::zeros(u.len())
    }

    /// Cauchy stress `2 * nu * epsilon(u) - p * I`
    ///
    /// `u` and `p` must share nodes. Defaults to the inviscid stress `-p`.
    fn sigma(&self, _u: &DVector<f64>, p: &DVector<f64>) -> DVector<f64> {
        -p
    }
}
