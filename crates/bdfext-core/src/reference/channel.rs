//! 1-D actuated channel
//!
//! Nodal velocity `u` and pressure `p` on `n` equally spaced points of
//! `[0, L]`. The inlet velocity is `u_inf` plus the actuator state, the outlet
//! pressure is zero and the outlet velocity satisfies a do-nothing condition.
//! Incompressibility is relaxed with a penalty `du/dx + eps * p = 0`.

use bdfext_types::ChannelSettings;
use nalgebra::DVector;

use crate::actuator::Actuator;
use crate::domain::{BoundaryCondition, DomainModel, FlowState};

/// Boundary marker of the inlet
pub const INLET: u32 = 2;
/// Boundary marker of the outlet
pub const OUTLET: u32 = 4;

/// Reference channel flow domain
#[derive(Debug, Clone)]
pub struct ChannelFlow {
    length: f64,
    spacing: f64,
    viscosity: f64,
    u_inf: f64,
    penalty: f64,
    forcing: DVector<f64>,
    actuator: Actuator,
    control: f64,
    state: FlowState,
}

impl ChannelFlow {
    /// Uniform flow at `u_inf` with zero pressure
    ///
    /// At least three nodes are used.
    pub fn new(settings: &ChannelSettings) -> Self {
        let n = settings.nodes.max(3);
        let length = settings.length;
        let spacing = length / (n - 1) as f64;
        let width = settings.forcing_width;
        let center = 0.5 * length;

        let forcing = DVector::from_fn(n, |i, _| {
            let x = i as f64 * spacing;
            (-((x - center) / width).powi(2)).exp()
        });

        Self {
            length,
            spacing,
            viscosity: 1.0 / settings.reynolds,
            u_inf: settings.u_inf,
            penalty: settings.penalty,
            forcing,
            actuator: Actuator::new(settings.actuator_tau, settings.max_control),
            control: 0.0,
            state: FlowState::new(
                DVector::from_element(n, settings.u_inf),
                DVector::zeros(n),
            ),
        }
    }

    pub fn nodes(&self) -> usize {
        self.forcing.len()
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Grid spacing `h`
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Kinematic viscosity `1 / Re`
    pub fn viscosity(&self) -> f64 {
        self.viscosity
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    pub fn u_inf(&self) -> f64 {
        self.u_inf
    }

    /// Body-force shape, scaled by the noise sample each step
    pub fn forcing_shape(&self) -> &DVector<f64> {
        &self.forcing
    }

    /// Boundary-condition scale currently applied at the inlet
    pub fn control(&self) -> f64 {
        self.control
    }

    pub fn actuator(&self) -> &Actuator {
        &self.actuator
    }

    /// Prescribed inlet velocity
    pub fn inlet_velocity(&self) -> f64 {
        self.u_inf + self.control
    }

    /// Boundary tractions `sigma * n` as `(inlet, outlet)`
    ///
    /// The inlet normal points in `-x`.
    pub fn collect_observations(&self) -> (f64, f64) {
        let sigma = self.sigma(&self.state.velocity, &self.state.pressure);
        (-sigma[0], sigma[sigma.len() - 1])
    }

    /// Zero the actuator and the applied control
    pub fn reset_control(&mut self) {
        self.actuator.reset();
        self.control = 0.0;
    }

    /// Return to uniform flow with no control
    pub fn reset(&mut self) {
        self.reset_control();
        self.state.velocity.fill(self.u_inf);
        self.state.pressure.fill(0.0);
    }
}

impl DomainModel for ChannelFlow {
    fn state(&self) -> &FlowState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FlowState {
        &mut self.state
    }

    fn boundary_conditions(&self) -> Vec<BoundaryCondition> {
        vec![
            BoundaryCondition::velocity(INLET, self.inlet_velocity()),
            BoundaryCondition::pressure(OUTLET, 0.0),
        ]
    }

    fn update_actuators(&mut self, control: &[f64], dt: f64) -> Vec<f64> {
        let input = control.first().copied().unwrap_or(0.0);
        vec![self.actuator.update(input, dt)]
    }

    fn set_control(&mut self, bc_scale: &[f64]) {
        self.control = bc_scale.first().copied().unwrap_or(0.0);
    }

    /// Strain rate `du/dx` at the nodes, the 1-D symmetric gradient
    ///
    /// Central differences inside, one-sided at the ends.
    fn epsilon(&self, u: &DVector<f64>) -> DVector<f64> {
        let n = u.len();
        if n < 2 {
            return DVector::zeros(n);
        }
        let h = self.spacing;
        DVector::from_fn(n, |i, _| {
            if i == 0 {
                (u[1] - u[0]) / h
            } else if i == n - 1 {
                (u[n - 1] - u[n - 2]) / h
            } else {
                (u[i + 1] - u[i - 1]) / (2.0 * h)
            }
        })
    }

    /// Cauchy stress `2 * nu * epsilon(u) - p`
    fn sigma(&self, u: &DVector<f64>, p: &DVector<f64>) -> DVector<f64> {
        self.epsilon(u) * (2.0 * self.viscosity) - p
    }
}
