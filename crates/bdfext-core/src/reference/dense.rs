//! Dense finite-difference backend for [`ChannelFlow`]
//!
//! Unknowns are ordered `[u_0 .. u_{n-1}, p_0 .. p_{n-1}]`.
//!
//! ```text
//! momentum   (alpha/dt) u + w u_x + p_x - (nu + nu_s) u_xx = bdf/dt + eta f
//! continuity u_x + eps p - tau p_xx = 0
//! ```
//!
//! `nu_s = tau * w^2` is the SUPG streamline diffusion and the `tau p_xx`
//! term is only present with GLS.

use bdfext_types::KrylovMethod;
use nalgebra::{DMatrix, DVector};
use tracing::trace;

use super::channel::{ChannelFlow, INLET, OUTLET};
use super::krylov::{bicgstab, PreconditionerOp};
use crate::domain::{BoundaryCondition, DomainModel, FieldKind, FlowState};
use crate::error::LinearSolveError;
use crate::solvers::{FieldSolver, StepSystem};

/// Dense LU / BiCGStab solver of the channel system
#[derive(Debug, Clone, Default)]
pub struct DenseChannelSolver {
    last_iterations: usize,
    solves: usize,
}

impl DenseChannelSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Krylov iterations of the most recent solve (0 for direct solves)
    pub fn last_iterations(&self) -> usize {
        self.last_iterations
    }

    /// Number of successful solves
    pub fn solves(&self) -> usize {
        self.solves
    }

    /// Assemble the mixed system for one step
    pub fn assemble(
        system: &StepSystem<'_>,
        domain: &ChannelFlow,
        bcs: &[BoundaryCondition],
    ) -> (DMatrix<f64>, DVector<f64>) {
        let n = domain.nodes();
        let h = domain.spacing();
        let nu = domain.viscosity();
        let eps = domain.penalty();
        let sigma = system.alpha / system.dt;
        let f = domain.forcing_shape();

        let mut inlet = domain.inlet_velocity();
        let mut outlet = 0.0;
        for bc in bcs {
            match (bc.marker, bc.field) {
                (INLET, FieldKind::Velocity) => inlet = bc.value,
                (OUTLET, FieldKind::Pressure) => outlet = bc.value,
                _ => {}
            }
        }

        let mut a = DMatrix::zeros(2 * n, 2 * n);
        let mut rhs = DVector::zeros(2 * n);
        let p = |i: usize| n + i;

        // Velocity rows
        a[(0, 0)] = 1.0;
        rhs[0] = inlet;
        for i in 1..n - 1 {
            let w = system.wind[i];
            let tau = stabilization_tau(system.alpha, system.dt, w, h, nu);
            let nu_eff = if system.stabilization.streamline() {
                nu + tau * w * w
            } else {
                nu
            };

            a[(i, i - 1)] = -w / (2.0 * h) - nu_eff / (h * h);
            a[(i, i)] = sigma + 2.0 * nu_eff / (h * h);
            a[(i, i + 1)] = w / (2.0 * h) - nu_eff / (h * h);
            a[(i, p(i - 1))] = -1.0 / (2.0 * h);
            a[(i, p(i + 1))] = 1.0 / (2.0 * h);
            rhs[i] = system.bdf_estimate[i] / system.dt + system.forcing_scale * f[i];
        }
        // Do-nothing outflow
        a[(n - 1, n - 1)] = 1.0;
        a[(n - 1, n - 2)] = -1.0;

        // Continuity rows
        a[(p(0), 0)] = -1.0 / h;
        a[(p(0), 1)] = 1.0 / h;
        a[(p(0), p(0))] = eps;
        for i in 1..n - 1 {
            a[(p(i), i - 1)] = -1.0 / (2.0 * h);
            a[(p(i), i + 1)] = 1.0 / (2.0 * h);
            a[(p(i), p(i))] = eps;
            if system.stabilization.pressure() {
                let tau = stabilization_tau(system.alpha, system.dt, system.wind[i], h, nu);
                a[(p(i), p(i - 1))] -= tau / (h * h);
                a[(p(i), p(i))] += 2.0 * tau / (h * h);
                a[(p(i), p(i + 1))] -= tau / (h * h);
            }
        }
        a[(p(n - 1), p(n - 1))] = 1.0;
        rhs[p(n - 1)] = outlet;

        (a, rhs)
    }
}

/// SUPG/GLS stabilization parameter
///
/// `tau = ((2 alpha/dt)^2 + (2|w|/h)^2 + 9 (4 nu/h^2)^2)^(-1/2)`
pub fn stabilization_tau(alpha: f64, dt: f64, w: f64, h: f64, nu: f64) -> f64 {
    let transient = 2.0 * alpha / dt;
    let advective = 2.0 * w.abs() / h;
    let diffusive = 4.0 * nu / (h * h);
    (transient.powi(2) + advective.powi(2) + 9.0 * diffusive.powi(2)).powf(-0.5)
}

impl FieldSolver<ChannelFlow> for DenseChannelSolver {
    fn assemble_and_solve(
        &mut self,
        system: &StepSystem<'_>,
        domain: &ChannelFlow,
        bcs: &[BoundaryCondition],
    ) -> Result<FlowState, LinearSolveError> {
        let n = domain.nodes();
        if system.wind.len() != n || system.bdf_estimate.len() != n {
            return Err(LinearSolveError::DimensionMismatch {
                expected: n,
                found: system.wind.len(),
            });
        }

        let (a, rhs) = Self::assemble(system, domain, bcs);
        let params = system.parameters;
        let precond = PreconditionerOp::build(params.preconditioner, &a, n);

        let (x, iterations) = match params.krylov {
            KrylovMethod::Preonly => {
                let x = precond
                    .apply(&rhs)
                    .ok_or(LinearSolveError::Singular {
                        order: system.order,
                    })?;
                (x, 0)
            }
            KrylovMethod::Bicgstab => {
                let state = domain.state();
                let x0 = DVector::from_iterator(
                    2 * n,
                    state.velocity.iter().chain(state.pressure.iter()).copied(),
                );
                let sol = bicgstab(&a, &rhs, x0, &precond, params.rtol, params.max_iterations)?;
                (sol.x, sol.iterations)
            }
        };

        trace!(
            order = system.order,
            krylov = %params.krylov,
            preconditioner = %params.preconditioner,
            iterations,
            "Channel system solved"
        );
        self.last_iterations = iterations;
        self.solves += 1;

        Ok(FlowState::new(
            x.rows(0, n).into_owned(),
            x.rows(n, n).into_owned(),
        ))
    }
}
