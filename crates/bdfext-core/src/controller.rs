//! Step controller: per-step orchestration of the BDF/EXT scheme
//!
//! One call to [`StepController::step`] performs:
//!
//! 1. read the next noise sample (fails with `NoiseExhausted` before any solve)
//! 2. pass an optional control input through the domain's actuators
//! 3. select the sub-solver for the current step index and solve
//! 4. rotate the accepted velocity into history
//! 5. advance the clock, step index and noise cursor
//!
//! Controller state (history, clock, step index, noise cursor) is committed
//! only after the solve succeeds. Side effects on the domain made in step 2
//! are not rolled back on failure.

use bdfext_types::IntegratorSettings;
use tracing::{debug, info, warn};

use crate::domain::{DomainModel, FlowState};
use crate::error::{ConfigError, StepError};
use crate::history::HistoryBuffer;
use crate::noise::NoiseSchedule;
use crate::solvers::{FieldSolver, StartupPhase, SubSolverSet};
use crate::stabilization::Stabilization;

/// Callback invoked after every accepted step
pub trait StepObserver<D> {
    fn on_step(&mut self, step: usize, t: f64, domain: &D);
}

impl<D, F> StepObserver<D> for F
where
    F: FnMut(usize, f64, &D),
{
    fn on_step(&mut self, step: usize, t: f64, domain: &D) {
        self(step, t, domain)
    }
}

/// Outcome of [`StepController::run`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Steps accepted during this run
    pub steps: usize,
    /// Simulated time at the end of the run
    pub t: f64,
    /// Order used by the last accepted step
    pub final_order: usize,
}

/// Orchestrator of a fixed-step, fixed-order BDF/EXT run
#[derive(Debug)]
pub struct StepController<S> {
    solvers: SubSolverSet,
    history: HistoryBuffer,
    noise: NoiseSchedule,
    backend: S,
    dt: f64,
    t: f64,
    step_index: usize,
}

impl<S> StepController<S> {
    /// Validate the settings, build the sub-solvers and seed history
    ///
    /// The domain's current boundary-condition layout is frozen into the
    /// sub-solvers, and its current velocity fills every history slot.
    pub fn new<D: DomainModel>(
        settings: &IntegratorSettings,
        backend: S,
        noise: NoiseSchedule,
        domain: &D,
    ) -> Result<Self, ConfigError> {
        let dt = settings.dt;
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(ConfigError::InvalidTimestep(dt));
        }
        let rtol = settings.solver.rtol;
        if !(rtol > 0.0 && rtol.is_finite()) {
            return Err(ConfigError::InvalidTolerance(rtol));
        }
        let stabilization: Stabilization = settings.stabilization.parse()?;

        let solvers = SubSolverSet::build(
            settings.order,
            dt,
            stabilization,
            &settings.solver,
            domain,
        )?;

        let mut controller = Self {
            history: HistoryBuffer::new(solvers.max_order()),
            solvers,
            noise,
            backend,
            dt,
            t: 0.0,
            step_index: 0,
        };
        controller.restart(domain);

        info!(
            order = controller.order(),
            dt,
            stabilization = %stabilization,
            krylov = %settings.solver.krylov,
            noise_samples = controller.noise.len(),
            "Step controller initialized"
        );
        Ok(controller)
    }

    /// Return to t = 0 with history re-seeded from the domain's current state
    pub fn reset<D: DomainModel>(&mut self, domain: &D) {
        self.restart(domain);
        info!(order = self.order(), "Step controller reset");
    }

    fn restart<D: DomainModel>(&mut self, domain: &D) {
        self.t = 0.0;
        self.step_index = 0;
        self.noise.reset();
        self.history.seed(&domain.state().velocity);
    }

    /// Advance one step
    ///
    /// Returns the domain's updated state. On error, history, clock, step
    /// index and noise cursor are exactly as before the call.
    pub fn step<'d, D>(
        &mut self,
        domain: &'d mut D,
        control: Option<&[f64]>,
    ) -> Result<&'d FlowState, StepError>
    where
        D: DomainModel,
        S: FieldSolver<D>,
    {
        let forcing = self.noise.peek()?;

        if let Some(control) = control {
            let bc_scale = domain.update_actuators(control, self.dt);
            domain.set_control(&bc_scale);
        }

        let was_steady = self.phase().is_steady();
        let solver = self.solvers.select(self.step_index);
        let order = solver.order();
        solver.solve(&self.history, domain, &mut self.backend, forcing)?;

        // Commit
        self.history.rotate(domain.state().velocity.clone());
        self.noise.advance();
        self.step_index += 1;
        self.t += self.dt;

        debug!(
            step = self.step_index - 1,
            t = self.t,
            order,
            forcing,
            "Step accepted"
        );
        if !was_steady && self.phase().is_steady() {
            info!(
                step = self.step_index,
                order = self.order(),
                "Startup complete, switching to steady order"
            );
        }

        Ok(domain.state())
    }

    /// Number of whole steps covering `duration`
    pub fn steps_for(&self, duration: f64) -> usize {
        crate::solvers::steps_for(duration, self.dt)
    }

    /// Take `num_steps` steps, querying `policy` for control before each one
    /// and notifying `observers` after each accepted step
    pub fn run<D>(
        &mut self,
        domain: &mut D,
        num_steps: usize,
        mut policy: impl FnMut(f64, &D) -> Option<Vec<f64>>,
        observers: &mut [&mut dyn StepObserver<D>],
    ) -> Result<RunSummary, StepError>
    where
        D: DomainModel,
        S: FieldSolver<D>,
    {
        if self.noise.remaining() < num_steps {
            warn!(
                planned = num_steps,
                remaining = self.noise.remaining(),
                "Noise schedule is shorter than the planned run"
            );
        }

        let mut final_order = self.phase().order();
        for _ in 0..num_steps {
            let control = policy(self.t, domain);
            final_order = self.phase().order();
            self.step(domain, control.as_deref())?;

            for observer in observers.iter_mut() {
                observer.on_step(self.step_index - 1, self.t, domain);
            }
        }

        Ok(RunSummary {
            steps: num_steps,
            t: self.t,
            final_order,
        })
    }

    /// Simulated time
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Number of accepted steps
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Configured order `k`
    pub fn order(&self) -> usize {
        self.solvers.max_order()
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Startup state of the next step
    pub fn phase(&self) -> StartupPhase {
        StartupPhase::at(self.step_index, self.order())
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn noise(&self) -> &NoiseSchedule {
        &self.noise
    }

    pub fn solvers(&self) -> &SubSolverSet {
        &self.solvers
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }
}
