//! Step controller behaviour against a recording backend
//!
//! The backend integrates `u_t = eta` exactly and records which order each
//! solve used, so startup dispatch, noise consumption and commit semantics can
//! be checked without a real discretisation.

use bdfext_core::prelude::*;
use bdfext_core::solvers::StepSystem;
use bdfext_types::IntegratorSettings;
use nalgebra::DVector;

use approx::assert_relative_eq;

// ==================================================================================
// FIXTURES
// ==================================================================================

struct Tank {
    state: FlowState,
    bcs: Vec<BoundaryCondition>,
    actuator_inputs: Vec<(Vec<f64>, f64)>,
    applied: Vec<Vec<f64>>,
}

impl Tank {
    fn new() -> Self {
        Self {
            state: FlowState::new(DVector::from_vec(vec![1.0, 2.0, 3.0]), DVector::zeros(2)),
            bcs: vec![
                BoundaryCondition::velocity(2, 1.0),
                BoundaryCondition::pressure(4, 0.0),
            ],
            actuator_inputs: Vec::new(),
            applied: Vec::new(),
        }
    }
}

impl DomainModel for Tank {
    fn state(&self) -> &FlowState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FlowState {
        &mut self.state
    }

    fn boundary_conditions(&self) -> Vec<BoundaryCondition> {
        self.bcs.clone()
    }

    fn update_actuators(&mut self, control: &[f64], dt: f64) -> Vec<f64> {
        self.actuator_inputs.push((control.to_vec(), dt));
        control.iter().map(|c| 0.5 * c).collect()
    }

    fn set_control(&mut self, bc_scale: &[f64]) {
        self.applied.push(bc_scale.to_vec());
        if let Some(bc) = self.bcs.first_mut() {
            bc.value = 1.0 + bc_scale.first().copied().unwrap_or(0.0);
        }
    }
}

#[derive(Debug, Default)]
struct Recorder {
    orders: Vec<usize>,
    forcings: Vec<f64>,
    inlet_values: Vec<f64>,
    calls: usize,
    fail_on_call: Option<usize>,
}

impl FieldSolver<Tank> for Recorder {
    fn assemble_and_solve(
        &mut self,
        system: &StepSystem<'_>,
        domain: &Tank,
        bcs: &[BoundaryCondition],
    ) -> Result<FlowState, LinearSolveError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on_call == Some(call) {
            return Err(LinearSolveError::ConvergenceFailure {
                iterations: 1000,
                residual: 1.0,
            });
        }

        self.orders.push(system.order);
        self.forcings.push(system.forcing_scale);
        self.inlet_values.push(bcs[0].value);

        let n = system.bdf_estimate.len();
        let velocity = (&system.bdf_estimate
            + DVector::from_element(n, system.dt * system.forcing_scale))
            / system.alpha;
        Ok(FlowState::new(velocity, domain.state().pressure.clone()))
    }
}

fn settings(order: usize, dt: f64) -> IntegratorSettings {
    IntegratorSettings {
        order,
        dt,
        ..Default::default()
    }
}

fn snapshot(history: &HistoryBuffer) -> Vec<DVector<f64>> {
    history.iter().cloned().collect()
}

// ==================================================================================
// STARTUP AND NOISE
// ==================================================================================

#[test]
fn test_second_order_run_exhausts_noise() {
    let mut domain = Tank::new();
    let noise = NoiseSchedule::new(vec![0.1, 0.2, 0.3, 0.4, 0.5]);
    let mut ctrl = StepController::new(&settings(2, 0.01), Recorder::default(), noise, &domain)
        .unwrap();

    for _ in 0..5 {
        ctrl.step(&mut domain, None).unwrap();
    }

    assert_eq!(ctrl.backend().orders, vec![1, 2, 2, 2, 2]);
    assert_eq!(ctrl.backend().forcings, vec![0.1, 0.2, 0.3, 0.4, 0.5]);
    assert_eq!(ctrl.step_index(), 5);
    assert_relative_eq!(ctrl.time(), 0.05, epsilon = 1e-12);

    // Sixth step fails before the backend is reached
    let err = ctrl.step(&mut domain, None).unwrap_err();
    assert_eq!(err, StepError::NoiseExhausted { index: 5, len: 5 });
    assert_eq!(ctrl.backend().calls, 5);
    assert_eq!(ctrl.step_index(), 5);
}

#[test]
fn test_startup_mapping_for_every_order() {
    for k in 1..=3 {
        let mut domain = Tank::new();
        let mut ctrl =
            StepController::new(&settings(k, 0.1), Recorder::default(), NoiseSchedule::zeros(6), &domain)
                .unwrap();

        for _ in 0..6 {
            ctrl.step(&mut domain, None).unwrap();
        }

        let expected: Vec<usize> = (0..6).map(|n| (n + 1).min(k)).collect();
        assert_eq!(ctrl.backend().orders, expected, "k = {k}");
        assert!(ctrl.phase().is_steady());
    }
}

#[test]
fn test_phase_transition() {
    let mut domain = Tank::new();
    let mut ctrl =
        StepController::new(&settings(3, 0.1), Recorder::default(), NoiseSchedule::zeros(3), &domain)
            .unwrap();

    assert_eq!(ctrl.phase(), StartupPhase::Startup { order: 1 });
    ctrl.step(&mut domain, None).unwrap();
    assert_eq!(ctrl.phase(), StartupPhase::Startup { order: 2 });
    ctrl.step(&mut domain, None).unwrap();
    assert_eq!(ctrl.phase(), StartupPhase::Steady { order: 3 });
}

#[test]
fn test_history_after_first_step() {
    let mut domain = Tank::new();
    let initial = domain.state.velocity.clone();
    let mut ctrl =
        StepController::new(&settings(3, 0.5), Recorder::default(), NoiseSchedule::new(vec![2.0]), &domain)
            .unwrap();

    let state = ctrl.step(&mut domain, None).unwrap().clone();

    // Order 1: u = u0 + dt * eta
    assert_relative_eq!(state.velocity, initial.add_scalar(1.0), epsilon = 1e-12);
    assert_eq!(
        snapshot(ctrl.history()),
        vec![state.velocity.clone(), initial.clone(), initial]
    );
}

// ==================================================================================
// FAILURE ATOMICITY
// ==================================================================================

#[test]
fn test_failed_solve_commits_nothing() {
    let mut domain = Tank::new();
    let backend = Recorder {
        fail_on_call: Some(3),
        ..Default::default()
    };
    let noise = NoiseSchedule::new((1..=10).map(|i| i as f64).collect());
    let mut ctrl = StepController::new(&settings(3, 0.01), backend, noise, &domain).unwrap();

    for _ in 0..3 {
        ctrl.step(&mut domain, None).unwrap();
    }
    let history = snapshot(ctrl.history());
    let state = domain.state.clone();

    let err = ctrl.step(&mut domain, None).unwrap_err();
    assert!(matches!(
        err,
        StepError::LinearSolve(LinearSolveError::ConvergenceFailure { .. })
    ));

    assert_eq!(ctrl.step_index(), 3);
    assert_relative_eq!(ctrl.time(), 0.03, epsilon = 1e-12);
    assert_eq!(snapshot(ctrl.history()), history);
    assert_eq!(ctrl.noise().cursor(), 3);
    assert_eq!(domain.state, state);

    // The same sample is used when stepping resumes
    ctrl.step(&mut domain, None).unwrap();
    assert_eq!(ctrl.backend().forcings, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(ctrl.step_index(), 4);
}

#[test]
fn test_run_stops_at_first_error() {
    let mut domain = Tank::new();
    let backend = Recorder {
        fail_on_call: Some(3),
        ..Default::default()
    };
    let mut ctrl =
        StepController::new(&settings(2, 0.01), backend, NoiseSchedule::zeros(10), &domain).unwrap();

    let mut steps = Vec::new();
    let mut count = |step: usize, _t: f64, _d: &Tank| steps.push(step);
    let mut observers: [&mut dyn StepObserver<Tank>; 1] = [&mut count];
    let result = ctrl.run(&mut domain, 10, |_, _| None, &mut observers);

    assert!(matches!(result, Err(StepError::LinearSolve(_))));
    assert_eq!(ctrl.step_index(), 3);
    assert_eq!(steps, vec![0, 1, 2]);
}

#[test]
fn test_boundary_layout_change_is_rejected() {
    let mut domain = Tank::new();
    let mut ctrl =
        StepController::new(&settings(2, 0.01), Recorder::default(), NoiseSchedule::zeros(3), &domain)
            .unwrap();
    ctrl.step(&mut domain, None).unwrap();

    domain.bcs.push(BoundaryCondition::velocity(6, 0.0));
    let err = ctrl.step(&mut domain, None).unwrap_err();

    assert_eq!(err, StepError::Config(ConfigError::BoundaryLayoutChanged));
    assert_eq!(ctrl.step_index(), 1);
    assert_eq!(ctrl.noise().cursor(), 1);
    assert_eq!(ctrl.backend().calls, 1);
}

// ==================================================================================
// CONTROL, RESET AND RUN
// ==================================================================================

#[test]
fn test_control_passes_through_actuators() {
    let mut domain = Tank::new();
    let mut ctrl =
        StepController::new(&settings(1, 0.02), Recorder::default(), NoiseSchedule::zeros(2), &domain)
            .unwrap();

    ctrl.step(&mut domain, Some(&[0.4])).unwrap();
    ctrl.step(&mut domain, None).unwrap();

    assert_eq!(domain.actuator_inputs, vec![(vec![0.4], 0.02)]);
    assert_eq!(domain.applied, vec![vec![0.2]]);
    // Current boundary values are re-collected at every solve
    assert_eq!(ctrl.backend().inlet_values, vec![1.2, 1.2]);
}

#[test]
fn test_reset_reseeds_history() {
    let mut domain = Tank::new();
    let mut ctrl = StepController::new(
        &settings(3, 0.1),
        Recorder::default(),
        NoiseSchedule::new(vec![1.0; 4]),
        &domain,
    )
    .unwrap();

    for _ in 0..4 {
        ctrl.step(&mut domain, None).unwrap();
    }
    assert_eq!(ctrl.noise().remaining(), 0);

    ctrl.reset(&domain);
    assert_eq!(ctrl.step_index(), 0);
    assert_eq!(ctrl.time(), 0.0);
    assert_eq!(ctrl.noise().cursor(), 0);
    assert_eq!(ctrl.phase(), StartupPhase::Startup { order: 1 });
    assert!(ctrl.history().iter().all(|h| *h == domain.state.velocity));

    ctrl.step(&mut domain, None).unwrap();
    assert_eq!(ctrl.backend().orders, vec![1, 2, 3, 3, 1]);
}

#[test]
fn test_run_with_policy() {
    let mut domain = Tank::new();
    let mut ctrl =
        StepController::new(&settings(2, 0.25), Recorder::default(), NoiseSchedule::zeros(4), &domain)
            .unwrap();

    let mut times = Vec::new();
    let policy = |t: f64, _d: &Tank| {
        times.push(t);
        (t > 0.3).then(|| vec![1.0])
    };
    let summary = ctrl.run(&mut domain, 4, policy, &mut []).unwrap();

    assert_eq!(summary.steps, 4);
    assert_eq!(summary.final_order, 2);
    assert_relative_eq!(summary.t, 1.0, epsilon = 1e-12);
    assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75]);
    assert_eq!(domain.applied.len(), 2);
}

// ==================================================================================
// CONSTRUCTION ERRORS
// ==================================================================================

#[test]
fn test_unknown_stabilization() {
    let domain = Tank::new();
    let mut s = settings(2, 0.01);
    s.stabilization = "vms".to_string();

    let err = StepController::new(&s, Recorder::default(), NoiseSchedule::zeros(1), &domain)
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownStabilization {
            name: "vms".to_string(),
            valid: "none, supg, gls".to_string(),
        }
    );
}

#[test]
fn test_unsupported_order() {
    let domain = Tank::new();
    for k in [0, 4] {
        let err = StepController::new(&settings(k, 0.01), Recorder::default(), NoiseSchedule::zeros(1), &domain)
            .unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedOrder { order: k, max: MAX_ORDER });
    }
}

#[test]
fn test_invalid_timestep() {
    let domain = Tank::new();
    for dt in [0.0, -0.01, f64::NAN, f64::INFINITY] {
        let err = StepController::new(&settings(2, dt), Recorder::default(), NoiseSchedule::zeros(1), &domain)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimestep(_)));
    }
}
