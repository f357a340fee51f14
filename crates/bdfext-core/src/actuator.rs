//! First-order actuator dynamics
//!
//! Transfer function: H(s) = 1 / (1 + s*tau)
//!
//! Discrete implementation using backward Euler:
//! y[n] = a * x[n] + (1-a) * y[n-1]
//! where a = dt / (tau + dt)
//!
//! The output saturates at `±max_control`.

/// Lagged, saturating actuator
///
/// # Example
///
/// ```
/// use bdfext_core::Actuator;
///
/// let mut act = Actuator::new(0.1, 1.0);
/// for _ in 0..200 {
///     act.update(0.5, 0.01);
/// }
/// assert!((act.state() - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct Actuator {
    tau: f64,
    max_control: f64,
    state: f64,
    initial_state: f64,
}

impl Actuator {
    /// Create an actuator with time constant `tau` and saturation `max_control`
    ///
    /// `tau = 0` passes the (clamped) input straight through.
    pub fn new(tau: f64, max_control: f64) -> Self {
        Self::with_initial(tau, max_control, 0.0)
    }

    /// Like [`new`](Self::new), starting from `initial` instead of zero
    ///
    /// A NaN `max_control` leaves the output unbounded; a NaN `tau` or
    /// `initial` falls back to zero.
    pub fn with_initial(tau: f64, max_control: f64, initial: f64) -> Self {
        let max_control = if max_control.is_nan() {
            f64::INFINITY
        } else {
            max_control.abs()
        };
        let initial = if initial.is_nan() { 0.0 } else { initial };
        let initial = initial.clamp(-max_control, max_control);
        Self {
            tau: tau.max(0.0),
            max_control,
            state: initial,
            initial_state: initial,
        }
    }

    /// Advance the filter by `dt` with input `input`; returns the new state
    pub fn update(&mut self, input: f64, dt: f64) -> f64 {
        let target = input.clamp(-self.max_control, self.max_control);
        if dt > 0.0 {
            let a = dt / (self.tau + dt);
            self.state = a * target + (1.0 - a) * self.state;
        } else if self.tau == 0.0 {
            self.state = target;
        }
        self.state
    }

    pub fn state(&self) -> f64 {
        self.state
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn max_control(&self) -> f64 {
        self.max_control
    }

    pub fn reset(&mut self) {
        self.state = self.initial_state;
    }
}
