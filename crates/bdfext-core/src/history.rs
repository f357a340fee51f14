//! Rolling history of accepted velocity states
//!
//! Holds up to `k` prior velocity fields, most recent first. Every slot owns an
//! independent copy of its state. The multistep combinations (wind and
//! BDF estimate) read only the leading `order` entries and never mutate the
//! buffer.

use nalgebra::DVector;
use std::collections::VecDeque;

use crate::error::ConfigError;
use crate::solvers::{coefficients, Coefficients};

/// Fixed-capacity history buffer
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: VecDeque<DVector<f64>>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` states
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Fill every slot with a copy of `initial`
    pub fn seed(&mut self, initial: &DVector<f64>) {
        self.slots.clear();
        for _ in 0..self.capacity {
            self.slots.push_back(initial.clone());
        }
    }

    /// Insert `state` as the newest entry, dropping the oldest when full
    pub fn rotate(&mut self, state: DVector<f64>) {
        if self.capacity == 0 {
            return;
        }
        while self.slots.len() >= self.capacity {
            self.slots.pop_back();
        }
        self.slots.push_front(state);
    }

    /// Explicit extrapolation `sum(beta_EXT[i] * history[i])`
    pub fn wind(&self, order: usize) -> Result<DVector<f64>, ConfigError> {
        let c = self.checked_coefficients(order)?;
        Ok(self.combine(c.beta_ext))
    }

    /// Implicit derivative estimate `sum(beta_BDF[i] * history[i])`
    pub fn bdf_estimate(&self, order: usize) -> Result<DVector<f64>, ConfigError> {
        let c = self.checked_coefficients(order)?;
        Ok(self.combine(c.beta_bdf))
    }

    // Callers go through `checked_coefficients`, so the buffer is non-empty
    fn combine(&self, weights: &[f64]) -> DVector<f64> {
        let mut acc = DVector::zeros(self.slots[0].len());
        for (w, state) in weights.iter().zip(self.slots.iter()) {
            acc.axpy(*w, state, 1.0);
        }
        acc
    }

    fn checked_coefficients(&self, order: usize) -> Result<Coefficients, ConfigError> {
        let c = coefficients(order)?;
        if order > self.slots.len() {
            return Err(ConfigError::HistoryTooShort {
                order,
                len: self.slots.len(),
            });
        }
        Ok(c)
    }

    /// Entry `i` (0 = most recent)
    pub fn get(&self, i: usize) -> Option<&DVector<f64>> {
        self.slots.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DVector<f64>> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Dimension of the stored states, if any
    pub fn dim(&self) -> Option<usize> {
        self.slots.front().map(|s| s.len())
    }
}
