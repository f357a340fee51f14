//! Pre-generated stochastic forcing schedule
//!
//! The schedule is generated once, in full, before integration starts and is
//! consumed one sample per accepted step. Reading past the end is a fatal
//! [`StepError::NoiseExhausted`]: a schedule of length `N` serves exactly `N`
//! samples.
//!
//! Generators (white and low-pass filtered Gaussian noise) require the
//! `rand-support` feature.

use crate::error::StepError;

#[cfg(feature = "rand-support")]
use crate::error::ConfigError;
#[cfg(feature = "rand-support")]
use rand::rngs::StdRng;
#[cfg(feature = "rand-support")]
use rand::SeedableRng;
#[cfg(feature = "rand-support")]
use rand_distr::{Distribution, Normal};

/// Finite forcing sequence with a consumption cursor
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSchedule {
    samples: Vec<f64>,
    cursor: usize,
}

impl NoiseSchedule {
    /// Wrap an already generated sequence
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples, cursor: 0 }
    }

    /// Schedule of `len` zero samples (unforced run)
    pub fn zeros(len: usize) -> Self {
        Self::new(vec![0.0; len])
    }

    /// Gaussian white noise with standard deviation `std_dev`
    ///
    /// Uses a seeded `StdRng` when `seed` is given, entropy otherwise.
    #[cfg(feature = "rand-support")]
    pub fn white(len: usize, std_dev: f64, seed: Option<u64>) -> Result<Self, ConfigError> {
        if !(std_dev >= 0.0 && std_dev.is_finite()) {
            return Err(ConfigError::InvalidNoise(format!(
                "std_dev must be non-negative and finite, got {std_dev}"
            )));
        }
        let distribution = Normal::new(0.0, std_dev)
            .map_err(|e| ConfigError::InvalidNoise(format!("std_dev {std_dev}: {e}")))?;

        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let samples = (0..len).map(|_| distribution.sample(&mut rng)).collect();
        Ok(Self::new(samples))
    }

    /// White noise passed through a first-order low-pass filter
    ///
    /// Backward Euler discretisation of `H(s) = 1 / (1 + s*tau)` with
    /// `tau = 1 / (2*pi*cutoff)`:
    ///
    /// ```text
    /// y[n] = a * x[n] + (1 - a) * y[n-1],   a = dt / (tau + dt)
    /// ```
    #[cfg(feature = "rand-support")]
    pub fn filtered(
        len: usize,
        dt: f64,
        cutoff: f64,
        std_dev: f64,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if !(cutoff > 0.0 && cutoff.is_finite()) {
            return Err(ConfigError::InvalidNoise(format!(
                "cutoff frequency must be positive, got {cutoff}"
            )));
        }
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(ConfigError::InvalidTimestep(dt));
        }

        let white = Self::white(len, std_dev, seed)?;
        let tau = 1.0 / (2.0 * std::f64::consts::PI * cutoff);
        let a = dt / (tau + dt);

        let mut y = 0.0;
        let samples = white
            .samples
            .iter()
            .map(|&x| {
                y = a * x + (1.0 - a) * y;
                y
            })
            .collect();
        Ok(Self::new(samples))
    }

    /// Current sample, without consuming it
    pub fn peek(&self) -> Result<f64, StepError> {
        self.samples
            .get(self.cursor)
            .copied()
            .ok_or(StepError::NoiseExhausted {
                index: self.cursor,
                len: self.samples.len(),
            })
    }

    /// Commit consumption of the current sample
    ///
    /// Saturates at the schedule length.
    pub fn advance(&mut self) {
        if self.cursor < self.samples.len() {
            self.cursor += 1;
        }
    }

    /// Return the current sample and advance the cursor
    pub fn sample(&mut self) -> Result<f64, StepError> {
        let value = self.peek()?;
        self.advance();
        Ok(value)
    }

    /// Rewind the cursor; samples are kept as generated
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples left to consume
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}
