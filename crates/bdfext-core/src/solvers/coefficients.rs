//! Fixed-step BDF/EXT coefficient tables
//!
//! The semi-implicit scheme discretises the time derivative with a backward
//! differentiation formula and linearises the convective term around an
//! explicit extrapolation of the velocity (the "wind"):
//!
//! ```text
//! u_t ≈ (alpha * u^{n+1} - sum(beta_BDF[i] * u^{n-i})) / h
//! w   = sum(beta_EXT[i] * u^{n-i})
//! ```
//!
//! with `i = 0..order-1` and `u^{n-i}` ordered most recent first.
//!
//! # Tables
//!
//! | order | alpha | beta_BDF             | beta_EXT         |
//! |-------|-------|----------------------|------------------|
//! | 1     | 1     | [1]                  | [1]              |
//! | 2     | 3/2   | [2, -1/2]            | [2, -1]          |
//! | 3     | 11/6  | [3, -3/2, 1/3]       | [3, -3, 1]       |

use crate::error::ConfigError;

/// Highest supported BDF/EXT order
pub const MAX_ORDER: usize = 3;

const ALPHA_BDF: [f64; MAX_ORDER] = [1.0, 3.0 / 2.0, 11.0 / 6.0];

const BETA_BDF_1: [f64; 1] = [1.0];
const BETA_BDF_2: [f64; 2] = [2.0, -1.0 / 2.0];
const BETA_BDF_3: [f64; 3] = [3.0, -3.0 / 2.0, 1.0 / 3.0];

const BETA_EXT_1: [f64; 1] = [1.0];
const BETA_EXT_2: [f64; 2] = [2.0, -1.0];
const BETA_EXT_3: [f64; 3] = [3.0, -3.0, 1.0];

/// Coefficient set of one BDF/EXT order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// Order of the scheme
    pub order: usize,
    /// Weight of the unknown in the time derivative
    pub alpha: f64,
    /// Weights of prior states in the implicit derivative estimate
    pub beta_bdf: &'static [f64],
    /// Weights of prior states in the explicit wind extrapolation
    pub beta_ext: &'static [f64],
}

/// Look up the coefficients of a BDF/EXT order
///
/// # Errors
/// Returns [`ConfigError::UnsupportedOrder`] unless `1 <= order <= MAX_ORDER`.
pub fn coefficients(order: usize) -> Result<Coefficients, ConfigError> {
    let (beta_bdf, beta_ext): (&'static [f64], &'static [f64]) = match order {
        1 => (&BETA_BDF_1, &BETA_EXT_1),
        2 => (&BETA_BDF_2, &BETA_EXT_2),
        3 => (&BETA_BDF_3, &BETA_EXT_3),
        _ => {
            return Err(ConfigError::UnsupportedOrder {
                order,
                max: MAX_ORDER,
            })
        }
    };

    Ok(Coefficients {
        order,
        alpha: ALPHA_BDF[order - 1],
        beta_bdf,
        beta_ext,
    })
}
