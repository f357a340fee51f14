//! Registry of stabilization schemes for the semi-implicit weak form

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Stabilization added to the linearised momentum/continuity system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stabilization {
    /// Plain Galerkin
    None,
    /// Streamline-upwind Petrov-Galerkin
    Supg,
    /// Galerkin least-squares (streamline plus pressure stabilization)
    Gls,
}

impl Stabilization {
    /// Registered names, in registry order
    pub const NAMES: [&'static str; 3] = ["none", "supg", "gls"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stabilization::None => "none",
            Stabilization::Supg => "supg",
            Stabilization::Gls => "gls",
        }
    }

    /// Whether the momentum equation receives streamline diffusion
    pub fn streamline(&self) -> bool {
        matches!(self, Stabilization::Supg | Stabilization::Gls)
    }

    /// Whether the continuity equation receives pressure stabilization
    pub fn pressure(&self) -> bool {
        matches!(self, Stabilization::Gls)
    }
}

impl Default for Stabilization {
    fn default() -> Self {
        Stabilization::None
    }
}

impl fmt::Display for Stabilization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stabilization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Stabilization::None),
            "supg" => Ok(Stabilization::Supg),
            "gls" => Ok(Stabilization::Gls),
            _ => Err(ConfigError::UnknownStabilization {
                name: s.to_string(),
                valid: Self::NAMES.join(", "),
            }),
        }
    }
}
