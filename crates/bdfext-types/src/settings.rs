//! Run and integrator settings types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Krylov method handed to the field-equation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KrylovMethod {
    /// Apply the preconditioner once (direct solve when paired with LU)
    Preonly,
    /// Preconditioned BiCGStab
    Bicgstab,
}

impl Default for KrylovMethod {
    fn default() -> Self {
        KrylovMethod::Preonly
    }
}

impl KrylovMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            KrylovMethod::Preonly => "preonly",
            KrylovMethod::Bicgstab => "bicgstab",
        }
    }
}

impl fmt::Display for KrylovMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KrylovMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preonly" => Ok(KrylovMethod::Preonly),
            "bicgstab" => Ok(KrylovMethod::Bicgstab),
            other => Err(format!(
                "unknown Krylov method '{other}' (expected one of: preonly, bicgstab)"
            )),
        }
    }
}

/// Preconditioner strategy handed to the field-equation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preconditioner {
    /// Full LU factorization
    Lu,
    /// Diagonal scaling
    Jacobi,
    /// Velocity/pressure field split with a diagonal Schur complement estimate
    FieldSplit,
    /// No preconditioning
    None,
}

impl Default for Preconditioner {
    fn default() -> Self {
        Preconditioner::Lu
    }
}

impl Preconditioner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preconditioner::Lu => "lu",
            Preconditioner::Jacobi => "jacobi",
            Preconditioner::FieldSplit => "fieldsplit",
            Preconditioner::None => "none",
        }
    }
}

impl fmt::Display for Preconditioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preconditioner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lu" => Ok(Preconditioner::Lu),
            "jacobi" => Ok(Preconditioner::Jacobi),
            "fieldsplit" => Ok(Preconditioner::FieldSplit),
            "none" => Ok(Preconditioner::None),
            other => Err(format!(
                "unknown preconditioner '{other}' (expected one of: lu, jacobi, fieldsplit, none)"
            )),
        }
    }
}

/// Linear solver configuration
///
/// Passed through to the backend untouched; the integration scheme does not
/// depend on any of these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverParameters {
    /// Krylov method
    #[serde(default)]
    pub krylov: KrylovMethod,

    /// Relative residual tolerance for iterative methods
    #[serde(default = "default_rtol")]
    pub rtol: f64,

    /// Iteration cap for iterative methods
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Preconditioner strategy
    #[serde(default)]
    pub preconditioner: Preconditioner,
}

fn default_rtol() -> f64 {
    1e-6
}

fn default_max_iterations() -> usize {
    1000
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self::direct()
    }
}

impl SolverParameters {
    /// Direct factorization
    pub fn direct() -> Self {
        Self {
            krylov: KrylovMethod::Preonly,
            rtol: default_rtol(),
            max_iterations: default_max_iterations(),
            preconditioner: Preconditioner::Lu,
        }
    }

    /// BiCGStab with field-split (Schur complement) preconditioning
    pub fn field_split() -> Self {
        Self {
            krylov: KrylovMethod::Bicgstab,
            rtol: default_rtol(),
            max_iterations: default_max_iterations(),
            preconditioner: Preconditioner::FieldSplit,
        }
    }

    pub fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Time integration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorSettings {
    /// BDF/EXT order (1-3)
    #[serde(default = "default_order")]
    pub order: usize,

    /// Fixed time step
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Stabilization scheme name, checked against the registry at construction
    #[serde(default = "default_stabilization")]
    pub stabilization: String,

    /// Linear solver configuration
    #[serde(default)]
    pub solver: SolverParameters,
}

fn default_order() -> usize {
    3
}

fn default_dt() -> f64 {
    0.01
}

fn default_stabilization() -> String {
    "none".to_string()
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            order: default_order(),
            dt: default_dt(),
            stabilization: default_stabilization(),
            solver: SolverParameters::default(),
        }
    }
}

/// Stochastic forcing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseSettings {
    /// Number of samples to pre-generate; defaults to the planned step count
    #[serde(default)]
    pub samples: Option<usize>,

    /// Standard deviation of the white noise
    #[serde(default)]
    pub std_dev: f64,

    /// Low-pass cutoff frequency; unfiltered when absent
    #[serde(default)]
    pub cutoff: Option<f64>,

    /// RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            samples: None,
            std_dev: 0.0,
            cutoff: None,
            seed: None,
        }
    }
}

/// Reference channel domain parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Number of grid nodes
    #[serde(default = "default_nodes")]
    pub nodes: usize,

    /// Channel length
    #[serde(default = "default_length")]
    pub length: f64,

    /// Reynolds number (nu = 1/Re)
    #[serde(default = "default_reynolds")]
    pub reynolds: f64,

    /// Free-stream inlet velocity
    #[serde(default = "default_u_inf")]
    pub u_inf: f64,

    /// Penalty coefficient of the continuity equation
    #[serde(default = "default_penalty")]
    pub penalty: f64,

    /// Actuator time constant
    #[serde(default)]
    pub actuator_tau: f64,

    /// Actuator saturation
    #[serde(default = "default_max_control")]
    pub max_control: f64,

    /// Width of the body-force bump
    #[serde(default = "default_forcing_width")]
    pub forcing_width: f64,
}

fn default_nodes() -> usize {
    41
}

fn default_length() -> f64 {
    1.0
}

fn default_reynolds() -> f64 {
    100.0
}

fn default_u_inf() -> f64 {
    1.0
}

fn default_penalty() -> f64 {
    1e-2
}

fn default_max_control() -> f64 {
    0.5 * std::f64::consts::PI
}

fn default_forcing_width() -> f64 {
    0.1
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            length: default_length(),
            reynolds: default_reynolds(),
            u_inf: default_u_inf(),
            penalty: default_penalty(),
            actuator_tau: 0.0,
            max_control: default_max_control(),
            forcing_width: default_forcing_width(),
        }
    }
}

/// Complete run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Simulated duration
    #[serde(default = "default_duration")]
    pub duration: f64,

    #[serde(default)]
    pub integrator: IntegratorSettings,

    #[serde(default)]
    pub noise: NoiseSettings,

    #[serde(default)]
    pub channel: ChannelSettings,
}

fn default_duration() -> f64 {
    1.0
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            integrator: IntegratorSettings::default(),
            noise: NoiseSettings::default(),
            channel: ChannelSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "integrator": { "order": 2, "stabilization": "supg" } }"#;
        let settings: RunSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.integrator.order, 2);
        assert_eq!(settings.integrator.stabilization, "supg");
        assert_eq!(settings.integrator.dt, 0.01);
        assert_eq!(settings.integrator.solver, SolverParameters::direct());
        assert_eq!(settings.channel, ChannelSettings::default());
        assert!(settings.noise.samples.is_none());
    }

    #[test]
    fn test_solver_parameters_lowercase_names() {
        let json = r#"{ "krylov": "bicgstab", "preconditioner": "fieldsplit", "rtol": 1e-8 }"#;
        let params: SolverParameters = serde_json::from_str(json).unwrap();

        assert_eq!(params.krylov, KrylovMethod::Bicgstab);
        assert_eq!(params.preconditioner, Preconditioner::FieldSplit);
        assert_eq!(params.rtol, 1e-8);
        assert_eq!(params.max_iterations, 1000);
    }

    #[test]
    fn test_from_str_round_trips_display() {
        for p in [
            Preconditioner::Lu,
            Preconditioner::Jacobi,
            Preconditioner::FieldSplit,
            Preconditioner::None,
        ] {
            assert_eq!(p.to_string().parse::<Preconditioner>(), Ok(p));
        }
        assert!("gmres".parse::<KrylovMethod>().is_err());
        assert_eq!("BiCGStab".parse::<KrylovMethod>(), Ok(KrylovMethod::Bicgstab));
    }
}
