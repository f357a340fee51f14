//! Shared types for bdfext runs.
//!
//! Plain configuration data, serialisable with serde, used by the integration
//! core and the command-line front end:
//! - Integrator settings (order, time step, stabilization name)
//! - Linear solver parameters passed through to the backend
//! - Noise and reference-domain settings

mod settings;

pub use settings::*;
