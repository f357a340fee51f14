//! Reference domain and backend
//!
//! A 1-D channel flow discretised with finite differences and a dense
//! nalgebra backend. These implement [`DomainModel`](crate::DomainModel) and
//! [`FieldSolver`](crate::solvers::FieldSolver) so the controller can be driven end to
//! end without an external FEM library.

mod channel;
mod dense;
pub mod krylov;

pub use channel::{ChannelFlow, INLET, OUTLET};
pub use dense::DenseChannelSolver;
