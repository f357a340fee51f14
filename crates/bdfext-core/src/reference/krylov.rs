//! Preconditioned BiCGStab and the preconditioners of the dense backend

use bdfext_types::Preconditioner;
use nalgebra::linalg::LU;
use nalgebra::{DMatrix, DVector, Dyn};

use crate::error::LinearSolveError;
use crate::utils::constants::{BREAKDOWN_TOLERANCE, PIVOT_TOLERANCE};

/// Result of a converged iterative solve
#[derive(Debug, Clone)]
pub struct KrylovSolution {
    pub x: DVector<f64>,
    pub iterations: usize,
    pub residual: f64,
}

/// Factored preconditioner `M^{-1}`
pub enum PreconditionerOp {
    Identity,
    /// Inverse diagonal
    Diagonal(DVector<f64>),
    /// Exact factorisation
    Exact(LU<f64, Dyn, Dyn>),
}

impl PreconditionerOp {
    /// Build the preconditioner for `matrix`
    ///
    /// `n_velocity` splits the unknowns into velocity and pressure blocks for
    /// [`Preconditioner::FieldSplit`].
    pub fn build(
        kind: Preconditioner,
        matrix: &DMatrix<f64>,
        n_velocity: usize,
    ) -> Self {
        match kind {
            Preconditioner::None => PreconditionerOp::Identity,
            Preconditioner::Jacobi => {
                PreconditionerOp::Diagonal(invert_diagonal(&matrix.diagonal()))
            }
            Preconditioner::FieldSplit => {
                PreconditionerOp::Diagonal(invert_diagonal(&schur_diagonal(matrix, n_velocity)))
            }
            Preconditioner::Lu => PreconditionerOp::Exact(matrix.clone().lu()),
        }
    }

    /// Apply `M^{-1}` to `r`
    pub fn apply(&self, r: &DVector<f64>) -> Option<DVector<f64>> {
        match self {
            PreconditionerOp::Identity => Some(r.clone()),
            PreconditionerOp::Diagonal(inv) => Some(r.component_mul(inv)),
            PreconditionerOp::Exact(lu) => lu.solve(r).filter(|x| x.iter().all(|v| v.is_finite())),
        }
    }
}

/// Block-diagonal field-split preconditioner diagonal
///
/// For `[[A, B], [D, C]]` the velocity block keeps `diag(A)` and the pressure
/// block uses the "selfp" Schur approximation
/// `S = C - D * diag(A)^{-1} * B`, of which only the diagonal is kept.
pub fn schur_diagonal(matrix: &DMatrix<f64>, n_velocity: usize) -> DVector<f64> {
    let n = matrix.nrows();
    DVector::from_fn(n, |i, _| {
        if i < n_velocity {
            return matrix[(i, i)];
        }
        let mut s = matrix[(i, i)];
        for j in 0..n_velocity {
            let a = matrix[(j, j)];
            if a.abs() > PIVOT_TOLERANCE {
                s -= matrix[(i, j)] * matrix[(j, i)] / a;
            }
        }
        // Fall back to the plain pressure diagonal when the approximation degenerates
        if s.abs() > PIVOT_TOLERANCE {
            s
        } else {
            matrix[(i, i)]
        }
    })
}

fn invert_diagonal(diag: &DVector<f64>) -> DVector<f64> {
    diag.map(|d| if d.abs() > PIVOT_TOLERANCE { 1.0 / d } else { 1.0 })
}

/// Right-preconditioned BiCGStab starting from `x0`
///
/// Converges when `||b - A x|| <= rtol * ||b||` (or `<= rtol` for `b = 0`).
pub fn bicgstab(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    x0: DVector<f64>,
    precond: &PreconditionerOp,
    rtol: f64,
    max_iterations: usize,
) -> Result<KrylovSolution, LinearSolveError> {
    let b_norm = b.norm();
    let tol = if b_norm > 0.0 { rtol * b_norm } else { rtol };

    let mut x = x0;
    let mut r = b - a * &x;
    let mut residual = r.norm();
    if residual <= tol {
        return Ok(KrylovSolution {
            x,
            iterations: 0,
            residual,
        });
    }

    let r_hat = r.clone();
    let n = b.len();
    let mut p = DVector::zeros(n);
    let mut v = DVector::zeros(n);
    let mut rho_old = 1.0;
    let mut alpha = 1.0;
    let mut omega = 1.0;

    for iter in 1..=max_iterations {
        let rho = r_hat.dot(&r);
        if !rho.is_finite() || rho.abs() < BREAKDOWN_TOLERANCE {
            return Err(LinearSolveError::Breakdown { iterations: iter });
        }

        let beta = (rho / rho_old) * (alpha / omega);
        p = &r + (&p - &v * omega) * beta;

        let y = precond
            .apply(&p)
            .ok_or(LinearSolveError::Breakdown { iterations: iter })?;
        v = a * &y;

        let r_hat_v = r_hat.dot(&v);
        if r_hat_v.abs() < BREAKDOWN_TOLERANCE {
            return Err(LinearSolveError::Breakdown { iterations: iter });
        }
        alpha = rho / r_hat_v;

        let s = &r - &v * alpha;
        let s_norm = s.norm();
        if s_norm <= tol {
            x.axpy(alpha, &y, 1.0);
            return Ok(KrylovSolution {
                x,
                iterations: iter,
                residual: s_norm,
            });
        }

        let z = precond
            .apply(&s)
            .ok_or(LinearSolveError::Breakdown { iterations: iter })?;
        let t = a * &z;
        let t_t = t.dot(&t);
        if t_t < BREAKDOWN_TOLERANCE {
            return Err(LinearSolveError::Breakdown { iterations: iter });
        }
        omega = t.dot(&s) / t_t;

        x.axpy(alpha, &y, 1.0);
        x.axpy(omega, &z, 1.0);
        r = &s - &t * omega;
        residual = r.norm();

        if !residual.is_finite() {
            return Err(LinearSolveError::Breakdown { iterations: iter });
        }
        if residual <= tol {
            return Ok(KrylovSolution {
                x,
                iterations: iter,
                residual,
            });
        }
        if omega.abs() < BREAKDOWN_TOLERANCE {
            return Err(LinearSolveError::Breakdown { iterations: iter });
        }
        rho_old = rho;
    }

    Err(LinearSolveError::ConvergenceFailure {
        iterations: max_iterations,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn nonsymmetric() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            4,
            4,
            &[
                4.0, -1.0, 0.0, 0.5, //
                -2.0, 5.0, 1.0, 0.0, //
                0.0, 1.5, 3.0, -1.0, //
                0.3, 0.0, -0.5, 2.0,
            ],
        )
    }

    #[test]
    fn test_bicgstab_matches_lu() {
        let a = nonsymmetric();
        let b = DVector::from_vec(vec![1.0, -2.0, 0.5, 3.0]);
        let exact = a.clone().lu().solve(&b).unwrap();

        for kind in [
            Preconditioner::None,
            Preconditioner::Jacobi,
            Preconditioner::FieldSplit,
            Preconditioner::Lu,
        ] {
            let m = PreconditionerOp::build(kind, &a, 2);
            let sol = bicgstab(&a, &b, DVector::zeros(4), &m, 1e-12, 100).unwrap();
            assert_relative_eq!(sol.x, exact, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_exact_start_takes_no_iterations() {
        let a = nonsymmetric();
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let b = &a * &x;

        let sol = bicgstab(&a, &b, x.clone(), &PreconditionerOp::Identity, 1e-10, 10).unwrap();
        assert_eq!(sol.iterations, 0);
        assert_eq!(sol.x, x);
    }

    #[test]
    fn test_iteration_limit() {
        let a = nonsymmetric();
        let b = DVector::from_vec(vec![1.0, -2.0, 0.5, 3.0]);

        let err = bicgstab(&a, &b, DVector::zeros(4), &PreconditionerOp::Identity, 1e-14, 1)
            .unwrap_err();
        assert!(matches!(
            err,
            LinearSolveError::ConvergenceFailure { iterations: 1, .. }
        ));
    }

    #[test]
    fn test_schur_diagonal() {
        // [[2, 1], [4, 3]]: S = 3 - 4 * 1 / 2
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 4.0, 3.0]);
        let d = schur_diagonal(&m, 1);
        assert_relative_eq!(d[0], 2.0);
        assert_relative_eq!(d[1], 1.0);
    }
}
