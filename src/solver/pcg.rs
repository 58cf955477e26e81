//! Preconditioned Conjugate Gradient with an SSOR preconditioner

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use super::{relative_residual, SolveReport, Solver, SolverError};
use crate::math::sparse::diagonal;
use crate::math::sparse_matvec;

/// Iterative solver for symmetric positive definite matrices
///
/// `solve` allocates its own work vectors, so one initialized solver can be
/// shared between threads.
pub struct PcgSolver {
    a: CsrMatrix<f64>,
    tolerance: f64,
    max_iterations: usize,
    omega: f64,
    diag: Option<Vec<f64>>,
}

impl PcgSolver {
    pub fn new(a: CsrMatrix<f64>, tolerance: f64, max_iterations: usize, omega: f64) -> Self {
        Self {
            a,
            tolerance,
            max_iterations,
            omega,
            diag: None,
        }
    }

    /// `z = M^-1 r` with the symmetric SOR splitting of `A`
    fn precondition(&self, diag: &[f64], r: &DVector<f64>) -> DVector<f64> {
        let n = r.len();
        let w = self.omega;
        let offsets = self.a.row_offsets();
        let cols = self.a.col_indices();
        let vals = self.a.values();

        // Forward sweep: (D/w + L) y = r
        let mut z = DVector::zeros(n);
        for i in 0..n {
            let mut sum = r[i];
            for idx in offsets[i]..offsets[i + 1] {
                let j = cols[idx];
                if j < i {
                    sum -= vals[idx] * z[j];
                }
            }
            z[i] = sum * w / diag[i];
        }

        // Scale by D/w
        for i in 0..n {
            z[i] *= diag[i] / w;
        }

        // Backward sweep: (D/w + U) z = y
        for i in (0..n).rev() {
            let mut sum = z[i];
            for idx in offsets[i]..offsets[i + 1] {
                let j = cols[idx];
                if j > i {
                    sum -= vals[idx] * z[j];
                }
            }
            z[i] = sum * w / diag[i];
        }

        z * ((2.0 - w) / w)
    }
}

impl Solver for PcgSolver {
    fn is_initialized(&self) -> bool {
        self.diag.is_some()
    }

    fn initialize(&mut self) -> Result<(), SolverError> {
        if self.diag.is_some() {
            return Ok(());
        }
        if self.a.nrows() != self.a.ncols() {
            return Err(SolverError::NotSquare {
                rows: self.a.nrows(),
                cols: self.a.ncols(),
            });
        }
        if !(self.omega > 0.0 && self.omega < 2.0) {
            return Err(SolverError::InvalidParameter(format!(
                "SSOR omega must lie in (0, 2), got {}",
                self.omega
            )));
        }

        let mut diag = Vec::with_capacity(self.a.nrows());
        for (row, d) in diagonal(&self.a).into_iter().enumerate() {
            match d {
                Some(v) if v > 0.0 => diag.push(v),
                Some(v) if v < 0.0 => return Err(SolverError::NotPositiveDefinite { row }),
                _ => return Err(SolverError::MissingDiagonal { row }),
            }
        }
        self.diag = Some(diag);
        Ok(())
    }

    fn solve(&self, b: &DVector<f64>, x: &mut DVector<f64>) -> Result<SolveReport, SolverError> {
        let diag = self.diag.as_deref().ok_or(SolverError::NotInitialized)?;
        let n = self.dimension();
        if b.len() != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                found: b.len(),
            });
        }

        *x = DVector::zeros(n);
        let b_norm = b.norm();
        if b_norm == 0.0 {
            return Ok(SolveReport::default());
        }

        let mut r = b.clone();
        let mut z = self.precondition(diag, &r);
        let mut p = z.clone();
        let mut r_dot_z = r.dot(&z);

        let mut best = x.clone();
        let mut best_residual = 1.0;

        for iteration in 1..=self.max_iterations {
            let ap = sparse_matvec(&self.a, &p);
            let p_dot_ap = p.dot(&ap);
            if p_dot_ap <= 0.0 {
                *x = best;
                return Err(SolverError::Breakdown(format!(
                    "non-positive curvature {:e} at iteration {}",
                    p_dot_ap, iteration
                )));
            }

            let alpha = r_dot_z / p_dot_ap;
            x.axpy(alpha, &p, 1.0);
            r.axpy(-alpha, &ap, 1.0);

            let residual = r.norm() / b_norm;
            if residual < best_residual {
                best_residual = residual;
                best.copy_from(x);
            }
            if residual < self.tolerance {
                return Ok(SolveReport {
                    iterations: iteration,
                    residual: relative_residual(&self.a, x, b),
                });
            }

            z = self.precondition(diag, &r);
            let r_dot_z_new = r.dot(&z);
            let beta = r_dot_z_new / r_dot_z;
            r_dot_z = r_dot_z_new;
            p = &z + beta * &p;
        }

        *x = best;
        Err(SolverError::NotConverged {
            iterations: self.max_iterations,
            residual: best_residual,
        })
    }

    fn dimension(&self) -> usize {
        self.a.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::SparseMatrixBuilder;
    use crate::solver::test_util::laplacian;
    use approx::assert_relative_eq;

    #[test]
    fn test_converges_on_laplacian() {
        let n = 40;
        let mut solver = PcgSolver::new(laplacian(n), 1e-12, 500, 1.0);
        solver.initialize().unwrap();
        let b = DVector::from_element(n, 1.0);
        let mut x = DVector::zeros(n);
        let report = solver.solve(&b, &mut x).unwrap();
        assert!(report.iterations > 0);
        // x_i = i (n + 1 - i) / 2, 1-based
        assert_relative_eq!(x[0], 20.0, epsilon = 1e-8);
        assert_relative_eq!(x[19], 20.0 * 21.0 / 2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_over_relaxation_converges() {
        let mut solver = PcgSolver::new(laplacian(30), 1e-10, 500, 1.5);
        solver.initialize().unwrap();
        let mut x = DVector::zeros(30);
        assert!(solver.solve(&DVector::from_element(30, 1.0), &mut x).is_ok());
    }

    #[test]
    fn test_iteration_cap_reports_best_iterate() {
        let mut solver = PcgSolver::new(laplacian(100), 1e-14, 3, 1.0);
        solver.initialize().unwrap();
        let mut x = DVector::zeros(100);
        match solver.solve(&DVector::from_element(100, 1.0), &mut x) {
            Err(SolverError::NotConverged { iterations, residual }) => {
                assert_eq!(iterations, 3);
                assert!(residual <= 1.0);
                assert_eq!(x.len(), 100);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_missing_diagonal_is_rejected() {
        let mut b = SparseMatrixBuilder::new(2);
        b.add(0, 0, 1.0);
        b.add(0, 1, 0.5);
        b.add(1, 0, 0.5);
        let mut solver = PcgSolver::new(b.to_csr(), 1e-10, 10, 1.0);
        assert_eq!(
            solver.initialize(),
            Err(SolverError::MissingDiagonal { row: 1 })
        );
    }

    #[test]
    fn test_omega_out_of_range() {
        let mut solver = PcgSolver::new(laplacian(3), 1e-10, 10, 2.0);
        assert!(matches!(
            solver.initialize(),
            Err(SolverError::InvalidParameter(_))
        ));
    }
}
