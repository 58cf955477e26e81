//! Skyline sparse Cholesky solver
//!
//! The matrix is reordered with reverse Cuthill-McKee to shrink the profile,
//! then factorized in place as `L * L^T` in row-wise skyline storage.

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use super::{relative_residual, SolveReport, Solver, SolverError};
use crate::math::{inverse_permutation, permute_symmetric, reverse_cuthill_mckee};

/// Smallest accepted pivot relative to the original diagonal entry of its row
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Lower triangle stored row by row from the first non-zero up to the diagonal
#[derive(Debug, Clone)]
struct Skyline {
    rows: Vec<Vec<f64>>,
    // Distance from the diagonal to the first stored entry of each row
    heights: Vec<usize>,
}

impl Skyline {
    fn from_csr(csr: &CsrMatrix<f64>) -> Self {
        let size = csr.nrows();
        let mut heights = vec![0usize; size];
        for (row, col, _) in csr.triplet_iter() {
            if col < row {
                heights[row] = heights[row].max(row - col);
            }
        }

        let mut rows: Vec<Vec<f64>> = heights.iter().map(|&h| vec![0.0; h + 1]).collect();
        for (row, col, &val) in csr.triplet_iter() {
            if col <= row {
                let start = row - heights[row];
                rows[row][col - start] += val;
            }
        }
        Self { rows, heights }
    }

    #[inline]
    fn start(&self, row: usize) -> usize {
        row - self.heights[row]
    }

    /// Entry `(row, col)` of the lower triangle, `col <= row`
    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        let start = self.start(row);
        if col < start {
            0.0
        } else {
            self.rows[row][col - start]
        }
    }

    fn factorize(&mut self) -> Result<(), SolverError> {
        for i in 0..self.rows.len() {
            let start_i = self.start(i);

            for j in start_i..i {
                let start = start_i.max(self.start(j));
                let mut sum = 0.0;
                for k in start..j {
                    sum += self.get(i, k) * self.get(j, k);
                }
                let diag_j = self.rows[j][self.heights[j]];
                self.rows[i][j - start_i] = (self.rows[i][j - start_i] - sum) / diag_j;
            }

            let a_ii = self.rows[i][self.heights[i]];
            let sum: f64 = self.rows[i][..self.heights[i]].iter().map(|v| v * v).sum();
            let diag = a_ii - sum;
            // A mechanism leaves only round-off of its diagonal
            if diag <= PIVOT_TOLERANCE * a_ii.abs() || !diag.is_finite() {
                return Err(SolverError::NotPositiveDefinite { row: i });
            }
            self.rows[i][self.heights[i]] = diag.sqrt();
        }
        Ok(())
    }

    /// Solve `L * L^T * x = b` in place
    fn substitute(&self, x: &mut DVector<f64>) {
        let n = self.rows.len();
        for i in 0..n {
            let start = self.start(i);
            let mut sum = 0.0;
            for j in start..i {
                sum += self.get(i, j) * x[j];
            }
            x[i] = (x[i] - sum) / self.get(i, i);
        }
        for i in (0..n).rev() {
            x[i] /= self.get(i, i);
            for j in self.start(i)..i {
                x[j] -= self.get(i, j) * x[i];
            }
        }
    }

    fn profile(&self) -> usize {
        self.heights.iter().map(|h| h + 1).sum()
    }
}

/// Direct solver for symmetric positive definite matrices
pub struct CholeskySolver {
    a: CsrMatrix<f64>,
    // perm[new] = old
    perm: Vec<usize>,
    factor: Option<Skyline>,
}

impl CholeskySolver {
    pub fn new(a: CsrMatrix<f64>) -> Self {
        Self {
            a,
            perm: Vec::new(),
            factor: None,
        }
    }
}

impl Solver for CholeskySolver {
    fn is_initialized(&self) -> bool {
        self.factor.is_some()
    }

    fn initialize(&mut self) -> Result<(), SolverError> {
        if self.factor.is_some() {
            return Ok(());
        }
        if self.a.nrows() != self.a.ncols() {
            return Err(SolverError::NotSquare {
                rows: self.a.nrows(),
                cols: self.a.ncols(),
            });
        }

        let perm = reverse_cuthill_mckee(&self.a);
        let mut skyline = Skyline::from_csr(&permute_symmetric(&self.a, &perm));
        log::debug!(
            "cholesky: {} unknowns, skyline profile {} (dense {})",
            self.a.nrows(),
            skyline.profile(),
            self.a.nrows() * (self.a.nrows() + 1) / 2
        );
        skyline.factorize().map_err(|e| match e {
            SolverError::NotPositiveDefinite { row } => {
                SolverError::NotPositiveDefinite { row: perm[row] }
            }
            other => other,
        })?;

        self.perm = perm;
        self.factor = Some(skyline);
        Ok(())
    }

    fn solve(&self, b: &DVector<f64>, x: &mut DVector<f64>) -> Result<SolveReport, SolverError> {
        let factor = self.factor.as_ref().ok_or(SolverError::NotInitialized)?;
        let n = self.dimension();
        if b.len() != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                found: b.len(),
            });
        }

        let mut y = DVector::from_iterator(n, self.perm.iter().map(|&old| b[old]));
        factor.substitute(&mut y);

        let inv = inverse_permutation(&self.perm);
        *x = DVector::from_iterator(n, inv.iter().map(|&new| y[new]));

        Ok(SolveReport {
            iterations: 0,
            residual: relative_residual(&self.a, x, b),
        })
    }

    fn dimension(&self) -> usize {
        self.a.nrows()
    }
}
