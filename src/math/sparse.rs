//! Sparse matrix utilities
//!
//! Global stiffness matrices are typically 95-99% sparse. Assembly goes through
//! COO triplets, everything downstream works on CSR.

use std::collections::VecDeque;
use std::ops::Range;

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Sparse matrix builder using COO format
///
/// Repeated entries at the same position are summed on conversion, which is
/// exactly the direct stiffness method's accumulation rule.
pub struct SparseMatrixBuilder {
    nrows: usize,
    ncols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    /// Create a builder for a square matrix
    pub fn new(size: usize) -> Self {
        Self::rectangular(size, size)
    }

    /// Create a builder for an `nrows x ncols` matrix
    pub fn rectangular(nrows: usize, ncols: usize) -> Self {
        // 6 DoFs per node, ~10 connected nodes per node
        let estimated_nnz = nrows.max(ncols) * 60;
        Self {
            nrows,
            ncols,
            entries: Vec::with_capacity(estimated_nnz),
        }
    }

    /// Add a value to the matrix (accumulates if already exists)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.nrows && col < self.ncols);
        if value != 0.0 {
            self.entries.push((row, col, value));
        }
    }

    /// Scatter a dense element matrix at the given global DoF indices
    pub fn add_dense(&mut self, dofs: &[usize], k: &DMatrix<f64>) {
        for (i, &di) in dofs.iter().enumerate() {
            for (j, &dj) in dofs.iter().enumerate() {
                self.add(di, dj, k[(i, j)]);
            }
        }
    }

    /// Convert to CSR format
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.nrows, self.ncols);
        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }
        CsrMatrix::from(&coo)
    }

    /// Convert to dense matrix (for comparison/debugging)
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.nrows, self.ncols);
        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }
        mat
    }

    /// Number of pushed triplets (before duplicate summation)
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }
}

/// Sparse matrix-vector multiplication `y = A * x`
#[inline]
pub fn sparse_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    debug_assert_eq!(csr.ncols(), x.len());
    let mut y = DVector::zeros(csr.nrows());

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..csr.nrows() {
        let mut sum = 0.0;
        for idx in row_offsets[row]..row_offsets[row + 1] {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }
    y
}

/// Copy the `rows x cols` window of a CSR matrix into a new CSR matrix
///
/// Only stored entries are copied, so the result keeps the sparsity pattern.
pub fn slice(csr: &CsrMatrix<f64>, rows: Range<usize>, cols: Range<usize>) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(rows.len(), cols.len());
    for row in rows.clone() {
        let lane = csr.row(row);
        for (&col, &val) in lane.col_indices().iter().zip(lane.values()) {
            if cols.contains(&col) {
                coo.push(row - rows.start, col - cols.start, val);
            }
        }
    }
    CsrMatrix::from(&coo)
}

/// Stored diagonal value of every row, `None` where the diagonal is not stored
pub fn diagonal(csr: &CsrMatrix<f64>) -> Vec<Option<f64>> {
    let n = csr.nrows().min(csr.ncols());
    let mut diag = vec![None; n];
    for (row, col, &val) in csr.triplet_iter() {
        if row == col && row < n {
            diag[row] = Some(val);
        }
    }
    diag
}

/// Largest absolute difference between `A` and `A^T`
pub fn asymmetry(csr: &CsrMatrix<f64>) -> f64 {
    let t = csr.transpose();
    let mut worst: f64 = 0.0;
    for (row, col, &val) in csr.triplet_iter() {
        let mirrored = t
            .get_entry(row, col)
            .map(|e| e.into_value())
            .unwrap_or(0.0);
        worst = worst.max((val - mirrored).abs());
    }
    worst
}

/// Bandwidth reduction using Reverse Cuthill-McKee algorithm
///
/// Returns `perm` with `perm[new_index] = old_index`.
pub fn reverse_cuthill_mckee(csr: &CsrMatrix<f64>) -> Vec<usize> {
    let n = csr.nrows();
    if n == 0 {
        return vec![];
    }

    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (row, col, &val) in csr.triplet_iter() {
        if val != 0.0 && row != col {
            adj[row].push(col);
        }
    }

    let degrees: Vec<usize> = adj.iter().map(|v| v.len()).collect();
    for neighbors in &mut adj {
        neighbors.sort_by_key(|&i| (degrees[i], i));
    }

    let mut visited = vec![false; n];
    let mut result = Vec::with_capacity(n);
    let mut queue = VecDeque::new();

    // Each component starts from its lowest degree node
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (degrees[i], i));

    for &start in &order {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            result.push(node);
            for &neighbor in &adj[node] {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    result.reverse();
    result
}

/// Create inverse permutation
pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (new_idx, &old_idx) in perm.iter().enumerate() {
        inv[old_idx] = new_idx;
    }
    inv
}

/// Symmetric reordering `B[i, j] = A[perm[i], perm[j]]`
pub fn permute_symmetric(csr: &CsrMatrix<f64>, perm: &[usize]) -> CsrMatrix<f64> {
    let inv = inverse_permutation(perm);
    let mut coo = CooMatrix::new(csr.nrows(), csr.ncols());
    for (row, col, &val) in csr.triplet_iter() {
        coo.push(inv[row], inv[col], val);
    }
    CsrMatrix::from(&coo)
}
