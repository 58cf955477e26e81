//! Zone division of the reduced stiffness matrix
//!
//! With the free DoFs first and the known DoFs last, the reduced matrix splits
//! into four blocks:
//!
//! ```text
//! | RR  RF |   RR: m x m     RF: m x k
//! | FR  FF |   FR: k x m     FF: k x k
//! ```

use nalgebra_sparse::CsrMatrix;

use crate::dof_map::DofMap;
use crate::math::sparse::{diagonal, slice};

#[derive(Debug, Clone)]
pub struct ZoneDividedMatrix {
    pub released_released: CsrMatrix<f64>,
    pub released_fixed: CsrMatrix<f64>,
    pub fixed_released: CsrMatrix<f64>,
    pub fixed_fixed: CsrMatrix<f64>,
}

impl ZoneDividedMatrix {
    /// Slice `k_reduced` (`R x R`) at the free count of `map`
    pub fn divide(k_reduced: &CsrMatrix<f64>, map: &DofMap) -> Self {
        Self::split_at(k_reduced, map.m)
    }

    pub fn split_at(k: &CsrMatrix<f64>, m: usize) -> Self {
        let r = k.nrows();
        Self {
            released_released: slice(k, 0..m, 0..m),
            released_fixed: slice(k, 0..m, m..r),
            fixed_released: slice(k, m..r, 0..m),
            fixed_fixed: slice(k, m..r, m..r),
        }
    }

    pub fn free_count(&self) -> usize {
        self.released_released.nrows()
    }

    pub fn known_count(&self) -> usize {
        self.fixed_fixed.nrows()
    }

    /// Free reduced indices whose diagonal in RR is missing or zero
    pub fn zero_diagonals(&self) -> Vec<usize> {
        diagonal(&self.released_released)
            .into_iter()
            .enumerate()
            .filter(|(_, d)| d.map_or(true, |v| v == 0.0))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::SparseMatrixBuilder;

    fn matrix() -> CsrMatrix<f64> {
        let mut b = SparseMatrixBuilder::new(4);
        b.add(0, 0, 2.0);
        b.add(0, 3, -1.0);
        b.add(3, 0, -1.0);
        b.add(2, 2, 5.0);
        b.add(3, 3, 1.0);
        b.to_csr()
    }

    #[test]
    fn test_block_shapes() {
        let z = ZoneDividedMatrix::split_at(&matrix(), 2);
        assert_eq!(z.released_released.nrows(), 2);
        assert_eq!(z.released_fixed.ncols(), 2);
        assert_eq!(z.fixed_released.nrows(), 2);
        assert_eq!(z.fixed_fixed.nnz(), 2);
        assert_eq!(z.released_fixed.get_entry(0, 1).unwrap().into_value(), -1.0);
        assert_eq!(z.fixed_released.get_entry(1, 0).unwrap().into_value(), -1.0);
    }

    #[test]
    fn test_zero_diagonal_detection() {
        let z = ZoneDividedMatrix::split_at(&matrix(), 2);
        assert_eq!(z.zero_diagonals(), vec![1]);
    }

    #[test]
    fn test_empty_free_zone() {
        let z = ZoneDividedMatrix::split_at(&matrix(), 0);
        assert_eq!(z.free_count(), 0);
        assert_eq!(z.known_count(), 4);
        assert!(z.zero_diagonals().is_empty());
    }
}
