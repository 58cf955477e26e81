//! Operators between the natural DoF order and the reduced order

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use crate::dof_map::DofMap;
use crate::math::SparseMatrixBuilder;

/// `Pu` (`6N x R`) with `u = Pu * ur + d`, and `Pf = Pu^T`
#[derive(Debug, Clone)]
pub struct PermutationPair {
    pub pu: CsrMatrix<f64>,
    pub pf: CsrMatrix<f64>,
    /// Constant part of the slave expressions, `6N`
    pub d: DVector<f64>,
}

/// Builds the permutation operators of a [`DofMap`]
pub struct PermutationGenerator;

impl PermutationGenerator {
    /// Displacement operator `Pu`: unit rows for reduced DoFs, expression rows for slaves
    pub fn displacement_permute(map: &DofMap) -> CsrMatrix<f64> {
        let mut builder = SparseMatrixBuilder::rectangular(map.total_dofs(), map.reduced_size());
        for (r, &g) in map.rmap1.iter().enumerate() {
            builder.add(g, r, 1.0);
        }
        for (&s, expr) in &map.slaves {
            for &(j, c) in &expr.terms {
                if let Some(r) = map.reduced_index(j) {
                    builder.add(s, r, c);
                }
            }
        }
        builder.to_csr()
    }

    /// Force operator `Pf = Pu^T`
    pub fn force_permute(map: &DofMap) -> CsrMatrix<f64> {
        Self::displacement_permute(map).transpose()
    }

    /// Slave constants scattered into a full-length vector
    pub fn slave_constants(map: &DofMap) -> DVector<f64> {
        let mut d = DVector::zeros(map.total_dofs());
        for (&s, expr) in &map.slaves {
            d[s] = expr.constant;
        }
        d
    }

    pub fn generate(map: &DofMap) -> PermutationPair {
        let pu = Self::displacement_permute(map);
        let pf = pu.transpose();
        PermutationPair {
            pu,
            pf,
            d: Self::slave_constants(map),
        }
    }

    /// Gather the reduced DoFs out of a full-length vector
    pub fn reduce_displacement(map: &DofMap, full: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(map.reduced_size(), map.rmap1.iter().map(|&g| full[g]))
    }

    /// Full-length vector from reduced values: scatter, then evaluate the slaves
    pub fn expand_displacement(map: &DofMap, reduced: &DVector<f64>) -> DVector<f64> {
        let mut full = DVector::zeros(map.total_dofs());
        for (r, &g) in map.rmap1.iter().enumerate() {
            full[g] = reduced[r];
        }
        for (&s, expr) in &map.slaves {
            let value = expr.evaluate(full.as_slice());
            full[s] = value;
        }
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Constraints, Node, NodeId};
    use crate::loads::LoadCase;
    use crate::math::sparse_matvec;
    use crate::mpc::{HingeLink, MpcElement};
    use approx::assert_relative_eq;

    fn linked_map() -> DofMap {
        let nodes = vec![
            Node::new("A", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed_rotations()),
            Node::new("B", 0.0, 0.0, 0.0),
        ];
        let mpc: Vec<Box<dyn MpcElement>> =
            vec![Box::new(HingeLink::new("H", vec![NodeId(0), NodeId(1)]))];
        DofMap::from_parts(&nodes, &mpc, &LoadCase::default()).unwrap()
    }

    #[test]
    fn test_round_trip_is_exact() {
        let map = linked_map();
        let ur = DVector::from_fn(map.reduced_size(), |i, _| (i as f64).sin() * 1e-3 + 0.1);
        let back = PermutationGenerator::reduce_displacement(
            &map,
            &PermutationGenerator::expand_displacement(&map, &ur),
        );
        assert_eq!(back, ur);
    }

    #[test]
    fn test_operator_matches_expansion() {
        let map = linked_map();
        let pair = PermutationGenerator::generate(&map);
        assert_eq!(pair.pu.nrows(), 12);
        assert_eq!(pair.pu.ncols(), map.reduced_size());
        assert_eq!(pair.pf.nrows(), map.reduced_size());

        let ur = DVector::from_fn(map.reduced_size(), |i, _| i as f64 + 1.0);
        let via_operator = sparse_matvec(&pair.pu, &ur) + &pair.d;
        let via_scatter = PermutationGenerator::expand_displacement(&map, &ur);
        assert_relative_eq!(via_operator, via_scatter);
        // B follows A
        assert_eq!(via_scatter[6], via_scatter[0]);
    }

    #[test]
    fn test_pure_permutation_without_slaves() {
        let nodes = vec![Node::new("A", 0.0, 0.0, 0.0).with_constraints(Constraints::pinned())];
        let map = DofMap::from_parts(&nodes, &[], &LoadCase::default()).unwrap();
        let pu = PermutationGenerator::displacement_permute(&map);
        assert_eq!(pu.nnz(), 6);
        assert!(pu.values().iter().all(|&v| v == 1.0));
    }
}
