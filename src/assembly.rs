//! Global matrix and vector assembly
//!
//! All vectors are full length (`6N`) in node-major order.

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use crate::elements::DOFS_PER_NODE;
use crate::error::{FEAError, FEAResult};
use crate::loads::LoadCase;
use crate::math::SparseMatrixBuilder;
use crate::model::Mesh;

pub struct MatrixAssemblerUtil;

impl MatrixAssemblerUtil {
    /// Unconstrained global stiffness matrix
    pub fn assemble_full_stiffness_matrix(mesh: &Mesh) -> FEAResult<CsrMatrix<f64>> {
        let n = mesh.total_dofs();
        let mut builder = SparseMatrixBuilder::new(n);

        for element in &mesh.elements {
            let k = element.global_stiffness_matrix(&mesh.nodes)?;
            let dofs = element.dof_indices();
            if k.nrows() != dofs.len() || k.ncols() != dofs.len() {
                return Err(FEAError::InvalidInput(format!(
                    "element '{}' returned a {}x{} stiffness matrix for {} DoFs",
                    element.label(),
                    k.nrows(),
                    k.ncols(),
                    dofs.len()
                )));
            }
            if let Some(&bad) = dofs.iter().find(|&&d| d >= n) {
                return Err(FEAError::NodeNotFound(format!(
                    "#{} (referenced by element '{}')",
                    bad / DOFS_PER_NODE,
                    element.label()
                )));
            }
            builder.add_dense(&dofs, &k);
        }

        let k = builder.to_csr();
        log::debug!("assembled stiffness: {} DoFs, {} non-zeros", n, k.nnz());
        Ok(k)
    }

    /// Concentrated nodal loads of a load case
    pub fn assemble_concentrated_force_vector(mesh: &Mesh, case: &LoadCase) -> DVector<f64> {
        let mut f = DVector::zeros(mesh.total_dofs());
        for (i, node) in mesh.nodes.iter().enumerate() {
            let load = node.total_load(case).as_array();
            for local in 0..DOFS_PER_NODE {
                f[i * DOFS_PER_NODE + local] = load[local];
            }
        }
        f
    }

    /// Equivalent nodal loads of all element loads of a load case
    pub fn assemble_element_force_vector(mesh: &Mesh, case: &LoadCase) -> FEAResult<DVector<f64>> {
        let mut f = DVector::zeros(mesh.total_dofs());
        for element in &mesh.elements {
            let loads = element.global_equivalent_nodal_loads(&mesh.nodes, case)?;
            if loads.len() != element.nodes().len() {
                return Err(FEAError::InvalidInput(format!(
                    "element '{}' returned {} nodal loads for {} nodes",
                    element.label(),
                    loads.len(),
                    element.nodes().len()
                )));
            }
            for (node, load) in element.nodes().iter().zip(&loads) {
                for (local, value) in load.as_array().into_iter().enumerate() {
                    f[node.dof(local)] += value;
                }
            }
        }
        Ok(f)
    }

    /// Node settlements of a load case
    pub fn assemble_settlement_vector(mesh: &Mesh, case: &LoadCase) -> DVector<f64> {
        let mut u = DVector::zeros(mesh.total_dofs());
        for (i, node) in mesh.nodes.iter().enumerate() {
            let s = node.total_settlement(case).as_array();
            for local in 0..DOFS_PER_NODE {
                u[i * DOFS_PER_NODE + local] = s[local];
            }
        }
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Constraints, FrameElement2Node, Material, Node, NodeId, Section, TrussElement};
    use crate::loads::{Displacement, DistributedLoad, NodalLoad, Settlement};
    use crate::math::sparse::asymmetry;
    use approx::assert_relative_eq;

    fn two_bars() -> Mesh {
        let mut mesh = Mesh::default();
        mesh.nodes.push(Node::new("A", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed()));
        mesh.nodes.push(Node::new("B", 1.0, 0.0, 0.0));
        mesh.nodes.push(Node::new("C", 2.0, 0.0, 0.0));
        for (label, i, j) in [("T1", 0, 1), ("T2", 1, 2)] {
            mesh.elements.push(Box::new(TrussElement::new(
                label,
                NodeId(i),
                NodeId(j),
                Material::unit(),
                Section::axial(3.0),
            )));
        }
        mesh
    }

    #[test]
    fn test_shared_node_stiffness_is_summed() {
        let k = MatrixAssemblerUtil::assemble_full_stiffness_matrix(&two_bars()).unwrap();
        assert_eq!(k.nrows(), 18);
        // EA/L = 3 from each side of node B
        let kbb = k.get_entry(6, 6).unwrap().into_value();
        assert_relative_eq!(kbb, 6.0);
        assert_relative_eq!(k.get_entry(0, 6).unwrap().into_value(), -3.0);
        assert_eq!(asymmetry(&k), 0.0);
    }

    #[test]
    fn test_element_on_missing_node_is_rejected() {
        let mut mesh = two_bars();
        mesh.elements.push(Box::new(TrussElement::new(
            "T3",
            NodeId(2),
            NodeId(9),
            Material::unit(),
            Section::axial(1.0),
        )));
        assert!(MatrixAssemblerUtil::assemble_full_stiffness_matrix(&mesh).is_err());
    }

    #[test]
    fn test_force_vectors_by_case() {
        let mut mesh = two_bars();
        mesh.nodes[2].loads.push(NodalLoad::fx(5.0, "A"));
        mesh.nodes[2].loads.push(NodalLoad::fy(7.0, "B"));
        mesh.nodes[0]
            .settlements
            .push(Settlement::new(Displacement::translation(0.0, 0.1, 0.0), "A"));

        let case = crate::loads::LoadCase::from("A");
        let fc = MatrixAssemblerUtil::assemble_concentrated_force_vector(&mesh, &case);
        assert_eq!(fc[12], 5.0);
        assert_eq!(fc[13], 0.0);
        let us = MatrixAssemblerUtil::assemble_settlement_vector(&mesh, &case);
        assert_eq!(us[1], 0.1);
        assert_eq!(us.sum(), 0.1);
    }

    #[test]
    fn test_element_loads_are_scattered() {
        let mut mesh = Mesh::default();
        mesh.nodes.push(Node::new("A", 0.0, 0.0, 0.0));
        mesh.nodes.push(Node::new("B", 4.0, 0.0, 0.0));
        mesh.elements.push(Box::new(
            FrameElement2Node::new(
                "M",
                NodeId(0),
                NodeId(1),
                Material::unit(),
                Section::rectangular(1.0, 1.0),
            )
            .with_load(DistributedLoad::gravity(2.0, "D")),
        ));
        let case = crate::loads::LoadCase::from("D");
        let fe = MatrixAssemblerUtil::assemble_element_force_vector(&mesh, &case).unwrap();
        assert_relative_eq!(fe[1], -4.0, epsilon = 1e-12);
        assert_relative_eq!(fe[7], -4.0, epsilon = 1e-12);
        assert_relative_eq!(fe[5], -8.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(fe[11], 8.0 / 3.0, epsilon = 1e-12);
    }
}
