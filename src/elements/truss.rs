//! Two-node truss element (axial stiffness only)

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::{lookup, Element, Material, Node, NodeId, Section};
use crate::error::{FEAError, FEAResult};
use crate::loads::{Force, LoadCase};

/// Pin-ended bar carrying axial force only
///
/// Rotational DoFs of the end nodes receive no stiffness from a truss; they
/// must be held by other elements or by node constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrussElement {
    pub label: String,
    nodes: [NodeId; 2],
    pub material: Material,
    pub section: Section,
}

impl TrussElement {
    pub fn new(
        label: &str,
        i_node: NodeId,
        j_node: NodeId,
        material: Material,
        section: Section,
    ) -> Self {
        Self {
            label: label.to_string(),
            nodes: [i_node, j_node],
            material,
            section,
        }
    }

    /// Axial rigidity over length and the unit vector from i to j
    fn axis(&self, nodes: &[Node]) -> FEAResult<(f64, [f64; 3])> {
        let i = lookup(nodes, self.nodes[0], &self.label)?;
        let j = lookup(nodes, self.nodes[1], &self.label)?;
        let length = i.distance_to(j);
        if length < 1e-10 {
            return Err(FEAError::InvalidGeometry(format!(
                "truss '{}' has zero length",
                self.label
            )));
        }
        let c = [
            (j.x - i.x) / length,
            (j.y - i.y) / length,
            (j.z - i.z) / length,
        ];
        Ok((self.material.e * self.section.a / length, c))
    }

    /// Axial force for the given end displacements (positive in tension)
    pub fn axial_force(&self, nodes: &[Node], u_i: [f64; 3], u_j: [f64; 3]) -> FEAResult<f64> {
        let (ea_l, c) = self.axis(nodes)?;
        let elongation: f64 = (0..3).map(|k| c[k] * (u_j[k] - u_i[k])).sum();
        Ok(ea_l * elongation)
    }
}

impl Element for TrussElement {
    fn label(&self) -> &str {
        &self.label
    }

    fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    fn global_stiffness_matrix(&self, nodes: &[Node]) -> FEAResult<DMatrix<f64>> {
        let (ea_l, c) = self.axis(nodes)?;
        let mut k = DMatrix::zeros(12, 12);
        for a in 0..3 {
            for b in 0..3 {
                let v = ea_l * c[a] * c[b];
                k[(a, b)] = v;
                k[(a + 6, b + 6)] = v;
                k[(a, b + 6)] = -v;
                k[(a + 6, b)] = -v;
            }
        }
        Ok(k)
    }

    fn global_equivalent_nodal_loads(
        &self,
        _nodes: &[Node],
        _case: &LoadCase,
    ) -> FEAResult<Vec<Force>> {
        Ok(vec![Force::ZERO; 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inclined_truss_stiffness() {
        let nodes = vec![Node::new("A", 0.0, 0.0, 0.0), Node::new("B", 3.0, 4.0, 0.0)];
        let truss = TrussElement::new("T", NodeId(0), NodeId(1), Material::unit(), Section::axial(5.0));
        let k = truss.global_stiffness_matrix(&nodes).unwrap();
        // EA/L = 1
        assert_relative_eq!(k[(0, 0)], 0.36, epsilon = 1e-12);
        assert_relative_eq!(k[(0, 1)], 0.48, epsilon = 1e-12);
        assert_relative_eq!(k[(1, 7)], -0.64, epsilon = 1e-12);
        assert_eq!(k[(3, 3)], 0.0);
    }

    #[test]
    fn test_axial_force_in_tension() {
        let nodes = vec![Node::new("A", 0.0, 0.0, 0.0), Node::new("B", 2.0, 0.0, 0.0)];
        let truss = TrussElement::new("T", NodeId(0), NodeId(1), Material::unit(), Section::axial(4.0));
        let n = truss
            .axial_force(&nodes, [0.0; 3], [0.1, 0.0, 0.0])
            .unwrap();
        assert_relative_eq!(n, 0.2, epsilon = 1e-12);
    }
}
