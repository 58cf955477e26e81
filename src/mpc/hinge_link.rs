//! Hinge link: coincident nodes share translations, rotations stay independent

use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use super::{resolve_nodes, Applicability, EquationRows, MpcElement};
use crate::elements::{Node, NodeId};
use crate::error::{FEAError, FEAResult};

/// Ties the translations of every node to those of the first node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HingeLink {
    pub label: String,
    nodes: Vec<NodeId>,
    pub applicability: Applicability,
}

impl HingeLink {
    pub fn new(label: &str, nodes: Vec<NodeId>) -> Self {
        Self {
            label: label.to_string(),
            nodes,
            applicability: Applicability::AllLoads,
        }
    }

    pub fn with_applicability(mut self, applicability: Applicability) -> Self {
        self.applicability = applicability;
        self
    }
}

impl MpcElement for HingeLink {
    fn label(&self) -> &str {
        &self.label
    }

    fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    fn applicability(&self) -> &Applicability {
        &self.applicability
    }

    fn extra_equations_count(&self, nodes: &[Node]) -> usize {
        resolve_nodes(nodes, &self.nodes, &self.label)
            .map(|n| 3 * n.len().saturating_sub(1))
            .unwrap_or(0)
    }

    fn extra_equations(&self, nodes: &[Node], total_dofs: usize) -> FEAResult<CsrMatrix<f64>> {
        let linked = resolve_nodes(nodes, &self.nodes, &self.label)?;
        let Some(&(center, center_node)) = linked.first() else {
            return Err(FEAError::InvalidInput(format!(
                "hinge link '{}' has no nodes",
                self.label
            )));
        };

        let mut rows = EquationRows::new(3 * (linked.len() - 1), total_dofs);
        for &(id, node) in &linked[1..] {
            if node.distance_to(center_node) > 1e-9 {
                return Err(FEAError::InvalidGeometry(format!(
                    "nodes '{}' and '{}' of hinge link '{}' are not coincident",
                    center_node.label, node.label, self.label
                )));
            }
            for local in 0..3 {
                rows.push(&[(center.dof(local), 1.0), (id.dof(local), -1.0)], 0.0)?;
            }
        }
        Ok(rows.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_tie_translations() {
        let nodes = vec![Node::new("A", 1.0, 0.0, 0.0), Node::new("B", 1.0, 0.0, 0.0)];
        let link = HingeLink::new("H", vec![NodeId(0), NodeId(1)]);
        assert_eq!(link.extra_equations_count(&nodes), 3);
        let eqs = link.extra_equations(&nodes, 12).unwrap();
        assert_eq!((eqs.nrows(), eqs.ncols()), (3, 13));
        assert_eq!(eqs.get_entry(2, 2).unwrap().into_value(), 1.0);
        assert_eq!(eqs.get_entry(2, 8).unwrap().into_value(), -1.0);
    }

    #[test]
    fn test_separated_nodes_are_rejected() {
        let nodes = vec![Node::new("A", 0.0, 0.0, 0.0), Node::new("B", 1.0, 0.0, 0.0)];
        let link = HingeLink::new("H", vec![NodeId(0), NodeId(1)]);
        assert!(matches!(
            link.extra_equations(&nodes, 12),
            Err(FEAError::InvalidGeometry(_))
        ));
    }
}
