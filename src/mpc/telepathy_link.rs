//! Telepathy link: selected DoFs of several nodes move together

use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use super::{resolve_nodes, Applicability, EquationRows, MpcElement};
use crate::elements::{Dof, Node, NodeId};
use crate::error::{FEAError, FEAResult};

/// Equates the chosen DoFs of every node with those of the first node
///
/// Unlike [`super::HingeLink`] the nodes need not be coincident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelepathyLink {
    pub label: String,
    nodes: Vec<NodeId>,
    pub connected: Vec<Dof>,
    pub applicability: Applicability,
}

impl TelepathyLink {
    pub fn new(label: &str, nodes: Vec<NodeId>, connected: &[Dof]) -> Self {
        let mut dofs: Vec<Dof> = Vec::new();
        for &dof in connected {
            if !dofs.contains(&dof) {
                dofs.push(dof);
            }
        }
        dofs.sort_by_key(|d| d.index());
        Self {
            label: label.to_string(),
            nodes,
            connected: dofs,
            applicability: Applicability::AllLoads,
        }
    }

    pub fn with_applicability(mut self, applicability: Applicability) -> Self {
        self.applicability = applicability;
        self
    }
}

impl MpcElement for TelepathyLink {
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
            .map(|n| self.connected.len() * n.len().saturating_sub(1))
            .unwrap_or(0)
    }

    fn extra_equations(&self, nodes: &[Node], total_dofs: usize) -> FEAResult<CsrMatrix<f64>> {
        let linked = resolve_nodes(nodes, &self.nodes, &self.label)?;
        let Some(&(first, _)) = linked.first() else {
            return Err(FEAError::InvalidInput(format!(
                "telepathy link '{}' has no nodes",
                self.label
            )));
        };

        let mut rows = EquationRows::new(self.connected.len() * (linked.len() - 1), total_dofs);
        for &(id, _) in &linked[1..] {
            for dof in &self.connected {
                let local = dof.index();
                rows.push(&[(first.dof(local), 1.0), (id.dof(local), -1.0)], 0.0)?;
            }
        }
        Ok(rows.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connected_dofs_emit_rows() {
        let nodes = vec![
            Node::new("A", 0.0, 0.0, 0.0),
            Node::new("B", 5.0, 0.0, 0.0),
            Node::new("C", 9.0, 0.0, 0.0),
        ];
        let link = TelepathyLink::new(
            "T",
            vec![NodeId(0), NodeId(1), NodeId(2)],
            &[Dof::Rz, Dof::Dy, Dof::Rz],
        );
        assert_eq!(link.connected, vec![Dof::Dy, Dof::Rz]);
        assert_eq!(link.extra_equations_count(&nodes), 4);
        let eqs = link.extra_equations(&nodes, 18).unwrap();
        assert_eq!(eqs.nrows(), 4);
        // Row 3 ties C.RZ to A.RZ
        assert_eq!(eqs.get_entry(3, 5).unwrap().into_value(), 1.0);
        assert_eq!(eqs.get_entry(3, 17).unwrap().into_value(), -1.0);
    }
}
