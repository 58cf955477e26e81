//! Virtual constraint: a support applied through constraint equations
//!
//! Behaves like a node constraint with a settlement, but can be limited to
//! some load cases through its [`Applicability`].

use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use super::{resolve_nodes, Applicability, EquationRows, MpcElement};
use crate::elements::{Constraints, Node, NodeId};
use crate::error::FEAResult;
use crate::loads::Displacement;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualConstraint {
    pub label: String,
    nodes: Vec<NodeId>,
    /// DoFs held on every node
    pub constraint: Constraints,
    /// Prescribed value of each held DoF
    pub settlement: Displacement,
    pub applicability: Applicability,
}

impl VirtualConstraint {
    pub fn new(label: &str, nodes: Vec<NodeId>, constraint: Constraints) -> Self {
        Self {
            label: label.to_string(),
            nodes,
            constraint,
            settlement: Displacement::default(),
            applicability: Applicability::AllLoads,
        }
    }

    pub fn with_settlement(mut self, settlement: Displacement) -> Self {
        self.settlement = settlement;
        self
    }

    pub fn with_applicability(mut self, applicability: Applicability) -> Self {
        self.applicability = applicability;
        self
    }
}

impl MpcElement for VirtualConstraint {
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
            .map(|n| n.len() * self.constraint.fixed_count())
            .unwrap_or(0)
    }

    fn extra_equations(&self, nodes: &[Node], total_dofs: usize) -> FEAResult<CsrMatrix<f64>> {
        let held = resolve_nodes(nodes, &self.nodes, &self.label)?;
        let values = self.settlement.as_array();
        let mut rows = EquationRows::new(held.len() * self.constraint.fixed_count(), total_dofs);
        for &(id, _) in &held {
            for (local, c) in self.constraint.as_array().iter().enumerate() {
                if c.is_fixed() {
                    rows.push(&[(id.dof(local), 1.0)], values[local])?;
                }
            }
        }
        Ok(rows.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_rows_use_rotation_settlement() {
        let nodes = vec![Node::new("A", 0.0, 0.0, 0.0)];
        let vc = VirtualConstraint::new("V", vec![NodeId(0)], Constraints::fixed_rotations())
            .with_settlement(Displacement::new(0.1, 0.0, 0.0, 0.0, 0.0, 0.02));
        assert_eq!(vc.extra_equations_count(&nodes), 3);
        let eqs = vc.extra_equations(&nodes, 6).unwrap();
        // Row 2 holds RZ
        assert_eq!(eqs.get_entry(2, 5).unwrap().into_value(), 1.0);
        assert_eq!(eqs.get_entry(2, 6).unwrap().into_value(), 0.02);
    }
}
