//! Rigid link: slave nodes follow the rigid-body motion of a master node

use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use super::{resolve_nodes, Applicability, EquationRows, MpcElement};
use crate::elements::{Node, NodeId};
use crate::error::{FEAError, FEAResult};

/// Rigid connection between the first node (master) and all others
///
/// For every other node `s`: `u_s = u_m + theta_m x (x_s - x_m)` and
/// `theta_s = theta_m`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidLink {
    pub label: String,
    nodes: Vec<NodeId>,
    pub applicability: Applicability,
}

impl RigidLink {
    pub fn new(label: &str, master: NodeId, slaves: &[NodeId]) -> Self {
        let mut nodes = vec![master];
        nodes.extend_from_slice(slaves);
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

impl MpcElement for RigidLink {
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
            .map(|n| 6 * n.len().saturating_sub(1))
            .unwrap_or(0)
    }

    fn extra_equations(&self, nodes: &[Node], total_dofs: usize) -> FEAResult<CsrMatrix<f64>> {
        let linked = resolve_nodes(nodes, &self.nodes, &self.label)?;
        let Some(&(m, master)) = linked.first() else {
            return Err(FEAError::InvalidInput(format!(
                "rigid link '{}' has no nodes",
                self.label
            )));
        };

        let mut rows = EquationRows::new(6 * (linked.len() - 1), total_dofs);
        for &(s, slave) in &linked[1..] {
            let (rx, ry, rz) = (slave.x - master.x, slave.y - master.y, slave.z - master.z);

            // u_s - u_m - theta_m x r = 0
            rows.push(
                &[(s.dof(0), 1.0), (m.dof(0), -1.0), (m.dof(4), -rz), (m.dof(5), ry)],
                0.0,
            )?;
            rows.push(
                &[(s.dof(1), 1.0), (m.dof(1), -1.0), (m.dof(3), rz), (m.dof(5), -rx)],
                0.0,
            )?;
            rows.push(
                &[(s.dof(2), 1.0), (m.dof(2), -1.0), (m.dof(3), -ry), (m.dof(4), rx)],
                0.0,
            )?;
            for local in 3..6 {
                rows.push(&[(s.dof(local), 1.0), (m.dof(local), -1.0)], 0.0)?;
            }
        }
        Ok(rows.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lever_arm_terms() {
        let nodes = vec![Node::new("M", 0.0, 0.0, 0.0), Node::new("S", 2.0, 0.0, 0.0)];
        let link = RigidLink::new("R", NodeId(0), &[NodeId(1)]);
        assert_eq!(link.extra_equations_count(&nodes), 6);
        let eqs = link.extra_equations(&nodes, 12).unwrap();
        // Rotation about Z moves the slave in +Y: u_sy - u_my - 2 * rz_m = 0
        assert_eq!(eqs.get_entry(1, 7).unwrap().into_value(), 1.0);
        assert_eq!(eqs.get_entry(1, 1).unwrap().into_value(), -1.0);
        assert_eq!(eqs.get_entry(1, 5).unwrap().into_value(), -2.0);
        // No lever arm along Y or Z
        assert_eq!(eqs.get_entry(0, 4).unwrap().into_value(), 0.0);
    }
}
