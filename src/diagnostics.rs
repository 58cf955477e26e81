//! Non-fatal findings collected while preparing an analysis

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::elements::{Dof, Node, DOFS_PER_NODE};
use crate::error::FEAError;
use crate::loads::LoadCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A free DoF has no stiffness
    ZeroStiffness,
    /// An MPC row became empty after substitution
    DependentConstraint,
    /// A node is not referenced by any element or MPC element
    UnconnectedNode,
    /// Equilibrium residual after a solve
    StaticsResidual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub load_case: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        load_case: Option<&LoadCase>,
        message: impl Into<String>,
    ) -> Self {
        let diagnostic = Self {
            kind,
            load_case: load_case.map(|c| c.name.clone()),
            message: message.into(),
        };
        log::warn!("{}", diagnostic);
        diagnostic
    }

    /// Whether this finding makes the reduced system singular
    pub fn is_singularity(&self) -> bool {
        matches!(
            self.kind,
            DiagnosticKind::ZeroStiffness | DiagnosticKind::DependentConstraint
        )
    }

    pub fn into_error(self) -> FEAError {
        FEAError::StructuralSingularity {
            load_case: self.load_case.unwrap_or_default(),
            message: self.message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.load_case {
            Some(case) => write!(f, "[{:?}] load case '{}': {}", self.kind, case, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

/// Human readable name of a global DoF, e.g. `N3.RZ`
pub fn dof_name(nodes: &[Node], dof: usize) -> String {
    let node = dof / DOFS_PER_NODE;
    let local = Dof::from_index(dof % DOFS_PER_NODE)
        .map(|d| d.to_string())
        .unwrap_or_default();
    match nodes.get(node) {
        Some(n) if !n.label.is_empty() => format!("{}.{}", n.label, local),
        _ => format!("#{}.{}", node, local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dof_name() {
        let nodes = vec![Node::new("A", 0.0, 0.0, 0.0), Node::new("", 1.0, 0.0, 0.0)];
        assert_eq!(dof_name(&nodes, 5), "A.RZ");
        assert_eq!(dof_name(&nodes, 7), "#1.DY");
    }

    #[test]
    fn test_singularity_converts_to_error() {
        let d = Diagnostic::new(
            DiagnosticKind::ZeroStiffness,
            Some(&LoadCase::from("D")),
            "no stiffness at A.RX",
        );
        assert!(d.is_singularity());
        match d.into_error() {
            FEAError::StructuralSingularity { load_case, message } => {
                assert_eq!(load_case, "D");
                assert!(message.contains("A.RX"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
