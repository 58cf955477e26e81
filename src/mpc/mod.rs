//! Multi-point constraint (MPC) elements
//!
//! An MPC element emits linear equality rows `sum_j a_j * u_j = c` over the
//! global DoFs of the model. Rows are returned as a sparse matrix of shape
//! `(count, 6N + 1)` whose last column holds the constant `c`.

mod elimination;
mod hinge_link;
mod rigid_link;
mod telepathy_link;
mod virtual_constraint;

use std::fmt;

use nalgebra_sparse::{CooMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};

use crate::elements::{Node, NodeId};
use crate::error::{FEAError, FEAResult};
use crate::loads::{LoadCase, LoadType};

pub use elimination::{ConstraintSystem, DofKind, MasterMap, SlaveExpression};
pub use hinge_link::HingeLink;
pub use rigid_link::RigidLink;
pub use telepathy_link::TelepathyLink;
pub use virtual_constraint::VirtualConstraint;

/// Load cases an MPC element takes part in
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Applicability {
    #[default]
    AllLoads,
    LoadTypes(Vec<LoadType>),
    LoadCases(Vec<LoadCase>),
}

impl Applicability {
    pub fn applies_to(&self, case: &LoadCase) -> bool {
        match self {
            Applicability::AllLoads => true,
            Applicability::LoadTypes(types) => types.contains(&case.load_type),
            Applicability::LoadCases(cases) => cases.contains(case),
        }
    }
}

/// An element contributing constraint equations instead of stiffness
pub trait MpcElement: fmt::Debug + Send + Sync {
    /// Unique label
    fn label(&self) -> &str;

    /// Nodes the equations refer to
    fn nodes(&self) -> &[NodeId];

    fn applicability(&self) -> &Applicability;

    fn applies_to(&self, case: &LoadCase) -> bool {
        self.applicability().applies_to(case)
    }

    /// Number of rows returned by [`MpcElement::extra_equations`]
    fn extra_equations_count(&self, nodes: &[Node]) -> usize;

    /// Constraint rows of shape `(count, total_dofs + 1)`
    fn extra_equations(&self, nodes: &[Node], total_dofs: usize) -> FEAResult<CsrMatrix<f64>>;
}

/// Row-by-row writer for the equations of one MPC element
pub(crate) struct EquationRows {
    coo: CooMatrix<f64>,
    row: usize,
    total_dofs: usize,
}

impl EquationRows {
    pub(crate) fn new(count: usize, total_dofs: usize) -> Self {
        Self {
            coo: CooMatrix::new(count, total_dofs + 1),
            row: 0,
            total_dofs,
        }
    }

    /// Append `sum(a * u[dof]) = constant`
    pub(crate) fn push(&mut self, terms: &[(usize, f64)], constant: f64) -> FEAResult<()> {
        if self.row >= self.coo.nrows() {
            return Err(FEAError::InvalidInput(format!(
                "more than {} constraint rows emitted",
                self.coo.nrows()
            )));
        }
        for &(dof, a) in terms {
            if dof >= self.total_dofs {
                return Err(FEAError::InvalidInput(format!(
                    "constraint row refers to DoF {} of a {}-DoF model",
                    dof, self.total_dofs
                )));
            }
            if a != 0.0 {
                self.coo.push(self.row, dof, a);
            }
        }
        if constant != 0.0 {
            self.coo.push(self.row, self.total_dofs, constant);
        }
        self.row += 1;
        Ok(())
    }

    pub(crate) fn finish(self) -> CsrMatrix<f64> {
        CsrMatrix::from(&self.coo)
    }
}

/// Resolve the nodes of an MPC element, rejecting missing and duplicate ids
pub(crate) fn resolve_nodes<'a>(
    nodes: &'a [Node],
    ids: &[NodeId],
    label: &str,
) -> FEAResult<Vec<(NodeId, &'a Node)>> {
    let mut out: Vec<(NodeId, &Node)> = Vec::with_capacity(ids.len());
    for &id in ids {
        if out.iter().any(|(seen, _)| *seen == id) {
            continue;
        }
        let node = nodes.get(id.0).ok_or_else(|| {
            FEAError::NodeNotFound(format!("#{} (referenced by MPC element '{}')", id.0, label))
        })?;
        out.push((id, node));
    }
    Ok(out)
}
