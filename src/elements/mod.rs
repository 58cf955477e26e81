//! Structural elements module
//!
//! Elements only know how to produce their global stiffness matrix and the
//! equivalent nodal loads of a load case. Everything about DoF numbering,
//! constraints and solving lives in the analysis pipeline.

mod constraint;
mod frame;
mod material;
mod node;
mod section;
mod truss;

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::error::{FEAError, FEAResult};
use crate::loads::{Force, LoadCase};

pub use constraint::{Constraints, Dof, DofConstraint, DOFS_PER_NODE};
pub use frame::{FrameElement2Node, MemberReleases};
pub use material::Material;
pub use node::{Node, NodeId};
pub use section::Section;
pub use truss::TrussElement;

/// A finite element contributing stiffness and loads to the global system
///
/// `nodes` passed to every method is the model's full node list; elements look
/// up their own nodes through the ids returned by [`Element::nodes`].
pub trait Element: fmt::Debug + Send + Sync {
    /// Unique label
    fn label(&self) -> &str;

    /// Connected nodes in element order
    fn nodes(&self) -> &[NodeId];

    /// Stiffness matrix in global coordinates, `6k x 6k` for `k` nodes
    fn global_stiffness_matrix(&self, nodes: &[Node]) -> FEAResult<DMatrix<f64>>;

    /// Nodal loads equivalent to the element loads of a load case, one per node
    fn global_equivalent_nodal_loads(
        &self,
        nodes: &[Node],
        case: &LoadCase,
    ) -> FEAResult<Vec<Force>>;

    /// Load cases the element carries loads for
    fn load_cases(&self) -> Vec<LoadCase> {
        Vec::new()
    }

    /// Global DoF indices of the element, in the row order of its matrices
    fn dof_indices(&self) -> Vec<usize> {
        self.nodes()
            .iter()
            .flat_map(|n| (0..DOFS_PER_NODE).map(move |local| n.dof(local)))
            .collect()
    }

    /// End forces in global coordinates: `K_e * u_e - f_eq`
    fn end_forces(
        &self,
        nodes: &[Node],
        displacements: &DVector<f64>,
        case: &LoadCase,
    ) -> FEAResult<DVector<f64>> {
        let k = self.global_stiffness_matrix(nodes)?;
        let dofs = self.dof_indices();
        let u = DVector::from_iterator(dofs.len(), dofs.iter().map(|&d| displacements[d]));
        let f_eq = self.global_equivalent_nodal_loads(nodes, case)?;
        let f_eq = DVector::from_iterator(
            dofs.len(),
            f_eq.iter().flat_map(|f| f.as_array()),
        );
        Ok(k * u - f_eq)
    }
}

/// Look up a node of an element, reporting the element on failure
pub(crate) fn lookup<'a>(nodes: &'a [Node], id: NodeId, element: &str) -> FEAResult<&'a Node> {
    nodes.get(id.0).ok_or_else(|| {
        FEAError::NodeNotFound(format!("#{} (referenced by element '{}')", id.0, element))
    })
}
