//! Node - a point in 3D space carrying six DoFs

use serde::{Deserialize, Serialize};

use super::constraint::{Constraints, DOFS_PER_NODE};
use crate::loads::{Displacement, Force, LoadCase, NodalLoad, Settlement};

/// Index of a node within its model.
///
/// Assigned when the node is added and stable for the lifetime of the model;
/// the DoFs of node `i` occupy global indices `6 * i .. 6 * i + 6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Global index of the first DoF of this node
    pub fn first_dof(self) -> usize {
        self.0 * DOFS_PER_NODE
    }

    /// Global index of local DoF `local` (0..6)
    pub fn dof(self, local: usize) -> usize {
        self.first_dof() + local
    }
}

/// A 3D node in the finite element model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique label
    pub label: String,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
    /// Support conditions
    pub constraints: Constraints,
    /// Concentrated loads
    pub loads: Vec<NodalLoad>,
    /// Prescribed displacements of fixed DoFs
    pub settlements: Vec<Settlement>,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(label: &str, x: f64, y: f64, z: f64) -> Self {
        Self {
            label: label.to_string(),
            x,
            y,
            z,
            constraints: Constraints::released(),
            loads: Vec::new(),
            settlements: Vec::new(),
        }
    }

    /// Set the support conditions
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Sum of the concentrated loads of a load case
    pub fn total_load(&self, case: &LoadCase) -> Force {
        self.loads
            .iter()
            .filter(|l| l.case == *case)
            .fold(Force::ZERO, |acc, l| acc + l.force)
    }

    /// Sum of the settlements of a load case
    pub fn total_settlement(&self, case: &LoadCase) -> Displacement {
        self.settlements
            .iter()
            .filter(|s| s.case == *case)
            .fold(Displacement::default(), |acc, s| acc + s.displacement)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("", 0.0, 0.0, 0.0)
    }
}
