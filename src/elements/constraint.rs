//! Per-DoF support constraints

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of DoFs carried by every node
pub const DOFS_PER_NODE: usize = 6;

/// Local degree of freedom of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dof {
    Dx,
    Dy,
    Dz,
    Rx,
    Ry,
    Rz,
}

impl Dof {
    pub const ALL: [Dof; DOFS_PER_NODE] = [Dof::Dx, Dof::Dy, Dof::Dz, Dof::Rx, Dof::Ry, Dof::Rz];

    /// Local index 0..6
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Dof> {
        Self::ALL.get(i).copied()
    }
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dof::Dx => "DX",
            Dof::Dy => "DY",
            Dof::Dz => "DZ",
            Dof::Rx => "RX",
            Dof::Ry => "RY",
            Dof::Rz => "RZ",
        };
        f.write_str(s)
    }
}

/// Constraint state of one DoF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DofConstraint {
    #[default]
    Released,
    Fixed,
}

impl DofConstraint {
    pub fn is_fixed(self) -> bool {
        self == DofConstraint::Fixed
    }

    fn from_bool(fixed: bool) -> Self {
        if fixed {
            DofConstraint::Fixed
        } else {
            DofConstraint::Released
        }
    }
}

/// Support conditions at a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub dx: DofConstraint,
    pub dy: DofConstraint,
    pub dz: DofConstraint,
    pub rx: DofConstraint,
    pub ry: DofConstraint,
    pub rz: DofConstraint,
}

impl Constraints {
    /// No restraints
    pub fn released() -> Self {
        Self::default()
    }

    /// All DoFs restrained
    pub fn fixed() -> Self {
        Self::with_restraints(true, true, true, true, true, true)
    }

    /// Translations restrained, rotations free
    pub fn pinned() -> Self {
        Self::with_restraints(true, true, true, false, false, false)
    }

    /// Rotations restrained, translations free
    pub fn fixed_rotations() -> Self {
        Self::with_restraints(false, false, false, true, true, true)
    }

    /// Only the X translation is free
    pub fn roller_x() -> Self {
        Self::with_restraints(false, true, true, true, true, true)
    }

    /// Create constraints with specific restraints
    pub fn with_restraints(dx: bool, dy: bool, dz: bool, rx: bool, ry: bool, rz: bool) -> Self {
        Self::from_array([dx, dy, dz, rx, ry, rz].map(DofConstraint::from_bool))
    }

    pub fn from_array(arr: [DofConstraint; DOFS_PER_NODE]) -> Self {
        Self {
            dx: arr[0],
            dy: arr[1],
            dz: arr[2],
            rx: arr[3],
            ry: arr[4],
            rz: arr[5],
        }
    }

    /// Get as array [DX, DY, DZ, RX, RY, RZ]
    pub fn as_array(&self) -> [DofConstraint; DOFS_PER_NODE] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    /// Constraint of a single DoF
    pub fn get(&self, dof: Dof) -> DofConstraint {
        self.as_array()[dof.index()]
    }

    /// Return a copy with one DoF changed
    pub fn with(mut self, dof: Dof, value: DofConstraint) -> Self {
        let mut arr = self.as_array();
        arr[dof.index()] = value;
        self = Self::from_array(arr);
        self
    }

    /// Count number of restrained DoFs
    pub fn fixed_count(&self) -> usize {
        self.as_array().iter().filter(|c| c.is_fixed()).count()
    }

    /// Check if any DoF is restrained
    pub fn is_supported(&self) -> bool {
        self.fixed_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constraints() {
        let c = Constraints::fixed();
        assert_eq!(c.fixed_count(), 6);
        assert!(c.get(Dof::Rz).is_fixed());
    }

    #[test]
    fn test_pinned_constraints() {
        let c = Constraints::pinned();
        assert_eq!(c.fixed_count(), 3);
        assert!(!c.get(Dof::Rx).is_fixed());
    }

    #[test]
    fn test_with_single_dof() {
        let c = Constraints::released().with(Dof::Dy, DofConstraint::Fixed);
        assert_eq!(c.fixed_count(), 1);
        assert!(c.dy.is_fixed());
    }

    #[test]
    fn test_dof_index_round_trip() {
        for (i, dof) in Dof::ALL.iter().enumerate() {
            assert_eq!(dof.index(), i);
            assert_eq!(Dof::from_index(i), Some(*dof));
        }
        assert_eq!(Dof::from_index(6), None);
    }
}
