//! Point loads on frame elements

use serde::{Deserialize, Serialize};

use super::LoadCase;

/// Direction of an element load
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoadDirection {
    /// Force in element's local x direction (axial)
    Fx,
    /// Force in element's local y direction
    Fy,
    /// Force in element's local z direction
    Fz,
    /// Moment about element's local x axis (torsion)
    Mx,
    /// Force in global X direction
    FX,
    /// Force in global Y direction
    FY,
    /// Force in global Z direction
    FZ,
}

impl LoadDirection {
    /// Check if this is a local coordinate direction
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            LoadDirection::Fx | LoadDirection::Fy | LoadDirection::Fz | LoadDirection::Mx
        )
    }

    /// Unit vector of a global direction, `None` for local directions
    pub fn global_axis(&self) -> Option<[f64; 3]> {
        match self {
            LoadDirection::FX => Some([1.0, 0.0, 0.0]),
            LoadDirection::FY => Some([0.0, 1.0, 0.0]),
            LoadDirection::FZ => Some([0.0, 0.0, 1.0]),
            _ => None,
        }
    }
}

/// A concentrated load on an element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointLoad {
    /// Load magnitude
    pub magnitude: f64,
    /// Distance from i-node
    pub position: f64,
    /// Load direction
    pub direction: LoadDirection,
    /// Load case
    pub case: LoadCase,
}

impl PointLoad {
    /// Create a new point load
    pub fn new(
        magnitude: f64,
        position: f64,
        direction: LoadDirection,
        case: impl Into<LoadCase>,
    ) -> Self {
        Self {
            magnitude,
            position,
            direction,
            case: case.into(),
        }
    }

    /// Create a downward (negative Y) point load in global coordinates
    pub fn downward(magnitude: f64, position: f64, case: impl Into<LoadCase>) -> Self {
        Self::new(-magnitude.abs(), position, LoadDirection::FY, case)
    }

    /// Create an axial load (in local x direction)
    pub fn axial(magnitude: f64, position: f64, case: impl Into<LoadCase>) -> Self {
        Self::new(magnitude, position, LoadDirection::Fx, case)
    }
}
