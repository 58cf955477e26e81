//! Distributed loads on frame elements

use serde::{Deserialize, Serialize};

use super::point_load::LoadDirection;
use super::LoadCase;

/// A uniform line load over the full length of an element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedLoad {
    /// Intensity (force per unit length)
    pub w: f64,
    /// Load direction
    pub direction: LoadDirection,
    /// Load case
    pub case: LoadCase,
}

impl DistributedLoad {
    /// Create a uniform distributed load
    pub fn uniform(w: f64, direction: LoadDirection, case: impl Into<LoadCase>) -> Self {
        Self {
            w,
            direction,
            case: case.into(),
        }
    }

    /// Create a downward (global -Y) uniform load
    pub fn gravity(w: f64, case: impl Into<LoadCase>) -> Self {
        Self::uniform(-w.abs(), LoadDirection::FY, case)
    }
}

/// Any load carried by an element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElementLoad {
    Point(super::PointLoad),
    Distributed(DistributedLoad),
}

impl ElementLoad {
    /// Load case of the load
    pub fn case(&self) -> &LoadCase {
        match self {
            ElementLoad::Point(p) => &p.case,
            ElementLoad::Distributed(d) => &d.case,
        }
    }
}

impl From<super::PointLoad> for ElementLoad {
    fn from(load: super::PointLoad) -> Self {
        ElementLoad::Point(load)
    }
}

impl From<DistributedLoad> for ElementLoad {
    fn from(load: DistributedLoad) -> Self {
        ElementLoad::Distributed(load)
    }
}
