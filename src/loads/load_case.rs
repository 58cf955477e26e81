//! Load cases

use std::fmt;

use serde::{Deserialize, Serialize};

/// Nature of the loads grouped in a load case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadType {
    Default,
    Dead,
    Live,
    Snow,
    Wind,
    Quake,
    Crane,
    Other,
}

impl Default for LoadType {
    fn default() -> Self {
        Self::Default
    }
}

/// A load case groups related loads that are analysed together.
///
/// Two load cases are the same case when both the name and the load type match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadCase {
    /// Name of the load case
    pub name: String,
    /// Nature of the load case
    pub load_type: LoadType,
}

impl LoadCase {
    /// Create a new load case
    pub fn new(name: &str, load_type: LoadType) -> Self {
        Self {
            name: name.to_string(),
            load_type,
        }
    }

    pub fn dead(name: &str) -> Self {
        Self::new(name, LoadType::Dead)
    }

    pub fn live(name: &str) -> Self {
        Self::new(name, LoadType::Live)
    }

    pub fn wind(name: &str) -> Self {
        Self::new(name, LoadType::Wind)
    }
}

impl Default for LoadCase {
    fn default() -> Self {
        Self::new("Case 1", LoadType::Default)
    }
}

impl From<&str> for LoadCase {
    fn from(name: &str) -> Self {
        Self::new(name, LoadType::Default)
    }
}

impl fmt::Display for LoadCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.load_type)
    }
}
