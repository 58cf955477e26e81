//! Prescribed support displacements

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use super::LoadCase;

/// Six component generalized displacement [DX, DY, DZ, RX, RY, RZ]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl Displacement {
    pub fn new(dx: f64, dy: f64, dz: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Self { dx, dy, dz, rx, ry, rz }
    }

    /// Pure translation
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(dx, dy, dz, 0.0, 0.0, 0.0)
    }

    /// Create from array [DX, DY, DZ, RX, RY, RZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3], arr[4], arr[5])
    }

    /// Get as array [DX, DY, DZ, RX, RY, RZ]
    pub fn as_array(&self) -> [f64; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    /// Get translation magnitude
    pub fn translation_magnitude(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }

    /// Get rotation magnitude
    pub fn rotation_magnitude(&self) -> f64 {
        (self.rx.powi(2) + self.ry.powi(2) + self.rz.powi(2)).sqrt()
    }
}

impl Add for Displacement {
    type Output = Displacement;

    fn add(self, rhs: Displacement) -> Displacement {
        let (a, b) = (self.as_array(), rhs.as_array());
        Displacement::from_array(std::array::from_fn(|i| a[i] + b[i]))
    }
}

impl AddAssign for Displacement {
    fn add_assign(&mut self, rhs: Displacement) {
        *self = *self + rhs;
    }
}

/// A settlement of a supported node for one load case.
///
/// Only components on DoFs fixed by the node's constraints have an effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub displacement: Displacement,
    pub case: LoadCase,
}

impl Settlement {
    pub fn new(displacement: Displacement, case: impl Into<LoadCase>) -> Self {
        Self {
            displacement,
            case: case.into(),
        }
    }
}
