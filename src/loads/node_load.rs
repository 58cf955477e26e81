//! Node loads - forces and moments applied directly to nodes

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::LoadCase;

/// Six component generalized force [FX, FY, FZ, MX, MY, MZ]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Force {
    /// Force in X direction (N)
    pub fx: f64,
    /// Force in Y direction (N)
    pub fy: f64,
    /// Force in Z direction (N)
    pub fz: f64,
    /// Moment about X axis (N·m)
    pub mx: f64,
    /// Moment about Y axis (N·m)
    pub my: f64,
    /// Moment about Z axis (N·m)
    pub mz: f64,
}

impl Force {
    pub const ZERO: Force = Force {
        fx: 0.0,
        fy: 0.0,
        fz: 0.0,
        mx: 0.0,
        my: 0.0,
        mz: 0.0,
    };

    pub fn new(fx: f64, fy: f64, fz: f64, mx: f64, my: f64, mz: f64) -> Self {
        Self { fx, fy, fz, mx, my, mz }
    }

    /// Create from array [FX, FY, FZ, MX, MY, MZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3], arr[4], arr[5])
    }

    /// Get the force as an array [FX, FY, FZ, MX, MY, MZ]
    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }

    /// Get total force magnitude
    pub fn force_magnitude(&self) -> f64 {
        (self.fx.powi(2) + self.fy.powi(2) + self.fz.powi(2)).sqrt()
    }

    /// Get total moment magnitude
    pub fn moment_magnitude(&self) -> f64 {
        (self.mx.powi(2) + self.my.powi(2) + self.mz.powi(2)).sqrt()
    }
}

impl Add for Force {
    type Output = Force;

    fn add(self, rhs: Force) -> Force {
        let (a, b) = (self.as_array(), rhs.as_array());
        Force::from_array(std::array::from_fn(|i| a[i] + b[i]))
    }
}

impl AddAssign for Force {
    fn add_assign(&mut self, rhs: Force) {
        *self = *self + rhs;
    }
}

impl Sub for Force {
    type Output = Force;

    fn sub(self, rhs: Force) -> Force {
        self + (-rhs)
    }
}

impl Neg for Force {
    type Output = Force;

    fn neg(self) -> Force {
        self * -1.0
    }
}

impl Mul<f64> for Force {
    type Output = Force;

    fn mul(self, factor: f64) -> Force {
        Force::from_array(self.as_array().map(|v| v * factor))
    }
}

/// A concentrated load applied directly to a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodalLoad {
    /// Load components
    pub force: Force,
    /// Load case this load belongs to
    pub case: LoadCase,
}

impl NodalLoad {
    /// Create a new node load with all components
    pub fn new(force: Force, case: impl Into<LoadCase>) -> Self {
        Self {
            force,
            case: case.into(),
        }
    }

    /// Create a force-only node load
    pub fn force(fx: f64, fy: f64, fz: f64, case: impl Into<LoadCase>) -> Self {
        Self::new(Force::new(fx, fy, fz, 0.0, 0.0, 0.0), case)
    }

    /// Create a moment-only node load
    pub fn moment(mx: f64, my: f64, mz: f64, case: impl Into<LoadCase>) -> Self {
        Self::new(Force::new(0.0, 0.0, 0.0, mx, my, mz), case)
    }

    /// Create a load in X direction
    pub fn fx(value: f64, case: impl Into<LoadCase>) -> Self {
        Self::force(value, 0.0, 0.0, case)
    }

    /// Create a load in Y direction
    pub fn fy(value: f64, case: impl Into<LoadCase>) -> Self {
        Self::force(0.0, value, 0.0, case)
    }

    /// Create a load in Z direction
    pub fn fz(value: f64, case: impl Into<LoadCase>) -> Self {
        Self::force(0.0, 0.0, value, case)
    }
}
