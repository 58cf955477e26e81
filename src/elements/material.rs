//! Material properties

use serde::{Deserialize, Serialize};

/// Linear elastic isotropic material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Modulus of elasticity (Young's modulus) in Pa
    pub e: f64,
    /// Shear modulus in Pa
    pub g: f64,
    /// Poisson's ratio
    pub nu: f64,
}

impl Material {
    pub fn new(e: f64, g: f64, nu: f64) -> Self {
        Self { e, g, nu }
    }

    /// Material from E and nu, with G = E / (2 (1 + nu))
    pub fn isotropic(e: f64, nu: f64) -> Self {
        Self::new(e, e / (2.0 * (1.0 + nu)), nu)
    }

    /// Structural steel, E = 200 GPa
    pub fn steel() -> Self {
        Self::new(200e9, 77e9, 0.3)
    }

    /// Aluminium 6061-T6, E = 68.9 GPa
    pub fn aluminum() -> Self {
        Self::new(68.9e9, 26e9, 0.33)
    }

    /// Unit material (E = G = 1), handy for hand-checkable models
    pub fn unit() -> Self {
        Self::new(1.0, 1.0, 0.0)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::steel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_isotropic_shear_modulus() {
        let mat = Material::isotropic(200e9, 0.3);
        assert_relative_eq!(mat.g, 200e9 / 2.6);
    }
}
