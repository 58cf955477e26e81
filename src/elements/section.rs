//! Section properties for two-node elements

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Cross-section properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Cross-sectional area
    pub a: f64,
    /// Second moment of area about local y
    pub iy: f64,
    /// Second moment of area about local z
    pub iz: f64,
    /// Torsional constant
    pub j: f64,
}

impl Section {
    pub fn new(a: f64, iy: f64, iz: f64, j: f64) -> Self {
        Self { a, iy, iz, j }
    }

    /// Axial-only section (bending and torsion properties zero)
    pub fn axial(a: f64) -> Self {
        Self::new(a, 0.0, 0.0, 0.0)
    }

    /// Solid rectangle, `width` along local z and `depth` along local y
    pub fn rectangular(width: f64, depth: f64) -> Self {
        let (long, short) = if width > depth {
            (width, depth)
        } else {
            (depth, width)
        };
        // Roark's approximation
        let j = long * short.powi(3) / 3.0 * (1.0 - 0.63 * short / long);
        Self::new(
            width * depth,
            depth * width.powi(3) / 12.0,
            width * depth.powi(3) / 12.0,
            j,
        )
    }

    /// Solid circle
    pub fn circular(diameter: f64) -> Self {
        let r = diameter / 2.0;
        let i = PI * r.powi(4) / 4.0;
        Self::new(PI * r * r, i, i, 2.0 * i)
    }

    /// Hollow circle
    pub fn pipe(outer_diameter: f64, wall_thickness: f64) -> Self {
        let r_o = outer_diameter / 2.0;
        let r_i = r_o - wall_thickness;
        let i = PI * (r_o.powi(4) - r_i.powi(4)) / 4.0;
        Self::new(PI * (r_o * r_o - r_i * r_i), i, i, 2.0 * i)
    }

    /// Radius of gyration about local y
    pub fn ry(&self) -> f64 {
        (self.iy / self.a).sqrt()
    }

    /// Radius of gyration about local z
    pub fn rz(&self) -> f64 {
        (self.iz / self.a).sqrt()
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::rectangular(0.2, 0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangular_section() {
        let s = Section::rectangular(0.3, 0.5);
        assert_relative_eq!(s.a, 0.15);
        assert_relative_eq!(s.iz, 0.3 * 0.125 / 12.0);
        assert!(s.iz > s.iy);
    }

    #[test]
    fn test_circular_section_is_symmetric() {
        let s = Section::circular(0.5);
        assert_relative_eq!(s.iy, s.iz);
        assert_relative_eq!(s.j, s.iy + s.iz);
    }
}
