//! Mathematical utilities: element kernels and sparse linear algebra

pub mod sparse;

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3};

use crate::error::{FEAError, FEAResult};

pub use sparse::{
    inverse_permutation, permute_symmetric, reverse_cuthill_mckee, sparse_matvec,
    SparseMatrixBuilder,
};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// 12x12 matrix for two-node element stiffness
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for two-node element forces/displacements
pub type Vec12 = SVector<f64, 12>;

/// Direction cosine matrix of a two-node element (rows are local x, y, z in global coordinates)
///
/// Local x runs from `i_node` to `j_node`. For horizontal elements local y is global Y;
/// for vertical elements local z is global Z. `rotation` turns the section about local x.
pub fn rotation_matrix(i_node: &[f64; 3], j_node: &[f64; 3], rotation: f64) -> FEAResult<Mat3> {
    let d = Vec3::new(
        j_node[0] - i_node[0],
        j_node[1] - i_node[1],
        j_node[2] - i_node[2],
    );
    let length = d.norm();
    if length < 1e-10 {
        return Err(FEAError::InvalidGeometry(format!(
            "element has zero length between {:?} and {:?}",
            i_node, j_node
        )));
    }
    let x = d / length;

    let (y, z) = if x[0].abs() < 1e-10 && x[2].abs() < 1e-10 {
        // Vertical: y in the XY plane, z = global Z
        let y = if x[1] > 0.0 {
            Vec3::new(-1.0, 0.0, 0.0)
        } else {
            Vec3::new(1.0, 0.0, 0.0)
        };
        (y, Vec3::z())
    } else if d[1].abs() < 1e-10 {
        // Horizontal: y = global Y
        let y = Vec3::y();
        (y, x.cross(&y).normalize())
    } else {
        // Inclined: z is horizontal
        let proj = Vec3::new(d[0], 0.0, d[2]);
        let z = if x[1] > 0.0 {
            proj.cross(&x)
        } else {
            x.cross(&proj)
        }
        .normalize();
        (z.cross(&x).normalize(), z)
    };

    let (y, z) = if rotation.abs() > 1e-10 {
        let (s, c) = rotation.sin_cos();
        (y * c + z * s, -y * s + z * c)
    } else {
        (y, z)
    };

    Ok(Mat3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]))
}

/// 12x12 transformation matrix from global to local coordinates
pub fn member_transformation_matrix(
    i_node: &[f64; 3],
    j_node: &[f64; 3],
    rotation: f64,
) -> FEAResult<Mat12> {
    let r = rotation_matrix(i_node, j_node, rotation)?;
    let mut t = Mat12::zeros();
    for block in 0..4 {
        t.fixed_view_mut::<3, 3>(block * 3, block * 3).copy_from(&r);
    }
    Ok(t)
}

/// Local stiffness matrix of a 3D Euler-Bernoulli frame element
///
/// DoF order is [u, v, w, θx, θy, θz] at i followed by the same at j.
pub fn member_local_stiffness(
    e: f64,
    g: f64,
    a: f64,
    iy: f64,
    iz: f64,
    j: f64,
    length: f64,
) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;

    let ea_l = e * a / l;
    let gj_l = g * j / l;

    let eiy_l3 = e * iy / l3;
    let eiy_l2 = e * iy / l2;
    let eiy_l = e * iy / l;

    let eiz_l3 = e * iz / l3;
    let eiz_l2 = e * iz / l2;
    let eiz_l = e * iz / l;

    #[rustfmt::skip]
    let data = [
        ea_l,      0.0,          0.0,           0.0,    0.0,           0.0,          -ea_l,     0.0,          0.0,           0.0,    0.0,           0.0,
        0.0,       12.0*eiz_l3,  0.0,           0.0,    0.0,           6.0*eiz_l2,   0.0,       -12.0*eiz_l3, 0.0,           0.0,    0.0,           6.0*eiz_l2,
        0.0,       0.0,          12.0*eiy_l3,   0.0,    -6.0*eiy_l2,   0.0,          0.0,       0.0,          -12.0*eiy_l3,  0.0,    -6.0*eiy_l2,   0.0,
        0.0,       0.0,          0.0,           gj_l,   0.0,           0.0,          0.0,       0.0,          0.0,           -gj_l,  0.0,           0.0,
        0.0,       0.0,          -6.0*eiy_l2,   0.0,    4.0*eiy_l,     0.0,          0.0,       0.0,          6.0*eiy_l2,    0.0,    2.0*eiy_l,     0.0,
        0.0,       6.0*eiz_l2,   0.0,           0.0,    0.0,           4.0*eiz_l,    0.0,       -6.0*eiz_l2,  0.0,           0.0,    0.0,           2.0*eiz_l,
        -ea_l,     0.0,          0.0,           0.0,    0.0,           0.0,          ea_l,      0.0,          0.0,           0.0,    0.0,           0.0,
        0.0,       -12.0*eiz_l3, 0.0,           0.0,    0.0,           -6.0*eiz_l2,  0.0,       12.0*eiz_l3,  0.0,           0.0,    0.0,           -6.0*eiz_l2,
        0.0,       0.0,          -12.0*eiy_l3,  0.0,    6.0*eiy_l2,    0.0,          0.0,       0.0,          12.0*eiy_l3,   0.0,    6.0*eiy_l2,    0.0,
        0.0,       0.0,          0.0,           -gj_l,  0.0,           0.0,          0.0,       0.0,          0.0,           gj_l,   0.0,           0.0,
        0.0,       0.0,          -6.0*eiy_l2,   0.0,    2.0*eiy_l,     0.0,          0.0,       0.0,          6.0*eiy_l2,    0.0,    4.0*eiy_l,     0.0,
        0.0,       6.0*eiz_l2,   0.0,           0.0,    0.0,           2.0*eiz_l,    0.0,       -6.0*eiz_l2,  0.0,           0.0,    0.0,           4.0*eiz_l,
    ];

    Mat12::from_row_slice(&data)
}

/// Partition of the 12 element DoFs into kept and released index lists
fn split_releases(releases: &[bool; 12]) -> (std::vec::Vec<usize>, std::vec::Vec<usize>) {
    (0..12).partition(|&i| !releases[i])
}

/// Static condensation of released DoFs: `k11 - k12 * inv(k22) * k21`
///
/// Released rows/columns are zero in the result. Returns the input unchanged
/// when nothing is released or the released block is singular.
pub fn apply_releases(k: &Mat12, releases: &[bool; 12]) -> Mat12 {
    let (kept, released) = split_releases(releases);
    if released.is_empty() {
        return *k;
    }

    let k12 = Mat::from_fn(kept.len(), released.len(), |i, j| k[(kept[i], released[j])]);
    let k22 = Mat::from_fn(released.len(), released.len(), |i, j| {
        k[(released[i], released[j])]
    });
    let Some(k22_inv) = k22.try_inverse() else {
        return *k;
    };
    let correction = &k12 * &k22_inv * k12.transpose();

    let mut out = Mat12::zeros();
    for (a, &ka) in kept.iter().enumerate() {
        for (b, &kb) in kept.iter().enumerate() {
            out[(ka, kb)] = k[(ka, kb)] - correction[(a, b)];
        }
    }
    out
}

/// Static condensation of a fixed end reaction vector: `fer1 - k12 * inv(k22) * fer2`
pub fn apply_fer_releases(fer: &Vec12, k: &Mat12, releases: &[bool; 12]) -> Vec12 {
    let (kept, released) = split_releases(releases);
    if released.is_empty() {
        return *fer;
    }

    let k12 = Mat::from_fn(kept.len(), released.len(), |i, j| k[(kept[i], released[j])]);
    let k22 = Mat::from_fn(released.len(), released.len(), |i, j| {
        k[(released[i], released[j])]
    });
    let fer2 = Vec::from_fn(released.len(), |i, _| fer[released[i]]);
    let Some(k22_inv) = k22.try_inverse() else {
        return *fer;
    };
    let correction = &k12 * (&k22_inv * fer2);

    let mut out = Vec12::zeros();
    for (a, &ka) in kept.iter().enumerate() {
        out[ka] = fer[ka] - correction[a];
    }
    out
}

/// Fixed end reactions for a uniform load of intensity `w` over the full length
///
/// `direction` is a local index: 0 = axial, 1 = y, 2 = z, 3 = torsion.
pub fn fer_uniform_load(w: f64, length: f64, direction: usize) -> Vec12 {
    let l = length;
    let l2 = l * l;

    let mut fer = Vec12::zeros();
    match direction {
        0 => {
            fer[0] = -w * l / 2.0;
            fer[6] = -w * l / 2.0;
        }
        1 => {
            fer[1] = -w * l / 2.0;
            fer[5] = -w * l2 / 12.0;
            fer[7] = -w * l / 2.0;
            fer[11] = w * l2 / 12.0;
        }
        2 => {
            fer[2] = -w * l / 2.0;
            fer[4] = w * l2 / 12.0;
            fer[8] = -w * l / 2.0;
            fer[10] = -w * l2 / 12.0;
        }
        3 => {
            fer[3] = -w * l / 2.0;
            fer[9] = -w * l / 2.0;
        }
        _ => {}
    }
    fer
}

/// Fixed end reactions for a point load `p` at distance `a` from the i-node
///
/// `direction` is a local index: 0 = axial, 1 = y, 2 = z, 3 = torsion.
pub fn fer_point_load(p: f64, a: f64, length: f64, direction: usize) -> Vec12 {
    let l = length;
    let b = l - a;
    let l2 = l * l;
    let l3 = l2 * l;

    let mut fer = Vec12::zeros();
    match direction {
        0 => {
            fer[0] = -p * b / l;
            fer[6] = -p * a / l;
        }
        1 => {
            fer[1] = -p * b * b * (3.0 * a + b) / l3;
            fer[5] = -p * a * b * b / l2;
            fer[7] = -p * a * a * (a + 3.0 * b) / l3;
            fer[11] = p * a * a * b / l2;
        }
        2 => {
            fer[2] = -p * b * b * (3.0 * a + b) / l3;
            fer[4] = p * a * b * b / l2;
            fer[8] = -p * a * a * (a + 3.0 * b) / l3;
            fer[10] = -p * a * a * b / l2;
        }
        3 => {
            fer[3] = -p * b / l;
            fer[9] = -p * a / l;
        }
        _ => {}
    }
    fer
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transformation_matrix_horizontal() {
        let t = member_transformation_matrix(&[0.0, 0.0, 0.0], &[10.0, 0.0, 0.0], 0.0).unwrap();
        assert_relative_eq!(t[(0, 0)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(1, 1)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(2, 2)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(11, 11)], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_transformation_matrix_vertical() {
        let t = member_transformation_matrix(&[0.0, 0.0, 0.0], &[0.0, 10.0, 0.0], 0.0).unwrap();
        assert_relative_eq!(t[(0, 1)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(1, 0)], -1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(2, 2)], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rotation_matrix_is_orthonormal() {
        let r = rotation_matrix(&[1.0, 2.0, 3.0], &[4.0, 7.0, -1.0], 0.3).unwrap();
        let rrt = r * r.transpose();
        assert_relative_eq!(rrt, Mat3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_is_error() {
        let err = rotation_matrix(&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0], 0.0).unwrap_err();
        assert!(matches!(err, FEAError::InvalidGeometry(_)));
    }

    #[test]
    fn test_local_stiffness_symmetry() {
        let k = member_local_stiffness(200e9, 77e9, 0.01, 1e-4, 2e-4, 1e-5, 10.0);
        assert_relative_eq!(k, k.transpose(), epsilon = 1e-6);
    }

    #[test]
    fn test_moment_release_zeroes_rotational_stiffness() {
        let k = member_local_stiffness(1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0);
        let mut releases = [false; 12];
        releases[11] = true;
        let kc = apply_releases(&k, &releases);
        for i in 0..12 {
            assert_eq!(kc[(11, i)], 0.0);
        }
        // Propped cantilever: transverse stiffness at the released end is 3EI/L^3
        assert_relative_eq!(kc[(7, 7)], 3.0 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axial_point_load_splits_by_lever_rule() {
        let fer = fer_point_load(10.0, 1.0, 4.0, 0);
        assert_relative_eq!(fer[0], -7.5);
        assert_relative_eq!(fer[6], -2.5);
    }
}
