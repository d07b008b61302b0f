//! Matrix helpers for alignment transforms.
//!
//! Euler angles follow the static-frame Z-Y-Z convention ("szyz") used by the
//! Scipion/EMAN transformation utilities, so the decomposition reproduces their
//! branch structure and sign flips exactly.

use nalgebra::Matrix4;

use crate::particles::Transform;

/// Threshold below which the Z-Y-Z decomposition is treated as gimbal-locked
const EULER_EPS: f64 = f64::EPSILON * 4.0;

/// Convert a row-major transform to an nalgebra matrix
pub fn to_matrix(transform: &Transform) -> Matrix4<f64> {
    let m = &transform.matrix;
    Matrix4::new(
        m[0][0], m[0][1], m[0][2], m[0][3],
        m[1][0], m[1][1], m[1][2], m[1][3],
        m[2][0], m[2][1], m[2][2], m[2][3],
        m[3][0], m[3][1], m[3][2], m[3][3],
    )
}

/// Translation column of a homogeneous matrix
pub fn translation_from_matrix(m: &Matrix4<f64>) -> [f64; 3] {
    [m[(0, 3)], m[(1, 3)], m[(2, 3)]]
}

/// Decompose the rotation part into static Z-Y-Z Euler angles (radians)
pub fn euler_zyz_from_matrix(m: &Matrix4<f64>) -> [f64; 3] {
    // axes 'szyz': i = 2, j = 1, k = 0, repetition and odd parity
    let (i, j, k) = (2, 1, 0);
    let sy = (m[(i, j)] * m[(i, j)] + m[(i, k)] * m[(i, k)]).sqrt();

    let (ax, ay, az) = if sy > EULER_EPS {
        (
            m[(i, j)].atan2(m[(i, k)]),
            sy.atan2(m[(i, i)]),
            m[(j, i)].atan2(-m[(k, i)]),
        )
    } else {
        ((-m[(j, k)]).atan2(m[(j, j)]), sy.atan2(m[(i, i)]), 0.0)
    };

    [-ax, -ay, -az]
}

/// Rotation about Z by `angle` radians, as a homogeneous matrix
pub fn rotation_z(angle: f64) -> Matrix4<f64> {
    let (s, c) = angle.sin_cos();
    Matrix4::new(
        c, -s, 0.0, 0.0,
        s, c, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Rotation about Y by `angle` radians, as a homogeneous matrix
pub fn rotation_y(angle: f64) -> Matrix4<f64> {
    let (s, c) = angle.sin_cos();
    Matrix4::new(
        c, 0.0, s, 0.0,
        0.0, 1.0, 0.0, 0.0,
        -s, 0.0, c, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Compose a static Z-Y-Z rotation from the three angles (radians)
///
/// Inverse of [`euler_zyz_from_matrix`] away from gimbal lock.
pub fn matrix_from_euler_zyz(angles: [f64; 3]) -> Matrix4<f64> {
    rotation_z(angles[2]) * rotation_y(angles[1]) * rotation_z(angles[0])
}

/// Back to the row-major storage used by [`Transform`]
pub fn to_transform(m: &Matrix4<f64>) -> Transform {
    let mut rows = [[0.0; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = m[(r, c)];
        }
    }
    Transform::from_rows(rows)
}
