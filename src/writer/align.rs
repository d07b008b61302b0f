//! Alignment-to-row conversions.
//!
//! The two conventions differ in sign and in whether the matrix is inverted;
//! both must match what the cryoDRGN STAR parser expects, so neither may be
//! "normalized" to look like the other.

use crate::geometry::{euler_zyz_from_matrix, to_matrix, translation_from_matrix};
use crate::particles::Transform;
use crate::star::labels;

use super::row::StarRow;

/// In-plane alignment as written to the particles table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InPlaneAlignment {
    /// `rlnAnglePsi` (degrees)
    pub psi: f64,
    /// `rlnOriginXAngst`
    pub shift_x: f64,
    /// `rlnOriginYAngst`
    pub shift_y: f64,
}

/// Projection alignment as written to the particles table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionAlignment {
    /// `rlnAngleRot` (degrees)
    pub rot: f64,
    /// `rlnAngleTilt` (degrees)
    pub tilt: f64,
    /// `rlnAnglePsi` (degrees)
    pub psi: f64,
    /// `rlnOriginXAngst`, `rlnOriginYAngst`, `rlnOriginZAngst`
    pub shifts: [f64; 3],
}

fn negated_degrees(angles: [f64; 3]) -> [f64; 3] {
    angles.map(|a| -a.to_degrees())
}

/// 2D branch: shifts taken as stored, psi is the negated sum of the outer angles
pub fn align_2d(transform: &Transform, pixel_size: f64) -> InPlaneAlignment {
    let m = to_matrix(transform);
    let shifts = translation_from_matrix(&m).map(|s| s * pixel_size);
    let angles = negated_degrees(euler_zyz_from_matrix(&m));

    InPlaneAlignment {
        psi: -(angles[0] + angles[2]),
        shift_x: shifts[0],
        shift_y: shifts[1],
    }
}

/// Projection branch: invert the matrix, then negate its translation
///
/// Returns `None` for a singular matrix.
pub fn align_projection(transform: &Transform, pixel_size: f64) -> Option<ProjectionAlignment> {
    let inv = to_matrix(transform).try_inverse()?;
    let shifts = translation_from_matrix(&inv).map(|s| -s * pixel_size);
    let [rot, tilt, psi] = negated_degrees(euler_zyz_from_matrix(&inv));

    Some(ProjectionAlignment {
        rot,
        tilt,
        psi,
        shifts,
    })
}

impl InPlaneAlignment {
    /// Write the 2D alignment columns
    pub fn write_to(&self, row: &mut StarRow) {
        row.set(labels::ORIGIN_X_ANGST, self.shift_x);
        row.set(labels::ORIGIN_Y_ANGST, self.shift_y);
        row.set(labels::ANGLE_PSI, self.psi);
    }
}

impl ProjectionAlignment {
    /// Write the projection alignment columns
    pub fn write_to(&self, row: &mut StarRow) {
        row.set(labels::ORIGIN_X_ANGST, self.shifts[0]);
        row.set(labels::ORIGIN_Y_ANGST, self.shifts[1]);
        row.set(labels::ORIGIN_Z_ANGST, self.shifts[2]);
        row.set(labels::ANGLE_ROT, self.rot);
        row.set(labels::ANGLE_TILT, self.tilt);
        row.set(labels::ANGLE_PSI, self.psi);
    }
}
