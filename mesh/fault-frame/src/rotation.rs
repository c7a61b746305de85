//! Rotation that carries a plane normal onto the reference axis.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector3};
use tracing::{debug, warn};

use crate::error::{FrameError, FrameResult};

/// How the normal related to the reference axis when the rotation was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// General orientation; the rotation came from Rodrigues' formula.
    General,
    /// Normal was (nearly) parallel to the reference axis; identity was used.
    Aligned,
    /// Normal was (nearly) anti-parallel; a half turn about an axis
    /// perpendicular to the reference axis was used.
    AntiAligned,
}

impl Alignment {
    /// Returns true when a fallback branch produced the rotation.
    ///
    /// The rotation is still valid, but `R · normal` only matches the
    /// reference axis to within the cutoff.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        !matches!(self, Self::General)
    }
}

/// A rotation from the global frame to a plane-aligned local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultRotation {
    /// Orthonormal matrix mapping global vectors to local vectors.
    pub matrix: Matrix3<f64>,
    /// Which construction branch was taken.
    pub alignment: Alignment,
}

impl FaultRotation {
    /// Apply the rotation to a vector.
    #[must_use]
    pub fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.matrix * v
    }
}

/// Build the rotation mapping `normal` onto `reference_axis`.
///
/// The rotation axis is `normal × reference_axis` and the angle is the
/// arccosine of their dot product. When `|normal × reference_axis|` is at or
/// below `cutoff_vecmag`, or too small to normalize, the cross product is
/// not trusted: the sign of the dot
/// product selects the identity (aligned) or a half turn about an axis
/// perpendicular to the reference (anti-aligned).
///
/// Both vectors are normalized first.
///
/// # Errors
///
/// Returns `FrameError::InvalidNormal` if `normal` is zero or not finite,
/// and `FrameError::InvalidParameter` if `reference_axis` is.
///
/// # Example
///
/// ```
/// use fault_frame::{Alignment, build_rotation};
/// use nalgebra::Vector3;
///
/// let normal = Vector3::new(1.0, 0.0, 1.0);
/// let rotation = build_rotation(&normal, &Vector3::z(), 1e-6).unwrap();
/// assert_eq!(rotation.alignment, Alignment::General);
///
/// let mapped = rotation.rotate(&normal.normalize());
/// assert!((mapped - Vector3::z()).norm() < 1e-12);
/// ```
pub fn build_rotation(
    normal: &Vector3<f64>,
    reference_axis: &Vector3<f64>,
    cutoff_vecmag: f64,
) -> FrameResult<FaultRotation> {
    let norm = normal.norm();
    if !norm.is_finite() || norm < f64::EPSILON {
        return Err(FrameError::InvalidNormal { norm });
    }
    let reference_norm = reference_axis.norm();
    if !reference_norm.is_finite() || reference_norm < f64::EPSILON {
        return Err(FrameError::InvalidParameter(format!(
            "reference axis cannot be normalized (norm {reference_norm})"
        )));
    }

    let from = normal / norm;
    let to = reference_axis / reference_norm;

    let cross = from.cross(&to);
    let sin = cross.norm();
    let cos = from.dot(&to);

    if sin <= cutoff_vecmag || sin < f64::EPSILON {
        let rotation = if cos >= 0.0 {
            FaultRotation {
                matrix: Matrix3::identity(),
                alignment: Alignment::Aligned,
            }
        } else {
            FaultRotation {
                matrix: axis_angle_matrix(&perpendicular_to(&to), PI),
                alignment: Alignment::AntiAligned,
            }
        };
        warn!(
            cross_magnitude = sin,
            cutoff_vecmag,
            alignment = ?rotation.alignment,
            "Normal nearly parallel to reference axis, using fallback rotation"
        );
        return Ok(rotation);
    }

    let axis = cross / sin;
    let angle = cos.clamp(-1.0, 1.0).acos();
    debug!(axis = ?axis.as_slice(), angle, "Built plane rotation");

    Ok(FaultRotation {
        matrix: axis_angle_matrix(&axis, angle),
        alignment: Alignment::General,
    })
}

/// Rotation matrix for a rotation of `angle` radians about `axis`.
///
/// Uses Rodrigues' rotation formula. The axis is normalized; a zero axis
/// yields the identity.
#[must_use]
#[allow(clippy::many_single_char_names)]
// Single-char names: standard mathematical notation for rotation formula
#[allow(clippy::suboptimal_flops)]
// Suboptimal flops: prefer readable Rodrigues formula over mul_add optimization
pub fn axis_angle_matrix(axis: &Vector3<f64>, angle: f64) -> Matrix3<f64> {
    let norm = axis.norm();
    if norm < f64::EPSILON {
        return Matrix3::identity();
    }

    let axis = axis / norm;
    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    let x = axis.x;
    let y = axis.y;
    let z = axis.z;

    #[rustfmt::skip]
    let matrix = Matrix3::new(
        t*x*x + c,     t*x*y - s*z,   t*x*z + s*y,
        t*x*y + s*z,   t*y*y + c,     t*y*z - s*x,
        t*x*z - s*y,   t*y*z + s*x,   t*z*z + c,
    );
    matrix
}

/// A unit vector perpendicular to `v` (assumed unit length).
fn perpendicular_to(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    helper.cross(v).normalize()
}
