//! Axis-angle form of a rotation matrix.
//!
//! External meshing tools take "rotate about axis by angle" commands, and the
//! pair is persisted next to the plane normal as an independent encoding of
//! the same rotation.

use nalgebra::{Matrix3, Vector3};

use crate::rotation::axis_angle_matrix;

/// Below this skew-vector magnitude (`2 sin θ`) the axis is taken from the
/// symmetric part of the matrix instead.
const SKEW_CUTOFF: f64 = 1e-9;

/// A rotation as a unit axis and an angle in `[0, π]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAngle {
    /// Unit rotation axis.
    pub axis: Vector3<f64>,
    /// Rotation angle in radians.
    pub angle: f64,
}

impl AxisAngle {
    /// The identity rotation, expressed about `axis`.
    #[must_use]
    pub const fn identity(axis: Vector3<f64>) -> Self {
        Self { axis, angle: 0.0 }
    }

    /// Rebuild the rotation matrix with Rodrigues' formula.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix3<f64> {
        axis_angle_matrix(&self.axis, self.angle)
    }

    /// The inverse rotation: same axis, negated angle.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            axis: self.axis,
            angle: -self.angle,
        }
    }

    /// The angle in degrees.
    #[must_use]
    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }
}

/// Extract the axis and angle of a rotation matrix.
///
/// The angle is `acos((trace(R) - 1) / 2)` with the argument clamped to
/// `[-1, 1]`. The axis comes from the skew-symmetric part of `R`; when that
/// vanishes the rotation is either the identity (the axis is reported as
/// `fallback_axis`) or a half turn (the axis is read from the symmetric part,
/// `(R + I) / 2 = a aᵀ`).
///
/// # Example
///
/// ```
/// use fault_frame::{axis_angle_matrix, to_axis_angle};
/// use nalgebra::Vector3;
/// use std::f64::consts::FRAC_PI_2;
///
/// let r = axis_angle_matrix(&Vector3::x(), FRAC_PI_2);
/// let aa = to_axis_angle(&r, &Vector3::z());
/// assert!((aa.angle - FRAC_PI_2).abs() < 1e-12);
/// assert!((aa.axis - Vector3::x()).norm() < 1e-12);
/// ```
#[must_use]
pub fn to_axis_angle(rotation: &Matrix3<f64>, fallback_axis: &Vector3<f64>) -> AxisAngle {
    let r = rotation;
    let cos = ((r.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    let angle = cos.acos();

    let skew = Vector3::new(
        r[(2, 1)] - r[(1, 2)],
        r[(0, 2)] - r[(2, 0)],
        r[(1, 0)] - r[(0, 1)],
    );
    let skew_norm = skew.norm();
    if skew_norm > SKEW_CUTOFF {
        return AxisAngle {
            axis: skew / skew_norm,
            angle,
        };
    }

    if cos > 0.0 {
        return AxisAngle::identity(
            fallback_axis
                .try_normalize(f64::EPSILON)
                .unwrap_or_else(Vector3::z),
        );
    }

    // Half turn: R + I = 2 a aᵀ, so any non-zero column is parallel to the axis.
    let outer = (r + Matrix3::identity()) / 2.0;
    let mut column = 0;
    for i in 1..3 {
        if outer[(i, i)] > outer[(column, column)] {
            column = i;
        }
    }
    let mut axis = outer
        .column(column)
        .into_owned()
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::z);
    if axis.dot(&skew) < 0.0 {
        axis = -axis;
    }

    AxisAngle { axis, angle }
}
