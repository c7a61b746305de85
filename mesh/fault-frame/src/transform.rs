//! Forward (global to local) and inverse (local to global) rigid transforms.
//!
//! Points keep their index order, so face and cell connectivity held by
//! the caller stays valid for the transformed points.

use nalgebra::{Matrix3, Vector3};

use crate::config::{FrameConfig, PlanarityMeasure};
use crate::error::FrameResult;

/// How to judge whether transformed points lie in the local plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarityCheck {
    /// Local-frame axis measuring out-of-plane distance (unit vector).
    pub axis: Vector3<f64>,
    /// Deviation below which the surface counts as planar.
    pub tolerance: f64,
    /// Aggregate compared against `tolerance`.
    pub measure: PlanarityMeasure,
}

impl PlanarityCheck {
    /// Build the check described by a configuration.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidParameter` if the reference axis is unusable.
    pub fn from_config(config: &FrameConfig) -> FrameResult<Self> {
        Ok(Self {
            axis: config.unit_reference_axis()?,
            tolerance: config.planarity_tolerance,
            measure: config.planarity_measure,
        })
    }

    /// The same check measured along another local axis.
    ///
    /// The axis is normalized; a zero axis leaves the check unchanged.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        if let Some(unit) = axis.try_normalize(f64::EPSILON) {
            self.axis = unit;
        }
        self
    }
}

/// Points expressed in the local frame, with planarity statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPoints {
    /// Transformed points, in input order.
    pub points: Vec<Vector3<f64>>,
    /// Whether the selected deviation measure is below the tolerance.
    ///
    /// Always false when any transformed coordinate is not finite.
    pub is_planar: bool,
    /// Largest absolute out-of-plane coordinate.
    pub max_deviation: f64,
    /// Root-mean-square out-of-plane coordinate.
    pub rms_deviation: f64,
}

/// Transform points into the local frame: `R · (p - origin)`.
///
/// # Example
///
/// ```
/// use fault_frame::{FrameConfig, PlanarityCheck, to_local};
/// use nalgebra::{Matrix3, Vector3};
///
/// let points = vec![Vector3::new(1.0, 2.0, 3.0), Vector3::new(2.0, 2.0, 3.0)];
/// let check = PlanarityCheck::from_config(&FrameConfig::default()).unwrap();
/// let local = to_local(&points, &Matrix3::identity(), &Vector3::new(0.0, 0.0, 3.0), &check);
///
/// assert_eq!(local.points[0], Vector3::new(1.0, 2.0, 0.0));
/// assert!(local.is_planar);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
// Precision loss: point counts beyond 2^52 are unsupported
pub fn to_local(
    points: &[Vector3<f64>],
    rotation: &Matrix3<f64>,
    origin: &Vector3<f64>,
    planarity: &PlanarityCheck,
) -> LocalPoints {
    let local: Vec<Vector3<f64>> = points.iter().map(|p| rotation * (p - origin)).collect();

    let mut max_deviation = 0.0_f64;
    let mut sum_squares = 0.0;
    let mut all_finite = true;
    for p in &local {
        let deviation = p.dot(&planarity.axis);
        all_finite &= deviation.is_finite();
        max_deviation = max_deviation.max(deviation.abs());
        sum_squares += deviation * deviation;
    }
    // f64::max skips NaN
    if !all_finite {
        max_deviation = f64::NAN;
    }
    let rms_deviation = if local.is_empty() {
        0.0
    } else {
        (sum_squares / local.len() as f64).sqrt()
    };

    let measured = match planarity.measure {
        PlanarityMeasure::MaxDeviation => max_deviation,
        PlanarityMeasure::Rms => rms_deviation,
    };

    LocalPoints {
        points: local,
        is_planar: all_finite && measured < planarity.tolerance,
        max_deviation,
        rms_deviation,
    }
}

/// Transform local points back to the global frame: `Rᵀ · p + origin`.
///
/// `rotation` must be orthonormal; its transpose is used as the inverse.
#[must_use]
pub fn to_global(
    points: &[Vector3<f64>],
    rotation: &Matrix3<f64>,
    origin: &Vector3<f64>,
) -> Vec<Vector3<f64>> {
    let inverse = rotation.transpose();
    points.iter().map(|p| inverse * p + origin).collect()
}

/// A rigid global-to-local transform: rotation about `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    /// Orthonormal rotation, global to local.
    pub rotation: Matrix3<f64>,
    /// Global position of the local origin.
    pub origin: Vector3<f64>,
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::identity()
    }
}

impl LocalFrame {
    /// Create a frame from a rotation and origin.
    #[must_use]
    pub const fn new(rotation: Matrix3<f64>, origin: Vector3<f64>) -> Self {
        Self { rotation, origin }
    }

    /// The frame that leaves every point unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            origin: Vector3::zeros(),
        }
    }

    /// Map a global point into this frame.
    #[must_use]
    pub fn to_local_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * (point - self.origin)
    }

    /// Map a local point back to the global frame.
    #[must_use]
    pub fn to_global_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.transpose() * point + self.origin
    }

    /// Map a direction into this frame (ignores the origin).
    #[must_use]
    pub fn to_local_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }

    /// Map global points into this frame, with planarity statistics.
    #[must_use]
    pub fn to_local(&self, points: &[Vector3<f64>], planarity: &PlanarityCheck) -> LocalPoints {
        to_local(points, &self.rotation, &self.origin, planarity)
    }

    /// Map local points back to the global frame.
    #[must_use]
    pub fn to_global(&self, points: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        to_global(points, &self.rotation, &self.origin)
    }
}
