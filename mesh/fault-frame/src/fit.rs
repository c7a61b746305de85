//! Best-fit plane through a point cloud.
//!
//! The plane passes through the centroid; its normal is the right singular
//! vector of the centered point matrix with the smallest singular value,
//! i.e. the direction of least variance.

use nalgebra::{MatrixXx3, SVD, Vector3};
use tracing::debug;

use crate::config::FrameConfig;
use crate::error::{DegeneracyKind, FrameError, FrameResult};
use crate::plane::Plane;

/// Result of fitting a plane to a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFit {
    /// The fitted plane, with its normal oriented toward the reference axis.
    pub plane: Plane,
    /// Singular values of the centered point matrix, sorted descending.
    pub singular_values: [f64; 3],
    /// Number of points that were fit.
    pub point_count: usize,
}

impl PlaneFit {
    /// The unit plane normal.
    #[must_use]
    pub const fn normal(&self) -> Vector3<f64> {
        self.plane.normal
    }

    /// The plane origin (the centroid of the input points).
    #[must_use]
    pub const fn origin(&self) -> Vector3<f64> {
        self.plane.origin
    }

    /// The smallest singular value; zero for a perfectly planar point set.
    #[must_use]
    pub const fn smallest_singular_value(&self) -> f64 {
        self.singular_values[2]
    }

    /// Root-mean-square distance of the points from the fitted plane.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    // Precision loss: point counts beyond 2^52 are unsupported
    pub fn rms_residual(&self) -> f64 {
        self.singular_values[2] / (self.point_count as f64).sqrt()
    }
}

/// Fit a plane to a point set.
///
/// The normal sign follows the convention of [`Plane::oriented_toward`]
/// against `config.reference_axis`.
///
/// # Errors
///
/// - `FrameError::NonFiniteCoordinate` if any point has a NaN or infinite coordinate.
/// - `FrameError::DegenerateInput` if there are fewer than 3 points, or the
///   points are coincident or collinear.
/// - `FrameError::InvalidParameter` if the reference axis is unusable.
/// - `FrameError::DecompositionFailed` if the SVD does not converge.
///
/// # Example
///
/// ```
/// use fault_frame::{FrameConfig, fit_plane};
/// use nalgebra::Vector3;
///
/// let points = vec![
///     Vector3::new(0.0, 0.0, 0.0),
///     Vector3::new(1.0, 0.0, 0.0),
///     Vector3::new(0.0, 1.0, 0.0),
///     Vector3::new(1.0, 1.0, 0.0),
/// ];
///
/// let fit = fit_plane(&points, &FrameConfig::default()).unwrap();
/// assert!((fit.normal().z - 1.0).abs() < 1e-12);
/// assert!(fit.smallest_singular_value() < 1e-12);
/// ```
#[allow(clippy::cast_precision_loss)]
// Precision loss: point counts beyond 2^52 are unsupported
pub fn fit_plane(points: &[Vector3<f64>], config: &FrameConfig) -> FrameResult<PlaneFit> {
    let reference = config.unit_reference_axis()?;

    if let Some(index) = points
        .iter()
        .position(|p| !p.iter().all(|c| c.is_finite()))
    {
        return Err(FrameError::NonFiniteCoordinate { index });
    }

    let point_count = points.len();
    if point_count < 3 {
        return Err(FrameError::DegenerateInput {
            point_count,
            singular_values: small_set_singular_values(points),
            kind: DegeneracyKind::TooFewPoints,
        });
    }

    let centroid = centroid(points);
    let centered = MatrixXx3::from_fn(point_count, |row, col| points[row][col] - centroid[col]);

    let svd = SVD::try_new(centered, false, true, f64::EPSILON, 0)
        .ok_or(FrameError::DecompositionFailed { point_count })?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or(FrameError::DecompositionFailed { point_count })?;

    // Sort by singular value (descending)
    let mut indices = [0usize, 1, 2];
    indices.sort_by(|&a, &b| {
        svd.singular_values[b]
            .partial_cmp(&svd.singular_values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let singular_values = indices.map(|i| svd.singular_values[i]);

    let scale = points
        .iter()
        .map(|p| p.amax())
        .fold(1.0_f64, f64::max)
        * (point_count as f64).sqrt();
    if singular_values[0] <= config.degeneracy_ratio * scale {
        return Err(FrameError::DegenerateInput {
            point_count,
            singular_values,
            kind: DegeneracyKind::Coincident,
        });
    }
    if singular_values[1] <= config.degeneracy_ratio * singular_values[0] {
        return Err(FrameError::DegenerateInput {
            point_count,
            singular_values,
            kind: DegeneracyKind::Collinear,
        });
    }

    let normal: Vector3<f64> = v_t.row(indices[2]).transpose();
    let plane = Plane::new(centroid, normal)
        .ok_or(FrameError::DecompositionFailed { point_count })?
        .oriented_toward(&reference);

    debug!(
        point_count,
        sigma_max = singular_values[0],
        sigma_min = singular_values[2],
        normal = ?plane.normal.as_slice(),
        "Fitted plane"
    );

    Ok(PlaneFit {
        plane,
        singular_values,
        point_count,
    })
}

/// Centroid of a non-empty point set.
#[allow(clippy::cast_precision_loss)]
// Precision loss: point counts beyond 2^52 are unsupported
fn centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    let mut sum = Vector3::zeros();
    for p in points {
        sum += p;
    }
    sum / points.len() as f64
}

/// Singular values reported for sets too small to fit.
fn small_set_singular_values(points: &[Vector3<f64>]) -> [f64; 3] {
    match points {
        [a, b] => [(a - b).norm() / std::f64::consts::SQRT_2, 0.0, 0.0],
        _ => [0.0; 3],
    }
}
