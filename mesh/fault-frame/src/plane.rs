//! Plane representation for fitted fault surfaces.

use nalgebra::Vector3;

/// Components smaller than this are treated as zero when breaking sign ties.
const SIGN_TIE_EPSILON: f64 = 1e-12;

/// A plane in 3D space defined by an origin on the plane and a unit normal.
///
/// The plane equation is: `normal · (p - origin) = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane (the centroid for fitted planes).
    pub origin: Vector3<f64>,
    /// The plane normal (unit vector).
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a new plane from an origin and normal.
    ///
    /// The normal is automatically normalized.
    ///
    /// # Returns
    ///
    /// `Some(Plane)` if the normal is non-zero and finite, `None` otherwise.
    #[must_use]
    pub fn new(origin: Vector3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let norm = normal.norm();
        if !norm.is_finite() || norm < f64::EPSILON {
            return None;
        }
        Some(Self {
            origin,
            normal: normal / norm,
        })
    }

    /// Compute the signed distance from a point to the plane.
    ///
    /// Positive distance means the point is on the side the normal points to.
    #[must_use]
    pub fn signed_distance(&self, point: Vector3<f64>) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    /// Compute the absolute distance from a point to the plane.
    #[must_use]
    pub fn distance(&self, point: Vector3<f64>) -> f64 {
        self.signed_distance(point).abs()
    }

    /// Project a point onto the plane.
    #[must_use]
    pub fn project(&self, point: Vector3<f64>) -> Vector3<f64> {
        point - self.signed_distance(point) * self.normal
    }

    /// The same plane with its normal flipped if needed so that it points
    /// into the half-space of `reference`.
    ///
    /// When the normal is perpendicular to `reference`, the largest-magnitude
    /// component of the normal is made positive (lowest index wins ties).
    #[must_use]
    pub fn oriented_toward(&self, reference: &Vector3<f64>) -> Self {
        let dot = self.normal.dot(reference);
        let flip = if dot.abs() > SIGN_TIE_EPSILON {
            dot < 0.0
        } else {
            let mut dominant = 0;
            for i in 1..3 {
                if self.normal[i].abs() > self.normal[dominant].abs() + SIGN_TIE_EPSILON {
                    dominant = i;
                }
            }
            self.normal[dominant] < 0.0
        };
        if flip {
            Self {
                origin: self.origin,
                normal: -self.normal,
            }
        } else {
            *self
        }
    }
}

/// Create a default plane (Z=0) for testing fallback scenarios.
#[cfg(test)]
fn default_plane() -> Plane {
    Plane {
        origin: Vector3::zeros(),
        normal: Vector3::z(),
    }
}
