//! Error types for local-frame operations.

use std::fmt;

use thiserror::Error;

/// Result type for local-frame operations.
pub type FrameResult<T> = Result<T, FrameError>;

/// Why a point set cannot define a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegeneracyKind {
    /// Fewer than three points were supplied.
    TooFewPoints,
    /// All points coincide (no spread in any direction).
    Coincident,
    /// All points lie on a single line.
    Collinear,
}

impl fmt::Display for DegeneracyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints => write!(f, "fewer than 3 points"),
            Self::Coincident => write!(f, "points are coincident"),
            Self::Collinear => write!(f, "points are collinear"),
        }
    }
}

/// Errors that can occur while fitting, building or applying a local frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The point set cannot define a plane.
    #[error(
        "degenerate input ({kind}): {point_count} points, singular values {singular_values:?}"
    )]
    DegenerateInput {
        /// Number of points supplied.
        point_count: usize,
        /// Singular values of the centered point matrix, largest first.
        singular_values: [f64; 3],
        /// Which degeneracy was detected.
        kind: DegeneracyKind,
    },

    /// The singular value decomposition did not converge.
    #[error("singular value decomposition of {point_count} points did not converge")]
    DecompositionFailed {
        /// Number of points supplied.
        point_count: usize,
    },

    /// A point has a NaN or infinite coordinate.
    #[error("point {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Index of the offending point.
        index: usize,
    },

    /// A plane normal cannot be normalized.
    #[error("plane normal cannot be normalized (norm {norm})")]
    InvalidNormal {
        /// Norm of the supplied vector.
        norm: f64,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Surface metadata was written with an unknown schema.
    #[error("unsupported surface info schema version {found} (supported: {supported})")]
    UnsupportedSchemaVersion {
        /// Version found in the record.
        found: u32,
        /// Version understood by this crate.
        supported: u32,
    },

    /// The stored axis-angle disagrees with the rotation rebuilt from the stored normal.
    #[error("surface info is inconsistent: rotation deviation {deviation:e} exceeds {tolerance:e}")]
    InconsistentSurfaceInfo {
        /// Largest element-wise difference between the two rotations.
        deviation: f64,
        /// Accepted tolerance.
        tolerance: f64,
    },

    /// Surface metadata could not be serialized or deserialized.
    #[error("surface info serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FrameError {
    /// Returns true if this error means no plane could be fit to the input.
    #[must_use]
    pub const fn is_degenerate_input(&self) -> bool {
        matches!(self, Self::DegenerateInput { .. })
    }
}
