//! Tolerances and conventions for local-frame conversion.
//!
//! [`FrameConfig`] bundles every threshold the fitting, rotation and
//! planarity steps need, so callers pass one value instead of relying on
//! process-wide constants.
//!
//! # Example
//!
//! ```
//! use fault_frame::{FrameConfig, PlanarityMeasure};
//!
//! let config = FrameConfig::default()
//!     .with_planarity_tolerance(1e-3)
//!     .with_planarity_measure(PlanarityMeasure::Rms);
//! assert!(config.validate().is_ok());
//! ```

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};

/// How out-of-plane deviations are aggregated for the planarity flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanarityMeasure {
    /// Largest absolute out-of-plane coordinate.
    #[default]
    MaxDeviation,
    /// Root-mean-square of the out-of-plane coordinates.
    Rms,
}

/// Configuration for plane fitting and local-frame conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Out-of-plane tolerance below which a surface is flagged planar.
    pub planarity_tolerance: f64,

    /// Minimum `|normal × reference_axis|` before the rotation falls back to
    /// the identity or a half turn.
    pub cutoff_vecmag: f64,

    /// Canonical axis the plane normal is rotated onto.
    pub reference_axis: [f64; 3],

    /// Aggregate used for the planarity flag.
    pub planarity_measure: PlanarityMeasure,

    /// Ratio of the second to the largest singular value below which input
    /// is treated as collinear. Also scales the coincident-point check.
    pub degeneracy_ratio: f64,

    /// Element-wise tolerance for the surface info consistency check.
    pub consistency_tolerance: f64,

    /// Check stored axis-angle against the rebuilt rotation when restoring.
    pub verify_on_restore: bool,

    /// Process batches with rayon.
    pub parallel: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            planarity_tolerance: 1e-5,
            cutoff_vecmag: 1e-6,
            reference_axis: [0.0, 0.0, 1.0],
            planarity_measure: PlanarityMeasure::default(),
            degeneracy_ratio: 1e-10,
            consistency_tolerance: 1e-8,
            verify_on_restore: true,
            parallel: true,
        }
    }
}

impl FrameConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the planarity tolerance.
    #[must_use]
    pub const fn with_planarity_tolerance(mut self, tolerance: f64) -> Self {
        self.planarity_tolerance = tolerance;
        self
    }

    /// Set the degenerate-alignment cutoff.
    #[must_use]
    pub const fn with_cutoff_vecmag(mut self, cutoff: f64) -> Self {
        self.cutoff_vecmag = cutoff;
        self
    }

    /// Set the reference axis. It is normalized on use.
    #[must_use]
    pub const fn with_reference_axis(mut self, axis: [f64; 3]) -> Self {
        self.reference_axis = axis;
        self
    }

    /// Set the planarity aggregate.
    #[must_use]
    pub const fn with_planarity_measure(mut self, measure: PlanarityMeasure) -> Self {
        self.planarity_measure = measure;
        self
    }

    /// Set the degeneracy ratio.
    #[must_use]
    pub const fn with_degeneracy_ratio(mut self, ratio: f64) -> Self {
        self.degeneracy_ratio = ratio;
        self
    }

    /// Set the consistency tolerance.
    #[must_use]
    pub const fn with_consistency_tolerance(mut self, tolerance: f64) -> Self {
        self.consistency_tolerance = tolerance;
        self
    }

    /// Enable or disable the consistency check on restore.
    #[must_use]
    pub const fn with_verify_on_restore(mut self, verify: bool) -> Self {
        self.verify_on_restore = verify;
        self
    }

    /// Enable or disable parallel batch processing.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The reference axis as a unit vector.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidParameter` if the axis is zero or not finite.
    pub fn unit_reference_axis(&self) -> FrameResult<Vector3<f64>> {
        let axis = Vector3::from(self.reference_axis);
        let norm = axis.norm();
        if !norm.is_finite() || norm < f64::EPSILON {
            return Err(FrameError::InvalidParameter(format!(
                "reference_axis must be a non-zero finite vector, got {:?}",
                self.reference_axis
            )));
        }
        Ok(axis / norm)
    }

    /// Check that every tolerance is usable.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidParameter` naming the first bad field.
    pub fn validate(&self) -> FrameResult<()> {
        positive("planarity_tolerance", self.planarity_tolerance)?;
        positive("degeneracy_ratio", self.degeneracy_ratio)?;
        positive("consistency_tolerance", self.consistency_tolerance)?;
        if !self.cutoff_vecmag.is_finite() || !(0.0..1.0).contains(&self.cutoff_vecmag) {
            return Err(FrameError::InvalidParameter(format!(
                "cutoff_vecmag must lie in [0, 1), got {}",
                self.cutoff_vecmag
            )));
        }
        self.unit_reference_axis()?;
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> FrameResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FrameError::InvalidParameter(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
