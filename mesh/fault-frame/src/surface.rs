//! Persisted surface metadata.
//!
//! [`SurfaceInfo`] is written once when a surface is moved into its local
//! frame and read back, possibly by another process, to restore the global
//! coordinates. The record carries an explicit schema version and rejects
//! unknown fields so that writer and reader cannot silently disagree.

use std::io::{Read, Write};

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::axis_angle::AxisAngle;
use crate::error::{FrameError, FrameResult};
use crate::rotation::{FaultRotation, build_rotation};
use crate::transform::LocalFrame;

/// Schema version written by this crate.
pub const SURFACE_INFO_SCHEMA_VERSION: u32 = 2;

/// Coordinate conversion metadata for one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurfaceInfo {
    /// Schema version of this record.
    pub schema_version: u32,
    /// Unit normal of the fitted plane.
    pub plane_normal: [f64; 3],
    /// Origin of the local frame (centroid of the fitted points).
    pub plane_origin: [f64; 3],
    /// Unit axis of the global-to-local rotation.
    pub rotation_axis: [f64; 3],
    /// Angle of the global-to-local rotation, radians in `[0, π]`.
    pub rotation_angle: f64,
    /// Whether the surface was within tolerance of its fitted plane.
    pub fault_is_plane: bool,
    /// Axis the plane normal was rotated onto.
    pub reference_axis: [f64; 3],
    /// Degenerate-alignment cutoff the rotation was built with.
    pub cutoff_vecmag: f64,
}

impl SurfaceInfo {
    /// Assemble a record for the current schema version.
    #[must_use]
    pub fn new(
        plane_normal: Vector3<f64>,
        plane_origin: Vector3<f64>,
        rotation: AxisAngle,
        fault_is_plane: bool,
        reference_axis: Vector3<f64>,
        cutoff_vecmag: f64,
    ) -> Self {
        Self {
            schema_version: SURFACE_INFO_SCHEMA_VERSION,
            plane_normal: plane_normal.into(),
            plane_origin: plane_origin.into(),
            rotation_axis: rotation.axis.into(),
            rotation_angle: rotation.angle,
            fault_is_plane,
            reference_axis: reference_axis.into(),
            cutoff_vecmag,
        }
    }

    /// The plane normal as a vector.
    #[must_use]
    pub fn normal(&self) -> Vector3<f64> {
        Vector3::from(self.plane_normal)
    }

    /// The frame origin as a vector.
    #[must_use]
    pub fn origin(&self) -> Vector3<f64> {
        Vector3::from(self.plane_origin)
    }

    /// The reference axis as a vector.
    #[must_use]
    pub fn reference(&self) -> Vector3<f64> {
        Vector3::from(self.reference_axis)
    }

    /// The stored global-to-local rotation in axis-angle form.
    #[must_use]
    pub fn axis_angle(&self) -> AxisAngle {
        AxisAngle {
            axis: Vector3::from(self.rotation_axis),
            angle: self.rotation_angle,
        }
    }

    /// The rotation that maps local coordinates back to global ones.
    ///
    /// Apply it, then translate by [`plane_origin`](Self::plane_origin), to
    /// restore a surface with tools that take axis-angle commands.
    #[must_use]
    pub fn restoring_axis_angle(&self) -> AxisAngle {
        self.axis_angle().inverse()
    }

    /// Rebuild the global-to-local rotation from the stored normal, using
    /// the stored cutoff so the same branch is taken as when it was written.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidNormal` or `FrameError::InvalidParameter`
    /// if the stored normal or reference axis is zero.
    pub fn rebuild_rotation(&self) -> FrameResult<FaultRotation> {
        build_rotation(&self.normal(), &self.reference(), self.cutoff_vecmag)
    }

    /// Rebuild the local frame from the stored normal and origin.
    ///
    /// # Errors
    ///
    /// See [`rebuild_rotation`](Self::rebuild_rotation).
    pub fn local_frame(&self) -> FrameResult<LocalFrame> {
        let rotation = self.rebuild_rotation()?;
        Ok(LocalFrame::new(rotation.matrix, self.origin()))
    }

    /// Check that the stored axis-angle reproduces `rotation`.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InconsistentSurfaceInfo` if any matrix element
    /// differs by more than `tolerance`.
    pub fn verify_rotation(&self, rotation: &Matrix3<f64>, tolerance: f64) -> FrameResult<()> {
        let stored = self.axis_angle().to_matrix();
        let deviation = (stored - rotation).amax();
        if deviation > tolerance || !deviation.is_finite() {
            return Err(FrameError::InconsistentSurfaceInfo {
                deviation,
                tolerance,
            });
        }
        Ok(())
    }

    /// Reject records written with another schema version.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::UnsupportedSchemaVersion` on mismatch.
    pub const fn check_version(&self) -> FrameResult<()> {
        if self.schema_version == SURFACE_INFO_SCHEMA_VERSION {
            Ok(())
        } else {
            Err(FrameError::UnsupportedSchemaVersion {
                found: self.schema_version,
                supported: SURFACE_INFO_SCHEMA_VERSION,
            })
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Serialization` if serialization fails.
    pub fn to_json(&self) -> FrameResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON, checking the schema version.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Serialization` for malformed input or unknown
    /// fields and `FrameError::UnsupportedSchemaVersion` for other versions.
    pub fn from_json(json: &str) -> FrameResult<Self> {
        let info: Self = serde_json::from_str(json)?;
        info.check_version()?;
        Ok(info)
    }

    /// Write as JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Serialization` if writing fails.
    pub fn write_json<W: Write>(&self, writer: W) -> FrameResult<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Read JSON from a reader, checking the schema version.
    ///
    /// # Errors
    ///
    /// Same as [`from_json`](Self::from_json).
    pub fn read_json<R: Read>(reader: R) -> FrameResult<Self> {
        let info: Self = serde_json::from_reader(reader)?;
        info.check_version()?;
        Ok(info)
    }
}
