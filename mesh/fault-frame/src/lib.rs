//! Best-fit plane local frames for fault surface meshes.
//!
//! This crate provides tools for:
//! - Fitting a plane to a 3D point cloud (SVD, least-variance normal)
//! - Building the rotation that aligns the plane normal with a reference axis
//! - Converting that rotation to and from axis-angle form
//! - Moving points between the global frame and the plane-aligned local frame
//! - Persisting the conversion metadata ([`SurfaceInfo`]) as versioned JSON
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies. It performs no file
//! I/O of its own; mesh readers and writers supply and consume point arrays.
//!
//! # Example
//!
//! ```
//! use fault_frame::{FrameConfig, SurfaceInfo, global_to_local, local_to_global};
//! use nalgebra::Vector3;
//!
//! // A tilted rectangular fault patch
//! let points: Vec<_> = [(0.0, 0.0), (2.0, 0.0), (0.0, 1.0), (2.0, 1.0)]
//!     .iter()
//!     .map(|&(x, y)| Vector3::new(x, y, 0.3 * x - 0.1 * y + 50.0))
//!     .collect();
//!
//! let config = FrameConfig::default();
//! let local = global_to_local(&points, &config).unwrap();
//! assert!(local.info.fault_is_plane);
//!
//! // Persist the metadata, then restore later
//! let json = local.info.to_json().unwrap();
//! let info = SurfaceInfo::from_json(&json).unwrap();
//! let restored = local_to_global(&local.points, &info, &config).unwrap();
//! assert!((restored[3] - points[3]).norm() < 1e-9);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod axis_angle;
mod config;
mod error;
mod fit;
mod pipeline;
mod plane;
mod rotation;
mod surface;
mod transform;

pub use axis_angle::{AxisAngle, to_axis_angle};
pub use config::{FrameConfig, PlanarityMeasure};
pub use error::{DegeneracyKind, FrameError, FrameResult};
pub use fit::{PlaneFit, fit_plane};
pub use pipeline::{
    LocalSurface, global_to_local, global_to_local_batch, local_to_global, local_to_global_batch,
};
pub use plane::Plane;
pub use rotation::{Alignment, FaultRotation, axis_angle_matrix, build_rotation};
pub use surface::{SURFACE_INFO_SCHEMA_VERSION, SurfaceInfo};
pub use transform::{LocalFrame, LocalPoints, PlanarityCheck, to_global, to_local};
