//! Whole-surface conversions between the global frame and a plane-aligned
//! local frame.
//!
//! `global_to_local` fits a plane, builds the aligning rotation, transforms
//! the points and produces the [`SurfaceInfo`] needed to undo it.
//! `local_to_global` rebuilds the rotation from that record and applies the
//! inverse. Point order is preserved in both directions, so connectivity
//! held alongside the points needs no remapping.

use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::axis_angle::to_axis_angle;
use crate::config::FrameConfig;
use crate::error::{FrameError, FrameResult};
use crate::fit::{PlaneFit, fit_plane};
use crate::rotation::{Alignment, build_rotation};
use crate::surface::SurfaceInfo;
use crate::transform::{LocalFrame, PlanarityCheck, to_global, to_local};

/// A surface expressed in its local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSurface {
    /// Points in the local frame, in input order.
    pub points: Vec<Vector3<f64>>,
    /// Metadata needed to restore global coordinates.
    pub info: SurfaceInfo,
    /// The plane fit the frame was built from.
    pub fit: PlaneFit,
    /// Which rotation branch was taken.
    pub alignment: Alignment,
    /// Largest absolute out-of-plane local coordinate.
    pub max_deviation: f64,
    /// Root-mean-square out-of-plane local coordinate.
    pub rms_deviation: f64,
}

impl LocalSurface {
    /// Whether the surface is within tolerance of its fitted plane.
    #[must_use]
    pub const fn is_planar(&self) -> bool {
        self.info.fault_is_plane
    }

    /// The global-to-local transform that produced these points.
    #[must_use]
    pub fn frame(&self) -> LocalFrame {
        LocalFrame::new(self.info.axis_angle().to_matrix(), self.info.origin())
    }
}

/// Move a surface into the local frame of its best-fit plane.
///
/// # Errors
///
/// - `FrameError::InvalidParameter` if the configuration is invalid.
/// - `FrameError::DegenerateInput` or `FrameError::NonFiniteCoordinate` if
///   no plane can be fit.
///
/// # Example
///
/// ```
/// use fault_frame::{FrameConfig, global_to_local, local_to_global};
/// use nalgebra::Vector3;
///
/// let points = vec![
///     Vector3::new(0.0, 0.0, 0.0),
///     Vector3::new(1.0, 0.0, 1.0),
///     Vector3::new(0.0, 1.0, 0.0),
///     Vector3::new(1.0, 1.0, 1.0),
/// ];
/// let config = FrameConfig::default();
///
/// let local = global_to_local(&points, &config).unwrap();
/// assert!(local.is_planar());
/// assert!(local.points.iter().all(|p| p.z.abs() < 1e-12));
///
/// let restored = local_to_global(&local.points, &local.info, &config).unwrap();
/// assert!((restored[1] - points[1]).norm() < 1e-12);
/// ```
pub fn global_to_local(points: &[Vector3<f64>], config: &FrameConfig) -> FrameResult<LocalSurface> {
    config.validate()?;
    let reference = config.unit_reference_axis()?;

    let fit = fit_plane(points, config)?;
    let rotation = build_rotation(&fit.normal(), &reference, config.cutoff_vecmag)?;
    let axis_angle = to_axis_angle(&rotation.matrix, &reference);

    // Fallback rotations leave the normal up to the cutoff away from the
    // reference axis, so measure along where the normal actually landed.
    let check = PlanarityCheck::from_config(config)?.with_axis(rotation.rotate(&fit.normal()));
    let local = to_local(points, &rotation.matrix, &fit.origin(), &check);

    debug!(
        point_count = points.len(),
        angle = axis_angle.angle,
        max_deviation = local.max_deviation,
        rms_deviation = local.rms_deviation,
        is_planar = local.is_planar,
        "Converted surface to local frame"
    );

    let info = SurfaceInfo::new(
        fit.normal(),
        fit.origin(),
        axis_angle,
        local.is_planar,
        reference,
        config.cutoff_vecmag,
    );

    Ok(LocalSurface {
        points: local.points,
        info,
        fit,
        alignment: rotation.alignment,
        max_deviation: local.max_deviation,
        rms_deviation: local.rms_deviation,
    })
}

/// Restore local-frame points to global coordinates.
///
/// The rotation is rebuilt from the stored plane normal with the cutoff
/// stored alongside it; `config.cutoff_vecmag` plays no part. When
/// `config.verify_on_restore` is set, the stored axis-angle must reproduce
/// it within `config.consistency_tolerance`.
///
/// # Errors
///
/// - `FrameError::UnsupportedSchemaVersion` for records from another schema.
/// - `FrameError::InvalidNormal` if the stored normal is zero.
/// - `FrameError::InconsistentSurfaceInfo` if verification fails.
pub fn local_to_global(
    points: &[Vector3<f64>],
    info: &SurfaceInfo,
    config: &FrameConfig,
) -> FrameResult<Vec<Vector3<f64>>> {
    info.check_version()?;
    let rotation = info.rebuild_rotation()?;
    if config.verify_on_restore {
        info.verify_rotation(&rotation.matrix, config.consistency_tolerance)?;
    }
    Ok(to_global(points, &rotation.matrix, &info.origin()))
}

/// Convert many independent surfaces to their local frames.
///
/// Results are returned in input order. A failing surface does not stop
/// the others. Runs on the rayon thread pool when `config.parallel` is set.
pub fn global_to_local_batch<S>(
    surfaces: &[S],
    config: &FrameConfig,
) -> Vec<FrameResult<LocalSurface>>
where
    S: AsRef<[Vector3<f64>]> + Sync,
{
    let results: Vec<FrameResult<LocalSurface>> = if config.parallel {
        surfaces
            .par_iter()
            .map(|s| global_to_local(s.as_ref(), config))
            .collect()
    } else {
        surfaces
            .iter()
            .map(|s| global_to_local(s.as_ref(), config))
            .collect()
    };

    log_batch("global_to_local", &results);
    results
}

/// Restore many surfaces to global coordinates.
///
/// `infos[i]` must be the record produced for `surfaces[i]`.
///
/// # Errors
///
/// Returns `FrameError::InvalidParameter` if the slices differ in length.
/// Per-surface failures are reported in the returned vector.
pub fn local_to_global_batch<S>(
    surfaces: &[S],
    infos: &[SurfaceInfo],
    config: &FrameConfig,
) -> FrameResult<Vec<FrameResult<Vec<Vector3<f64>>>>>
where
    S: AsRef<[Vector3<f64>]> + Sync,
{
    if surfaces.len() != infos.len() {
        return Err(FrameError::InvalidParameter(format!(
            "{} surfaces but {} surface info records",
            surfaces.len(),
            infos.len()
        )));
    }

    let results: Vec<FrameResult<Vec<Vector3<f64>>>> = if config.parallel {
        surfaces
            .par_iter()
            .zip(infos.par_iter())
            .map(|(s, info)| local_to_global(s.as_ref(), info, config))
            .collect()
    } else {
        surfaces
            .iter()
            .zip(infos)
            .map(|(s, info)| local_to_global(s.as_ref(), info, config))
            .collect()
    };

    log_batch("local_to_global", &results);
    Ok(results)
}

fn log_batch<T>(operation: &str, results: &[FrameResult<T>]) {
    let mut failed = 0;
    for (index, result) in results.iter().enumerate() {
        if let Err(err) = result {
            failed += 1;
            warn!(operation, index, error = %err, "Skipping surface");
        }
    }
    info!(
        operation,
        surfaces = results.len(),
        failed,
        "Batch conversion complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Placeholder surface for failed conversions; its info never verifies.
    fn empty_surface() -> LocalSurface {
        let fit = PlaneFit {
            plane: crate::plane::Plane {
                origin: Vector3::zeros(),
                normal: Vector3::z(),
            },
            singular_values: [0.0; 3],
            point_count: 0,
        };
        LocalSurface {
            points: Vec::new(),
            info: SurfaceInfo::new(
                Vector3::z(),
                Vector3::zeros(),
                crate::axis_angle::AxisAngle {
                    axis: Vector3::x(),
                    angle: 1.0,
                },
                false,
                Vector3::z(),
                1e-6,
            ),
            fit,
            alignment: Alignment::General,
            max_deviation: 0.0,
            rms_deviation: 0.0,
        }
    }

    fn dipping_plane(offset: f64) -> Vec<Vector3<f64>> {
        let mut points = Vec::new();
        for i in 0..6_i32 {
            for j in 0..4_i32 {
                let x = f64::from(i) * 100.0 + offset;
                let y = f64::from(j) * 50.0;
                points.push(Vector3::new(x, y, -0.5 * x + 0.25 * y + 1000.0));
            }
        }
        points
    }

    #[test]
    fn planar_surface_flattens() {
        let points = dipping_plane(0.0);
        let local = global_to_local(&points, &FrameConfig::default());
        assert!(local.is_ok());
        let local = local.unwrap_or_else(|_| empty_surface());

        assert!(local.is_planar());
        assert_eq!(local.alignment, Alignment::General);
        assert_eq!(local.points.len(), points.len());
        for p in &local.points {
            assert!(p.z.abs() < 1e-9);
        }
    }

    #[test]
    fn restore_recovers_points() {
        let points = dipping_plane(10.0);
        let config = FrameConfig::default();
        let local = global_to_local(&points, &config);
        assert!(local.is_ok());
        let local = local.unwrap_or_else(|_| empty_surface());

        let restored = local_to_global(&local.points, &local.info, &config);
        assert!(restored.is_ok());
        let restored = restored.unwrap_or_default();
        assert_eq!(restored.len(), points.len());
        for (a, b) in restored.iter().zip(&points) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn restore_ignores_reader_cutoff() {
        let points = dipping_plane(0.0);
        let local = global_to_local(&points, &FrameConfig::default());
        assert!(local.is_ok());
        let local = local.unwrap_or_else(|_| empty_surface());

        for verify in [true, false] {
            let reader = FrameConfig::default()
                .with_cutoff_vecmag(0.5)
                .with_verify_on_restore(verify);
            let restored = local_to_global(&local.points, &local.info, &reader);
            assert!(restored.is_ok());
            let restored = restored.unwrap_or_default();
            assert_eq!(restored.len(), points.len());
            for (a, b) in restored.iter().zip(&points) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn zero_cutoff_on_horizontal_surface() {
        let points = vec![
            Vector3::new(0.0, 0.0, 4.0),
            Vector3::new(1.0, 0.0, 4.0),
            Vector3::new(0.0, 1.0, 4.0),
            Vector3::new(1.0, 1.0, 4.0),
        ];
        let config = FrameConfig::default().with_cutoff_vecmag(0.0);
        assert!(config.validate().is_ok());

        let local = global_to_local(&points, &config);
        assert!(local.is_ok());
        let local = local.unwrap_or_else(|_| empty_surface());

        assert!(local.is_planar());
        assert_eq!(local.points.len(), 4);
        for (l, p) in local.points.iter().zip(&points) {
            assert!(l.iter().all(|c| c.is_finite()));
            assert_relative_eq!(*l, p - Vector3::new(0.5, 0.5, 4.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn frame_matches_transformed_points() {
        let points = dipping_plane(0.0);
        let local = global_to_local(&points, &FrameConfig::default());
        assert!(local.is_ok());
        let local = local.unwrap_or_else(|_| empty_surface());
        assert_eq!(local.points.len(), points.len());

        let frame = local.frame();
        assert_relative_eq!(frame.to_local_point(&points[5]), local.points[5], epsilon = 1e-9);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = FrameConfig::default().with_planarity_tolerance(-1.0);
        let result = global_to_local(&dipping_plane(0.0), &config);
        assert!(matches!(result, Err(FrameError::InvalidParameter(_))));
    }

    #[test]
    fn tampered_info_fails_verification() {
        let config = FrameConfig::default();
        let local = global_to_local(&dipping_plane(0.0), &config);
        assert!(local.is_ok());
        let local = local.unwrap_or_else(|_| empty_surface());

        let mut info = local.info.clone();
        info.rotation_axis = [1.0, 0.0, 0.0];

        let result = local_to_global(&local.points, &info, &config);
        assert!(matches!(result, Err(FrameError::InconsistentSurfaceInfo { .. })));

        let unchecked =
            local_to_global(&local.points, &info, &config.with_verify_on_restore(false));
        assert!(unchecked.is_ok());
    }

    #[test]
    fn batch_keeps_order_and_isolates_failures() {
        let surfaces = vec![
            dipping_plane(0.0),
            vec![Vector3::zeros(), Vector3::x()],
            dipping_plane(500.0),
        ];

        for parallel in [true, false] {
            let config = FrameConfig::default().with_parallel(parallel);
            let results = global_to_local_batch(&surfaces, &config);

            assert_eq!(results.len(), 3);
            assert!(results[0].is_ok());
            assert!(matches!(&results[1], Err(err) if err.is_degenerate_input()));
            assert!(results[2].is_ok());

            if let (Ok(first), Ok(third)) = (&results[0], &results[2]) {
                assert!(third.info.plane_origin[0] > first.info.plane_origin[0]);
            }
        }
    }

    #[test]
    fn batch_restore_round_trips() {
        let surfaces = vec![dipping_plane(0.0), dipping_plane(-300.0)];
        let config = FrameConfig::default();

        let locals: Vec<LocalSurface> = global_to_local_batch(&surfaces, &config)
            .into_iter()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(locals.len(), 2);

        let points: Vec<Vec<Vector3<f64>>> = locals.iter().map(|l| l.points.clone()).collect();
        let infos: Vec<SurfaceInfo> = locals.iter().map(|l| l.info.clone()).collect();

        let restored = local_to_global_batch(&points, &infos, &config);
        assert!(restored.is_ok());
        for (result, original) in restored.unwrap_or_default().into_iter().zip(&surfaces) {
            let result = result.unwrap_or_default();
            assert_eq!(result.len(), original.len());
            for (a, b) in result.iter().zip(original) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn batch_restore_length_mismatch() {
        let points = vec![dipping_plane(0.0)];
        let result = local_to_global_batch(&points, &[], &FrameConfig::default());
        assert!(matches!(result, Err(FrameError::InvalidParameter(_))));
    }
}
