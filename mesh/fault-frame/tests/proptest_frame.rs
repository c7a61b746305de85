//! Property-based tests for plane fitting and frame conversion.
//!
//! Run with: cargo test -p fault-frame -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used)]

use fault_frame::{
    Alignment, FrameConfig, PlanarityCheck, PlanarityMeasure, axis_angle_matrix, build_rotation,
    fit_plane, to_axis_angle, to_global, to_local,
};
use nalgebra::{Matrix3, Vector3};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// A coordinate in a bounded range.
fn arb_point(range: f64) -> impl Strategy<Value = Vector3<f64>> {
    prop::array::uniform3(-range..range).prop_map(Vector3::from)
}

/// A unit vector, rejecting near-zero samples.
fn arb_unit() -> impl Strategy<Value = Vector3<f64>> {
    prop::array::uniform3(-1.0..1.0f64)
        .prop_map(Vector3::from)
        .prop_filter("non-zero direction", |v| v.norm() > 1e-3)
        .prop_map(|v| v.normalize())
}

/// A proper rotation matrix built from a random axis and angle.
fn arb_rotation() -> impl Strategy<Value = Matrix3<f64>> {
    (arb_unit(), 0.0..std::f64::consts::PI)
        .prop_map(|(axis, angle)| axis_angle_matrix(&axis, angle))
}

fn max_abs_diff(a: &Matrix3<f64>, b: &Matrix3<f64>) -> f64 {
    (a - b).amax()
}

// =============================================================================
// Rotation properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_rotation_is_orthonormal(normal in arb_unit()) {
        let rotation = build_rotation(&normal, &Vector3::z(), 1e-6).unwrap();
        let m = rotation.matrix;

        prop_assert!(max_abs_diff(&(m * m.transpose()), &Matrix3::identity()) < 1e-12);
        prop_assert!((m.determinant() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn proptest_rotation_aligns_normal(normal in arb_unit()) {
        let rotation = build_rotation(&normal, &Vector3::z(), 1e-6).unwrap();
        let mapped = rotation.rotate(&normal);

        let tolerance = if rotation.alignment == Alignment::General { 1e-9 } else { 1e-6 };
        prop_assert!((mapped - Vector3::z()).norm() < tolerance);
    }

    #[test]
    fn proptest_axis_angle_round_trip(r in arb_rotation()) {
        let aa = to_axis_angle(&r, &Vector3::z());

        prop_assert!((aa.axis.norm() - 1.0).abs() < 1e-12);
        prop_assert!(aa.angle >= 0.0 && aa.angle <= std::f64::consts::PI);
        prop_assert!(max_abs_diff(&aa.to_matrix(), &r) < 1e-9);
    }

    #[test]
    fn proptest_forward_inverse_round_trip(
        points in prop::collection::vec(arb_point(1000.0), 0..50),
        r in arb_rotation(),
        origin in arb_point(1.0e6),
    ) {
        let check = PlanarityCheck {
            axis: Vector3::z(),
            tolerance: 1e-5,
            measure: PlanarityMeasure::MaxDeviation,
        };
        let local = to_local(&points, &r, &origin, &check);
        let restored = to_global(&local.points, &r, &origin);

        prop_assert_eq!(restored.len(), points.len());
        for (a, b) in restored.iter().zip(&points) {
            prop_assert!((a - b).norm() < 1e-6);
        }
    }

    #[test]
    fn proptest_fit_recovers_plane(
        normal in arb_unit(),
        origin in arb_point(1000.0),
        offsets in prop::collection::vec(prop::array::uniform2(-50.0..50.0f64), 3..40),
    ) {
        let helper = if normal.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        let u = normal.cross(&helper).normalize();
        let v = normal.cross(&u);
        let points: Vec<_> = offsets.iter().map(|[a, b]| origin + u * *a + v * *b).collect();

        match fit_plane(&points, &FrameConfig::default()) {
            Ok(fit) => {
                prop_assert!((fit.normal().dot(&normal).abs() - 1.0).abs() < 1e-6);
                prop_assert!(fit.plane.distance(origin) < 1e-6);
                prop_assert!(fit.normal().z >= 0.0 || fit.normal().z.abs() < 1e-12);
            }
            // Random offsets may happen to be collinear
            Err(err) => prop_assert!(err.is_degenerate_input()),
        }
    }
}
