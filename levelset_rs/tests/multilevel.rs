//! Multilevel hierarchy tests for levelset_rs.

use std::sync::OnceLock;

use levelset_rs::prelude::*;
use levelset_rs::LevelSetError;

const COARSEST_SPACING: f32 = 0.1;

// =============================================================================
// Test Fixtures
// =============================================================================

fn unit_sphere() -> Sphere {
    Sphere::new(Point3::ZERO, 1.0)
}

/// A sphere whose field grows twice as fast as a true distance.
struct StretchedSphere {
    sphere: Sphere,
}

impl Shape for StretchedSphere {
    fn signed_distance(&self, point: Point3) -> f32 {
        2.0 * self.sphere.signed_distance(point)
    }

    fn normal_direction(&self, point: Point3) -> Point3 {
        self.sphere.normal_direction(point)
    }
}

fn build(total_levels: usize, coarsest_spacing: f32) -> MultilevelLevelSet {
    let _ = env_logger::builder().is_test(true).try_init();
    let sphere = unit_sphere();
    MultilevelLevelSet::new(
        sphere.bounds(),
        coarsest_spacing,
        total_levels,
        &sphere,
        Adaptation::new(coarsest_spacing),
        LevelSetConfig::default(),
    )
    .unwrap()
}

fn two_levels() -> &'static MultilevelLevelSet {
    static HIERARCHY: OnceLock<MultilevelLevelSet> = OnceLock::new();
    HIERARCHY.get_or_init(|| build(2, COARSEST_SPACING))
}

fn surface_points() -> Vec<Point3> {
    vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0).normalize(),
        Point3::new(-1.0, 1.0, 0.0).normalize(),
    ]
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_three_level_hierarchy() {
    let multilevel = build(3, 0.2);
    assert_eq!(multilevel.total_levels(), 3);

    let levels = multilevel.levels();
    for (level, expected) in levels.iter().zip([1.0f32, 2.0, 4.0]) {
        assert!((level.global_h_ratio() - expected).abs() < 1e-4);
    }
    for pair in levels.windows(2) {
        assert!((pair[1].data_spacing() - 0.5 * pair[0].data_spacing()).abs() < 1e-7);
    }
    assert_eq!(multilevel.mesh_level(3.0).unwrap(), 1);
    assert_eq!(multilevel.mesh_level(4.0).unwrap(), 2);
}

#[test]
fn test_single_level_checks_ratio_range() {
    let single = build(1, COARSEST_SPACING);
    let level = &single.levels()[0];
    let r0 = level.global_h_ratio();
    let position = Point3::new(1.0, 0.0, 0.0);

    let direct = level.probe_kernel_integral(position, r0).unwrap();
    assert_eq!(single.probe_kernel_integral(position, r0).unwrap(), direct);
    assert!(single.probe_kernel_gradient_integral(position, r0).is_ok());

    for h_ratio in [7.0f32, 0.1] {
        assert!(matches!(
            single.probe_kernel_integral(position, h_ratio),
            Err(LevelSetError::LevelOutOfRange { .. })
        ));
        assert!(matches!(
            single.probe_kernel_gradient_integral(position, h_ratio),
            Err(LevelSetError::LevelOutOfRange { .. })
        ));
    }
}

// =============================================================================
// Level Selection
// =============================================================================

#[test]
fn test_mesh_level_is_monotonic() {
    let multilevel = two_levels();
    let mut previous = 0;
    for step in 0..=20 {
        let h_ratio = 1.0 + 0.05 * step as f32;
        let level = multilevel.mesh_level(h_ratio).unwrap();
        assert!(level >= previous);
        previous = level;
    }
    assert_eq!(previous, 1);
}

#[test]
fn test_out_of_range_ratio_is_an_error() {
    let multilevel = two_levels();
    let position = Point3::new(1.0, 0.0, 0.0);

    let err = multilevel.probe_kernel_integral(position, 0.5).unwrap_err();
    assert!(matches!(err, LevelSetError::LevelOutOfRange { .. }));
    assert!(err.to_string().contains("outside hierarchy range"));

    assert!(multilevel
        .probe_kernel_gradient_integral(position, 2.5)
        .is_err());
}

#[test]
fn test_direct_probes_use_finest_core_level() {
    let multilevel = two_levels();
    let finest = &multilevel.levels()[1];

    for position in surface_points() {
        assert_eq!(multilevel.probe_level(position), 1);
        assert_eq!(
            multilevel.probe_signed_distance(position),
            finest.probe_signed_distance(position)
        );
        assert_eq!(
            multilevel.probe_normal_direction(position),
            finest.probe_normal_direction(position)
        );
        assert!(multilevel.probe_signed_distance(position).abs() < 0.025);
    }
    assert_eq!(multilevel.probe_level(Point3::ZERO), 0);
}

// =============================================================================
// Blended Kernel Probes
// =============================================================================

#[test]
fn test_kernel_probe_continuity_at_level_ratios() {
    let multilevel = two_levels();
    let levels = multilevel.levels();
    let (r0, r1) = (levels[0].global_h_ratio(), levels[1].global_h_ratio());

    for position in surface_points() {
        let coarse = levels[0].probe_kernel_integral(position, r0).unwrap();
        let fine = levels[1].probe_kernel_integral(position, r1).unwrap();
        assert_eq!(multilevel.probe_kernel_integral(position, r0).unwrap(), coarse);
        assert_eq!(multilevel.probe_kernel_integral(position, r1).unwrap(), fine);
    }
}

#[test]
fn test_kernel_probe_blends_between_levels() {
    let multilevel = two_levels();
    let levels = multilevel.levels();

    for position in surface_points() {
        let coarse = levels[0].probe_kernel_integral(position, 1.0).unwrap();
        let fine = levels[1].probe_kernel_integral(position, 2.0).unwrap();
        let mid = multilevel.probe_kernel_integral(position, 1.5).unwrap();
        assert!((mid - 0.5 * (coarse + fine)).abs() < 1e-5);

        let coarse_gradient = levels[0].probe_kernel_gradient_integral(position, 1.0).unwrap();
        let fine_gradient = levels[1].probe_kernel_gradient_integral(position, 2.0).unwrap();
        let blended = multilevel
            .probe_kernel_gradient_integral(position, 1.25)
            .unwrap();
        let expected = coarse_gradient * 0.75 + fine_gradient * 0.25;
        assert!((blended - expected).length() < 1e-4);
    }
}

// =============================================================================
// Bounds and Cleaning
// =============================================================================

#[test]
fn test_mesh_bound_requires_every_level() {
    let multilevel = two_levels();
    let levels = multilevel.levels();

    let center = Point3::ZERO;
    assert!(multilevel.probe_is_within_mesh_bound(center));

    // Inside the coarse margin, outside the fine one.
    let edge = Point3::new(1.6, 0.0, 0.0);
    assert!(levels[0].probe_is_within_mesh_bound(edge));
    assert!(!levels[1].probe_is_within_mesh_bound(edge));
    assert!(!multilevel.probe_is_within_mesh_bound(edge));
}

#[test]
fn test_clean_interface_touches_finest_level_only() {
    let _ = env_logger::builder().is_test(true).try_init();
    let shape = StretchedSphere {
        sphere: unit_sphere(),
    };
    let mut multilevel = MultilevelLevelSet::new(
        BoundingBox::cube(Point3::ZERO, 1.0),
        COARSEST_SPACING,
        2,
        &shape,
        Adaptation::new(COARSEST_SPACING),
        LevelSetConfig::default(),
    )
    .unwrap();

    let samples: Vec<Point3> = surface_points()
        .into_iter()
        .flat_map(|p| [p * 0.97, p * 1.03, p * 1.06])
        .collect();
    let sample = |multilevel: &MultilevelLevelSet, level: usize| -> Vec<f32> {
        samples
            .iter()
            .map(|p| multilevel.levels()[level].probe_signed_distance(*p))
            .collect()
    };
    let coarse_before = sample(&multilevel, 0);
    let fine_before = sample(&multilevel, 1);

    multilevel.clean_interface();

    assert_eq!(sample(&multilevel, 0), coarse_before);
    let fine_after = sample(&multilevel, 1);
    assert!(fine_after
        .iter()
        .zip(&fine_before)
        .any(|(after, before)| (after - before).abs() > 0.1 * COARSEST_SPACING));

    // The stretched field relaxes toward the true distance.
    let inside = Point3::new(0.0, 0.97, 0.0);
    assert!((multilevel.probe_signed_distance(inside) + 0.03).abs() < 0.25 * COARSEST_SPACING);
}
