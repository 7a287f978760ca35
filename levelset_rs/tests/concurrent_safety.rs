//! Concurrent safety tests for levelset_rs.
//!
//! Construction passes run on rayon; these tests check that the resulting
//! package layout and field values do not depend on the thread count, and
//! that built level sets can be probed from many threads at once.

use std::sync::Arc;
use std::thread;

use levelset_rs::prelude::*;
use levelset_rs::CellIndex;

// =============================================================================
// Test Factories
// =============================================================================

fn build_sphere() -> LevelSet {
    let sphere = Sphere::new(Point3::new(0.1, -0.2, 0.05), 0.9);
    LevelSet::new(
        sphere.bounds(),
        0.05,
        &sphere,
        Adaptation::new(0.05),
        LevelSetConfig::default().with_reinitialization_sweeps(5),
    )
    .unwrap()
}

fn build_in_pool(threads: usize) -> LevelSet {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .unwrap()
        .install(build_sphere)
}

fn probe_points() -> Vec<Point3> {
    (0..200)
        .map(|i| {
            let t = i as f32 * 0.731;
            Point3::new(t.sin(), (1.3 * t).cos(), (0.7 * t).sin()) * 1.2
        })
        .collect()
}

struct Snapshot {
    core: Vec<CellIndex>,
    inner: Vec<CellIndex>,
    phi: Vec<f32>,
    normals: Vec<Point3>,
    kernel: Vec<f32>,
}

fn snapshot(level_set: &LevelSet) -> Snapshot {
    let points = probe_points();
    Snapshot {
        core: level_set.core_package_cells(),
        inner: level_set.inner_package_cells(),
        phi: points
            .iter()
            .map(|p| level_set.probe_signed_distance(*p))
            .collect(),
        normals: points
            .iter()
            .map(|p| level_set.probe_normal_direction(*p))
            .collect(),
        kernel: points
            .iter()
            .map(|p| level_set.probe_kernel_integral(*p, 1.0).unwrap())
            .collect(),
    }
}

// =============================================================================
// Deterministic Construction
// =============================================================================

#[test]
fn test_construction_independent_of_thread_count() {
    let reference = snapshot(&build_in_pool(1));
    assert!(!reference.core.is_empty());

    for threads in [2, 4] {
        let other = snapshot(&build_in_pool(threads));
        assert_eq!(other.core, reference.core, "{threads} threads");
        assert_eq!(other.inner, reference.inner, "{threads} threads");
        assert_eq!(other.phi, reference.phi, "{threads} threads");
        assert_eq!(other.normals, reference.normals, "{threads} threads");
        assert_eq!(other.kernel, reference.kernel, "{threads} threads");
    }
}

#[test]
fn test_cleaning_independent_of_thread_count() {
    let clean_in_pool = |threads: usize| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
            .install(|| {
                let mut level_set = build_sphere();
                let residual = level_set.reinitialize_level_set();
                level_set.clean_interface();
                (residual, snapshot(&level_set))
            })
    };

    let (residual_1, single) = clean_in_pool(1);
    let (residual_4, multi) = clean_in_pool(4);
    assert_eq!(residual_1, residual_4);
    assert_eq!(single.phi, multi.phi);
    assert_eq!(single.normals, multi.normals);
    assert_eq!(single.kernel, multi.kernel);
}

// =============================================================================
// Concurrent Reads
// =============================================================================

#[test]
fn test_concurrent_probes_match_sequential() {
    let level_set = Arc::new(build_sphere());
    let points = Arc::new(probe_points());
    let expected: Vec<f32> = points
        .iter()
        .map(|p| level_set.probe_signed_distance(*p))
        .collect();

    let num_threads = 8;
    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let level_set = Arc::clone(&level_set);
            let points = Arc::clone(&points);
            thread::spawn(move || {
                points
                    .iter()
                    .map(|p| level_set.probe_signed_distance(*p))
                    .collect::<Vec<f32>>()
            })
        })
        .collect();

    for handle in handles {
        let results = handle.join().expect("Thread panicked");
        assert_eq!(results, expected);
    }
}

#[test]
fn test_concurrent_multilevel_probes() {
    let sphere = Sphere::new(Point3::ZERO, 1.0);
    let multilevel = Arc::new(
        MultilevelLevelSet::new(
            sphere.bounds(),
            0.1,
            2,
            &sphere,
            Adaptation::new(0.1),
            LevelSetConfig::default(),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|thread_id| {
            let multilevel = Arc::clone(&multilevel);
            thread::spawn(move || {
                for i in 0..250 {
                    let t = (thread_id * 250 + i) as f32 * 0.013;
                    let point = Point3::new(t.cos(), t.sin(), 0.0);
                    let h_ratio = 1.0 + (i % 11) as f32 * 0.1;
                    let weight = multilevel.probe_kernel_integral(point, h_ratio).unwrap();
                    assert!((-0.05..=1.05).contains(&weight), "weight {weight} at {point:?}");
                    assert!(multilevel.probe_signed_distance(point).abs() < 0.05);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
}

#[test]
fn test_level_sets_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LevelSet>();
    assert_send_sync::<RefinedLevelSet>();
    assert_send_sync::<MultilevelLevelSet>();
    assert_send_sync::<Box<dyn MeshLevel>>();
}
