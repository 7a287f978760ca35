//! Collaborator traits shared by the level-set crates.
//!
//! Storage implements [`NodeValueProvider`] to plug into the interpolation
//! routines. Geometry and smoothing kernels come from the caller through
//! [`Shape`] and [`Kernel`].

use crate::types::Point3;

/// Trait for storage that answers values at integer lattice nodes.
///
/// Indices are signed so callers may address ghost nodes around a block;
/// implementations decide how to resolve them.
pub trait NodeValueProvider<T> {
    /// Value stored at the node with the given lattice index.
    fn node_value(&self, index: [i32; 3]) -> T;
}

/// A closed body described by its signed distance.
///
/// Distances are negative inside and positive outside.
pub trait Shape: Send + Sync {
    /// Signed distance from `point` to the surface.
    fn signed_distance(&self, point: Point3) -> f32;

    /// Outward unit normal of the surface nearest to `point`.
    fn normal_direction(&self, point: Point3) -> Point3;

    /// True when `point` lies inside the body.
    #[inline]
    fn contains(&self, point: Point3) -> bool {
        self.signed_distance(point) < 0.0
    }
}

/// A compactly supported, radially symmetric smoothing kernel.
///
/// `h_ratio` is the ratio between the kernel's reference smoothing length
/// and the smoothing length at which it is evaluated.
pub trait Kernel: Send + Sync {
    /// Radius beyond which the kernel vanishes.
    fn cutoff_radius(&self, h_ratio: f32) -> f32;

    /// Kernel value at distance `r`.
    fn w(&self, h_ratio: f32, r: f32) -> f32;

    /// Radial derivative of the kernel at distance `r`.
    fn dw(&self, h_ratio: f32, r: f32) -> f32;
}

/// Convert a corner index (0-7) to a corner offset tuple (i, j, k).
///
/// ```text
/// Corner:  0      1      2      3      4      5      6      7
/// Offset: (0,0,0)(1,0,0)(1,1,0)(0,1,0)(0,0,1)(1,0,1)(1,1,1)(0,1,1)
/// ```
#[inline]
pub const fn corner_from_index(idx: usize) -> (u32, u32, u32) {
    const CORNERS: [(u32, u32, u32); 8] = [
        (0, 0, 0),
        (1, 0, 0),
        (1, 1, 0),
        (0, 1, 0),
        (0, 0, 1),
        (1, 0, 1),
        (1, 1, 1),
        (0, 1, 1),
    ];
    CORNERS[idx & 7]
}
