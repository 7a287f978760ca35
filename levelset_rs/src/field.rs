//! Capability traits shared by every level-set variant.

use levelset_core::Point3;

use crate::error::Result;

/// Point queries and maintenance offered by every level set.
///
/// Probes near the lattice edge are only meaningful where
/// [`probe_is_within_mesh_bound`](Self::probe_is_within_mesh_bound) holds.
pub trait LevelSetField: Send + Sync {
    /// Signed distance to the interface, negative inside.
    fn probe_signed_distance(&self, position: Point3) -> f32;

    /// Unit outward normal.
    fn probe_normal_direction(&self, position: Point3) -> Point3;

    /// Gradient of the signed distance without normalization.
    fn probe_non_normalized_normal_direction(&self, position: Point3) -> Point3;

    /// Kernel weight integral at the resolution ratio `h_ratio`.
    ///
    /// Single-resolution level sets ignore `h_ratio` and return the value
    /// integrated at their own ratio.
    fn probe_kernel_integral(&self, position: Point3, h_ratio: f32) -> Result<f32>;

    /// Kernel gradient integral at the resolution ratio `h_ratio`.
    fn probe_kernel_gradient_integral(&self, position: Point3, h_ratio: f32) -> Result<Point3>;

    /// False within two cells of the lattice edge.
    fn probe_is_within_mesh_bound(&self, position: Point3) -> bool;

    /// Mark, redistance, reinitialize, then refresh normals and kernel integrals.
    fn clean_interface(&mut self);
}

/// One resolution level of a multilevel hierarchy.
pub trait MeshLevel: LevelSetField {
    /// Reference particle spacing over this level's data spacing.
    fn global_h_ratio(&self) -> f32;

    /// Spacing between data nodes.
    fn data_spacing(&self) -> f32;

    /// True when `position` falls in a cell holding a core package.
    fn is_within_core_package(&self, position: Point3) -> bool;
}
