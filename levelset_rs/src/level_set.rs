//! Single-resolution packaged level set.
//!
//! Construction runs as a sequence of data-parallel passes, each finished
//! before the next begins:
//!
//! 1. classify every cell as core or as far inside / far outside,
//! 2. allocate core packages and bind far cells to the singular packages,
//! 3. promote the singular neighbors of core cells to inner packages,
//! 4. wire the neighbor address tables,
//! 5. compute normals, gradients and kernel integrals.

use rayon::prelude::*;

use levelset_core::{
    decompose_point, trilinear_interpolate, BoundingBox, CellIndex, Interpolable, LocalCoord,
    Point3, Shape,
};

use crate::arena::{PackageArena, PackageSeed};
use crate::config::{Adaptation, LevelSetConfig};
use crate::error::Result;
use crate::field::{LevelSetField, MeshLevel};
use crate::mesh::{MeshGeometry, ADDRS_BUFFER, PKG_NODES, PKG_SIZE};
use crate::package::{DataPackage, PackageHandle, Stencil};

const LOG_TARGET: &str = "levelset";

/// Outcome of classifying one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellClass {
    Core,
    FarInside,
    FarOutside,
}

impl CellClass {
    fn singular_handle(self) -> PackageHandle {
        match self {
            CellClass::FarInside => PackageHandle::SINGULAR_INSIDE,
            _ => PackageHandle::SINGULAR_OUTSIDE,
        }
    }
}

/// Proximity measure of the core test: largest component of `n · phi`.
pub(crate) fn is_near_interface(shape: &dyn Shape, position: Point3, grid_spacing: f32) -> bool {
    let measure = (shape.normal_direction(position) * shape.signed_distance(position))
        .max_abs_element();
    measure < grid_spacing
}

/// Level set at one resolution.
///
/// # Example
///
/// ```
/// use levelset_core::{BoundingBox, Point3, Sphere};
/// use levelset_rs::{Adaptation, LevelSet, LevelSetConfig, LevelSetField};
///
/// let sphere = Sphere::new(Point3::ZERO, 1.0);
/// let level_set = LevelSet::new(
///     sphere.bounds(),
///     0.1,
///     &sphere,
///     Adaptation::new(0.1),
///     LevelSetConfig::default(),
/// )?;
///
/// let phi = level_set.probe_signed_distance(Point3::new(0.9, 0.0, 0.0));
/// assert!((phi + 0.1).abs() < 0.1);
/// # Ok::<(), levelset_rs::LevelSetError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LevelSet {
    mesh: MeshGeometry,
    arena: PackageArena,
    cell_packages: Vec<PackageHandle>,
    core_packages: Vec<PackageHandle>,
    inner_packages: Vec<PackageHandle>,
    adaptation: Adaptation,
    config: LevelSetConfig,
    global_h_ratio: f32,
}

impl LevelSet {
    /// Build a level set of `shape` over `bounds` at the given data spacing.
    ///
    /// # Errors
    /// Invalid bounds, spacing, adaptation or configuration.
    pub fn new(
        bounds: BoundingBox,
        data_spacing: f32,
        shape: &dyn Shape,
        adaptation: Adaptation,
        config: LevelSetConfig,
    ) -> Result<Self> {
        Self::build(bounds, data_spacing, shape, adaptation, config, |mesh, _, position| {
            if is_near_interface(shape, position, mesh.grid_spacing()) {
                CellClass::Core
            } else if shape.contains(position) {
                CellClass::FarInside
            } else {
                CellClass::FarOutside
            }
        })
    }

    /// Shared construction pipeline, parameterized by the cell classifier.
    pub(crate) fn build<F>(
        bounds: BoundingBox,
        data_spacing: f32,
        shape: &dyn Shape,
        adaptation: Adaptation,
        config: LevelSetConfig,
        classify: F,
    ) -> Result<Self>
    where
        F: Fn(&MeshGeometry, CellIndex, Point3) -> CellClass + Sync,
    {
        config.validate()?;
        adaptation.validate()?;
        let mesh = MeshGeometry::new(bounds, data_spacing, config.buffer_width)?;
        let total_cells = mesh.total_cells();
        log::debug!(
            target: LOG_TARGET,
            "building level set: {:?} cells, data spacing {}",
            mesh.number_of_cells(),
            data_spacing
        );

        // Classification.
        let classes: Vec<CellClass> = (0..total_cells)
            .into_par_iter()
            .map(|i| {
                let cell = mesh.cell_from_linear(i);
                classify(&mesh, cell, mesh.cell_position(cell))
            })
            .collect();

        let mut arena = PackageArena::new(mesh.far_field_distance());
        let mut cell_packages: Vec<PackageHandle> =
            classes.par_iter().map(|class| class.singular_handle()).collect();

        let core_cells: Vec<usize> = (0..total_cells)
            .filter(|i| classes[*i] == CellClass::Core)
            .collect();
        let seeds: Vec<PackageSeed> = core_cells
            .par_iter()
            .map(|i| PackageSeed::from_shape(&mesh, mesh.cell_from_linear(*i), shape, true, false))
            .collect();
        let core_packages = arena.allocate(seeds);
        for (i, handle) in core_cells.iter().zip(&core_packages) {
            cell_packages[*i] = *handle;
        }
        log::debug!(target: LOG_TARGET, "classified {} core packages", core_packages.len());

        // Inner tagging.
        let is_inner: Vec<bool> = (0..total_cells)
            .into_par_iter()
            .map(|i| {
                mesh.neighborhood(mesh.cell_from_linear(i))
                    .any(|neighbor| classes[mesh.linear_index(neighbor)] == CellClass::Core)
            })
            .collect();
        for handle in &core_packages {
            arena.set_inner(*handle);
        }
        let promoted_cells: Vec<usize> = (0..total_cells)
            .filter(|i| is_inner[*i] && classes[*i] != CellClass::Core)
            .collect();
        let seeds: Vec<PackageSeed> = promoted_cells
            .par_iter()
            .map(|i| PackageSeed::from_shape(&mesh, mesh.cell_from_linear(*i), shape, false, true))
            .collect();
        let promoted = arena.allocate(seeds);
        for (i, handle) in promoted_cells.iter().zip(&promoted) {
            cell_packages[*i] = *handle;
        }
        let inner_packages: Vec<PackageHandle> = (0..total_cells)
            .filter(|i| is_inner[*i])
            .map(|i| cell_packages[i])
            .collect();
        log::debug!(
            target: LOG_TARGET,
            "promoted {} cells to inner packages ({} inner total)",
            promoted.len(),
            inner_packages.len()
        );

        // Address wiring and derived fields.
        arena.wire_neighbors(&mesh, &cell_packages);

        let global_h_ratio = adaptation.reference_spacing / data_spacing;
        let mut level_set = Self {
            mesh,
            arena,
            cell_packages,
            core_packages,
            inner_packages,
            adaptation,
            config,
            global_h_ratio,
        };
        level_set.update_normal_direction();
        level_set.update_non_normalized_normal_direction();
        level_set.update_kernel_integrals();

        log::info!(
            target: LOG_TARGET,
            "level set ready: h_ratio {:.3}, {} core / {} inner packages",
            level_set.global_h_ratio,
            level_set.core_packages.len(),
            level_set.inner_packages.len()
        );
        Ok(level_set)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Lattice geometry.
    #[inline]
    pub fn geometry(&self) -> &MeshGeometry {
        &self.mesh
    }

    /// Reference particle spacing over the data spacing.
    #[inline]
    pub fn global_h_ratio(&self) -> f32 {
        self.global_h_ratio
    }

    /// Spacing between data nodes.
    #[inline]
    pub fn data_spacing(&self) -> f32 {
        self.mesh.data_spacing()
    }

    /// Edge length of a cell.
    #[inline]
    pub fn grid_spacing(&self) -> f32 {
        self.mesh.grid_spacing()
    }

    /// Cells along each axis.
    #[inline]
    pub fn number_of_cells(&self) -> [usize; 3] {
        self.mesh.number_of_cells()
    }

    /// Allocated packages, singular ones included.
    #[inline]
    pub fn num_packages(&self) -> usize {
        self.arena.len()
    }

    /// Handles of core packages, in cell order.
    #[inline]
    pub fn core_packages(&self) -> &[PackageHandle] {
        &self.core_packages
    }

    /// Handles of inner packages, in cell order.
    #[inline]
    pub fn inner_packages(&self) -> &[PackageHandle] {
        &self.inner_packages
    }

    /// Cells owning core packages.
    pub fn core_package_cells(&self) -> Vec<CellIndex> {
        self.package_cells(&self.core_packages)
    }

    /// Cells owning inner packages.
    pub fn inner_package_cells(&self) -> Vec<CellIndex> {
        self.package_cells(&self.inner_packages)
    }

    fn package_cells(&self, handles: &[PackageHandle]) -> Vec<CellIndex> {
        handles
            .iter()
            .filter_map(|handle| self.arena.meta(*handle).cell)
            .collect()
    }

    /// Read view of a package.
    #[inline]
    pub fn package(&self, handle: PackageHandle) -> DataPackage<'_> {
        self.arena.package(handle)
    }

    /// Package bound to the cell containing `position` (clamped into the lattice).
    #[inline]
    pub fn package_at(&self, position: Point3) -> DataPackage<'_> {
        self.arena.package(self.handle_at(self.mesh.clamped_cell(position)))
    }

    /// Package bound to a cell.
    #[inline]
    pub fn handle_at(&self, cell: CellIndex) -> PackageHandle {
        self.cell_packages[self.mesh.linear_index(cell)]
    }

    /// Adaptation parameters used by this level set.
    #[inline]
    pub fn adaptation(&self) -> &Adaptation {
        &self.adaptation
    }

    /// Configuration used by this level set.
    #[inline]
    pub fn config(&self) -> &LevelSetConfig {
        &self.config
    }

    /// True when `position` falls in a cell holding a core package.
    pub fn is_within_core_package(&self, position: Point3) -> bool {
        self.package_at(position).is_core()
    }

    // ------------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------------

    /// Recompute unit normals on all inner packages.
    pub fn update_normal_direction(&mut self) {
        self.arena.update_normal_direction();
    }

    /// Recompute un-normalized gradients on all inner packages.
    pub fn update_non_normalized_normal_direction(&mut self) {
        self.arena
            .update_non_normalized_normal_direction(self.mesh.data_spacing());
    }

    /// Recompute kernel integrals on all inner packages at this level's ratio.
    pub fn update_kernel_integrals(&mut self) {
        self.arena.update_kernel_integrals(
            &self.mesh,
            &self.cell_packages,
            self.adaptation.kernel.as_ref(),
            self.global_h_ratio,
        );
    }

    /// Tag near-interface nodes on core packages.
    pub fn mark_near_interface(&mut self) {
        self.arena.mark_near_interface(
            self.mesh.data_spacing(),
            self.adaptation.small_shift_factor,
        );
    }

    /// Recompute the signed distance of cut nodes on core packages.
    ///
    /// Reads the tags written by [`mark_near_interface`](Self::mark_near_interface).
    pub fn redistance_interface(&mut self) {
        self.arena.redistance_interface(self.mesh.data_spacing());
    }

    /// Run the configured number of reinitialization sweeps.
    ///
    /// # Returns
    /// The largest node change of the last sweep (0 when no sweep runs).
    pub fn reinitialize_level_set(&mut self) -> f32 {
        let data_spacing = self.mesh.data_spacing();
        let sweeps = self.config.reinitialization_sweeps;
        let mut residual = 0.0;
        for sweep in 0..sweeps {
            residual = self.arena.step_reinitialization(data_spacing);
            log::trace!(target: LOG_TARGET, "reinitialization sweep {sweep}: residual {residual:e}");
        }
        log::debug!(
            target: LOG_TARGET,
            "reinitialization finished after {sweeps} sweeps: residual {residual:e}"
        );
        if residual > 0.1 * data_spacing {
            log::warn!(
                target: LOG_TARGET,
                "reinitialization residual {residual:e} still above 0.1 data spacing after {sweeps} sweeps"
            );
        }
        residual
    }

    // ------------------------------------------------------------------------
    // Probes
    // ------------------------------------------------------------------------

    fn probe_field<T: Interpolable>(&self, field: &[T], position: Point3) -> T {
        let cell = self.mesh.clamped_cell(position);
        let handle = self.handle_at(cell);
        if !self.arena.meta(handle).is_inner {
            return field[handle.index() * PKG_NODES];
        }

        let data_spacing = self.mesh.data_spacing();
        let origin = self.mesh.cell_lower_corner(cell) + Point3::splat(0.5 * data_spacing);
        let (base, local) = decompose_point(position, origin, data_spacing);
        let (base, local) = clamp_to_table(base, local);
        let stencil = Stencil::new(field, self.arena.table(handle));
        trilinear_interpolate(&stencil, base, local)
    }
}

/// Keep the interpolation cell inside the address table.
fn clamp_to_table(base: [i32; 3], local: LocalCoord) -> ([i32; 3], LocalCoord) {
    let lower = -(ADDRS_BUFFER as i32);
    let upper = (PKG_SIZE + ADDRS_BUFFER) as i32 - 2;
    let mut base = base;
    let mut weights = [local.u, local.v, local.w];
    for axis in 0..3 {
        if base[axis] < lower {
            base[axis] = lower;
            weights[axis] = 0.0;
        } else if base[axis] > upper {
            base[axis] = upper;
            weights[axis] = 1.0;
        }
    }
    (base, LocalCoord::new(weights[0], weights[1], weights[2]))
}

impl LevelSetField for LevelSet {
    fn probe_signed_distance(&self, position: Point3) -> f32 {
        self.probe_field(&self.arena.phi, position)
    }

    fn probe_normal_direction(&self, position: Point3) -> Point3 {
        self.probe_field(&self.arena.normal, position)
    }

    fn probe_non_normalized_normal_direction(&self, position: Point3) -> Point3 {
        self.probe_field(&self.arena.raw_gradient, position)
    }

    fn probe_kernel_integral(&self, position: Point3, _h_ratio: f32) -> Result<f32> {
        Ok(self.probe_field(&self.arena.kernel_weight, position))
    }

    fn probe_kernel_gradient_integral(&self, position: Point3, _h_ratio: f32) -> Result<Point3> {
        Ok(self.probe_field(&self.arena.kernel_gradient, position))
    }

    fn probe_is_within_mesh_bound(&self, position: Point3) -> bool {
        self.mesh.is_within_mesh_bound(position)
    }

    fn clean_interface(&mut self) {
        self.mark_near_interface();
        self.redistance_interface();
        self.reinitialize_level_set();
        self.update_normal_direction();
        self.update_kernel_integrals();
    }
}

impl MeshLevel for LevelSet {
    fn global_h_ratio(&self) -> f32 {
        self.global_h_ratio
    }

    fn data_spacing(&self) -> f32 {
        self.mesh.data_spacing()
    }

    fn is_within_core_package(&self, position: Point3) -> bool {
        LevelSet::is_within_core_package(self, position)
    }
}
