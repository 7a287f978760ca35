//! Package storage with SoA (Structure of Arrays) layout.
//!
//! Memory layout: `field[handle * PKG_NODES + node]` for every node field and
//! `neighbors[handle * ADDRS_NODES + entry]` for the address tables. Handles
//! 0 and 1 are the singular far-field packages; every other handle is a
//! package owned by exactly one cell.
//!
//! Every numeric pass iterates the field it writes with `par_chunks_mut`
//! and reads the other fields (or a snapshot of the written one) shared, so
//! packages never write into each other.

use rayon::prelude::*;

use levelset_core::{euclidean_div, euclidean_rem, heaviside, CellIndex, Kernel, Point3, Shape};

use crate::mesh::{MeshGeometry, ADDRS_NODES, PKG_NODES, PKG_SIZE};
use crate::package::{
    compute_gradient, compute_normal_direction, mark_near_interface, node_coords, node_index,
    redistance_interface, step_reinitialization, table_offset, DataPackage, NodeAddress,
    PackageHandle, Stencil,
};

/// Per-package flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackageMeta {
    /// Owning cell, `None` for singular packages.
    pub cell: Option<CellIndex>,
    /// Within one grid spacing of the interface.
    pub is_core: bool,
    /// Carries stencil data for the numeric passes.
    pub is_inner: bool,
}

/// A package ready to be moved into the arena.
#[derive(Debug, Clone)]
pub(crate) struct PackageSeed {
    pub(crate) cell: CellIndex,
    pub(crate) is_core: bool,
    pub(crate) is_inner: bool,
    pub(crate) phi: [f32; PKG_NODES],
}

impl PackageSeed {
    /// Sample the shape's signed distance at every node of the cell's package.
    pub(crate) fn from_shape(
        mesh: &MeshGeometry,
        cell: CellIndex,
        shape: &dyn Shape,
        is_core: bool,
        is_inner: bool,
    ) -> Self {
        let mut phi = [0.0f32; PKG_NODES];
        for (n, value) in phi.iter_mut().enumerate() {
            *value = shape.signed_distance(mesh.node_position(cell, node_coords(n)));
        }
        Self {
            cell,
            is_core,
            is_inner,
            phi,
        }
    }
}

/// Pool of data packages.
#[derive(Debug, Clone)]
pub struct PackageArena {
    pub(crate) phi: Vec<f32>,
    pub(crate) normal: Vec<Point3>,
    pub(crate) raw_gradient: Vec<Point3>,
    pub(crate) kernel_weight: Vec<f32>,
    pub(crate) kernel_gradient: Vec<Point3>,
    pub(crate) interface_tag: Vec<i8>,
    pub(crate) meta: Vec<PackageMeta>,
    pub(crate) neighbors: Vec<NodeAddress>,
}

impl PackageArena {
    /// Create an arena holding only the two singular packages.
    ///
    /// The inside package stores `-far_field_distance` with kernel weight 0,
    /// the outside package `+far_field_distance` with kernel weight 1.
    pub fn new(far_field_distance: f32) -> Self {
        let mut arena = Self {
            phi: Vec::new(),
            normal: Vec::new(),
            raw_gradient: Vec::new(),
            kernel_weight: Vec::new(),
            kernel_gradient: Vec::new(),
            interface_tag: Vec::new(),
            meta: Vec::new(),
            neighbors: Vec::new(),
        };
        arena.push_singular(-far_field_distance, 0.0, -2);
        arena.push_singular(far_field_distance, 1.0, 2);
        arena
    }

    fn push_singular(&mut self, phi: f32, kernel_weight: f32, tag: i8) {
        let handle = PackageHandle::from_index(self.meta.len());
        self.phi.extend([phi; PKG_NODES]);
        self.normal.extend([Point3::ZERO; PKG_NODES]);
        self.raw_gradient.extend([Point3::ZERO; PKG_NODES]);
        self.kernel_weight.extend([kernel_weight; PKG_NODES]);
        self.kernel_gradient.extend([Point3::ZERO; PKG_NODES]);
        self.interface_tag.extend([tag; PKG_NODES]);
        self.meta.push(PackageMeta::default());
        self.neighbors
            .extend(std::iter::repeat(NodeAddress::new(handle, 0)).take(ADDRS_NODES));
    }

    /// Number of packages, singular ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    /// True when the arena holds nothing but the singular packages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meta.len() <= PackageHandle::SINGULAR_COUNT
    }

    /// Flags of a package.
    #[inline]
    pub fn meta(&self, handle: PackageHandle) -> &PackageMeta {
        &self.meta[handle.index()]
    }

    /// Read view of a package.
    #[inline]
    pub fn package(&self, handle: PackageHandle) -> DataPackage<'_> {
        DataPackage::new(self, handle)
    }

    /// Neighbor address table of a package.
    #[inline]
    pub(crate) fn table(&self, handle: PackageHandle) -> &[NodeAddress] {
        let start = handle.index() * ADDRS_NODES;
        &self.neighbors[start..start + ADDRS_NODES]
    }

    pub(crate) fn set_inner(&mut self, handle: PackageHandle) {
        self.meta[handle.index()].is_inner = true;
    }

    /// Move seeds into the arena in order.
    ///
    /// # Returns
    /// The handles of the new packages, in the order of `seeds`.
    pub(crate) fn allocate(&mut self, seeds: Vec<PackageSeed>) -> Vec<PackageHandle> {
        let first = self.meta.len();
        let count = seeds.len();
        let added = count * PKG_NODES;

        self.phi.reserve(added);
        self.interface_tag.reserve(added);
        for seed in &seeds {
            self.phi.extend_from_slice(&seed.phi);
            self.interface_tag
                .extend(seed.phi.iter().map(|phi| if *phi < 0.0 { -2i8 } else { 2 }));
        }
        self.normal.resize(self.normal.len() + added, Point3::ZERO);
        self.raw_gradient.resize(self.raw_gradient.len() + added, Point3::ZERO);
        self.kernel_weight.resize(self.kernel_weight.len() + added, 0.0);
        self.kernel_gradient.resize(self.kernel_gradient.len() + added, Point3::ZERO);

        self.meta.extend(seeds.into_iter().map(|seed| PackageMeta {
            cell: Some(seed.cell),
            is_core: seed.is_core,
            is_inner: seed.is_inner,
        }));

        let handles: Vec<PackageHandle> =
            (first..first + count).map(PackageHandle::from_index).collect();
        for handle in &handles {
            self.neighbors
                .extend(std::iter::repeat(NodeAddress::new(*handle, 0)).take(ADDRS_NODES));
        }
        handles
    }

    // ------------------------------------------------------------------------
    // Passes
    // ------------------------------------------------------------------------

    /// Fill the address tables of all inner packages from the final cell bindings.
    pub(crate) fn wire_neighbors(&mut self, mesh: &MeshGeometry, cell_packages: &[PackageHandle]) {
        let meta = &self.meta;
        self.neighbors
            .par_chunks_mut(ADDRS_NODES)
            .enumerate()
            .skip(PackageHandle::SINGULAR_COUNT)
            .for_each(|(h, table)| {
                let package = &meta[h];
                let Some(cell) = package.cell.filter(|_| package.is_inner) else {
                    return;
                };
                let origin = [cell.x as i32, cell.y as i32, cell.z as i32];
                let size = PKG_SIZE as i32;
                for (entry, address) in table.iter_mut().enumerate() {
                    let offset = table_offset(entry);
                    let mut neighbor = [0i32; 3];
                    let mut local = [0usize; 3];
                    for axis in 0..3 {
                        neighbor[axis] = origin[axis] + euclidean_div(offset[axis], size);
                        local[axis] = euclidean_rem(offset[axis], size) as usize;
                    }
                    let neighbor_cell = mesh.clamp(neighbor);
                    let handle = cell_packages[mesh.linear_index(neighbor_cell)];
                    *address = NodeAddress::new(handle, node_index(local));
                }
            });
    }

    /// Recompute unit normals on inner packages.
    pub(crate) fn update_normal_direction(&mut self) {
        let (meta, phi, neighbors) = (&self.meta, &self.phi, &self.neighbors);
        self.normal
            .par_chunks_mut(PKG_NODES)
            .enumerate()
            .skip(PackageHandle::SINGULAR_COUNT)
            .filter(|(h, _)| meta[*h].is_inner)
            .for_each(|(h, out)| {
                let table = &neighbors[h * ADDRS_NODES..(h + 1) * ADDRS_NODES];
                compute_normal_direction(&Stencil::new(phi, table), out);
            });
    }

    /// Recompute un-normalized gradients on inner packages.
    pub(crate) fn update_non_normalized_normal_direction(&mut self, data_spacing: f32) {
        let (meta, phi, neighbors) = (&self.meta, &self.phi, &self.neighbors);
        self.raw_gradient
            .par_chunks_mut(PKG_NODES)
            .enumerate()
            .skip(PackageHandle::SINGULAR_COUNT)
            .filter(|(h, _)| meta[*h].is_inner)
            .for_each(|(h, out)| {
                let table = &neighbors[h * ADDRS_NODES..(h + 1) * ADDRS_NODES];
                compute_gradient(&Stencil::new(phi, table), data_spacing, out);
            });
    }

    /// One reinitialization sweep over inner packages.
    ///
    /// # Returns
    /// Largest change applied to any node.
    pub(crate) fn step_reinitialization(&mut self, data_spacing: f32) -> f32 {
        let snapshot = self.phi.clone();
        let (meta, neighbors) = (&self.meta, &self.neighbors);
        self.phi
            .par_chunks_mut(PKG_NODES)
            .enumerate()
            .skip(PackageHandle::SINGULAR_COUNT)
            .filter(|(h, _)| meta[*h].is_inner)
            .map(|(h, out)| {
                let table = &neighbors[h * ADDRS_NODES..(h + 1) * ADDRS_NODES];
                step_reinitialization(&Stencil::new(&snapshot, table), data_spacing, out)
            })
            .reduce(|| 0.0, f32::max)
    }

    /// Tag near-interface nodes on core packages.
    pub(crate) fn mark_near_interface(&mut self, data_spacing: f32, small_shift_factor: f32) {
        let (meta, phi, neighbors) = (&self.meta, &self.phi, &self.neighbors);
        self.interface_tag
            .par_chunks_mut(PKG_NODES)
            .enumerate()
            .skip(PackageHandle::SINGULAR_COUNT)
            .filter(|(h, _)| meta[*h].is_core)
            .for_each(|(h, out)| {
                let table = &neighbors[h * ADDRS_NODES..(h + 1) * ADDRS_NODES];
                mark_near_interface(
                    &Stencil::new(phi, table),
                    data_spacing,
                    small_shift_factor,
                    out,
                );
            });
    }

    /// Redistance cut nodes on core packages.
    pub(crate) fn redistance_interface(&mut self, data_spacing: f32) {
        let snapshot = self.phi.clone();
        let (meta, tag, neighbors) = (&self.meta, &self.interface_tag, &self.neighbors);
        self.phi
            .par_chunks_mut(PKG_NODES)
            .enumerate()
            .skip(PackageHandle::SINGULAR_COUNT)
            .filter(|(h, _)| meta[*h].is_core)
            .for_each(|(h, out)| {
                let table = &neighbors[h * ADDRS_NODES..(h + 1) * ADDRS_NODES];
                redistance_interface(
                    &Stencil::new(&snapshot, table),
                    &Stencil::new(tag, table),
                    data_spacing,
                    out,
                );
            });
    }

    /// Recompute kernel weight and gradient integrals on inner packages.
    ///
    /// Neighbor nodes are looked up through the cell bindings, so the
    /// integration radius may exceed the address-table buffer.
    pub(crate) fn update_kernel_integrals(
        &mut self,
        mesh: &MeshGeometry,
        cell_packages: &[PackageHandle],
        kernel: &dyn Kernel,
        h_ratio: f32,
    ) {
        let nodes = GlobalNodes {
            mesh,
            cell_packages,
            phi: &self.phi,
        };
        let integrator = KernelIntegrator::new(kernel, h_ratio, mesh.data_spacing());
        let meta = &self.meta;
        self.kernel_weight
            .par_chunks_mut(PKG_NODES)
            .zip(self.kernel_gradient.par_chunks_mut(PKG_NODES))
            .enumerate()
            .skip(PackageHandle::SINGULAR_COUNT)
            .for_each(|(h, (weights, gradients))| {
                let package = &meta[h];
                let Some(cell) = package.cell.filter(|_| package.is_inner) else {
                    return;
                };
                let size = PKG_SIZE as i32;
                for n in 0..PKG_NODES {
                    let local = node_coords(n);
                    let global = [
                        cell.x as i32 * size + local[0] as i32,
                        cell.y as i32 * size + local[1] as i32,
                        cell.z as i32 * size + local[2] as i32,
                    ];
                    let phi = nodes.phi[h * PKG_NODES + n];
                    let (weight, gradient) = integrator.integrate(&nodes, global, phi);
                    weights[n] = weight;
                    gradients[n] = gradient;
                }
            });
    }
}

/// Signed distance at any global data node, resolved through the cell bindings.
struct GlobalNodes<'a> {
    mesh: &'a MeshGeometry,
    cell_packages: &'a [PackageHandle],
    phi: &'a [f32],
}

impl GlobalNodes<'_> {
    fn phi(&self, global: [i32; 3]) -> f32 {
        let size = PKG_SIZE as i32;
        let cell = self.mesh.clamp([
            euclidean_div(global[0], size),
            euclidean_div(global[1], size),
            euclidean_div(global[2], size),
        ]);
        let local = [
            euclidean_rem(global[0], size) as usize,
            euclidean_rem(global[1], size) as usize,
            euclidean_rem(global[2], size) as usize,
        ];
        let handle = self.cell_packages[self.mesh.linear_index(cell)];
        self.phi[handle.index() * PKG_NODES + node_index(local)]
    }
}

/// Riemann-sum integration of a kernel over the region where `phi > 0`.
struct KernelIntegrator<'a> {
    kernel: &'a dyn Kernel,
    h_ratio: f32,
    data_spacing: f32,
    cutoff: f32,
    reach: i32,
    cell_volume: f32,
}

impl<'a> KernelIntegrator<'a> {
    fn new(kernel: &'a dyn Kernel, h_ratio: f32, data_spacing: f32) -> Self {
        let cutoff = kernel.cutoff_radius(h_ratio);
        Self {
            kernel,
            h_ratio,
            data_spacing,
            cutoff,
            reach: (cutoff / data_spacing).ceil() as i32,
            cell_volume: data_spacing * data_spacing * data_spacing,
        }
    }

    fn integrate(&self, nodes: &GlobalNodes<'_>, global: [i32; 3], phi: f32) -> (f32, Point3) {
        let threshold = self.cutoff + self.data_spacing;
        if phi > threshold {
            return (1.0, Point3::ZERO);
        }
        if phi < -threshold {
            return (0.0, Point3::ZERO);
        }

        let mut weight = 0.0f32;
        let mut gradient = Point3::ZERO;
        for k in -self.reach..=self.reach {
            for j in -self.reach..=self.reach {
                for i in -self.reach..=self.reach {
                    // Displacement from the node to the integration point.
                    let displacement =
                        Point3::new(-i as f32, -j as f32, -k as f32) * self.data_spacing;
                    let distance = displacement.length();
                    if distance >= self.cutoff {
                        continue;
                    }
                    let phi_neighbor = nodes.phi([global[0] + i, global[1] + j, global[2] + k]);
                    if phi_neighbor <= -self.data_spacing {
                        continue;
                    }
                    let fraction = heaviside(phi_neighbor, self.data_spacing);
                    weight += self.kernel.w(self.h_ratio, distance) * fraction;
                    if distance > 0.0 {
                        gradient += displacement
                            * (self.kernel.dw(self.h_ratio, distance) * fraction / distance);
                    }
                }
            }
        }
        (weight * self.cell_volume, gradient * self.cell_volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelset_core::{BoundingBox, Sphere};

    #[test]
    fn test_singular_packages() {
        let arena = PackageArena::new(2.0);
        assert_eq!(arena.len(), 2);
        assert!(arena.is_empty());

        let inside = arena.package(PackageHandle::SINGULAR_INSIDE);
        let outside = arena.package(PackageHandle::SINGULAR_OUTSIDE);
        assert!(inside.is_singular() && outside.is_singular());
        assert_eq!(inside.phi([1, 2, 3]), -2.0);
        assert_eq!(outside.phi([3, 0, 1]), 2.0);
        assert_eq!(inside.kernel_weight([0, 0, 0]), 0.0);
        assert_eq!(outside.kernel_weight([0, 0, 0]), 1.0);
        assert_eq!(inside.interface_tag([0, 0, 0]), -2);
        assert_eq!(outside.normal([2, 2, 2]), Point3::ZERO);
        assert_eq!(inside.cell(), None);
        assert_eq!(
            outside.neighbor_address([-2, 5, 0]).package,
            PackageHandle::SINGULAR_OUTSIDE
        );
    }

    #[test]
    fn test_allocate_assigns_handles_in_order() {
        let bounds = BoundingBox::cube(Point3::ZERO, 1.0);
        let mesh = MeshGeometry::new(bounds, 0.125, 4).unwrap();
        let sphere = Sphere::new(Point3::ZERO, 0.5);
        let mut arena = PackageArena::new(mesh.far_field_distance());

        let cells = [CellIndex::new(5, 6, 6), CellIndex::new(6, 6, 6)];
        let seeds = cells
            .iter()
            .map(|cell| PackageSeed::from_shape(&mesh, *cell, &sphere, true, false))
            .collect();
        let handles = arena.allocate(seeds);

        assert_eq!(handles, vec![PackageHandle::from_index(2), PackageHandle::from_index(3)]);
        assert_eq!(arena.len(), 4);
        assert_eq!(arena.phi.len(), 4 * PKG_NODES);
        assert_eq!(arena.neighbors.len(), 4 * ADDRS_NODES);

        let package = arena.package(handles[1]);
        assert_eq!(package.cell(), Some(cells[1]));
        assert!(package.is_core());
        let position = mesh.node_position(cells[1], [0, 0, 0]);
        assert!((package.phi([0, 0, 0]) - sphere.signed_distance(position)).abs() < 1e-6);
        assert_eq!(package.interface_tag([0, 0, 0]), -2);
    }
}
