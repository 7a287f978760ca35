//! Data packages: handles, neighbor addressing and per-package stencil numerics.
//!
//! A package is a `PKG_SIZE³` block of data nodes owned by one lattice cell.
//! Stencils that reach past the block edge go through the package's
//! neighbor address table, which maps every local offset in
//! `-ADDRS_BUFFER..PKG_SIZE + ADDRS_BUFFER` to a `(package, node)` pair.

use levelset_core::{CellIndex, NodeValueProvider, Point3, TINY};

use crate::arena::PackageArena;
use crate::mesh::{ADDRS_BUFFER, ADDRS_SIZE, PKG_NODES, PKG_SIZE};

/// Index of a package inside a [`PackageArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PackageHandle(u32);

impl PackageHandle {
    /// Far-field package shared by every cell deep inside the shape.
    pub const SINGULAR_INSIDE: Self = Self(0);

    /// Far-field package shared by every cell far outside the shape.
    pub const SINGULAR_OUTSIDE: Self = Self(1);

    /// Number of singular packages at the front of every arena.
    pub const SINGULAR_COUNT: usize = 2;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the package in the arena's field arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the two far-field packages.
    #[inline]
    pub const fn is_singular(self) -> bool {
        (self.0 as usize) < Self::SINGULAR_COUNT
    }
}

/// Location of one data node: the package holding it and its local index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAddress {
    /// Package holding the node.
    pub package: PackageHandle,
    /// Local node index inside the package.
    pub node: u16,
}

impl NodeAddress {
    /// Create a new address.
    #[inline]
    pub const fn new(package: PackageHandle, node: usize) -> Self {
        Self {
            package,
            node: node as u16,
        }
    }

    /// Offset of the node in a package-strided field array.
    #[inline]
    pub const fn flat(self) -> usize {
        self.package.index() * PKG_NODES + self.node as usize
    }
}

/// Local node index of `(i, j, k)` inside a package.
#[inline]
pub const fn node_index(node: [usize; 3]) -> usize {
    node[0] + PKG_SIZE * (node[1] + PKG_SIZE * node[2])
}

/// Inverse of [`node_index`].
#[inline]
pub const fn node_coords(index: usize) -> [usize; 3] {
    [
        index % PKG_SIZE,
        (index / PKG_SIZE) % PKG_SIZE,
        index / (PKG_SIZE * PKG_SIZE),
    ]
}

/// Entry of the address table for a local offset in `-ADDRS_BUFFER..PKG_SIZE + ADDRS_BUFFER`.
#[inline]
pub const fn table_index(offset: [i32; 3]) -> usize {
    let b = ADDRS_BUFFER as i32;
    let s = ADDRS_SIZE;
    (offset[0] + b) as usize + s * ((offset[1] + b) as usize + s * (offset[2] + b) as usize)
}

/// Inverse of [`table_index`].
#[inline]
pub const fn table_offset(index: usize) -> [i32; 3] {
    let b = ADDRS_BUFFER as i32;
    let s = ADDRS_SIZE;
    [
        (index % s) as i32 - b,
        ((index / s) % s) as i32 - b,
        (index / (s * s)) as i32 - b,
    ]
}

#[inline]
fn signed(node: [usize; 3]) -> [i32; 3] {
    [node[0] as i32, node[1] as i32, node[2] as i32]
}

#[inline]
fn shifted(node: [i32; 3], axis: usize, step: i32) -> [i32; 3] {
    let mut out = node;
    out[axis] += step;
    out
}

#[inline]
fn opposite_sign(a: f32, b: f32) -> bool {
    (a < 0.0) != (b < 0.0)
}

/// Reads one field of a package and its neighbors through the address table.
#[derive(Clone, Copy)]
pub(crate) struct Stencil<'a, T> {
    field: &'a [T],
    table: &'a [NodeAddress],
}

impl<'a, T: Copy> Stencil<'a, T> {
    #[inline]
    pub(crate) fn new(field: &'a [T], table: &'a [NodeAddress]) -> Self {
        Self { field, table }
    }

    /// Value at a local offset; the offset must lie inside the table.
    #[inline]
    pub(crate) fn at(&self, offset: [i32; 3]) -> T {
        self.field[self.table[table_index(offset)].flat()]
    }
}

impl<T: Copy> NodeValueProvider<T> for Stencil<'_, T> {
    #[inline]
    fn node_value(&self, index: [i32; 3]) -> T {
        self.at(index)
    }
}

// ----------------------------------------------------------------------------
// Per-package numerics
// ----------------------------------------------------------------------------

fn central_difference(phi: &Stencil<'_, f32>, node: [i32; 3]) -> Point3 {
    Point3::new(
        phi.at(shifted(node, 0, 1)) - phi.at(shifted(node, 0, -1)),
        phi.at(shifted(node, 1, 1)) - phi.at(shifted(node, 1, -1)),
        phi.at(shifted(node, 2, 1)) - phi.at(shifted(node, 2, -1)),
    )
}

/// Unit normals from central differences of `phi`.
pub(crate) fn compute_normal_direction(phi: &Stencil<'_, f32>, out: &mut [Point3]) {
    for (n, normal) in out.iter_mut().enumerate() {
        let gradient = central_difference(phi, signed(node_coords(n)));
        *normal = gradient / (gradient.length() + TINY);
    }
}

/// Gradient of `phi` from central differences, in world units.
pub(crate) fn compute_gradient(phi: &Stencil<'_, f32>, data_spacing: f32, out: &mut [Point3]) {
    let inv = 0.5 / data_spacing;
    for (n, gradient) in out.iter_mut().enumerate() {
        *gradient = central_difference(phi, signed(node_coords(n))) * inv;
    }
}

/// One Jacobi relaxation sweep of `|∇phi| = 1` on a package.
///
/// `phi` reads the sweep's input snapshot; `out` receives the package's new
/// values. Nodes next to a sign change keep their value and no node changes
/// sign.
///
/// # Returns
/// Largest absolute change applied to any node.
pub(crate) fn step_reinitialization(
    phi: &Stencil<'_, f32>,
    data_spacing: f32,
    out: &mut [f32],
) -> f32 {
    let mut max_change = 0.0f32;
    for (n, value) in out.iter_mut().enumerate() {
        let node = signed(node_coords(n));
        let phi_0 = phi.at(node);

        let mut squared_gradient = 0.0f32;
        let mut is_cut = false;
        for axis in 0..3 {
            let phi_p = phi.at(shifted(node, axis, 1));
            let phi_m = phi.at(shifted(node, axis, -1));
            if opposite_sign(phi_0, phi_p) || opposite_sign(phi_0, phi_m) {
                is_cut = true;
                break;
            }
            let dp = phi_p - phi_0;
            let dm = phi_0 - phi_m;
            let upwind = if phi_0 > 0.0 {
                let a = dm.max(0.0);
                let b = dp.min(0.0);
                (a * a).max(b * b)
            } else {
                let a = dm.min(0.0);
                let b = dp.max(0.0);
                (a * a).max(b * b)
            };
            squared_gradient += upwind;
        }

        if is_cut {
            *value = phi_0;
            continue;
        }

        let sign = phi_0 / (phi_0 * phi_0 + data_spacing * data_spacing).sqrt();
        let mut updated = phi_0 - 0.5 * sign * (squared_gradient.sqrt() - data_spacing);
        if opposite_sign(updated, phi_0) {
            updated = phi_0;
        }
        max_change = max_change.max((updated - phi_0).abs());
        *value = updated;
    }
    max_change
}

/// Tag nodes by proximity to the zero level.
///
/// `0` marks a node with an axial neighbor of opposite sign, `±1` a node
/// closer than `small_shift_factor · data_spacing`, `±2` everything else.
/// The sign of a tag follows the sign of `phi`.
pub(crate) fn mark_near_interface(
    phi: &Stencil<'_, f32>,
    data_spacing: f32,
    small_shift_factor: f32,
    out: &mut [i8],
) {
    let threshold = small_shift_factor * data_spacing;
    for (n, tag) in out.iter_mut().enumerate() {
        let node = signed(node_coords(n));
        let phi_0 = phi.at(node);
        let is_cut = (0..3).any(|axis| {
            opposite_sign(phi_0, phi.at(shifted(node, axis, 1)))
                || opposite_sign(phi_0, phi.at(shifted(node, axis, -1)))
        });
        let sign: i8 = if phi_0 < 0.0 { -1 } else { 1 };
        *tag = if is_cut {
            0
        } else if phi_0.abs() < threshold {
            sign
        } else {
            2 * sign
        };
    }
}

/// Recompute `phi` at cut nodes from the zero crossings on their axial edges.
///
/// Along each axis the nearest crossing is found by linear interpolation of
/// the sign change, giving the intercept `d_a`. A cut node takes the distance
/// to the plane through those intercepts, `1 / sqrt(sum 1 / d_a^2)`, and keeps
/// its sign. The result depends only on where `phi` changes sign, not on its
/// scale, so the zero level stays in place.
pub(crate) fn redistance_interface(
    phi: &Stencil<'_, f32>,
    tag: &Stencil<'_, i8>,
    data_spacing: f32,
    out: &mut [f32],
) {
    for (n, value) in out.iter_mut().enumerate() {
        let node = signed(node_coords(n));
        if tag.at(node) != 0 {
            continue;
        }
        let phi_0 = phi.at(node);
        let mut inverse_square_sum = 0.0f32;
        for axis in 0..3 {
            let intercept = [1, -1]
                .into_iter()
                .map(|step| phi.at(shifted(node, axis, step)))
                .filter(|phi_neighbor| opposite_sign(phi_0, *phi_neighbor))
                .map(|phi_neighbor| data_spacing * phi_0 / (phi_0 - phi_neighbor))
                .fold(f32::INFINITY, f32::min);
            // A zero intercept saturates the sum and yields distance 0.
            inverse_square_sum += 1.0 / (intercept * intercept);
        }
        if inverse_square_sum == 0.0 {
            continue;
        }
        let distance = 1.0 / inverse_square_sum.sqrt();
        *value = if phi_0 < 0.0 { -distance } else { distance };
    }
}

// ----------------------------------------------------------------------------
// Read view
// ----------------------------------------------------------------------------

/// Read-only view of one package in an arena.
///
/// Field accessors take local node indices `(i, j, k)` in `0..PKG_SIZE`.
#[derive(Clone, Copy)]
pub struct DataPackage<'a> {
    arena: &'a PackageArena,
    handle: PackageHandle,
}

impl<'a> DataPackage<'a> {
    pub(crate) fn new(arena: &'a PackageArena, handle: PackageHandle) -> Self {
        Self { arena, handle }
    }

    #[inline]
    fn flat(&self, node: [usize; 3]) -> usize {
        self.handle.index() * PKG_NODES + node_index(node)
    }

    /// Handle of this package.
    #[inline]
    pub fn handle(&self) -> PackageHandle {
        self.handle
    }

    /// Cell owning the package, `None` for the singular packages.
    #[inline]
    pub fn cell(&self) -> Option<CellIndex> {
        self.arena.meta[self.handle.index()].cell
    }

    /// True for packages within one grid spacing of the interface.
    #[inline]
    pub fn is_core(&self) -> bool {
        self.arena.meta[self.handle.index()].is_core
    }

    /// True for packages carrying stencil data (core packages and their neighbors).
    #[inline]
    pub fn is_inner(&self) -> bool {
        self.arena.meta[self.handle.index()].is_inner
    }

    /// True for the two far-field packages.
    #[inline]
    pub fn is_singular(&self) -> bool {
        self.handle.is_singular()
    }

    /// Signed distance at a node.
    #[inline]
    pub fn phi(&self, node: [usize; 3]) -> f32 {
        self.arena.phi[self.flat(node)]
    }

    /// Unit normal at a node.
    #[inline]
    pub fn normal(&self, node: [usize; 3]) -> Point3 {
        self.arena.normal[self.flat(node)]
    }

    /// Un-normalized gradient of `phi` at a node.
    #[inline]
    pub fn non_normalized_normal(&self, node: [usize; 3]) -> Point3 {
        self.arena.raw_gradient[self.flat(node)]
    }

    /// Kernel weight integral at a node.
    #[inline]
    pub fn kernel_weight(&self, node: [usize; 3]) -> f32 {
        self.arena.kernel_weight[self.flat(node)]
    }

    /// Kernel gradient integral at a node.
    #[inline]
    pub fn kernel_gradient(&self, node: [usize; 3]) -> Point3 {
        self.arena.kernel_gradient[self.flat(node)]
    }

    /// Near-interface tag at a node.
    #[inline]
    pub fn interface_tag(&self, node: [usize; 3]) -> i8 {
        self.arena.interface_tag[self.flat(node)]
    }

    /// All signed distances of the package in local node order.
    #[inline]
    pub fn phi_values(&self) -> &'a [f32] {
        let start = self.handle.index() * PKG_NODES;
        &self.arena.phi[start..start + PKG_NODES]
    }

    /// Address-table entry for a local offset in `-ADDRS_BUFFER..PKG_SIZE + ADDRS_BUFFER`.
    #[inline]
    pub fn neighbor_address(&self, offset: [i32; 3]) -> NodeAddress {
        self.arena.table(self.handle)[table_index(offset)]
    }
}

impl std::fmt::Debug for DataPackage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataPackage")
            .field("handle", &self.handle)
            .field("cell", &self.cell())
            .field("is_core", &self.is_core())
            .field("is_inner", &self.is_inner())
            .finish()
    }
}
