//! Coordinate mathematics for uniform lattices.
//!
//! A lattice is described by its lower corner and its spacing. Cells are
//! addressed by integer indices, and positions inside a cell by a
//! [`LocalCoord`] in [0, 1]³. Cell-centred and node-centred lattices differ
//! only in the origin passed in: callers shift the origin by half a spacing
//! when they want node-centred interpolation.

use crate::types::{CellIndex, LocalCoord, Point3};

/// Signed cell index containing `point`.
///
/// Uses floor so positions below `lower` land in negative cells.
///
/// # Arguments
/// * `point` - The world-space point
/// * `lower` - World-space lower corner of cell (0, 0, 0)
/// * `spacing` - Edge length of one cell
#[inline]
pub fn cell_index_from_position(point: Point3, lower: Point3, spacing: f32) -> [i32; 3] {
    let rel = (point - lower) / spacing;
    [
        libm::floorf(rel.x) as i32,
        libm::floorf(rel.y) as i32,
        libm::floorf(rel.z) as i32,
    ]
}

/// Clamp a signed cell index into a lattice of `dims` cells per axis.
///
/// # Returns
/// The nearest valid [`CellIndex`]. A lattice with zero cells on an axis
/// clamps to index 0 on that axis.
#[inline]
pub fn clamp_cell_index(index: [i32; 3], dims: [usize; 3]) -> CellIndex {
    let clamp_axis = |i: i32, n: usize| -> usize {
        let upper = n.saturating_sub(1) as i64;
        (i as i64).clamp(0, upper) as usize
    };
    CellIndex::new(
        clamp_axis(index[0], dims[0]),
        clamp_axis(index[1], dims[1]),
        clamp_axis(index[2], dims[2]),
    )
}

/// True when a signed index lies inside a lattice of `dims` cells per axis.
#[inline]
pub fn index_in_range(index: [i32; 3], dims: [usize; 3]) -> bool {
    (0..3).all(|a| index[a] >= 0 && (index[a] as i64) < dims[a] as i64)
}

/// World-space centre of a cell.
#[inline]
pub fn cell_center(cell: CellIndex, lower: Point3, spacing: f32) -> Point3 {
    Point3::new(
        lower.x + (cell.x as f32 + 0.5) * spacing,
        lower.y + (cell.y as f32 + 0.5) * spacing,
        lower.z + (cell.z as f32 + 0.5) * spacing,
    )
}

/// World-space lower corner of a cell.
#[inline]
pub fn cell_origin(cell: CellIndex, lower: Point3, spacing: f32) -> Point3 {
    Point3::new(
        lower.x + cell.x as f32 * spacing,
        lower.y + cell.y as f32 * spacing,
        lower.z + cell.z as f32 * spacing,
    )
}

/// Decompose a point into (base index, local coordinate) relative to a lattice.
///
/// # Arguments
/// * `point` - The world-space point
/// * `origin` - World-space position of lattice point (0, 0, 0)
/// * `spacing` - Distance between lattice points
///
/// # Returns
/// The signed index of the lattice point at the lower corner of the
/// enclosing cell, and the fractional position inside that cell.
#[inline]
pub fn decompose_point(point: Point3, origin: Point3, spacing: f32) -> ([i32; 3], LocalCoord) {
    let rel = (point - origin) / spacing;
    let fx = libm::floorf(rel.x);
    let fy = libm::floorf(rel.y);
    let fz = libm::floorf(rel.z);
    (
        [fx as i32, fy as i32, fz as i32],
        LocalCoord::new(rel.x - fx, rel.y - fy, rel.z - fz),
    )
}

/// Euclidean division that rounds toward negative infinity.
#[inline]
pub const fn euclidean_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    let r = a % b;
    if (r < 0 && b > 0) || (r > 0 && b < 0) {
        q - 1
    } else {
        q
    }
}

/// Euclidean remainder (always non-negative when divisor is positive).
#[inline]
pub const fn euclidean_rem(a: i32, b: i32) -> i32 {
    let r = a % b;
    if r < 0 {
        r + b.abs()
    } else {
        r
    }
}
