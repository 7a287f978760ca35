//! Background lattice of a level set.
//!
//! The lattice covers the requested bounds plus a padding of
//! `buffer_width` cells on every side. Each cell owns one package of
//! `PKG_SIZE³` data nodes, so the grid spacing is `PKG_SIZE` data spacings.
//! Data nodes are cell-centred inside their package.

use levelset_core::{
    cell_center, cell_index_from_position, cell_origin, clamp_cell_index, BoundingBox,
    CellIndex, Point3,
};

use crate::error::{LevelSetError, Result};

/// Data nodes per package along each axis.
pub const PKG_SIZE: usize = 4;

/// Data nodes per package.
pub const PKG_NODES: usize = PKG_SIZE * PKG_SIZE * PKG_SIZE;

/// Nodes of neighbor addressing on each side of a package.
pub const ADDRS_BUFFER: usize = 2;

/// Entries per axis in a package's neighbor address table.
pub const ADDRS_SIZE: usize = PKG_SIZE + 2 * ADDRS_BUFFER;

/// Entries in a package's neighbor address table.
pub const ADDRS_NODES: usize = ADDRS_SIZE * ADDRS_SIZE * ADDRS_SIZE;

/// Cells from the lattice edge inside which probes are not trusted.
pub const MESH_BOUND_MARGIN: i32 = 2;

/// Geometry of the background lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshGeometry {
    lower_bound: Point3,
    data_spacing: f32,
    grid_spacing: f32,
    buffer_width: usize,
    number_of_cells: [usize; 3],
}

impl MeshGeometry {
    /// Lay out a lattice over `bounds` at the given data spacing.
    ///
    /// # Errors
    /// `InvalidBounds` for empty or non-finite bounds, `InvalidConfig` for a
    /// non-positive spacing.
    pub fn new(bounds: BoundingBox, data_spacing: f32, buffer_width: usize) -> Result<Self> {
        if !bounds.is_valid() {
            return Err(LevelSetError::InvalidBounds);
        }
        if !(data_spacing.is_finite() && data_spacing > 0.0) {
            return Err(LevelSetError::config("data_spacing must be positive"));
        }

        let grid_spacing = data_spacing * PKG_SIZE as f32;
        let padding = buffer_width as f32 * grid_spacing;
        let lower_bound = bounds.min - Point3::splat(padding);
        let extent = bounds.extent();
        let cells_along = |length: f32| (length / grid_spacing).ceil() as usize + 2 * buffer_width;

        Ok(Self {
            lower_bound,
            data_spacing,
            grid_spacing,
            buffer_width,
            number_of_cells: [
                cells_along(extent.x),
                cells_along(extent.y),
                cells_along(extent.z),
            ],
        })
    }

    /// World-space lower corner of the lattice.
    #[inline]
    pub fn lower_bound(&self) -> Point3 {
        self.lower_bound
    }

    /// World-space upper corner of the lattice.
    #[inline]
    pub fn upper_bound(&self) -> Point3 {
        let n = self.number_of_cells;
        self.lower_bound
            + Point3::new(n[0] as f32, n[1] as f32, n[2] as f32) * self.grid_spacing
    }

    /// Spacing between data nodes.
    #[inline]
    pub fn data_spacing(&self) -> f32 {
        self.data_spacing
    }

    /// Edge length of a cell.
    #[inline]
    pub fn grid_spacing(&self) -> f32 {
        self.grid_spacing
    }

    /// Padding in cells around the requested bounds.
    #[inline]
    pub fn buffer_width(&self) -> usize {
        self.buffer_width
    }

    /// Cells along each axis.
    #[inline]
    pub fn number_of_cells(&self) -> [usize; 3] {
        self.number_of_cells
    }

    /// Total number of cells.
    #[inline]
    pub fn total_cells(&self) -> usize {
        self.number_of_cells.iter().product()
    }

    /// Magnitude stored in the far-field singular packages.
    #[inline]
    pub fn far_field_distance(&self) -> f32 {
        self.grid_spacing * self.buffer_width as f32
    }

    /// Unclamped signed index of the cell containing `position`.
    #[inline]
    pub fn cell_index(&self, position: Point3) -> [i32; 3] {
        cell_index_from_position(position, self.lower_bound, self.grid_spacing)
    }

    /// Cell containing `position`, clamped into the lattice.
    #[inline]
    pub fn clamped_cell(&self, position: Point3) -> CellIndex {
        clamp_cell_index(self.cell_index(position), self.number_of_cells)
    }

    /// Signed cell index clamped into the lattice.
    #[inline]
    pub fn clamp(&self, index: [i32; 3]) -> CellIndex {
        clamp_cell_index(index, self.number_of_cells)
    }

    /// World-space centre of a cell.
    #[inline]
    pub fn cell_position(&self, cell: CellIndex) -> Point3 {
        cell_center(cell, self.lower_bound, self.grid_spacing)
    }

    /// World-space lower corner of a cell, which is also its package's lower corner.
    #[inline]
    pub fn cell_lower_corner(&self, cell: CellIndex) -> Point3 {
        cell_origin(cell, self.lower_bound, self.grid_spacing)
    }

    /// Row-major linear index of a cell.
    #[inline]
    pub fn linear_index(&self, cell: CellIndex) -> usize {
        cell.flat_index(self.number_of_cells)
    }

    /// Inverse of [`linear_index`](Self::linear_index).
    #[inline]
    pub fn cell_from_linear(&self, index: usize) -> CellIndex {
        CellIndex::from_flat_index(index, self.number_of_cells)
    }

    /// World-space position of data node `node` in the package of `cell`.
    #[inline]
    pub fn node_position(&self, cell: CellIndex, node: [usize; 3]) -> Point3 {
        self.cell_lower_corner(cell)
            + Point3::new(
                node[0] as f32 + 0.5,
                node[1] as f32 + 0.5,
                node[2] as f32 + 0.5,
            ) * self.data_spacing
    }

    /// True unless `position` lies within [`MESH_BOUND_MARGIN`] cells of any lattice edge.
    pub fn is_within_mesh_bound(&self, position: Point3) -> bool {
        let index = self.cell_index(position);
        (0..3).all(|axis| {
            let n = self.number_of_cells[axis] as i64;
            let i = index[axis] as i64;
            i >= MESH_BOUND_MARGIN as i64 && i < n - MESH_BOUND_MARGIN as i64
        })
    }

    /// Iterate the cells of the 3×3×3 neighborhood of `cell` that lie inside the lattice.
    pub fn neighborhood(&self, cell: CellIndex) -> impl Iterator<Item = CellIndex> + '_ {
        let center = [cell.x as i32, cell.y as i32, cell.z as i32];
        (0..27).filter_map(move |i| {
            let index = [
                center[0] + (i % 3) as i32 - 1,
                center[1] + (i / 3 % 3) as i32 - 1,
                center[2] + (i / 9) as i32 - 1,
            ];
            levelset_core::index_in_range(index, self.number_of_cells)
                .then(|| self.clamp(index))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_geometry() -> MeshGeometry {
        let bounds = BoundingBox::cube(Point3::ZERO, 1.0);
        MeshGeometry::new(bounds, 0.125, 4).unwrap()
    }

    #[test]
    fn test_lattice_layout() {
        let mesh = unit_geometry();
        assert_eq!(mesh.grid_spacing(), 0.5);
        assert_eq!(mesh.number_of_cells(), [12, 12, 12]);
        assert_eq!(mesh.lower_bound(), Point3::splat(-3.0));
        assert_eq!(mesh.upper_bound(), Point3::splat(3.0));
        assert_eq!(mesh.total_cells(), 1728);
        assert_eq!(mesh.far_field_distance(), 2.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let bounds = BoundingBox::cube(Point3::ZERO, 1.0);
        assert_eq!(
            MeshGeometry::new(BoundingBox::new(Point3::ZERO, Point3::ZERO), 0.1, 4),
            Err(LevelSetError::InvalidBounds)
        );
        assert!(matches!(
            MeshGeometry::new(bounds, 0.0, 4),
            Err(LevelSetError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_cell_lookup_roundtrip() {
        let mesh = unit_geometry();
        let cell = CellIndex::new(3, 7, 11);
        let center = mesh.cell_position(cell);
        assert_eq!(mesh.clamped_cell(center), cell);
        let linear = mesh.linear_index(cell);
        assert_eq!(mesh.cell_from_linear(linear), cell);
        assert_eq!(mesh.clamped_cell(Point3::splat(-100.0)), CellIndex::new(0, 0, 0));
        assert_eq!(mesh.clamped_cell(Point3::splat(100.0)), CellIndex::new(11, 11, 11));
    }

    #[test]
    fn test_node_positions() {
        let mesh = unit_geometry();
        let cell = CellIndex::new(6, 6, 6);
        let p = mesh.node_position(cell, [0, 1, 3]);
        assert_eq!(p, Point3::new(0.0625, 0.1875, 0.4375));
    }

    #[test]
    fn test_mesh_bound_margin() {
        let mesh = unit_geometry();
        assert!(mesh.is_within_mesh_bound(Point3::ZERO));
        assert!(mesh.is_within_mesh_bound(Point3::splat(1.9)));
        assert!(!mesh.is_within_mesh_bound(Point3::new(2.1, 0.0, 0.0)));
        assert!(!mesh.is_within_mesh_bound(Point3::new(0.0, -2.1, 0.0)));
        assert!(!mesh.is_within_mesh_bound(Point3::new(0.0, 0.0, 50.0)));
    }

    #[test]
    fn test_neighborhood_clipped_at_edges() {
        let mesh = unit_geometry();
        assert_eq!(mesh.neighborhood(CellIndex::new(5, 5, 5)).count(), 27);
        assert_eq!(mesh.neighborhood(CellIndex::new(0, 0, 0)).count(), 8);
        assert_eq!(mesh.neighborhood(CellIndex::new(0, 5, 11)).count(), 12);
    }
}
