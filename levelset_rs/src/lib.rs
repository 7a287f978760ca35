//! # levelset_rs
//!
//! Packaged signed-distance grids for boundary treatment in particle
//! methods.
//!
//! A level set is a uniform lattice of cells. Cells near the boundary of a
//! shape own a data package: a 4³ block of nodes holding signed distance,
//! normals, raw gradients, kernel integrals and an interface tag. Every
//! other cell shares one of two singular packages carrying a uniform
//! far-field value of the right sign.
//!
//! ## Quick Start
//!
//! ```
//! use levelset_rs::prelude::*;
//!
//! let sphere = Sphere::new(Point3::ZERO, 1.0);
//! let mut level_set = LevelSet::new(
//!     sphere.bounds(),
//!     0.1,
//!     &sphere,
//!     Adaptation::new(0.1),
//!     LevelSetConfig::default().with_reinitialization_sweeps(10),
//! )?;
//!
//! let surface = Point3::new(1.0, 0.0, 0.0);
//! assert!(level_set.probe_signed_distance(surface).abs() < 0.05);
//! assert!(level_set.probe_normal_direction(surface).x > 0.9);
//!
//! level_set.clean_interface();
//! assert!(level_set.probe_signed_distance(Point3::new(0.8, 0.0, 0.0)) < 0.0);
//! # Ok::<(), LevelSetError>(())
//! ```
//!
//! ## Architecture
//!
//! - **Arena**: packages live in one structure-of-arrays pool addressed by
//!   integer [`PackageHandle`]s; handles 0 and 1 are the singular packages
//! - **Neighbor tables**: each real package stores an 8³ table of
//!   `(handle, node)` pairs covering its nodes plus two nodes on every side,
//!   so stencils read across package boundaries without lookups
//! - **Passes**: construction and maintenance are rayon data-parallel passes
//!   over packages; each pass writes one field and reads others
//!
//! Three variants implement [`LevelSetField`]:
//!
//! - [`LevelSet`]: a single resolution
//! - [`RefinedLevelSet`]: half the spacing of a coarser level, allocating
//!   packages only inside that level's core region
//! - [`MultilevelLevelSet`]: coarsest-to-finest levels, blending adjacent
//!   levels for kernel probes
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for [`LevelSetConfig`]

#![warn(missing_docs)]
#![warn(clippy::all)]

mod arena;
mod config;
mod error;
mod field;
mod level_set;
mod mesh;
mod multilevel;
mod package;
mod refined;

pub use arena::{PackageArena, PackageMeta};
pub use config::{Adaptation, LevelSetConfig};
pub use error::{LevelSetError, Result};
pub use field::{LevelSetField, MeshLevel};
pub use level_set::LevelSet;
pub use mesh::{
    MeshGeometry, ADDRS_BUFFER, ADDRS_NODES, ADDRS_SIZE, MESH_BOUND_MARGIN, PKG_NODES, PKG_SIZE,
};
pub use multilevel::MultilevelLevelSet;
pub use package::{
    node_coords, node_index, table_index, table_offset, DataPackage, NodeAddress, PackageHandle,
};
pub use refined::RefinedLevelSet;

// Re-export levelset_core for convenience
pub use levelset_core;
pub use levelset_core::{BoundingBox, CellIndex, Cuboid, Kernel, Point3, Shape, Sphere, WendlandC2};

/// Prelude module for convenient imports.
///
/// ```
/// use levelset_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Adaptation, LevelSetConfig};
    pub use crate::error::{LevelSetError, Result};
    pub use crate::field::{LevelSetField, MeshLevel};
    pub use crate::level_set::LevelSet;
    pub use crate::multilevel::MultilevelLevelSet;
    pub use crate::refined::RefinedLevelSet;

    pub use levelset_core::{BoundingBox, Cuboid, Kernel, Point3, Shape, Sphere};
}
