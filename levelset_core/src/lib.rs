//! # levelset_core
//!
//! Pure mathematical building blocks for packaged level-set grids.
//!
//! This crate holds everything that does not need storage: the vector type,
//! lattice coordinate conversion, trilinear interpolation, the collaborator
//! traits for shapes and smoothing kernels, and a few analytic
//! implementations of them.
//!
//! ## Features
//!
//! - **no_std compatible**: only `libm` is needed for transcendental math
//! - **Pure algorithms**: no storage implementation, just math
//! - **Generic interpolation**: one routine for scalars and vectors
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables standard library support
//!
//! ## Modules
//!
//! - [`types`]: Core data types (Point3, BoundingBox, CellIndex, LocalCoord)
//! - [`coords`]: Coordinate conversion functions
//! - [`interpolation`]: Trilinear interpolation
//! - [`traits`]: Collaborator traits (NodeValueProvider, Shape, Kernel)
//! - [`shapes`]: Analytic shapes (Sphere, Cuboid)
//! - [`kernel`]: Wendland C2 kernel and smoothed Heaviside
//!
//! ## Usage
//!
//! ```
//! use levelset_core::prelude::*;
//!
//! let sphere = Sphere::new(Point3::ZERO, 1.0);
//! assert!(sphere.contains(Point3::new(0.5, 0.0, 0.0)));
//!
//! let kernel = WendlandC2::new(0.13);
//! assert!(kernel.w(1.0, 0.1) > 0.0);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "std")]
extern crate std;

pub mod coords;
pub mod interpolation;
pub mod kernel;
pub mod shapes;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
///
/// Provides the most commonly used types and functions.
pub mod prelude {
    pub use crate::coords::{
        cell_center, cell_index_from_position, cell_origin, clamp_cell_index, decompose_point,
        index_in_range,
    };
    pub use crate::interpolation::{compute_trilinear_weights, trilinear_interpolate, Interpolable};
    pub use crate::kernel::{heaviside, WendlandC2};
    pub use crate::shapes::{Cuboid, Sphere};
    pub use crate::traits::{corner_from_index, Kernel, NodeValueProvider, Shape};
    pub use crate::types::{BoundingBox, CellIndex, LocalCoord, Point3, TINY};
}

pub use coords::{
    cell_center, cell_index_from_position, cell_origin, clamp_cell_index, decompose_point,
    euclidean_div, euclidean_rem, index_in_range,
};
pub use interpolation::{compute_trilinear_weights, trilinear_interpolate, Interpolable};
pub use kernel::{heaviside, WendlandC2};
pub use shapes::{Cuboid, Sphere};
pub use traits::{corner_from_index, Kernel, NodeValueProvider, Shape};
pub use types::{BoundingBox, CellIndex, LocalCoord, Point3, TINY};
