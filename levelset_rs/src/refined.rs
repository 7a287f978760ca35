//! Level set seeded from a coarser level.
//!
//! Real packages are only considered inside the coarse level's core
//! region; every other cell takes the sign of the coarse probe and binds to
//! a singular package. From there on the pipeline is the one of
//! [`LevelSet`].

use std::ops::{Deref, DerefMut};

use levelset_core::{BoundingBox, Point3, Shape};

use crate::config::{Adaptation, LevelSetConfig};
use crate::error::Result;
use crate::field::{LevelSetField, MeshLevel};
use crate::level_set::{is_near_interface, CellClass, LevelSet};

/// Level set at half the data spacing of its coarse level.
#[derive(Debug, Clone)]
pub struct RefinedLevelSet {
    level_set: LevelSet,
}

impl RefinedLevelSet {
    /// Build over `bounds` at half of `coarse`'s data spacing.
    ///
    /// # Errors
    /// Invalid bounds, adaptation or configuration.
    pub fn new(
        bounds: BoundingBox,
        coarse: &dyn MeshLevel,
        shape: &dyn Shape,
        adaptation: Adaptation,
        config: LevelSetConfig,
    ) -> Result<Self> {
        let data_spacing = 0.5 * coarse.data_spacing();
        let level_set = LevelSet::build(
            bounds,
            data_spacing,
            shape,
            adaptation,
            config,
            |mesh, _, position| {
                if coarse.is_within_core_package(position)
                    && is_near_interface(shape, position, mesh.grid_spacing())
                {
                    CellClass::Core
                } else if coarse.probe_signed_distance(position) < 0.0 {
                    CellClass::FarInside
                } else {
                    CellClass::FarOutside
                }
            },
        )?;
        Ok(Self { level_set })
    }
}

impl Deref for RefinedLevelSet {
    type Target = LevelSet;

    fn deref(&self) -> &LevelSet {
        &self.level_set
    }
}

impl DerefMut for RefinedLevelSet {
    fn deref_mut(&mut self) -> &mut LevelSet {
        &mut self.level_set
    }
}

impl LevelSetField for RefinedLevelSet {
    fn probe_signed_distance(&self, position: Point3) -> f32 {
        self.level_set.probe_signed_distance(position)
    }

    fn probe_normal_direction(&self, position: Point3) -> Point3 {
        self.level_set.probe_normal_direction(position)
    }

    fn probe_non_normalized_normal_direction(&self, position: Point3) -> Point3 {
        self.level_set.probe_non_normalized_normal_direction(position)
    }

    fn probe_kernel_integral(&self, position: Point3, h_ratio: f32) -> Result<f32> {
        self.level_set.probe_kernel_integral(position, h_ratio)
    }

    fn probe_kernel_gradient_integral(&self, position: Point3, h_ratio: f32) -> Result<Point3> {
        self.level_set.probe_kernel_gradient_integral(position, h_ratio)
    }

    fn probe_is_within_mesh_bound(&self, position: Point3) -> bool {
        self.level_set.probe_is_within_mesh_bound(position)
    }

    fn clean_interface(&mut self) {
        self.level_set.clean_interface();
    }
}

impl MeshLevel for RefinedLevelSet {
    fn global_h_ratio(&self) -> f32 {
        self.level_set.global_h_ratio()
    }

    fn data_spacing(&self) -> f32 {
        self.level_set.data_spacing()
    }

    fn is_within_core_package(&self, position: Point3) -> bool {
        self.level_set.is_within_core_package(position)
    }
}
