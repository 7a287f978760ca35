//! Hierarchy of level sets with doubling resolution.

use std::fmt;

use levelset_core::{BoundingBox, Interpolable, Point3, Shape};

use crate::config::{Adaptation, LevelSetConfig};
use crate::error::{LevelSetError, Result};
use crate::field::{LevelSetField, MeshLevel};
use crate::level_set::LevelSet;
use crate::refined::RefinedLevelSet;

const LOG_TARGET: &str = "levelset";

/// Ordered levels, coarsest first. Each level halves the data spacing of the
/// one before it, so resolution ratios double per level.
///
/// Direct probes read from the finest level whose core region contains the
/// position. Kernel probes blend the two levels bracketing the requested
/// resolution ratio.
pub struct MultilevelLevelSet {
    levels: Vec<Box<dyn MeshLevel>>,
}

impl MultilevelLevelSet {
    /// Build `total_levels` levels, the coarsest at `coarsest_data_spacing`.
    ///
    /// # Errors
    /// [`LevelSetError::EmptyHierarchy`] for zero levels; any construction
    /// error of a single level.
    pub fn new(
        bounds: BoundingBox,
        coarsest_data_spacing: f32,
        total_levels: usize,
        shape: &dyn Shape,
        adaptation: Adaptation,
        config: LevelSetConfig,
    ) -> Result<Self> {
        if total_levels == 0 {
            return Err(LevelSetError::EmptyHierarchy);
        }

        let mut levels: Vec<Box<dyn MeshLevel>> = Vec::with_capacity(total_levels);
        levels.push(Box::new(LevelSet::new(
            bounds,
            coarsest_data_spacing,
            shape,
            adaptation.clone(),
            config,
        )?));
        while levels.len() < total_levels {
            let refined = match levels.last() {
                Some(coarse) => RefinedLevelSet::new(
                    bounds,
                    coarse.as_ref(),
                    shape,
                    adaptation.clone(),
                    config,
                )?,
                None => return Err(LevelSetError::EmptyHierarchy),
            };
            levels.push(Box::new(refined));
        }

        log::info!(
            target: LOG_TARGET,
            "multilevel level set ready: {} levels, h_ratio {:.3} to {:.3}",
            levels.len(),
            levels[0].global_h_ratio(),
            levels[levels.len() - 1].global_h_ratio()
        );
        Ok(Self { levels })
    }

    /// Levels, coarsest first.
    #[inline]
    pub fn levels(&self) -> &[Box<dyn MeshLevel>] {
        &self.levels
    }

    /// Number of levels.
    #[inline]
    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    /// Finest level whose ratio does not exceed `h_ratio`.
    ///
    /// # Errors
    /// [`LevelSetError::LevelOutOfRange`] when `h_ratio` lies outside the
    /// ratios spanned by the hierarchy.
    pub fn mesh_level(&self, h_ratio: f32) -> Result<usize> {
        let min = self.levels[0].global_h_ratio();
        let max = self.levels[self.levels.len() - 1].global_h_ratio();
        let tolerance = 1.0e-6 * h_ratio.abs().max(1.0);
        let out_of_range = LevelSetError::LevelOutOfRange { h_ratio, min, max };

        if h_ratio.is_nan() || h_ratio - max > tolerance {
            return Err(out_of_range);
        }
        self.levels
            .iter()
            .rposition(|level| h_ratio - level.global_h_ratio() > -tolerance)
            .ok_or(out_of_range)
    }

    /// Finest level whose core region contains `position`, or the coarsest
    /// level when none does.
    pub fn probe_level(&self, position: Point3) -> usize {
        self.levels
            .iter()
            .rposition(|level| level.is_within_core_package(position))
            .unwrap_or(0)
    }

    fn blend<T, F>(&self, h_ratio: f32, probe: F) -> Result<T>
    where
        T: Interpolable,
        F: Fn(&dyn MeshLevel) -> Result<T>,
    {
        let level = self.mesh_level(h_ratio)?;
        if self.levels.len() == 1 {
            return probe(self.levels[0].as_ref());
        }
        let coarse_level = level.min(self.levels.len() - 2);
        let coarse = self.levels[coarse_level].as_ref();
        let fine = self.levels[coarse_level + 1].as_ref();

        let alpha = (fine.global_h_ratio() - h_ratio)
            / (fine.global_h_ratio() - coarse.global_h_ratio());
        Ok(probe(coarse)? * alpha + probe(fine)? * (1.0 - alpha))
    }
}

impl fmt::Debug for MultilevelLevelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ratios: Vec<f32> = self.levels.iter().map(|l| l.global_h_ratio()).collect();
        f.debug_struct("MultilevelLevelSet")
            .field("total_levels", &self.levels.len())
            .field("h_ratios", &ratios)
            .finish()
    }
}

impl LevelSetField for MultilevelLevelSet {
    fn probe_signed_distance(&self, position: Point3) -> f32 {
        self.levels[self.probe_level(position)].probe_signed_distance(position)
    }

    fn probe_normal_direction(&self, position: Point3) -> Point3 {
        self.levels[self.probe_level(position)].probe_normal_direction(position)
    }

    fn probe_non_normalized_normal_direction(&self, position: Point3) -> Point3 {
        self.levels[self.probe_level(position)].probe_non_normalized_normal_direction(position)
    }

    fn probe_kernel_integral(&self, position: Point3, h_ratio: f32) -> Result<f32> {
        self.blend(h_ratio, |level| level.probe_kernel_integral(position, h_ratio))
    }

    fn probe_kernel_gradient_integral(&self, position: Point3, h_ratio: f32) -> Result<Point3> {
        self.blend(h_ratio, |level| {
            level.probe_kernel_gradient_integral(position, h_ratio)
        })
    }

    fn probe_is_within_mesh_bound(&self, position: Point3) -> bool {
        self.levels
            .iter()
            .all(|level| level.probe_is_within_mesh_bound(position))
    }

    /// Cleans the finest level only.
    fn clean_interface(&mut self) {
        if let Some(finest) = self.levels.last_mut() {
            finest.clean_interface();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelset_core::Sphere;

    fn hierarchy(total_levels: usize) -> MultilevelLevelSet {
        let sphere = Sphere::new(Point3::ZERO, 1.0);
        MultilevelLevelSet::new(
            sphere.bounds(),
            0.1,
            total_levels,
            &sphere,
            Adaptation::new(0.1),
            LevelSetConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_hierarchy_rejected() {
        let sphere = Sphere::new(Point3::ZERO, 1.0);
        let result = MultilevelLevelSet::new(
            sphere.bounds(),
            0.1,
            0,
            &sphere,
            Adaptation::new(0.1),
            LevelSetConfig::default(),
        );
        assert_eq!(result.unwrap_err(), LevelSetError::EmptyHierarchy);
    }

    #[test]
    fn test_ratios_double_per_level() {
        let multilevel = hierarchy(2);
        assert_eq!(multilevel.total_levels(), 2);
        let ratios: Vec<f32> = multilevel
            .levels()
            .iter()
            .map(|l| l.global_h_ratio())
            .collect();
        assert!((ratios[0] - 1.0).abs() < 1e-5);
        assert!((ratios[1] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_mesh_level_selection() {
        let multilevel = hierarchy(2);
        assert_eq!(multilevel.mesh_level(1.0).unwrap(), 0);
        assert_eq!(multilevel.mesh_level(1.5).unwrap(), 0);
        assert_eq!(multilevel.mesh_level(2.0).unwrap(), 1);
        assert!(matches!(
            multilevel.mesh_level(0.5),
            Err(LevelSetError::LevelOutOfRange { .. })
        ));
        assert!(matches!(
            multilevel.mesh_level(4.0),
            Err(LevelSetError::LevelOutOfRange { .. })
        ));
        assert!(multilevel.mesh_level(f32::NAN).is_err());
    }

    #[test]
    fn test_probe_level_prefers_finest_core() {
        let multilevel = hierarchy(2);
        assert_eq!(multilevel.probe_level(Point3::new(0.0, 1.0, 0.0)), 1);
        assert_eq!(multilevel.probe_level(Point3::ZERO), 0);
    }
}
