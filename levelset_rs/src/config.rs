//! Construction parameters for level sets.

use std::fmt;
use std::sync::Arc;

use levelset_core::{Kernel, WendlandC2};

use crate::error::{LevelSetError, Result};

/// Tunables shared by every level of a level set.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LevelSetConfig {
    /// Cells of padding added around the requested bounds on every side.
    pub buffer_width: usize,

    /// Relaxation sweeps run by reinitialization.
    pub reinitialization_sweeps: usize,
}

impl Default for LevelSetConfig {
    fn default() -> Self {
        Self {
            buffer_width: 4,
            reinitialization_sweeps: 50,
        }
    }
}

impl LevelSetConfig {
    /// Set the lattice padding in cells.
    pub fn with_buffer_width(mut self, buffer_width: usize) -> Self {
        self.buffer_width = buffer_width;
        self
    }

    /// Set the number of reinitialization sweeps.
    pub fn with_reinitialization_sweeps(mut self, sweeps: usize) -> Self {
        self.reinitialization_sweeps = sweeps;
        self
    }

    /// Validate the configuration.
    ///
    /// Probes need two cells of stencil margin, so the padding must be at
    /// least that wide.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_width < 2 {
            return Err(LevelSetError::config("buffer_width must be at least 2"));
        }
        Ok(())
    }
}

/// Resolution parameters derived from the particle discretization.
///
/// Carries the reference particle spacing, the tolerance used when marking
/// near-interface nodes and the kernel evaluated by the integral passes.
#[derive(Clone)]
pub struct Adaptation {
    /// Particle spacing at the reference resolution.
    pub reference_spacing: f32,

    /// Fraction of the data spacing under which a node counts as near the interface.
    pub small_shift_factor: f32,

    /// Kernel integrated against the level set.
    pub kernel: Arc<dyn Kernel>,
}

impl Adaptation {
    /// Ratio between smoothing length and particle spacing.
    pub const DEFAULT_H_SPACING_RATIO: f32 = 1.3;

    /// Default near-interface tolerance factor.
    pub const DEFAULT_SMALL_SHIFT_FACTOR: f32 = 0.75;

    /// Adaptation with a Wendland C2 kernel of smoothing length `1.3 × reference_spacing`.
    pub fn new(reference_spacing: f32) -> Self {
        Self {
            reference_spacing,
            small_shift_factor: Self::DEFAULT_SMALL_SHIFT_FACTOR,
            kernel: Arc::new(WendlandC2::new(
                Self::DEFAULT_H_SPACING_RATIO * reference_spacing,
            )),
        }
    }

    /// Replace the kernel.
    pub fn with_kernel(mut self, kernel: Arc<dyn Kernel>) -> Self {
        self.kernel = kernel;
        self
    }

    /// Replace the near-interface tolerance factor.
    pub fn with_small_shift_factor(mut self, factor: f32) -> Self {
        self.small_shift_factor = factor;
        self
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.reference_spacing.is_finite() && self.reference_spacing > 0.0) {
            return Err(LevelSetError::config("reference_spacing must be positive"));
        }
        if !(self.small_shift_factor.is_finite() && self.small_shift_factor > 0.0) {
            return Err(LevelSetError::config("small_shift_factor must be positive"));
        }
        Ok(())
    }
}

impl fmt::Debug for Adaptation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adaptation")
            .field("reference_spacing", &self.reference_spacing)
            .field("small_shift_factor", &self.small_shift_factor)
            .field("cutoff_radius", &self.kernel.cutoff_radius(1.0))
            .finish()
    }
}
