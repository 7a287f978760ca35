//! Smoothing kernel and smoothed step used by the kernel-integral passes.

use core::f32::consts::PI;

use crate::traits::Kernel;

/// Wendland C2 kernel in three dimensions.
///
/// Support radius is twice the smoothing length. Evaluating at `h_ratio`
/// shrinks the smoothing length to `reference_smoothing_length / h_ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WendlandC2 {
    reference_smoothing_length: f32,
}

impl WendlandC2 {
    const NORMALIZATION: f32 = 21.0 / (16.0 * PI);
    const KERNEL_SIZE: f32 = 2.0;

    /// Create a kernel with the given reference smoothing length.
    #[inline]
    pub const fn new(reference_smoothing_length: f32) -> Self {
        Self {
            reference_smoothing_length,
        }
    }

    /// Smoothing length at the reference resolution.
    #[inline]
    pub const fn reference_smoothing_length(&self) -> f32 {
        self.reference_smoothing_length
    }

    #[inline]
    fn smoothing_length(&self, h_ratio: f32) -> f32 {
        self.reference_smoothing_length / h_ratio
    }
}

impl Kernel for WendlandC2 {
    #[inline]
    fn cutoff_radius(&self, h_ratio: f32) -> f32 {
        Self::KERNEL_SIZE * self.smoothing_length(h_ratio)
    }

    fn w(&self, h_ratio: f32, r: f32) -> f32 {
        let h = self.smoothing_length(h_ratio);
        let q = r / h;
        if q >= Self::KERNEL_SIZE {
            return 0.0;
        }
        let a = 1.0 - 0.5 * q;
        let a2 = a * a;
        Self::NORMALIZATION / (h * h * h) * a2 * a2 * (2.0 * q + 1.0)
    }

    fn dw(&self, h_ratio: f32, r: f32) -> f32 {
        let h = self.smoothing_length(h_ratio);
        let q = r / h;
        if q >= Self::KERNEL_SIZE {
            return 0.0;
        }
        let a = 1.0 - 0.5 * q;
        Self::NORMALIZATION / (h * h * h * h) * (-5.0 * q) * a * a * a
    }
}

/// Smoothed Heaviside step of half width `half_width`.
///
/// Zero below `-half_width`, one above `half_width`, and a sine-blended
/// ramp in between with value 0.5 at `phi = 0`.
#[inline]
pub fn heaviside(phi: f32, half_width: f32) -> f32 {
    if phi < -half_width {
        return 0.0;
    }
    if phi > half_width {
        return 1.0;
    }
    let q = phi / half_width;
    0.5 + 0.5 * q + 0.5 * libm::sinf(PI * q) / PI
}
