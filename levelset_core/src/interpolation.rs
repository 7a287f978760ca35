//! Trilinear interpolation over node-centred lattices.
//!
//! Works for any value type implementing [`Interpolable`] so the same code
//! path serves signed distances, normals and kernel gradients.

use core::ops::{Add, Mul};

use crate::traits::{corner_from_index, NodeValueProvider};
use crate::types::{LocalCoord, Point3};

/// Values that can be blended linearly.
pub trait Interpolable: Copy + Add<Output = Self> + Mul<f32, Output = Self> {
    /// Additive identity.
    fn zero() -> Self;
}

impl Interpolable for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }
}

impl Interpolable for Point3 {
    #[inline]
    fn zero() -> Self {
        Point3::ZERO
    }
}

/// Compute trilinear interpolation weights for a local coordinate.
///
/// Returns the 8 weights corresponding to corners 0-7 in the order given by
/// [`corner_from_index`]. The weights sum to 1.0.
///
/// For a local coordinate (u, v, w) in [0,1]³:
/// - weight[0] = (1-u)(1-v)(1-w)  at corner (0,0,0)
/// - weight[1] = u(1-v)(1-w)      at corner (1,0,0)
/// - weight[2] = uv(1-w)          at corner (1,1,0)
/// - weight[3] = (1-u)v(1-w)      at corner (0,1,0)
/// - weight[4] = (1-u)(1-v)w      at corner (0,0,1)
/// - weight[5] = u(1-v)w          at corner (1,0,1)
/// - weight[6] = uvw              at corner (1,1,1)
/// - weight[7] = (1-u)vw          at corner (0,1,1)
#[inline]
pub fn compute_trilinear_weights(local: LocalCoord) -> [f32; 8] {
    let u = local.u;
    let v = local.v;
    let w = local.w;

    let u0 = 1.0 - u;
    let v0 = 1.0 - v;
    let w0 = 1.0 - w;

    [
        u0 * v0 * w0,
        u * v0 * w0,
        u * v * w0,
        u0 * v * w0,
        u0 * v0 * w,
        u * v0 * w,
        u * v * w,
        u0 * v * w,
    ]
}

/// Trilinear interpolation from the 8 lattice nodes surrounding a point.
///
/// # Arguments
/// * `provider` - Storage answering node lookups
/// * `base` - Index of the lower corner node of the enclosing cell
/// * `local` - The fractional position inside that cell
///
/// # Returns
/// The weighted sum of the 8 corner values.
pub fn trilinear_interpolate<T, P>(provider: &P, base: [i32; 3], local: LocalCoord) -> T
where
    T: Interpolable,
    P: NodeValueProvider<T> + ?Sized,
{
    let weights = compute_trilinear_weights(local);
    let mut result = T::zero();
    for (i, weight) in weights.iter().enumerate() {
        let (dx, dy, dz) = corner_from_index(i);
        let corner = [base[0] + dx as i32, base[1] + dy as i32, base[2] + dz as i32];
        result = result + provider.node_value(corner) * *weight;
    }
    result
}
