//! Core types for level-set lattice operations.
//!
//! Provides the vector type, lattice indices and bounding boxes used throughout the ecosystem.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Small value guarding divisions by vanishing magnitudes.
pub const TINY: f32 = 1.0e-12;

/// A 3D point with named fields for clarity.
///
/// Doubles as a vector for gradients, normals and displacements.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Point3 {
    /// The zero vector.
    pub const ZERO: Self = Self::splat(0.0);

    /// Create a new Point3.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a Point3 with all components set to the same value.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Component along `axis` (0 = x, 1 = y, anything else = z).
    #[inline]
    pub const fn component(&self, axis: usize) -> f32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Dot product with another point (treating both as vectors).
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared length of the vector.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length (magnitude) of the vector.
    #[inline]
    pub fn length(self) -> f32 {
        libm::sqrtf(self.length_squared())
    }

    /// Normalize the vector to unit length.
    /// Returns a zero vector if the length is zero.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            self / len
        }
    }

    /// Largest absolute component.
    ///
    /// Used as the per-axis proximity measure when classifying cells.
    #[inline]
    pub fn max_abs_element(self) -> f32 {
        libm::fabsf(self.x)
            .max(libm::fabsf(self.y))
            .max(libm::fabsf(self.z))
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }

    /// Component-wise absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        Self {
            x: libm::fabsf(self.x),
            y: libm::fabsf(self.y),
            z: libm::fabsf(self.z),
        }
    }

    /// True when every component is finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Point3 {
    #[inline]
    fn from(arr: [f32; 3]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
        }
    }
}

impl From<Point3> for [f32; 3] {
    #[inline]
    fn from(p: Point3) -> Self {
        p.as_array()
    }
}

impl From<(f32, f32, f32)> for Point3 {
    #[inline]
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self { x, y, z }
    }
}

impl Add for Point3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl AddAssign for Point3 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl Sub for Point3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl Mul<Point3> for f32 {
    type Output = Point3;

    #[inline]
    fn mul(self, point: Point3) -> Point3 {
        point * self
    }
}

impl Div<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl Neg for Point3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// Axis-aligned box bounding the region a lattice must cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Lower corner.
    pub min: Point3,
    /// Upper corner.
    pub max: Point3,
}

impl BoundingBox {
    /// Create a new bounding box from its corners.
    #[inline]
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Cube of half-width `half_extent` centred at `center`.
    #[inline]
    pub fn cube(center: Point3, half_extent: f32) -> Self {
        Self {
            min: center - Point3::splat(half_extent),
            max: center + Point3::splat(half_extent),
        }
    }

    /// Edge lengths of the box.
    #[inline]
    pub fn extent(&self) -> Point3 {
        self.max - self.min
    }

    /// A box is usable when its corners are finite and strictly ordered.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.max.x > self.min.x
            && self.max.y > self.min.y
            && self.max.z > self.min.z
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, point: Point3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

/// Cell index within a uniform lattice (unsigned, 0 to cells-1 per axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct CellIndex {
    /// X index.
    pub x: usize,
    /// Y index.
    pub y: usize,
    /// Z index.
    pub z: usize,
}

impl CellIndex {
    /// Create a new CellIndex.
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    /// Compute the flat index for a lattice with the given cell counts.
    /// Uses row-major ordering: index = x + y * nx + z * nx * ny
    #[inline]
    pub const fn flat_index(&self, dims: [usize; 3]) -> usize {
        self.x + self.y * dims[0] + self.z * dims[0] * dims[1]
    }

    /// Create a CellIndex from a flat index and lattice cell counts.
    #[inline]
    pub const fn from_flat_index(index: usize, dims: [usize; 3]) -> Self {
        Self {
            x: index % dims[0],
            y: (index / dims[0]) % dims[1],
            z: index / (dims[0] * dims[1]),
        }
    }
}

impl From<[usize; 3]> for CellIndex {
    #[inline]
    fn from(arr: [usize; 3]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
        }
    }
}

/// Local interpolation coordinates within a lattice cell, in the range [0, 1]³.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalCoord {
    /// U coordinate (x-axis) in [0, 1].
    pub u: f32,
    /// V coordinate (y-axis) in [0, 1].
    pub v: f32,
    /// W coordinate (z-axis) in [0, 1].
    pub w: f32,
}

impl LocalCoord {
    /// Create a new LocalCoord.
    #[inline]
    pub const fn new(u: f32, v: f32, w: f32) -> Self {
        Self { u, v, w }
    }

    /// Clamp all components to the [0, 1] range.
    #[inline]
    pub fn clamped(&self) -> Self {
        Self {
            u: self.u.clamp(0.0, 1.0),
            v: self.v.clamp(0.0, 1.0),
            w: self.w.clamp(0.0, 1.0),
        }
    }

    /// Check if all components are within the [0, 1] range.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.u) && (0.0..=1.0).contains(&self.v) && (0.0..=1.0).contains(&self.w)
    }
}
