//! Analytic shapes for building and testing level sets.

use crate::traits::Shape;
use crate::types::{BoundingBox, Point3};

/// Sphere given by centre and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Centre of the sphere.
    pub center: Point3,
    /// Radius of the sphere.
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere.
    #[inline]
    pub const fn new(center: Point3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Tight bounding box of the sphere.
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::cube(self.center, self.radius)
    }
}

impl Shape for Sphere {
    #[inline]
    fn signed_distance(&self, point: Point3) -> f32 {
        (point - self.center).length() - self.radius
    }

    /// Radial direction; +x at the centre, where every direction is nearest.
    #[inline]
    fn normal_direction(&self, point: Point3) -> Point3 {
        let radial = point - self.center;
        if radial.length_squared() == 0.0 {
            Point3::new(1.0, 0.0, 0.0)
        } else {
            radial.normalize()
        }
    }
}

/// Axis-aligned box given by centre and half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    /// Centre of the box.
    pub center: Point3,
    /// Half edge length along each axis.
    pub half_size: Point3,
}

impl Cuboid {
    /// Create a new box.
    #[inline]
    pub const fn new(center: Point3, half_size: Point3) -> Self {
        Self { center, half_size }
    }

    /// Tight bounding box of the cuboid.
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.center - self.half_size, self.center + self.half_size)
    }
}

impl Shape for Cuboid {
    fn signed_distance(&self, point: Point3) -> f32 {
        let q = (point - self.center).abs() - self.half_size;
        let outside = q.max(Point3::ZERO).length();
        let inside = q.x.max(q.y).max(q.z).min(0.0);
        outside + inside
    }

    fn normal_direction(&self, point: Point3) -> Point3 {
        let eps = 1.0e-4 * self.half_size.max_abs_element().max(1.0e-6);
        let dx = Point3::new(eps, 0.0, 0.0);
        let dy = Point3::new(0.0, eps, 0.0);
        let dz = Point3::new(0.0, 0.0, eps);
        Point3::new(
            self.signed_distance(point + dx) - self.signed_distance(point - dx),
            self.signed_distance(point + dy) - self.signed_distance(point - dy),
            self.signed_distance(point + dz) - self.signed_distance(point - dz),
        )
        .normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_sign_convention() {
        let sphere = Sphere::new(Point3::ZERO, 1.0);
        assert!((sphere.signed_distance(Point3::ZERO) + 1.0).abs() < 1e-6);
        assert!((sphere.signed_distance(Point3::new(2.0, 0.0, 0.0)) - 1.0).abs() < 1e-6);
        assert!(sphere.contains(Point3::new(0.5, 0.0, 0.0)));
        assert!(!sphere.contains(Point3::new(0.0, 1.5, 0.0)));
        let n = sphere.normal_direction(Point3::new(0.0, 3.0, 0.0));
        assert!((n - Point3::new(0.0, 1.0, 0.0)).length() < 1e-6);
        assert!((sphere.normal_direction(Point3::ZERO).length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cuboid_distance() {
        let cuboid = Cuboid::new(Point3::ZERO, Point3::new(1.0, 0.5, 0.5));
        assert!((cuboid.signed_distance(Point3::ZERO) + 0.5).abs() < 1e-6);
        assert!((cuboid.signed_distance(Point3::new(2.0, 0.0, 0.0)) - 1.0).abs() < 1e-6);
        let corner = cuboid.signed_distance(Point3::new(2.0, 1.5, 0.0));
        assert!((corner - 2.0f32.sqrt()).abs() < 1e-5);
        let n = cuboid.normal_direction(Point3::new(0.0, 0.0, 0.8));
        assert!((n - Point3::new(0.0, 0.0, 1.0)).length() < 1e-3);
    }
}
