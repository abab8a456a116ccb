//! Math type re-exports and XNB-specific value types.
//!
//! This module re-exports types from `glam` and provides the additional
//! value types the XNB format carries (packed colors, bounding spheres).

// Re-export glam types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Packed 8-bit-per-channel RGBA color, stored in R,G,B,A order.
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Create a color from channel values.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to a normalized float vector.
    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Bounding sphere: a center point and a radius.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a new bounding sphere.
    #[inline]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if a point is inside the sphere.
    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    /// Expand this sphere to include another sphere.
    pub fn merged_with(&self, other: &Self) -> Self {
        let offset = other.center - self.center;
        let distance = offset.length();
        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }
        let radius = (self.radius + distance + other.radius) * 0.5;
        let center = self.center + offset * ((radius - self.radius) / distance);
        Self { center, radius }
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

impl fmt::Debug for BoundingSphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundingSphere({:?}, r={})", self.center, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color() {
        let c = Color::new(255, 128, 0, 255);
        assert_eq!(c.r, 255);
        assert_eq!(c.to_vec4().x, 1.0);
        assert_eq!(Color::default(), Color::TRANSPARENT);
    }

    #[test]
    fn test_bounding_sphere_contains() {
        let s = BoundingSphere::new(Vec3::ZERO, 2.0);
        assert!(s.contains(Vec3::new(1.0, 1.0, 0.0)));
        assert!(!s.contains(Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_bounding_sphere_merge() {
        let a = BoundingSphere::new(Vec3::ZERO, 1.0);
        let b = BoundingSphere::new(Vec3::new(4.0, 0.0, 0.0), 1.0);
        let m = a.merged_with(&b);
        assert_eq!(m.radius, 3.0);
        assert_eq!(m.center, Vec3::new(2.0, 0.0, 0.0));

        // Containment cases collapse to the larger sphere
        let inner = BoundingSphere::new(Vec3::new(0.5, 0.0, 0.0), 0.1);
        assert_eq!(a.merged_with(&inner), a);
    }

    #[test]
    fn test_pod_layout() {
        assert_eq!(std::mem::size_of::<Color>(), 4);
        assert_eq!(std::mem::size_of::<BoundingSphere>(), 16);
    }
}
