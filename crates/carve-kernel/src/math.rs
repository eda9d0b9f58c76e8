//! Math types for the carve kernel.
//!
//! Thin aliases over nalgebra plus the oriented [`Plane`] used by the
//! CSG tree.

use nalgebra::Vector3;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// An oriented plane `normal · p = w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing to the front side.
    pub normal: Vec3,
    /// Signed distance of the plane from the origin along `normal`.
    pub w: f64,
}

impl Plane {
    /// Plane through three points, oriented by their counter-clockwise winding.
    ///
    /// Returns `None` for collinear or coincident points.
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len < 1e-14 {
            return None;
        }
        let normal = n / len;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    /// Signed distance of a point from the plane (positive in front).
    pub fn distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.w
    }

    /// Reverse the orientation.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }
}
