#![warn(missing_docs)]

//! Math types for the raygauge solid-model analysis engine.
//!
//! Thin wrappers around nalgebra providing domain-specific types
//! for ray sampling: points, vectors, directions, bounding boxes,
//! view frames, and tolerance constants.

use nalgebra::{Unit, Vector3};

mod aabb;
mod view;

pub use aabb::Aabb3;
pub use view::ViewBasis;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 3x3 matrix, used for inertia tensors.
pub type Mat3 = nalgebra::Matrix3<f64>;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
}

impl Tolerance {
    /// Default distance tolerance (1e-6 mm).
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
