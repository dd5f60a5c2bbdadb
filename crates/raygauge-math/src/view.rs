//! Orthonormal view frames for ray-grid generation.

use crate::{Dir3, Vec3};

/// A right-handed orthonormal frame describing one sampling view.
///
/// `dir` is the direction rays travel (toward the model); `u` and `v`
/// span the grid plane perpendicular to `dir`, with `u × v == dir`.
#[derive(Debug, Clone, Copy)]
pub struct ViewBasis {
    /// First in-plane axis (grid columns advance along `u`).
    pub u: Dir3,
    /// Second in-plane axis (grid rows advance along `v`).
    pub v: Dir3,
    /// Ray direction.
    pub dir: Dir3,
}

impl ViewBasis {
    /// Build a view from azimuth and elevation angles in degrees.
    ///
    /// Azimuth is measured in the XY plane from +X toward +Y; elevation
    /// from the XY plane toward +Z. The eye sits at the given bearing and
    /// rays travel from the eye toward the model, so `dir` is the negated
    /// bearing vector.
    pub fn from_az_el(azimuth_deg: f64, elevation_deg: f64) -> Self {
        let az = azimuth_deg.to_radians();
        let el = elevation_deg.to_radians();
        let bearing = Vec3::new(el.cos() * az.cos(), el.cos() * az.sin(), el.sin());
        let dir = Dir3::new_normalize(-bearing);
        Self::from_dir(dir)
    }

    /// Build a view shooting along one of the principal axes
    /// (0 = +X, 1 = +Y, 2 = +Z), with the in-plane axes chosen as the
    /// other two principal axes in right-handed order.
    pub fn axis(axis: usize) -> Self {
        let (u, v, dir) = match axis {
            0 => (Vec3::y(), Vec3::z(), Vec3::x()),
            1 => (Vec3::z(), Vec3::x(), Vec3::y()),
            _ => (Vec3::x(), Vec3::y(), Vec3::z()),
        };
        Self {
            u: Dir3::new_normalize(u),
            v: Dir3::new_normalize(v),
            dir: Dir3::new_normalize(dir),
        }
    }

    /// Build a view from an arbitrary ray direction.
    ///
    /// The in-plane axes are derived from the world Z axis (or X when the
    /// direction is near-vertical) so that `u × v == dir`.
    pub fn from_dir(dir: Dir3) -> Self {
        let up = if dir.as_ref().z.abs() > 0.999 {
            Vec3::x()
        } else {
            Vec3::z()
        };
        let u = Dir3::new_normalize(dir.as_ref().cross(&up));
        let v = Dir3::new_normalize(u.as_ref().cross(dir.as_ref()));
        Self { u, v, dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(b: &ViewBasis) {
        assert!(b.u.as_ref().dot(b.v.as_ref()).abs() < 1e-12);
        assert!(b.u.as_ref().dot(b.dir.as_ref()).abs() < 1e-12);
        assert!(b.v.as_ref().dot(b.dir.as_ref()).abs() < 1e-12);
        let cross = b.u.as_ref().cross(b.v.as_ref());
        assert!((cross - b.dir.as_ref()).norm() < 1e-12);
    }

    #[test]
    fn test_axis_views() {
        for axis in 0..3 {
            let b = ViewBasis::axis(axis);
            assert_orthonormal(&b);
        }
        assert!((ViewBasis::axis(0).dir.as_ref() - Vec3::x()).norm() < 1e-12);
        assert!((ViewBasis::axis(1).dir.as_ref() - Vec3::y()).norm() < 1e-12);
        assert!((ViewBasis::axis(2).dir.as_ref() - Vec3::z()).norm() < 1e-12);
    }

    #[test]
    fn test_az_el_zero_looks_down_minus_x() {
        let b = ViewBasis::from_az_el(0.0, 0.0);
        assert!((b.dir.as_ref() - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
        assert_orthonormal(&b);
    }

    #[test]
    fn test_az_el_vertical() {
        // Looking straight down: elevation 90 gives dir = -Z.
        let b = ViewBasis::from_az_el(0.0, 90.0);
        assert!((b.dir.as_ref() - Vec3::new(0.0, 0.0, -1.0)).norm() < 1e-9);
        assert_orthonormal(&b);
    }

    #[test]
    fn test_az_el_oblique() {
        let b = ViewBasis::from_az_el(35.0, 25.0);
        assert_orthonormal(&b);
    }
}
