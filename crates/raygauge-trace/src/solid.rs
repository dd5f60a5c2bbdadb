//! Solid definitions: primitive shapes combined by boolean operators.
//!
//! Coordinates are stored as plain `[f64; 3]` arrays so scene files stay
//! simple JSON; they are converted to math types at evaluation time.

use crate::interval::{self, Span};
use crate::Ray;
use raygauge_math::{Aabb3, Point3};
use serde::{Deserialize, Serialize};

/// Tolerance for merging touching spans during union evaluation.
const SPAN_TOL: f64 = 1e-9;

/// A solid: a CSG tree of primitives and boolean operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Solid {
    /// Axis-aligned box spanning `min` to `max`.
    Cuboid {
        /// Minimum corner.
        min: [f64; 3],
        /// Maximum corner.
        max: [f64; 3],
    },
    /// Sphere.
    Sphere {
        /// Center point.
        center: [f64; 3],
        /// Radius.
        radius: f64,
    },
    /// Cylinder along the Z axis.
    Cylinder {
        /// Center of the bottom cap.
        base: [f64; 3],
        /// Radius.
        radius: f64,
        /// Height along +Z.
        height: f64,
    },
    /// Boolean union of two solids.
    Union {
        /// Left operand.
        a: Box<Solid>,
        /// Right operand.
        b: Box<Solid>,
    },
    /// Boolean intersection of two solids.
    Intersection {
        /// Left operand.
        a: Box<Solid>,
        /// Right operand.
        b: Box<Solid>,
    },
    /// Boolean difference (`a` minus `b`).
    Difference {
        /// Base solid.
        a: Box<Solid>,
        /// Subtracted solid.
        b: Box<Solid>,
    },
}

impl Solid {
    /// Axis-aligned box from two corners.
    pub fn cuboid(min: [f64; 3], max: [f64; 3]) -> Self {
        Self::Cuboid { min, max }
    }

    /// Sphere from center and radius.
    pub fn sphere(center: [f64; 3], radius: f64) -> Self {
        Self::Sphere { center, radius }
    }

    /// Z-axis cylinder from bottom-cap center, radius, and height.
    pub fn cylinder(base: [f64; 3], radius: f64, height: f64) -> Self {
        Self::Cylinder {
            base,
            radius,
            height,
        }
    }

    /// Union of two solids.
    pub fn union(a: Solid, b: Solid) -> Self {
        Self::Union {
            a: Box::new(a),
            b: Box::new(b),
        }
    }

    /// Intersection of two solids.
    pub fn intersection(a: Solid, b: Solid) -> Self {
        Self::Intersection {
            a: Box::new(a),
            b: Box::new(b),
        }
    }

    /// Difference of two solids (`a` minus `b`).
    pub fn difference(a: Solid, b: Solid) -> Self {
        Self::Difference {
            a: Box::new(a),
            b: Box::new(b),
        }
    }

    /// Check the tree for malformed primitives.
    ///
    /// Returns a human-readable reason on the first defect found.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Solid::Cuboid { min, max } => {
                for axis in 0..3 {
                    if max[axis] <= min[axis] {
                        return Err(format!(
                            "cuboid max <= min on axis {axis} ({} <= {})",
                            max[axis], min[axis]
                        ));
                    }
                }
                Ok(())
            }
            Solid::Sphere { radius, .. } => {
                if *radius > 0.0 {
                    Ok(())
                } else {
                    Err(format!("sphere radius {radius} not positive"))
                }
            }
            Solid::Cylinder { radius, height, .. } => {
                if *radius <= 0.0 {
                    Err(format!("cylinder radius {radius} not positive"))
                } else if *height <= 0.0 {
                    Err(format!("cylinder height {height} not positive"))
                } else {
                    Ok(())
                }
            }
            Solid::Union { a, b } | Solid::Intersection { a, b } | Solid::Difference { a, b } => {
                a.validate()?;
                b.validate()
            }
        }
    }

    /// Bounding box of the tree.
    ///
    /// Boolean nodes are bounded conservatively: intersection and
    /// difference use the left operand's box.
    pub fn bounding_box(&self) -> Aabb3 {
        match self {
            Solid::Cuboid { min, max } => Aabb3::new(
                Point3::new(min[0], min[1], min[2]),
                Point3::new(max[0], max[1], max[2]),
            ),
            Solid::Sphere { center, radius } => Aabb3::new(
                Point3::new(center[0] - radius, center[1] - radius, center[2] - radius),
                Point3::new(center[0] + radius, center[1] + radius, center[2] + radius),
            ),
            Solid::Cylinder {
                base,
                radius,
                height,
            } => Aabb3::new(
                Point3::new(base[0] - radius, base[1] - radius, base[2]),
                Point3::new(base[0] + radius, base[1] + radius, base[2] + height),
            ),
            Solid::Union { a, b } => {
                let mut bb = a.bounding_box();
                bb.include(&b.bounding_box());
                bb
            }
            Solid::Intersection { a, .. } | Solid::Difference { a, .. } => a.bounding_box(),
        }
    }

    /// Evaluate the tree against a ray.
    ///
    /// Returns the sorted, disjoint list of spans where the ray is
    /// inside the solid, clipped to `t >= 0`.
    pub fn spans(&self, ray: &Ray) -> Vec<Span> {
        match self {
            Solid::Cuboid { .. } => clip(ray.intersect_aabb(&self.bounding_box())),
            Solid::Sphere { center, radius } => {
                let c = Point3::new(center[0], center[1], center[2]);
                let oc = ray.origin - c;
                let d = ray.direction.as_ref();
                let b = 2.0 * oc.dot(d);
                let c2 = oc.dot(&oc) - radius * radius;
                let disc = b * b - 4.0 * c2;
                if disc < 0.0 {
                    return Vec::new();
                }
                let sq = disc.sqrt();
                clip(Some(((-b - sq) / 2.0, (-b + sq) / 2.0)))
            }
            Solid::Cylinder {
                base,
                radius,
                height,
            } => {
                let d = ray.direction.as_ref();
                let ox = ray.origin.x - base[0];
                let oy = ray.origin.y - base[1];
                // Quadratic in the XY plane.
                let a2 = d.x * d.x + d.y * d.y;
                let side = if a2 < 1e-16 {
                    // Ray parallel to the axis: inside or outside for all t.
                    if ox * ox + oy * oy <= radius * radius {
                        (f64::NEG_INFINITY, f64::INFINITY)
                    } else {
                        return Vec::new();
                    }
                } else {
                    let b = 2.0 * (ox * d.x + oy * d.y);
                    let c = ox * ox + oy * oy - radius * radius;
                    let disc = b * b - 4.0 * a2 * c;
                    if disc < 0.0 {
                        return Vec::new();
                    }
                    let sq = disc.sqrt();
                    ((-b - sq) / (2.0 * a2), (-b + sq) / (2.0 * a2))
                };
                // Clip against the caps.
                let caps = if d.z.abs() < 1e-16 {
                    let z = ray.origin.z - base[2];
                    if z >= 0.0 && z <= *height {
                        (f64::NEG_INFINITY, f64::INFINITY)
                    } else {
                        return Vec::new();
                    }
                } else {
                    let t0 = (base[2] - ray.origin.z) / d.z;
                    let t1 = (base[2] + height - ray.origin.z) / d.z;
                    (t0.min(t1), t0.max(t1))
                };
                clip(Some((side.0.max(caps.0), side.1.min(caps.1))))
            }
            Solid::Union { a, b } => {
                interval::union(&a.spans(ray), &b.spans(ray), SPAN_TOL)
            }
            Solid::Intersection { a, b } => {
                interval::intersection(&a.spans(ray), &b.spans(ray))
            }
            Solid::Difference { a, b } => {
                interval::difference(&a.spans(ray), &b.spans(ray))
            }
        }
    }
}

/// Turn an entry/exit pair into a span list, clipping to `t >= 0`.
fn clip(hit: Option<(f64, f64)>) -> Vec<Span> {
    match hit {
        Some((t0, t1)) => Span::new(t0.max(0.0), t1).into_iter().collect(),
        None => Vec::new(),
    }
}
