#![warn(missing_docs)]

//! Ray, partition, and solid-model kernel interface for raygauge.
//!
//! The analysis engine sees geometry only through the [`SolidKernel`]
//! trait: a prepared model that can report its bounding box, its region
//! table, and the ordered list of [`Partition`]s a ray traverses. This
//! crate also ships [`Scene`], an interval-CSG kernel over primitive
//! solids, which backs the batch front end and the test suites.
//!
//! # Example
//!
//! ```
//! use raygauge_trace::{Ray, Scene, SceneRegion, Solid, SolidKernel};
//! use raygauge_math::{Point3, Vec3};
//!
//! let scene = Scene::new(vec![SceneRegion::solid(
//!     "cube",
//!     1,
//!     Solid::cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
//! )])
//! .unwrap();
//!
//! let ray = Ray::new(Point3::new(0.5, 0.5, -1.0), Vec3::new(0.0, 0.0, 1.0));
//! let parts = scene.shoot_ray(&ray);
//! assert_eq!(parts.len(), 1);
//! assert!((parts[0].length() - 1.0).abs() < 1e-12);
//! ```

mod error;
mod interval;
mod kernel;
mod partition;
mod ray;
mod scene;
mod solid;

pub use error::TraceError;
pub use interval::Span;
pub use kernel::SolidKernel;
pub use partition::{Partition, RegionId, RegionInfo};
pub use ray::Ray;
pub use scene::{Scene, SceneRegion};
pub use solid::Solid;
