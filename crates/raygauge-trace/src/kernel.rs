//! The interface the analysis engine uses to query prepared geometry.

use crate::{Partition, Ray, RegionInfo};
use raygauge_math::Aabb3;

/// A prepared solid model that can be interrogated with rays.
///
/// Implementations must support concurrent `shoot_ray` calls from many
/// threads once constructed; all queries are read-only.
pub trait SolidKernel: Sync {
    /// Bounding box enclosing every region of the model.
    fn bounding_box(&self) -> Aabb3;

    /// The model's region table, indexed by [`crate::RegionId`].
    fn regions(&self) -> &[RegionInfo];

    /// Shoot a ray through the model.
    ///
    /// Returns every partition the ray traverses, ordered by increasing
    /// `t_in`, or an empty list on a miss. Partitions of different
    /// regions may overlap; the kernel reports them as-is.
    fn shoot_ray(&self, ray: &Ray) -> Vec<Partition>;
}
