//! Ray partitions and region identity.

use serde::{Deserialize, Serialize};

/// Stable identifier of a region: an index into the kernel's region table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

impl RegionId {
    /// The region's index in the kernel's region table.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Metadata the kernel reports for each region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Region name, unique within a model.
    pub name: String,
    /// Material identifier, resolved to a density by the caller.
    pub material_id: u32,
    /// True if this region models air/void rather than solid material.
    pub air: bool,
}

/// One contiguous traversal of a region's material along a ray.
///
/// `t_in`/`t_out` are ray parameters (distances, since directions are
/// unit length) with `t_in <= t_out`. Within one ray's partition list,
/// partitions are ordered by increasing `t_in`; lists from different
/// regions may overlap, which the analysis engine diagnoses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    /// Entry distance along the ray.
    pub t_in: f64,
    /// Exit distance along the ray.
    pub t_out: f64,
    /// Region this partition belongs to.
    pub region: RegionId,
    /// Air flag copied from the region.
    pub air: bool,
}

impl Partition {
    /// Length of the traversed segment.
    pub fn length(&self) -> f64 {
        self.t_out - self.t_in
    }

    /// Ray parameter of the segment midpoint.
    pub fn mid_t(&self) -> f64 {
        (self.t_in + self.t_out) / 2.0
    }

    /// Depth by which this partition's range overlaps another's.
    ///
    /// Positive when the two `[t_in, t_out]` ranges share a span,
    /// zero or negative otherwise.
    pub fn overlap_depth(&self, other: &Partition) -> f64 {
        self.t_out.min(other.t_out) - self.t_in.max(other.t_in)
    }
}
