//! Shared per-region statistics, merged one ray at a time.
//!
//! Workers collect one ray's worth of segment samples into a local
//! [`RayBatch`], then merge it into the engine-scoped accumulator under
//! a single lock acquisition. The lock is owned by one engine instance,
//! never process-wide, so independent analyses can run concurrently.

use crate::report::QuantityRange;
use raygauge_math::{Mat3, Point3, Vec3};
use raygauge_trace::{Partition, Ray, RegionId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Upper bound on views per pass (triple grid).
pub(crate) const MAX_VIEWS: usize = 3;

/// One in-solid segment sampled by a ray.
#[derive(Debug, Clone, Copy)]
struct RaySample {
    region: RegionId,
    length: f64,
    mid: Point3,
    density: f64,
}

/// Worker-local buffer for one ray's accumulator updates.
pub struct RayBatch {
    view: usize,
    cell_area: f64,
    dir: Vec3,
    samples: Vec<RaySample>,
    hit_regions: Vec<RegionId>,
    overlaps: Vec<(RegionId, RegionId, f64)>,
}

impl RayBatch {
    /// Start a batch for one ray of the given view.
    pub fn new(view: usize, cell_area: f64, dir: Vec3) -> Self {
        Self {
            view,
            cell_area,
            dir,
            samples: Vec::new(),
            hit_regions: Vec::new(),
            overlaps: Vec::new(),
        }
    }

    /// Record one partition's segment for its region.
    pub fn add_segment(&mut self, part: &Partition, ray: &Ray, density: f64) {
        self.samples.push(RaySample {
            region: part.region,
            length: part.length(),
            mid: ray.at(part.mid_t()),
            density,
        });
        if !self.hit_regions.contains(&part.region) {
            self.hit_regions.push(part.region);
        }
    }

    /// Record one overlap occurrence between two regions.
    pub fn add_overlap(&mut self, a: RegionId, b: RegionId, depth: f64) {
        self.overlaps.push((a, b, depth));
    }

    /// True if the ray produced nothing to merge.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.overlaps.is_empty()
    }
}

/// Running statistics for one region (or the model total).
///
/// Pass sums are cleared at the start of every pass; the folded
/// estimates, brackets, and hit counts persist for the run.
#[derive(Debug, Clone)]
pub struct RegionStats {
    pub(crate) pass_length: [f64; MAX_VIEWS],
    pub(crate) pass_mass: [f64; MAX_VIEWS],
    pub(crate) pass_area: [f64; MAX_VIEWS],
    pub(crate) pass_moment: Vec3,
    pub(crate) pass_inertia: Mat3,
    pub(crate) pass_hits: u64,
    pub(crate) prev_volume: Option<f64>,
    pub(crate) prev_mass: Option<f64>,
    pub(crate) prev_area: Option<f64>,
    /// Volume estimate with its high/low bracket.
    pub volume: QuantityRange,
    /// Mass estimate with its high/low bracket.
    pub mass: QuantityRange,
    /// Surface-area estimate with its high/low bracket.
    pub surface_area: QuantityRange,
    /// Volume centroid from the finest completed pass.
    pub centroid: Point3,
    /// Mass-weighted inertia tensor about the model origin.
    pub inertia: Mat3,
    /// Rays that hit this region over the whole run.
    pub hits: u64,
    /// Set when `hits` stayed below the configured requirement.
    pub unreliable: bool,
}

impl Default for RegionStats {
    fn default() -> Self {
        Self {
            pass_length: [0.0; MAX_VIEWS],
            pass_mass: [0.0; MAX_VIEWS],
            pass_area: [0.0; MAX_VIEWS],
            pass_moment: Vec3::zeros(),
            pass_inertia: Mat3::zeros(),
            pass_hits: 0,
            prev_volume: None,
            prev_mass: None,
            prev_area: None,
            volume: QuantityRange::default(),
            mass: QuantityRange::default(),
            surface_area: QuantityRange::default(),
            centroid: Point3::origin(),
            inertia: Mat3::zeros(),
            hits: 0,
            unreliable: false,
        }
    }
}

impl RegionStats {
    /// Clear the per-pass sums, keeping folded state.
    pub(crate) fn clear_pass(&mut self) {
        self.pass_length = [0.0; MAX_VIEWS];
        self.pass_mass = [0.0; MAX_VIEWS];
        self.pass_area = [0.0; MAX_VIEWS];
        self.pass_moment = Vec3::zeros();
        self.pass_inertia = Mat3::zeros();
        self.pass_hits = 0;
    }
}

/// Deduplicated overlap evidence for one unordered region pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapStats {
    /// Number of ray segments that exhibited the overlap.
    pub count: u64,
    /// Deepest overlap seen along any ray.
    pub max_depth: f64,
}

pub(crate) struct AccumInner {
    pub(crate) regions: HashMap<RegionId, RegionStats>,
    pub(crate) total: RegionStats,
    pub(crate) overlaps: HashMap<(RegionId, RegionId), OverlapStats>,
}

/// Thread-safe map from region identity to running statistics.
pub struct RegionAccumulator {
    inner: Mutex<AccumInner>,
}

impl Default for RegionAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionAccumulator {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(AccumInner {
                regions: HashMap::new(),
                total: RegionStats::default(),
                overlaps: HashMap::new(),
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, AccumInner> {
        self.inner.lock().expect("accumulator lock poisoned")
    }

    /// Clear per-pass sums across all regions; keys are retained.
    pub(crate) fn begin_pass(&self) {
        let mut inner = self.lock();
        for stats in inner.regions.values_mut() {
            stats.clear_pass();
        }
        inner.total.clear_pass();
    }

    /// Merge one ray's batch under a single critical section.
    ///
    /// Region entries are created lazily on first hit and never removed
    /// for the lifetime of the run.
    pub fn merge_ray(&self, batch: &RayBatch) {
        if batch.is_empty() {
            return;
        }
        let mut guard = self.lock();
        let AccumInner {
            regions,
            total,
            overlaps,
        } = &mut *guard;
        for sample in &batch.samples {
            let w = batch.cell_area;
            let vol = w * sample.length;
            let m = vol * sample.density;
            let r = sample.mid.coords;
            // Thin-rod second moment: point term about the origin plus
            // the segment's own length term transverse to the ray.
            let point_term = m * (Mat3::identity() * r.dot(&r) - r * r.transpose());
            let rod_term = (m * sample.length * sample.length / 12.0)
                * (Mat3::identity() - batch.dir * batch.dir.transpose());

            let stats = regions.entry(sample.region).or_default();
            stats.pass_length[batch.view] += vol;
            stats.pass_mass[batch.view] += m;
            stats.pass_area[batch.view] += 2.0 * w;
            stats.pass_moment += vol * r;
            stats.pass_inertia += point_term + rod_term;

            total.pass_length[batch.view] += vol;
            total.pass_mass[batch.view] += m;
            total.pass_area[batch.view] += 2.0 * w;
            total.pass_moment += vol * r;
            total.pass_inertia += point_term + rod_term;
        }
        for region in &batch.hit_regions {
            regions.entry(*region).or_default().pass_hits += 1;
        }
        if !batch.hit_regions.is_empty() {
            total.pass_hits += 1;
        }
        for &(a, b, depth) in &batch.overlaps {
            let key = if a <= b { (a, b) } else { (b, a) };
            let entry = overlaps.entry(key).or_default();
            entry.count += 1;
            entry.max_depth = entry.max_depth.max(depth);
        }
    }

    /// Number of regions that have received at least one hit.
    pub fn region_count(&self) -> usize {
        self.lock().regions.len()
    }

    /// Lock-protected copy of every region's statistics, sorted by id.
    pub fn snapshot(&self) -> Vec<(RegionId, RegionStats)> {
        let inner = self.lock();
        let mut entries: Vec<_> = inner
            .regions
            .iter()
            .map(|(id, stats)| (*id, stats.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raygauge_math::Vec3;
    use raygauge_trace::Ray;

    fn ray_x() -> Ray {
        Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::x())
    }

    fn part(t_in: f64, t_out: f64, region: u32) -> Partition {
        Partition {
            t_in,
            t_out,
            region: RegionId(region),
            air: false,
        }
    }

    #[test]
    fn test_merge_accumulates_weighted_length() {
        let acc = RegionAccumulator::new();
        let mut batch = RayBatch::new(0, 0.25, Vec3::x());
        batch.add_segment(&part(1.0, 3.0, 0), &ray_x(), 2.0);
        acc.merge_ray(&batch);

        let snap = acc.snapshot();
        assert_eq!(snap.len(), 1);
        let (id, stats) = &snap[0];
        assert_eq!(*id, RegionId(0));
        assert!((stats.pass_length[0] - 0.5).abs() < 1e-12);
        assert!((stats.pass_mass[0] - 1.0).abs() < 1e-12);
        assert!((stats.pass_area[0] - 0.5).abs() < 1e-12);
        assert_eq!(stats.pass_hits, 1);
    }

    #[test]
    fn test_hits_count_rays_not_segments() {
        let acc = RegionAccumulator::new();
        let mut batch = RayBatch::new(0, 1.0, Vec3::x());
        batch.add_segment(&part(0.0, 1.0, 7), &ray_x(), 0.0);
        batch.add_segment(&part(2.0, 3.0, 7), &ray_x(), 0.0);
        acc.merge_ray(&batch);
        let snap = acc.snapshot();
        assert_eq!(snap[0].1.pass_hits, 1);
    }

    #[test]
    fn test_overlap_registry_deduplicates_pairs() {
        let acc = RegionAccumulator::new();
        let mut batch = RayBatch::new(0, 1.0, Vec3::x());
        batch.add_overlap(RegionId(2), RegionId(1), 0.5);
        batch.add_overlap(RegionId(1), RegionId(2), 0.8);
        acc.merge_ray(&batch);
        let inner = acc.lock();
        assert_eq!(inner.overlaps.len(), 1);
        let stats = inner.overlaps[&(RegionId(1), RegionId(2))];
        assert_eq!(stats.count, 2);
        assert!((stats.max_depth - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_begin_pass_clears_sums_keeps_keys() {
        let acc = RegionAccumulator::new();
        let mut batch = RayBatch::new(0, 1.0, Vec3::x());
        batch.add_segment(&part(0.0, 2.0, 3), &ray_x(), 1.0);
        acc.merge_ray(&batch);
        acc.begin_pass();
        let snap = acc.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].1.pass_length[0], 0.0);
        assert_eq!(snap[0].1.pass_hits, 0);
    }

    #[test]
    fn test_empty_batch_is_skipped() {
        let acc = RegionAccumulator::new();
        let batch = RayBatch::new(0, 1.0, Vec3::x());
        acc.merge_ray(&batch);
        assert_eq!(acc.region_count(), 0);
    }
}
