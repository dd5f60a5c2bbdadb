//! Ray-grid generation: finite, restartable lattices of sampling rays.
//!
//! A [`RayGrid`] walks a rectangular lattice in the plane perpendicular
//! to one view direction, row-major, launching every ray from outside
//! the model so partitions always start at positive parameters. A pass
//! uses either one grid (single view) or three (one per principal axis)
//! so volume and surface-area estimates can be cross-checked against
//! independent sampling axes.

use raygauge_math::{Aabb3, Point3, ViewBasis};
use raygauge_trace::Ray;

/// Grid strategy for one analysis run.
#[derive(Debug, Clone, Copy)]
pub enum GridMode {
    /// One view direction given by azimuth/elevation angles in degrees.
    Single {
        /// Azimuth of the eye bearing, degrees.
        azimuth_deg: f64,
        /// Elevation of the eye bearing, degrees.
        elevation_deg: f64,
    },
    /// Three views along the principal axes.
    Triple,
}

impl GridMode {
    /// Number of views this mode samples per pass (1 or 3).
    pub fn num_views(&self) -> usize {
        match self {
            GridMode::Single { .. } => 1,
            GridMode::Triple => 3,
        }
    }

    /// The view bases for one pass, in view order.
    pub fn bases(&self) -> Vec<ViewBasis> {
        match self {
            GridMode::Single {
                azimuth_deg,
                elevation_deg,
            } => vec![ViewBasis::from_az_el(*azimuth_deg, *elevation_deg)],
            GridMode::Triple => (0..3).map(ViewBasis::axis).collect(),
        }
    }
}

/// A finite, restartable sequence of lattice rays for one view.
///
/// The lattice is centered on the bounding box's silhouette in the view
/// plane and over-covers it by up to half a cell on each edge. Counts
/// are clamped to at least one per axis, so a degenerate box still
/// yields a sequence of one ray.
#[derive(Debug, Clone)]
pub struct RayGrid {
    basis: ViewBasis,
    spacing: f64,
    nu: usize,
    nv: usize,
    u0: f64,
    v0: f64,
    d0: f64,
    index: usize,
    end: usize,
}

impl RayGrid {
    /// Build the lattice covering `bbox` as seen from `basis`.
    pub fn new(bbox: &Aabb3, basis: ViewBasis, spacing: f64) -> Self {
        let mut u_lo = f64::INFINITY;
        let mut u_hi = f64::NEG_INFINITY;
        let mut v_lo = f64::INFINITY;
        let mut v_hi = f64::NEG_INFINITY;
        let mut d_lo = f64::INFINITY;
        for ix in 0..8 {
            let corner = Point3::new(
                if ix & 1 == 0 { bbox.min.x } else { bbox.max.x },
                if ix & 2 == 0 { bbox.min.y } else { bbox.max.y },
                if ix & 4 == 0 { bbox.min.z } else { bbox.max.z },
            );
            let su = corner.coords.dot(basis.u.as_ref());
            let sv = corner.coords.dot(basis.v.as_ref());
            let sd = corner.coords.dot(basis.dir.as_ref());
            u_lo = u_lo.min(su);
            u_hi = u_hi.max(su);
            v_lo = v_lo.min(sv);
            v_hi = v_hi.max(sv);
            d_lo = d_lo.min(sd);
        }
        let nu = ((u_hi - u_lo) / spacing).ceil().max(1.0) as usize;
        let nv = ((v_hi - v_lo) / spacing).ceil().max(1.0) as usize;
        // Center the lattice on the silhouette.
        let u0 = (u_lo + u_hi) / 2.0 - (nu as f64 - 1.0) * spacing / 2.0;
        let v0 = (v_lo + v_hi) / 2.0 - (nv as f64 - 1.0) * spacing / 2.0;
        // Launch plane strictly behind the model along the view axis.
        let d0 = d_lo - 1.0 - 1e-3 * bbox.diagonal();
        let end = nu * nv;
        Self {
            basis,
            spacing,
            nu,
            nv,
            u0,
            v0,
            d0,
            index: 0,
            end,
        }
    }

    /// Spacing used to generate this sequence.
    ///
    /// The area each sample represents is `spacing * spacing`.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Area of one lattice cell.
    pub fn cell_area(&self) -> f64 {
        self.spacing * self.spacing
    }

    /// Total number of lattice points in the full sequence.
    pub fn len(&self) -> usize {
        self.nu * self.nv
    }

    /// True for a zero-point sequence (never produced by `new`).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The view this grid samples.
    pub fn basis(&self) -> &ViewBasis {
        &self.basis
    }

    /// An independent sub-sequence over lattice indices `[start, end)`.
    ///
    /// Used to hand each worker a contiguous batch with no shared
    /// counters. Indices are clamped to the lattice size.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let mut sub = self.clone();
        sub.end = end.min(self.len());
        sub.index = start.min(sub.end);
        sub
    }

    /// Produce the next ray, advancing row-major through the lattice.
    ///
    /// Returns `None` once the sequence is exhausted and keeps
    /// returning `None`; restart requires building a new grid.
    pub fn next_ray(&mut self) -> Option<Ray> {
        if self.index >= self.end {
            return None;
        }
        let i = self.index % self.nu;
        let j = self.index / self.nu;
        self.index += 1;
        let su = self.u0 + i as f64 * self.spacing;
        let sv = self.v0 + j as f64 * self.spacing;
        let origin = Point3::from(
            su * self.basis.u.as_ref()
                + sv * self.basis.v.as_ref()
                + self.d0 * self.basis.dir.as_ref(),
        );
        Some(Ray::from_dir(origin, self.basis.dir))
    }
}

/// Build the pass's grids, one per view, at the given spacing.
pub fn build_grids(bbox: &Aabb3, mode: &GridMode, spacing: f64) -> Vec<RayGrid> {
    mode.bases()
        .into_iter()
        .map(|basis| RayGrid::new(bbox, basis, spacing))
        .collect()
}

/// Statically partition a pass's lattices into `workers` batches.
///
/// The concatenated index space of all views is cut into `workers`
/// contiguous ranges; each batch is a list of `(view index, sub-grid)`
/// pieces. Batches are decided before the pass starts, so workers need
/// no coordination to claim rays.
pub fn split_batches(grids: &[RayGrid], workers: usize) -> Vec<Vec<(usize, RayGrid)>> {
    let total: usize = grids.iter().map(RayGrid::len).sum();
    let mut batches = Vec::with_capacity(workers);
    for w in 0..workers {
        let lo = total * w / workers;
        let hi = total * (w + 1) / workers;
        let mut batch = Vec::new();
        let mut offset = 0;
        for (view, grid) in grids.iter().enumerate() {
            let glo = lo.max(offset);
            let ghi = hi.min(offset + grid.len());
            if glo < ghi {
                batch.push((view, grid.slice(glo - offset, ghi - offset)));
            }
            offset += grid.len();
        }
        batches.push(batch);
    }
    batches
}
