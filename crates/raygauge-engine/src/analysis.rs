//! The convergence controller.
//!
//! Owns one analysis run: configures the ray grids, drives worker
//! passes over them, folds each pass's sums into bracketed estimates,
//! and halves the spacing until every tracked quantity's bracket is
//! within tolerance or the spacing floor is reached.
//!
//! ## Bracketing estimator
//!
//! Each pass yields one estimate per active view for every tracked
//! quantity. After pass N the bracket is the min/max over the current
//! pass's per-view estimates together with the previous pass's
//! aggregate, so a single-view run always compares two grid
//! resolutions and a triple-grid run additionally compares three
//! independent sampling axes within a pass. Convergence can only be
//! declared from the second pass onward.

use crate::accumulate::{RayBatch, RegionAccumulator, RegionStats};
use crate::callbacks::DiagnosticCallbacks;
use crate::classify::{classify, ClassifyOptions, Event};
use crate::density::DensityTable;
use crate::error::AnalysisError;
use crate::grid::{build_grids, split_batches, GridMode, RayGrid};
use crate::plot::PlotWriter;
use crate::report::{Outcome, OverlapReport, PassSummary, QuantityRange, RegionReport, Report};
use raygauge_math::{Mat3, Point3, Tolerance};
use raygauge_trace::{RegionId, SolidKernel};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for one analysis run.
///
/// `spacing` and `spacing_limit` are required at construction; the
/// remaining fields default to a single-quantity volume analysis on
/// one worker.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Initial grid spacing.
    pub spacing: f64,
    /// Refinement floor: spacing never drops below this.
    pub spacing_limit: f64,
    /// Grid strategy (single view or triple grid).
    pub mode: GridMode,
    /// Relative tolerance on volume, or `None` to not track volume.
    pub volume_tolerance: Option<f64>,
    /// Relative tolerance on mass, or `None` to not track mass.
    pub mass_tolerance: Option<f64>,
    /// Relative tolerance on surface area, or `None` to not track it.
    pub area_tolerance: Option<f64>,
    /// Minimum overlap depth reported as a diagnostic.
    pub overlap_tolerance: f64,
    /// Number of worker threads.
    pub ncpu: usize,
    /// Whether air regions are tracked (gates gap/air diagnostics).
    pub use_air: bool,
    /// Minimum ray hits below which a region is flagged unreliable.
    pub required_hits: u64,
    /// Suppress the under-sampled warning message (never the flag).
    pub quiet_missed: bool,
    /// Density used for materials missing from the density table.
    pub default_density: f64,
}

impl AnalysisConfig {
    /// A volume-only, single-worker configuration.
    pub fn new(spacing: f64, spacing_limit: f64) -> Self {
        Self {
            spacing,
            spacing_limit,
            mode: GridMode::Triple,
            volume_tolerance: Some(0.01),
            mass_tolerance: None,
            area_tolerance: None,
            overlap_tolerance: 1e-6,
            ncpu: 1,
            use_air: false,
            required_hits: 1,
            quiet_missed: false,
            default_density: 0.0,
        }
    }

    /// Reject invalid combinations before any sampling starts.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return Err(AnalysisError::InvalidSpacing(self.spacing));
        }
        if !self.spacing_limit.is_finite() || self.spacing_limit <= 0.0 {
            return Err(AnalysisError::InvalidSpacing(self.spacing_limit));
        }
        if self.spacing_limit > self.spacing {
            return Err(AnalysisError::SpacingLimitExceedsSpacing {
                spacing: self.spacing,
                limit: self.spacing_limit,
            });
        }
        if self.ncpu == 0 {
            return Err(AnalysisError::ZeroCpus);
        }
        if self.volume_tolerance.is_none()
            && self.mass_tolerance.is_none()
            && self.area_tolerance.is_none()
        {
            return Err(AnalysisError::NoTrackedQuantities);
        }
        Ok(())
    }
}

/// Best-effort abort switch, checked at the per-pass barrier.
///
/// Rays in flight always finish; the run stops before the next pass.
#[derive(Clone)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Request the run to stop at the next pass barrier.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once an abort has been requested.
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where the controller currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    /// Configured and validated, no pass run yet.
    Ready,
    /// A grid pass is in flight.
    Running {
        /// 1-based pass number.
        pass: u32,
    },
    /// Finished with every tracked bracket within tolerance.
    Converged,
    /// Finished at the spacing floor without meeting tolerance.
    SpacingFloorReached,
}

/// One analysis session over a prepared model.
pub struct Analysis<'k, K: SolidKernel + ?Sized> {
    kernel: &'k K,
    config: AnalysisConfig,
    callbacks: DiagnosticCallbacks,
    accumulator: RegionAccumulator,
    densities: Vec<f64>,
    plot: Option<PlotWriter>,
    abort: Arc<AtomicBool>,
    state: AnalysisState,
}

impl<'k, K: SolidKernel + ?Sized> Analysis<'k, K> {
    /// Create a session over `kernel` with a validated configuration.
    pub fn new(kernel: &'k K, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        if kernel.regions().is_empty() {
            return Err(AnalysisError::EmptyModel);
        }
        let densities = kernel
            .regions()
            .iter()
            .map(|r| if r.air { 0.0 } else { config.default_density })
            .collect();
        Ok(Self {
            kernel,
            config,
            callbacks: DiagnosticCallbacks::new(),
            accumulator: RegionAccumulator::new(),
            densities,
            plot: None,
            abort: Arc::new(AtomicBool::new(false)),
            state: AnalysisState::Ready,
        })
    }

    /// Resolve every region's density through `table`.
    ///
    /// Materials missing from the table fall back to the configured
    /// default density; air regions are always massless.
    pub fn set_density_table(&mut self, table: &DensityTable) {
        let default = self.config.default_density;
        self.densities = self
            .kernel
            .regions()
            .iter()
            .map(|r| {
                if r.air {
                    0.0
                } else {
                    table.lookup(r.material_id).unwrap_or(default)
                }
            })
            .collect();
    }

    /// Load a density table from a file and resolve region densities.
    pub fn load_density_file(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), AnalysisError> {
        let table = DensityTable::from_path(path)?;
        self.set_density_table(&table);
        Ok(())
    }

    /// Install the diagnostic callback table.
    pub fn set_callbacks(&mut self, callbacks: DiagnosticCallbacks) {
        self.callbacks = callbacks;
    }

    /// Enable plot output of sampled in-solid segments.
    pub fn set_plot_writer(&mut self, plot: PlotWriter) {
        self.plot = Some(plot);
    }

    /// A handle that can stop the run between passes.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle(Arc::clone(&self.abort))
    }

    /// The controller's current lifecycle state.
    pub fn state(&self) -> AnalysisState {
        self.state
    }

    /// The live accumulator (snapshot access while a run is active).
    pub fn accumulator(&self) -> &RegionAccumulator {
        &self.accumulator
    }

    /// Discard accumulated state so the session can be rerun.
    pub fn reset(&mut self) {
        self.accumulator = RegionAccumulator::new();
        self.abort.store(false, Ordering::SeqCst);
        self.state = AnalysisState::Ready;
    }

    /// Run one complete convergence analysis.
    ///
    /// Resets any previous state, then performs grid passes at
    /// successively halved spacing until every tracked quantity's
    /// bracket meets its tolerance or the spacing floor is reached.
    pub fn run(&mut self) -> Result<Report, AnalysisError> {
        let bbox = self.kernel.bounding_box();
        if bbox.is_empty() {
            return Err(AnalysisError::EmptyModel);
        }
        if bbox.diagonal() <= 0.0 {
            return Err(AnalysisError::DegenerateModel);
        }
        self.reset();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.ncpu)
            .build()
            .map_err(|e| AnalysisError::WorkerPool(e.to_string()))?;

        let num_views = self.config.mode.num_views();
        let opts = ClassifyOptions {
            overlap_tol: self.config.overlap_tolerance,
            dist_tol: Tolerance::DEFAULT.linear,
            use_air: self.config.use_air,
        };

        let mut spacing = self.config.spacing;
        let mut pass = 0u32;
        let mut pass_log = Vec::new();
        let outcome = loop {
            pass += 1;
            self.state = AnalysisState::Running { pass };
            self.accumulator.begin_pass();
            let grids = build_grids(&bbox, &self.config.mode, spacing);
            let total_rays: usize = grids.iter().map(RayGrid::len).sum();
            debug!(pass, spacing, rays = total_rays, "starting grid pass");

            let ctx = PassContext {
                kernel: self.kernel,
                accumulator: &self.accumulator,
                callbacks: &self.callbacks,
                densities: &self.densities,
                opts,
                plot: self.plot.is_some(),
            };
            let batches = split_batches(&grids, self.config.ncpu);
            let segments: Vec<Vec<(Point3, Point3)>> = pool.install(|| {
                batches
                    .into_par_iter()
                    .map(|batch| ctx.process_batch(batch))
                    .collect()
            });
            // All workers have joined; plot output is flushed by this
            // thread alone.
            if let Some(plot) = self.plot.as_mut() {
                for (start, end) in segments.iter().flatten() {
                    plot.write_segment(start, end)?;
                }
                plot.flush()?;
            }

            let (converged, summary) = self.fold_pass(pass, spacing, num_views);
            pass_log.push(summary);

            if self.abort.load(Ordering::SeqCst) {
                return Err(AnalysisError::Aborted);
            }
            if pass >= 2 && converged {
                break Outcome::Converged;
            }
            let next = spacing / 2.0;
            if next < self.config.spacing_limit {
                warn!(
                    spacing,
                    limit = self.config.spacing_limit,
                    "spacing floor reached before tolerance"
                );
                break Outcome::SpacingFloorReached;
            }
            spacing = next;
        };

        self.state = match outcome {
            Outcome::Converged => AnalysisState::Converged,
            Outcome::SpacingFloorReached => AnalysisState::SpacingFloorReached,
        };
        let report = self.build_report(outcome, pass, spacing, num_views, pass_log);
        info!(
            passes = pass,
            final_spacing = spacing,
            converged = report.converged(),
            regions = report.region_count(),
            "analysis complete"
        );
        Ok(report)
    }

    /// Fold one pass's sums into estimates; returns whether every
    /// tracked quantity is within tolerance.
    fn fold_pass(&self, pass: u32, spacing: f64, num_views: usize) -> (bool, PassSummary) {
        let mut guard = self.accumulator.lock();
        let inner = &mut *guard;
        let mut all_ok = true;
        for stats in inner.regions.values_mut() {
            fold_stats(stats, num_views);
            stats.unreliable = stats.hits < self.config.required_hits;
            // Under-sampled regions never gate convergence; they are
            // flagged instead.
            if !stats.unreliable && !within_tolerances(stats, &self.config) {
                all_ok = false;
            }
        }
        fold_stats(&mut inner.total, num_views);
        if !within_tolerances(&inner.total, &self.config) {
            all_ok = false;
        }
        let summary = PassSummary {
            pass,
            spacing,
            total_volume: inner.total.volume,
            total_mass: inner.total.mass,
            total_area: inner.total.surface_area,
        };
        (all_ok, summary)
    }

    fn build_report(
        &self,
        outcome: Outcome,
        passes: u32,
        final_spacing: f64,
        num_views: usize,
        pass_log: Vec<PassSummary>,
    ) -> Report {
        let infos = self.kernel.regions();
        let inner = self.accumulator.lock();
        let unhit = RegionStats::default();
        let mut regions = Vec::with_capacity(infos.len());
        for (idx, info) in infos.iter().enumerate() {
            let id = RegionId(idx as u32);
            let stats = inner.regions.get(&id).unwrap_or(&unhit);
            let unreliable = stats.hits < self.config.required_hits;
            if unreliable && !self.config.quiet_missed {
                warn!(
                    region = info.name.as_str(),
                    hits = stats.hits,
                    required = self.config.required_hits,
                    "region under-sampled; estimates unreliable"
                );
            }
            regions.push(RegionReport {
                region: id,
                name: info.name.clone(),
                air: info.air,
                volume: stats.volume,
                mass: stats.mass,
                surface_area: stats.surface_area,
                centroid: stats.centroid,
                inertia: inertia_about_centroid(stats),
                hits: stats.hits,
                unreliable,
            });
        }
        let region_name = |id: RegionId| {
            infos
                .get(id.index())
                .map(|i| i.name.clone())
                .unwrap_or_default()
        };
        let mut overlaps: Vec<OverlapReport> = inner
            .overlaps
            .iter()
            .map(|(&(a, b), &stats)| {
                OverlapReport::new((a, b), (region_name(a), region_name(b)), stats)
            })
            .collect();
        overlaps.sort_by_key(|o| o.regions);

        Report {
            outcome,
            passes,
            final_spacing,
            num_views,
            total_volume: inner.total.volume,
            total_mass: inner.total.mass,
            total_surface_area: inner.total.surface_area,
            total_centroid: inner.total.centroid,
            total_inertia: inertia_about_centroid(&inner.total),
            regions,
            overlaps,
            pass_log,
        }
    }
}

/// Shared per-pass context handed to every worker.
struct PassContext<'a, K: SolidKernel + ?Sized> {
    kernel: &'a K,
    accumulator: &'a RegionAccumulator,
    callbacks: &'a DiagnosticCallbacks,
    densities: &'a [f64],
    opts: ClassifyOptions,
    plot: bool,
}

impl<K: SolidKernel + ?Sized> PassContext<'_, K> {
    /// Drain one worker's batch of sub-grids.
    ///
    /// Returns the in-solid segments to plot; all statistics updates
    /// are merged into the accumulator one ray at a time.
    fn process_batch(&self, batch: Vec<(usize, RayGrid)>) -> Vec<(Point3, Point3)> {
        let mut segments = Vec::new();
        for (view, mut grid) in batch {
            let cell_area = grid.cell_area();
            while let Some(ray) = grid.next_ray() {
                let mut parts = self.kernel.shoot_ray(&ray);
                if !self.opts.use_air {
                    parts.retain(|p| !p.air);
                }
                if parts.is_empty() {
                    continue;
                }
                let mut updates = RayBatch::new(view, cell_area, ray.direction.into_inner());
                classify(&ray, &parts, &self.opts, |event| {
                    if let Event::Overlap { a, b, depth, .. } = &event {
                        updates.add_overlap(a.region, b.region, *depth);
                    }
                    self.callbacks.dispatch(&ray, &event);
                });
                for part in &parts {
                    let density = if part.air {
                        0.0
                    } else {
                        self.densities
                            .get(part.region.index())
                            .copied()
                            .unwrap_or(0.0)
                    };
                    updates.add_segment(part, &ray, density);
                    if self.plot {
                        segments.push((ray.at(part.t_in), ray.at(part.t_out)));
                    }
                }
                self.accumulator.merge_ray(&updates);
            }
        }
        segments
    }
}

/// Fold one region's pass sums into estimates and brackets.
fn fold_stats(stats: &mut RegionStats, num_views: usize) {
    stats.hits += stats.pass_hits;
    stats.volume = fold_quantity(&mut stats.prev_volume, &stats.pass_length[..num_views]);
    stats.mass = fold_quantity(&mut stats.prev_mass, &stats.pass_mass[..num_views]);
    stats.surface_area = fold_quantity(&mut stats.prev_area, &stats.pass_area[..num_views]);
    let length_total: f64 = stats.pass_length[..num_views].iter().sum();
    if length_total > 0.0 {
        stats.centroid = Point3::from(stats.pass_moment / length_total);
        stats.inertia = stats.pass_inertia / num_views as f64;
    }
}

/// Bracket one quantity: min/max over this pass's per-view estimates
/// and the previous pass's aggregate.
fn fold_quantity(prev: &mut Option<f64>, views: &[f64]) -> QuantityRange {
    let value = views.iter().sum::<f64>() / views.len() as f64;
    let mut high = views.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let mut low = views.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    if let Some(p) = *prev {
        high = high.max(p);
        low = low.min(p);
    }
    *prev = Some(value);
    QuantityRange { value, high, low }
}

/// True when every tracked quantity's bracket is within tolerance.
fn within_tolerances(stats: &RegionStats, config: &AnalysisConfig) -> bool {
    [
        (config.volume_tolerance, &stats.volume),
        (config.mass_tolerance, &stats.mass),
        (config.area_tolerance, &stats.surface_area),
    ]
    .iter()
    .all(|(tol, quantity)| match tol {
        Some(t) => quantity.relative_spread() <= *t,
        None => true,
    })
}

/// Parallel-axis transfer of the accumulated origin-frame tensor to
/// the region's centroid.
fn inertia_about_centroid(stats: &RegionStats) -> Mat3 {
    let m = stats.mass.value;
    let c = stats.centroid.coords;
    stats.inertia - m * (Mat3::identity() * c.dot(&c) - c * c.transpose())
}
