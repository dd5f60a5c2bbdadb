#![warn(missing_docs)]

//! Grid quantitative analysis of boolean solid models.
//!
//! The engine estimates volumetric properties (volume, mass, surface
//! area, centroid, moments of inertia) of every region in a model and
//! diagnoses geometric defects (overlaps, gaps, air anomalies) by
//! firing structured grids of sampling rays through it. Passes repeat
//! at successively halved grid spacing until the high/low bracket on
//! every tracked quantity is within tolerance or the spacing floor is
//! reached.
//!
//! # Example
//!
//! ```
//! use raygauge_engine::{Analysis, AnalysisConfig, GridMode};
//! use raygauge_trace::{Scene, SceneRegion, Solid};
//!
//! let scene = Scene::new(vec![SceneRegion::solid(
//!     "cube",
//!     1,
//!     Solid::cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
//! )])
//! .unwrap();
//!
//! let mut config = AnalysisConfig::new(0.5, 0.1);
//! config.mode = GridMode::Triple;
//! let mut analysis = Analysis::new(&scene, config).unwrap();
//! let report = analysis.run().unwrap();
//! assert!((report.total_volume.value - 1.0).abs() < 0.01);
//! ```

mod accumulate;
mod analysis;
mod callbacks;
mod classify;
mod density;
mod error;
mod grid;
mod plot;
mod report;

pub use accumulate::{OverlapStats, RayBatch, RegionAccumulator, RegionStats};
pub use analysis::{AbortHandle, Analysis, AnalysisConfig, AnalysisState};
pub use callbacks::DiagnosticCallbacks;
pub use classify::{classify, ClassifyOptions, Event};
pub use density::{DensityEntry, DensityError, DensityTable};
pub use error::AnalysisError;
pub use grid::{build_grids, split_batches, GridMode, RayGrid};
pub use plot::PlotWriter;
pub use report::{Outcome, OverlapReport, PassSummary, QuantityRange, RegionReport, Report};
