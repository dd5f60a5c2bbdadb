//! Error types for the analysis engine.

use crate::density::DensityError;
use thiserror::Error;

/// Errors that can occur while configuring or running an analysis.
///
/// Statistical warnings (spacing floor reached, under-sampled regions)
/// are not errors; they are reported as flags on the
/// [`Report`](crate::Report).
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Grid spacing must be positive.
    #[error("grid spacing must be positive, got {0}")]
    InvalidSpacing(f64),

    /// The refinement floor cannot exceed the initial spacing.
    #[error("spacing limit {limit} exceeds initial spacing {spacing}")]
    SpacingLimitExceedsSpacing {
        /// Configured initial spacing.
        spacing: f64,
        /// Configured spacing floor.
        limit: f64,
    },

    /// At least one worker is required.
    #[error("worker count must be at least 1")]
    ZeroCpus,

    /// Every convergence tolerance is unset.
    #[error("no quantity has a convergence tolerance set")]
    NoTrackedQuantities,

    /// The model has no regions or an empty bounding box.
    #[error("model contains no sampleable geometry")]
    EmptyModel,

    /// The model's bounding box has zero size along every axis.
    #[error("model bounding box is degenerate")]
    DegenerateModel,

    /// The worker pool could not be constructed.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),

    /// Density table could not be loaded.
    #[error(transparent)]
    Density(#[from] DensityError),

    /// Plot output could not be written.
    #[error("plot output failed: {0}")]
    Plot(#[from] std::io::Error),

    /// The run was aborted between passes.
    #[error("analysis aborted")]
    Aborted,
}
