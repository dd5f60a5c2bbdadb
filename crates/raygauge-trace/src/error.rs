//! Error types for scene construction and loading.

use thiserror::Error;

/// Errors raised while building or loading a scene.
#[derive(Error, Debug)]
pub enum TraceError {
    /// Scene contains no regions.
    #[error("scene contains no regions")]
    EmptyScene,

    /// Two regions share the same name.
    #[error("duplicate region name: {0}")]
    DuplicateRegion(String),

    /// A solid has a non-positive dimension.
    #[error("invalid solid in region {region}: {reason}")]
    InvalidSolid {
        /// Name of the offending region.
        region: String,
        /// What is wrong with the solid.
        reason: String,
    },

    /// Scene JSON could not be parsed.
    #[error("failed to parse scene: {0}")]
    Parse(#[from] serde_json::Error),

    /// Scene file could not be read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
