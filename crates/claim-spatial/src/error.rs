//! Error types for spatial configuration.

/// Errors that can occur while configuring the spatial grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// The grid cell size must be positive.
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(i32),
}
