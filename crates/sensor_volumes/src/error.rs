//! Error types for sensor volume operations

use thiserror::Error;

use crate::render::BackendError;

/// Errors raised by primitives, scenes and visualizers
///
/// All variants are caller errors surfaced at the violating call. Angular span
/// clamping is not reported here: it is part of the shape contract.
#[derive(Error, Debug)]
pub enum SensorError {
    /// A mandatory constructor argument was not supplied
    #[error("{0} is required")]
    MissingArgument(&'static str),

    /// Primitive state is invalid at render time
    ///
    /// Raised for a negative radius or a missing surface material.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The object was used after `destroy()`
    #[error("Object was used after it was destroyed")]
    Destroyed,

    /// The rendering backend failed to create a resource
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type for sensor volume operations
pub type SensorResult<T> = Result<T, SensorError>;
