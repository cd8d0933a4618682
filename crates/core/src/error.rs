//! Error types for wildhab

use thiserror::Error;

/// Main error type for wildhab operations
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter or configuration value cannot be honoured
    #[error("Invalid configuration: {name} = {value} ({reason})")]
    InvalidConfiguration {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Grids meant to be combined disagree in shape, transform or CRS
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Nothing valid to work with
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A collaborator handed over invalid or missing data
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl Error {
    /// Shorthand for an [`Error::InvalidConfiguration`]
    pub fn invalid_config(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidConfiguration {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a size disagreement between two grids
    pub fn size_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Error::ShapeMismatch(format!(
            "expected ({}, {}), got ({}, {})",
            expected.0, expected.1, actual.0, actual.1
        ))
    }
}

/// Result type alias for wildhab operations
pub type Result<T> = std::result::Result<T, Error>;
