//! Error types for HippoMaps

use thiserror::Error;

/// Main error type for HippoMaps operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Geometry mismatch: surface has {expected} vertices, field has {actual}")]
    GeometryMismatch { expected: usize, actual: usize },

    #[error("Unsupported metric: {0}")]
    UnsupportedMetric(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Unknown tessellation: label={label}, density={density}")]
    UnknownTessellation { label: String, density: String },

    #[error("Index out of bounds: ({row}, {col}) in grid of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Statistic is undefined: {0}")]
    UndefinedStatistic(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Format(e.to_string())
    }
}

/// Result type alias for HippoMaps operations
pub type Result<T> = std::result::Result<T, Error>;
