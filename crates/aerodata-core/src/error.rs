//! Error types for the aerodata core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Primary error type for quantity, metadata and algorithm operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown or invalid unit: '{0}'")]
    Unit(String),

    #[error("Incompatible units: '{from}' cannot be converted to '{to}'")]
    UnitMismatch { from: String, to: String },

    #[error("Unsupported conversion between temperature scales: '{from}' given, '{to}' expected")]
    TemperatureScale { from: String, to: String },

    #[error("Missing or invalid metadata: {0}")]
    Metadata(String),

    #[error("Algorithm not implemented")]
    AlgorithmNotImplemented,

    #[error("Algorithm produced {got} outputs but declares {expected}")]
    OutputCount { expected: usize, got: usize },

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
