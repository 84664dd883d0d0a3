//! Error types for the file adapters and converters.

use thiserror::Error;

/// Result type alias using FileError.
pub type FileResult<T> = Result<T, FileError>;

/// Primary error type for file access and conversion.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid data format: {0}")]
    Format(String),

    #[error("No file open")]
    NoFileOpen,

    #[error("File is open read-only: {0}")]
    ReadOnly(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("HDF5 error: {0}")]
    Hdf(#[from] hdf5::Error),

    #[error(transparent)]
    Core(#[from] aerodata_core::CoreError),
}

impl FileError {
    /// Shorthand for a NotFound error naming the missing object.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> FileError {
        FileError::NotFound {
            kind,
            name: name.into(),
        }
    }
}
