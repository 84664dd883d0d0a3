//! File adapters and cross-format converters for airborne science data.
//!
//! Four container formats share one conceptual surface: NetCDF4, HDF5,
//! NASA Ames FFI 1001 and generic delimited text. Each scientific format
//! has a plain adapter returning raw arrays and a quantity-aware variant
//! hydrating [`aerodata_core::Quantity`] values with their metadata, and
//! each can be converted to the others through a format-neutral file
//! model (global attributes, dimensions, variables, groups) with the
//! `history` attribute recording every conversion.

pub mod convert;
pub mod error;
pub mod file;
pub mod hdf;
pub mod model;
pub mod nasa_ames;
pub mod netcdf;
pub mod text;

pub use convert::{model_to_na, na_to_model, write_model_hdf, write_model_netcdf};
pub use error::{FileError, FileResult};
pub use file::{Container, Perms, ReadOptions};
pub use hdf::{silence_hdf5_errors, AeroHdf, Hdf};
pub use model::{FileModel, Ftype, GroupModel, VariableModel};
pub use nasa_ames::{AeroNasaAmes, NaDict, NaSaveOptions, NasaAmes};
pub use netcdf::{AeroNetCdf, NetCdf};
pub use text::{CsvFile, SeekOrigin, TextFile};
