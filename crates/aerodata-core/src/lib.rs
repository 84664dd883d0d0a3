//! Core types for airborne and atmospheric science data processing.
//!
//! This crate provides the in-memory representation of a physical quantity
//! with units and metadata, the unit validation and dimensional algebra
//! behind it, the metadata model with convention compliance checking, and
//! the algorithm base that every named algorithm in the catalog builds on.

pub mod algorithm;
pub mod env;
pub mod error;
pub mod metadata;
pub mod quantity;
pub mod units;

pub use algorithm::{now_iso, Algorithm, AlgorithmCore, Input};
pub use error::{CoreError, CoreResult};
pub use metadata::{
    AlgorithmMetadata, AttrValue, Convention, FileMetadata, Metadata, ParentMetadata,
    VariableMetadata,
};
pub use quantity::{Quantity, QuantityValue};
pub use units::{validate, validate_with_origin, TempScale, UnitExpr};
