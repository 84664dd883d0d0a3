//! Common file-access types shared by every adapter.

use std::path::Path;
use std::str::FromStr;

use aerodata_core::metadata::{AttrValue, Metadata};
use ndarray::ArrayD;

use crate::error::{FileError, FileResult};

/// File open permissions: `r` read, `r+` read/write, `a` append, `w`
/// write (truncates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Perms {
    #[default]
    Read,
    ReadWrite,
    Append,
    Write,
}

impl Perms {
    pub fn as_str(&self) -> &'static str {
        match self {
            Perms::Read => "r",
            Perms::ReadWrite => "r+",
            Perms::Append => "a",
            Perms::Write => "w",
        }
    }

    /// Whether the handle may mutate the file.
    pub fn writable(&self) -> bool {
        !matches!(self, Perms::Read)
    }
}

impl FromStr for Perms {
    type Err = FileError;

    fn from_str(s: &str) -> FileResult<Perms> {
        match s {
            "r" => Ok(Perms::Read),
            "r+" => Ok(Perms::ReadWrite),
            "a" => Ok(Perms::Append),
            "w" => Ok(Perms::Write),
            other => Err(FileError::Format(format!(
                "unknown file permissions '{}'",
                other
            ))),
        }
    }
}

/// Options for a variable read.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Half-open `(start, end)` range per dimension; `None` reads all.
    pub range: Option<Vec<(usize, usize)>>,
    /// Replace the variable's fill value (`_FillValue`, falling back to
    /// `missing_value`) with NaN.
    pub replace_fill: bool,
}

impl ReadOptions {
    pub fn all() -> Self {
        ReadOptions::default()
    }

    pub fn with_range(range: Vec<(usize, usize)>) -> Self {
        ReadOptions {
            range: Some(range),
            ..ReadOptions::default()
        }
    }

    pub fn replacing_fill() -> Self {
        ReadOptions {
            replace_fill: true,
            ..ReadOptions::default()
        }
    }
}

/// The uniform adapter surface: every container format exposes attribute
/// CRUD, dimension and variable listings and plain numeric reads through
/// this trait; format-specific writes, group handling and conversions are
/// inherent methods of each adapter.
pub trait Container {
    /// Path of the currently open file.
    fn filename(&self) -> Option<&Path>;

    /// Permissions the file was opened with.
    fn perms(&self) -> Perms;

    /// Release the underlying handle.
    fn close(&mut self);

    /// Attributes of the file (no target) or of a variable/group.
    fn get_attribute_list(&self, target: Option<&str>) -> FileResult<Metadata>;

    /// Single attribute lookup.
    fn get_attribute_value(&self, name: &str, target: Option<&str>) -> FileResult<AttrValue> {
        self.get_attribute_list(target)?
            .get(name)
            .cloned()
            .ok_or_else(|| FileError::not_found("attribute", name))
    }

    /// Create or overwrite an attribute.
    fn add_attribute(&mut self, name: &str, value: &AttrValue, target: Option<&str>)
        -> FileResult<()>;

    /// Remove an attribute, where the format supports it.
    fn delete_attribute(&mut self, name: &str, target: Option<&str>) -> FileResult<()>;

    /// Ordered dimension name/length pairs of the file or of a variable.
    fn get_dimension_list(&self, target: Option<&str>) -> FileResult<Vec<(String, usize)>>;

    /// Variable names at the root level.
    fn get_variable_list(&self) -> FileResult<Vec<String>>;

    /// Read a variable as a plain numeric array.
    fn read_variable(&self, name: &str, opts: &ReadOptions) -> FileResult<ArrayD<f64>>;
}

/// Slice an array by per-axis half-open ranges (used by adapters that read
/// whole variables and subset in memory).
pub(crate) fn slice_range(data: ArrayD<f64>, range: &[(usize, usize)]) -> FileResult<ArrayD<f64>> {
    if range.len() != data.ndim() {
        return Err(FileError::Format(format!(
            "{} ranges given for {}-dimensional variable",
            range.len(),
            data.ndim()
        )));
    }
    let mut view = data.view();
    for (axis, &(start, end)) in range.iter().enumerate() {
        let len = data.shape()[axis];
        if start > end || end > len {
            return Err(FileError::Format(format!(
                "range {}..{} out of bounds for axis {} of length {}",
                start, end, axis, len
            )));
        }
        view.slice_axis_inplace(ndarray::Axis(axis), ndarray::Slice::from(start..end));
    }
    Ok(view.to_owned())
}

/// Replace fill-valued elements with NaN.
pub(crate) fn fill_to_nan(mut data: ArrayD<f64>, fill: f64) -> ArrayD<f64> {
    data.mapv_inplace(|v| if v == fill { f64::NAN } else { v });
    data
}

/// Build a [`Quantity`] from raw data and file attributes, parented to the
/// file's global metadata. Units that fail validation are kept verbatim in
/// the metadata while the quantity itself falls back to unitless, matching
/// the tolerant read behaviour expected from instrument files.
pub(crate) fn hydrate_quantity(
    value: ArrayD<f64>,
    attrs: Metadata,
    parent: Option<aerodata_core::FileMetadata>,
) -> FileResult<aerodata_core::Quantity> {
    use aerodata_core::{ParentMetadata, Quantity, VariableMetadata};

    let mut metadata =
        VariableMetadata::new(attrs.iter().map(|(k, v)| (k.to_string(), v.clone())));
    if let Some(parent) = parent {
        metadata.set_parent(ParentMetadata::File(parent));
    }

    let declared = metadata.get_str("units").unwrap_or("").to_string();
    if aerodata_core::validate(&declared).is_ok() {
        Ok(Quantity::with_units_and_metadata(value, &declared, metadata)?)
    } else {
        let mut q = Quantity::with_units_and_metadata(value, "", metadata)?;
        q.metadata.insert("units", declared);
        Ok(q)
    }
}

/// Resolve the on-disk name for a Quantity write: the explicit argument,
/// else the metadata's `name`/`cdf_name`, else a non-empty
/// `standard_name`/`long_name`.
pub(crate) fn resolve_name(
    q: &aerodata_core::Quantity,
    explicit: Option<&str>,
) -> FileResult<String> {
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }
    for key in ["name", "cdf_name", "standard_name", "long_name"] {
        if let Some(name) = q.metadata.get_str(key) {
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }
    }
    Err(FileError::Core(aerodata_core::CoreError::Metadata(
        "cannot write a Quantity without a resolvable name".to_string(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_perms_parse() {
        assert_eq!("r".parse::<Perms>().unwrap(), Perms::Read);
        assert_eq!("r+".parse::<Perms>().unwrap(), Perms::ReadWrite);
        assert_eq!("a".parse::<Perms>().unwrap(), Perms::Append);
        assert_eq!("w".parse::<Perms>().unwrap(), Perms::Write);
        assert!("x".parse::<Perms>().is_err());
    }

    #[test]
    fn test_slice_range() {
        let data = ArrayD::from_shape_vec(IxDyn(&[4]), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let out = slice_range(data, &[(1, 3)]).unwrap();
        assert_eq!(out.as_slice().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_fill_to_nan() {
        let data = ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0, -999.0, 2.0]).unwrap();
        let out = fill_to_nan(data, -999.0);
        assert!(out[[1]].is_nan());
        assert_eq!(out[[0]], 1.0);
    }
}
