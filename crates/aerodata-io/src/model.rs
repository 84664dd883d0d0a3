//! Format-neutral file model used by the cross-format converters.
//!
//! Every adapter can snapshot its open file into a [`FileModel`] (global
//! attributes, an ordered dimension list, variables and nested groups),
//! and every format has a writer for it. Conversion between any two
//! formats is a snapshot, a `history` note, and a write.

use aerodata_core::metadata::{AttrValue, Metadata};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use ndarray::ArrayD;

use crate::error::{FileError, FileResult};

/// On-disk data type tag for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ftype {
    #[default]
    Double,
    Float,
    Int,
    Short,
    Byte,
    Char,
}

impl Ftype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ftype::Double => "double",
            Ftype::Float => "float",
            Ftype::Int => "int",
            Ftype::Short => "short",
            Ftype::Byte => "byte",
            Ftype::Char => "char",
        }
    }

    /// Parse a type name; unknown names fall back to `double`, keeping the
    /// string-representation fallback of the conversion type tables.
    pub fn from_name(name: &str) -> Ftype {
        match name {
            "double" | "f8" | "float64" => Ftype::Double,
            "float" | "f4" | "float32" => Ftype::Float,
            "int" | "i4" | "int32" => Ftype::Int,
            "short" | "i2" | "int16" => Ftype::Short,
            "byte" | "i1" | "int8" => Ftype::Byte,
            "char" | "c" => Ftype::Char,
            _ => Ftype::Double,
        }
    }
}

impl std::str::FromStr for Ftype {
    type Err = FileError;

    fn from_str(s: &str) -> FileResult<Ftype> {
        match s {
            "double" => Ok(Ftype::Double),
            "float" => Ok(Ftype::Float),
            "int" => Ok(Ftype::Int),
            "short" => Ok(Ftype::Short),
            "byte" => Ok(Ftype::Byte),
            "char" => Ok(Ftype::Char),
            other => Err(FileError::Format(format!("unknown data type '{}'", other))),
        }
    }
}

/// A variable: name, on-disk type, dimension names, data and attributes.
#[derive(Debug, Clone)]
pub struct VariableModel {
    pub name: String,
    pub ftype: Ftype,
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
    pub attrs: Metadata,
}

/// A group: ordered dimensions, variables and nested groups.
#[derive(Debug, Clone, Default)]
pub struct GroupModel {
    pub name: String,
    pub dims: Vec<(String, usize)>,
    pub vars: Vec<VariableModel>,
    pub groups: Vec<GroupModel>,
}

impl GroupModel {
    pub fn named(name: &str) -> GroupModel {
        GroupModel {
            name: name.to_string(),
            ..GroupModel::default()
        }
    }

    pub fn variable(&self, name: &str) -> Option<&VariableModel> {
        self.vars.iter().find(|v| v.name == name)
    }
}

/// A whole file: global attributes plus the root group.
#[derive(Debug, Clone, Default)]
pub struct FileModel {
    pub attrs: Metadata,
    pub root: GroupModel,
}

impl FileModel {
    pub fn new() -> FileModel {
        FileModel::default()
    }

    /// Append a conversion note to the `history` attribute, creating it
    /// when absent.
    pub fn append_history(&mut self, format_name: &str) {
        let note = format!(
            "converted to {} by aerodata, {}",
            format_name,
            aerodata_core::now_iso()
        );
        match self.attrs.get_str("history") {
            Some(existing) if !existing.is_empty() => {
                let combined = format!("{}\n{}", existing, note);
                self.attrs.insert("history", combined);
            }
            _ => self.attrs.insert("history", note),
        }
    }

    pub fn has_groups(&self) -> bool {
        !self.root.groups.is_empty()
    }

    /// The single root dimension, when there is exactly one.
    pub fn sole_root_dimension(&self) -> Option<&(String, usize)> {
        match self.root.dims.as_slice() {
            [dim] => Some(dim),
            _ => None,
        }
    }
}

/// Parse the `<timestamp>` part of a `"<unit> since <timestamp>"` unit
/// string into year/month/day. Several timestamp spellings occur in the
/// wild; unparsable input yields `None`.
pub fn parse_origin_date(timestamp: &str) -> Option<(i32, u32, u32)> {
    let ts = timestamp.trim().trim_end_matches('Z').trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp.trim()) {
        let d = dt.with_timezone(&Utc).date_naive();
        return Some((d.year(), d.month(), d.day()));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y%m%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts, fmt) {
            let d = dt.date();
            return Some((d.year(), d.month(), d.day()));
        }
    }
    for fmt in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(ts, fmt) {
            return Some((d.year(), d.month(), d.day()));
        }
    }
    None
}

/// Convert an [`AttrValue`] to the scalar fill value it encodes, when it
/// does encode one.
pub fn attr_fill_value(value: &AttrValue) -> Option<f64> {
    match value {
        AttrValue::Float(f) => Some(*f),
        AttrValue::Int(i) => Some(*i as f64),
        AttrValue::Floats(v) if v.len() == 1 => Some(v[0]),
        AttrValue::Ints(v) if v.len() == 1 => Some(v[0] as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ftype_roundtrip() {
        for name in ["double", "float", "int", "short", "byte", "char"] {
            let t: Ftype = name.parse().unwrap();
            assert_eq!(t.as_str(), name);
        }
        assert!("quux".parse::<Ftype>().is_err());
        assert_eq!(Ftype::from_name("quux"), Ftype::Double);
    }

    #[test]
    fn test_append_history() {
        let mut model = FileModel::new();
        model.append_history("NetCDF");
        let first = model.attrs.get_str("history").unwrap().to_string();
        assert!(first.starts_with("converted to NetCDF by aerodata"));

        model.append_history("HDF5");
        let second = model.attrs.get_str("history").unwrap();
        assert!(second.starts_with(&first));
        assert!(second.contains("converted to HDF5"));
    }

    #[test]
    fn test_parse_origin_date() {
        assert_eq!(parse_origin_date("2017-01-01 00:00:00Z"), Some((2017, 1, 1)));
        assert_eq!(parse_origin_date("20170101 00:00:00Z"), Some((2017, 1, 1)));
        assert_eq!(parse_origin_date("2017-01-01T12:30:00+00:00"), Some((2017, 1, 1)));
        assert_eq!(parse_origin_date("2017-01-01"), Some((2017, 1, 1)));
        assert_eq!(parse_origin_date("not a date"), None);
    }
}
