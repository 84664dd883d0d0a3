//! Metadata storage and convention compliance checking.
//!
//! Three kinds of attribute dictionaries move through the toolkit: file
//! globals, per-variable attributes and algorithm descriptions. All are
//! insertion-ordered mappings from attribute name to a scalar or list
//! value, and all can be checked against the named metadata vocabularies
//! (CF, RAF, IWGADTS, EUFAR, NASA Ames).

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A single attribute value: scalar or list, string or numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Strs(Vec<String>),
}

impl AttrValue {
    /// Borrow the string content when the value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of a scalar value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{}", s),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Ints(v) => {
                let parts: Vec<String> = v.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
            AttrValue::Floats(v) => {
                let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
            AttrValue::Strs(v) => write!(f, "{}", v.join(", ")),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<i32> for AttrValue {
    fn from(i: i32) -> Self {
        AttrValue::Int(i as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Floats(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Ints(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::Strs(v)
    }
}

impl From<&[&str]> for AttrValue {
    fn from(v: &[&str]) -> Self {
        AttrValue::Strs(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Metadata vocabularies recognised by the compliance checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    Cf,
    Raf,
    Iwgadts,
    Eufar,
    NasaAmes,
}

impl Convention {
    /// Match a convention by substring, so `"CF-1.6"` resolves to CF and
    /// `"NASAAmes"` to NASA Ames.
    pub fn from_name(name: &str) -> Option<Convention> {
        if name.contains("CF") {
            Some(Convention::Cf)
        } else if name.contains("RAF") {
            Some(Convention::Raf)
        } else if name.contains("IWGADTS") {
            Some(Convention::Iwgadts)
        } else if name.contains("EUFAR") {
            Some(Convention::Eufar)
        } else if name.contains("NASA") {
            Some(Convention::NasaAmes)
        } else {
            None
        }
    }

    /// File-global attributes the convention requires.
    fn required_global(self) -> &'static [&'static str] {
        match self {
            Convention::Cf => &[
                "title",
                "source",
                "institution",
                "project",
                "date_created",
                "geospatial_lat_min",
                "geospatial_lat_max",
                "geospatial_lon_min",
                "geospatial_lon_max",
                "geospatial_vertical_min",
                "geospatial_vertical_max",
                "time_coverage_start",
                "time_coverage_end",
                "history",
                "references",
                "comment",
            ],
            Convention::Raf => &[
                "institution",
                "Address",
                "Phone",
                "Categories",
                "geospatial_lat_min",
                "geospatial_lat_max",
                "geospatial_lon_min",
                "geospatial_lon_max",
                "geospatial_vertical_min",
                "geospatial_vertical_max",
                "geospatial_vertical_positive",
                "geospatial_vertical_units",
                "time_coverage_start",
                "time_coverage_end",
                "TimeInterval",
                "DateProcessed",
                "date_created",
                "FlightDate",
                "FlightNumber",
                "DataQuality",
                "creator_url",
                "ConventionsURL",
                "ConventionsVersion",
                "Metadata_Conventions",
                "Standard_name_vocabulary",
                "ProcessorRevision",
                "ProcessorURL",
                "ProjectName",
                "Platform",
                "ProjectNumber",
                "InterpolationMethod",
                "latitude_coordinate",
                "longitude_coordinate",
                "zaxis_coordinate",
                "time_coordinate",
                "wind_field",
                "landmarks",
            ],
            Convention::Iwgadts => &["title", "data_quality", "institution", "source", "project"],
            Convention::Eufar => &[
                "title",
                "references",
                "geospatial_lat_min",
                "geospatial_lat_max",
                "geospatial_lon_min",
                "geospatial_lon_max",
                "geospatial_vertical_min",
                "geospatial_vertical_max",
                "time_coverage_start",
                "time_coverage_end",
                "time_duration",
                "date_created",
                "history",
                "institution",
                "source",
                "comment",
                "project",
            ],
            Convention::NasaAmes => &["DATE", "RDATE", "ONAME", "MNAME", "COMMENTS"],
        }
    }

    /// Per-variable attributes the convention requires.
    fn required_variable(self) -> &'static [&'static str] {
        match self {
            Convention::Cf => &[
                "_FillValue",
                "valid_min",
                "valid_max",
                "valid_range",
                "scale_factor",
                "add_offset",
                "units",
                "long_name",
                "standard_name",
                "ancillary_variables",
                "flag_values",
                "flag_masks",
                "flag_meanings",
            ],
            Convention::Raf => &[
                "_FillValue",
                "units",
                "long_name",
                "standard_name",
                "valid_range",
                "SampledRate",
                "CalibrationCoefficients",
                "Category",
                "Dependencies",
            ],
            Convention::Iwgadts => &[
                "missing_value",
                "valid_range",
                "units",
                "long_name",
                "standard_name",
                "source",
            ],
            Convention::Eufar => &[
                "_FillValue",
                "valid_min",
                "valid_max",
                "valid_range",
                "units",
                "long_name",
                "standard_name",
                "ancillary_variables",
                "flag_values",
                "flag_masks",
                "flag_meanings",
                "SampledRate",
                "CalibrationCoefficients",
                "Category",
                "InstrumentCoordinates",
                "InstrumentLocation",
                "Dependencies",
                "Processor",
                "Comments",
            ],
            Convention::NasaAmes => &["AMISS", "ASCAL", "ANAME", "SNAME"],
        }
    }
}

/// Insertion-ordered attribute mapping with declared conventions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    items: Vec<(String, AttrValue)>,
    conventions: Option<Vec<String>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of `(name, value)` pairs, keeping their order.
    pub fn from_items<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        let mut md = Metadata::new();
        for (k, v) in items {
            md.insert(k, v);
        }
        md
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut AttrValue> {
        self.items
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// String content of an attribute, when present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_str)
    }

    /// Insert or replace, preserving the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        let value = value.into();
        match self.items.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.items.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        let idx = self.items.iter().position(|(k, _)| k == key)?;
        Some(self.items.remove(idx).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut AttrValue)> {
        self.items.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Merge attribute items into this instance; the incoming value wins on
    /// key collision.
    pub fn add_items<K, V>(&mut self, items: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        for (k, v) in items {
            self.insert(k, v);
        }
    }

    /// Set the declared conventions of this metadata.
    pub fn set_conventions(&mut self, conventions: Vec<String>) {
        self.conventions = Some(conventions);
    }

    pub fn conventions(&self) -> Option<&[String]> {
        self.conventions.as_deref()
    }

    fn resolve_conventions(&self, requested: Option<&[&str]>) -> CoreResult<Vec<Convention>> {
        let names: Vec<String> = match requested {
            Some(names) => names.iter().map(|s| s.to_string()).collect(),
            None => match &self.conventions {
                Some(c) if !c.is_empty() => c.clone(),
                _ => match self.get_str("Conventions") {
                    Some(c) => c.split(',').map(|s| s.trim().to_string()).collect(),
                    None => {
                        return Err(CoreError::Metadata(
                            "no convention declared; specify one for the compliance check"
                                .to_string(),
                        ))
                    }
                },
            },
        };

        names
            .iter()
            .map(|name| {
                Convention::from_name(name).ok_or_else(|| {
                    CoreError::Metadata(format!("unknown metadata convention '{}'", name))
                })
            })
            .collect()
    }

    fn missing_from(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.contains_key(name))
            .map(|name| name.to_string())
            .collect()
    }

    fn compliance_check_with(
        &self,
        requested: Option<&[&str]>,
        table: fn(Convention) -> &'static [&'static str],
    ) -> CoreResult<Vec<String>> {
        let mut missing = Vec::new();
        for convention in self.resolve_conventions(requested)? {
            for name in self.missing_from(table(convention)) {
                if !missing.contains(&name) {
                    missing.push(name);
                }
            }
        }
        Ok(missing)
    }
}

/// File-global metadata. Conventions are auto-detected from the
/// `Conventions` attribute unless given explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMetadata {
    base: Metadata,
    filename: Option<String>,
}

impl FileMetadata {
    pub fn new<K, V>(items: impl IntoIterator<Item = (K, V)>, filename: Option<&str>) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        let mut base = Metadata::from_items(items);
        if let Some(declared) = base.get_str("Conventions") {
            let list: Vec<String> = declared.split(',').map(|s| s.trim().to_string()).collect();
            base.set_conventions(list);
        }
        FileMetadata {
            base,
            filename: filename.map(|s| s.to_string()),
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, filename: &str) {
        self.filename = Some(filename.to_string());
    }

    /// Names of required file-global attributes absent from this metadata,
    /// for the requested conventions (or the declared ones).
    pub fn compliance_check(&self, conventions: Option<&[&str]>) -> CoreResult<Vec<String>> {
        self.base
            .compliance_check_with(conventions, Convention::required_global)
    }
}

impl Deref for FileMetadata {
    type Target = Metadata;

    fn deref(&self) -> &Metadata {
        &self.base
    }
}

impl DerefMut for FileMetadata {
    fn deref_mut(&mut self) -> &mut Metadata {
        &mut self.base
    }
}

/// Parent of a variable's metadata: the file it was read from or the
/// algorithm that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum ParentMetadata {
    File(FileMetadata),
    Algorithm(AlgorithmMetadata),
}

impl ParentMetadata {
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        match self {
            ParentMetadata::File(f) => f.get(key),
            ParentMetadata::Algorithm(a) => a.get(key),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_str)
    }

    fn conventions(&self) -> Option<&[String]> {
        match self {
            ParentMetadata::File(f) => f.conventions(),
            ParentMetadata::Algorithm(a) => a.conventions(),
        }
    }
}

/// Per-variable metadata with an optional parent back-reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableMetadata {
    base: Metadata,
    parent: Option<Box<ParentMetadata>>,
}

impl VariableMetadata {
    pub fn new<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        VariableMetadata {
            base: Metadata::from_items(items),
            parent: None,
        }
    }

    pub fn with_parent<K, V>(
        items: impl IntoIterator<Item = (K, V)>,
        parent: ParentMetadata,
    ) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        let mut md = VariableMetadata::new(items);
        md.set_parent(parent);
        md
    }

    pub fn set_parent(&mut self, parent: ParentMetadata) {
        self.parent = Some(Box::new(parent));
    }

    pub fn parent(&self) -> Option<&ParentMetadata> {
        self.parent.as_deref()
    }

    /// Names of required variable attributes absent from this metadata.
    /// When no conventions are passed, the parent's declared conventions
    /// are inherited.
    pub fn compliance_check(&self, conventions: Option<&[&str]>) -> CoreResult<Vec<String>> {
        if conventions.is_none() && self.base.conventions().is_none() {
            if let Some(inherited) = self.parent().and_then(|p| p.conventions()) {
                let names: Vec<&str> = inherited.iter().map(|s| s.as_str()).collect();
                return self
                    .base
                    .compliance_check_with(Some(&names), Convention::required_variable);
            }
        }
        self.base
            .compliance_check_with(conventions, Convention::required_variable)
    }
}

impl Deref for VariableMetadata {
    type Target = Metadata;

    fn deref(&self) -> &Metadata {
        &self.base
    }
}

impl DerefMut for VariableMetadata {
    fn deref_mut(&mut self) -> &mut Metadata {
        &mut self.base
    }
}

/// Metadata describing an algorithm's public surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlgorithmMetadata {
    base: Metadata,
}

/// Keys every algorithm metadata must carry.
pub const MANDATORY_ALGORITHM_KEYS: &[&str] = &[
    "Inputs",
    "InputUnits",
    "InputTypes",
    "Outputs",
    "Processor",
    "ProcessorDate",
    "ProcessorVersion",
    "DateProcessed",
];

impl AlgorithmMetadata {
    pub fn new<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        let mut base = Metadata::from_items(items);

        // Strip version-control marker noise left by keyword expansion,
        // e.g. `$Date:: 2012-07-06 17:42#$` or `$Revision:: 146 $`.
        for (key, markers) in [
            ("ProcessorDate", &["$", "#", "Date::"][..]),
            ("ProcessorVersion", &["$", "Revision::"][..]),
        ] {
            if let Some(AttrValue::Str(s)) = base.get(key) {
                let mut cleaned = s.clone();
                for marker in markers {
                    cleaned = cleaned.replace(marker, "");
                }
                base.insert(key, cleaned.trim().to_string());
            }
        }

        base.set_conventions(vec!["Algorithm".to_string()]);
        AlgorithmMetadata { base }
    }

    /// Check that every mandatory algorithm key is present and that at
    /// least one output is declared.
    pub fn validate(&self) -> CoreResult<()> {
        for key in MANDATORY_ALGORITHM_KEYS {
            if !self.base.contains_key(key) {
                return Err(CoreError::Metadata(format!(
                    "algorithm metadata is missing mandatory key '{}'",
                    key
                )));
            }
        }
        let outputs = match self.base.get("Outputs") {
            Some(AttrValue::Strs(v)) => v.len(),
            Some(AttrValue::Str(_)) => 1,
            _ => 0,
        };
        if outputs == 0 {
            return Err(CoreError::Metadata(
                "algorithm declares zero outputs".to_string(),
            ));
        }
        Ok(())
    }
}

impl Deref for AlgorithmMetadata {
    type Target = Metadata;

    fn deref(&self) -> &Metadata {
        &self.base
    }
}

impl DerefMut for AlgorithmMetadata {
    fn deref_mut(&mut self) -> &mut Metadata {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let mut md = Metadata::new();
        md.insert("units", "m");
        md.insert("long_name", "altitude");
        md.insert("units", "km");
        let keys: Vec<&str> = md.keys().collect();
        assert_eq!(keys, vec!["units", "long_name"]);
        assert_eq!(md.get_str("units"), Some("km"));
    }

    #[test]
    fn test_add_items_latter_wins() {
        let mut md = Metadata::from_items([("a", AttrValue::from(1i64)), ("b", 2i64.into())]);
        md.add_items([("b", AttrValue::from(3i64)), ("c", 4i64.into())]);
        assert_eq!(md.get("b"), Some(&AttrValue::Int(3)));
        assert_eq!(md.len(), 3);
    }

    #[test]
    fn test_cf_compliance_scenario() {
        let md = FileMetadata::new(
            [
                ("Conventions", AttrValue::from("CF")),
                ("title", "a test".into()),
                ("source", "computer".into()),
                ("institution", "EUFAR".into()),
                ("project", "test".into()),
                ("date_created", "20170101".into()),
                ("geospatial_vertical_min", AttrValue::Float(0.0)),
                ("geospatial_vertical_max", AttrValue::Float(1000.0)),
                ("time_coverage_start", "0".into()),
                ("time_coverage_end", "5".into()),
                ("history", "created".into()),
                ("references", "none".into()),
                ("comment", "no comment".into()),
            ],
            None,
        );
        let missing = md.compliance_check(Some(&["CF"])).unwrap();
        assert_eq!(
            missing,
            vec![
                "geospatial_lat_min",
                "geospatial_lat_max",
                "geospatial_lon_min",
                "geospatial_lon_max",
            ]
        );
    }

    #[test]
    fn test_compliance_unknown_convention() {
        let md = FileMetadata::new([("title", AttrValue::from("t"))], None);
        assert!(md.compliance_check(Some(&["XYZZY"])).is_err());
    }

    #[test]
    fn test_compliance_requires_convention() {
        let md = FileMetadata::new([("title", AttrValue::from("t"))], None);
        assert!(md.compliance_check(None).is_err());
    }

    #[test]
    fn test_variable_inherits_parent_conventions() {
        let parent = FileMetadata::new([("Conventions", AttrValue::from("CF"))], None);
        let var = VariableMetadata::with_parent(
            [("units", AttrValue::from("m"))],
            ParentMetadata::File(parent),
        );
        let missing = var.compliance_check(None).unwrap();
        assert!(missing.contains(&"long_name".to_string()));
        assert!(!missing.contains(&"units".to_string()));
    }

    #[test]
    fn test_algorithm_metadata_strips_vcs_noise() {
        let md = AlgorithmMetadata::new([
            ("ProcessorDate", AttrValue::from("$Date:: 2012-07-06 17:42#$")),
            ("ProcessorVersion", "$Revision:: 146       $".into()),
        ]);
        assert_eq!(md.get_str("ProcessorDate"), Some("2012-07-06 17:42"));
        assert_eq!(md.get_str("ProcessorVersion"), Some("146"));
    }

    #[test]
    fn test_algorithm_metadata_validation() {
        let md = AlgorithmMetadata::new([
            ("Inputs", AttrValue::Strs(vec!["x".into()])),
            ("InputUnits", AttrValue::Strs(vec!["m".into()])),
            ("InputTypes", AttrValue::Strs(vec!["vector".into()])),
            ("Outputs", AttrValue::Strs(vec![])),
            ("Processor", "Test".into()),
            ("ProcessorDate", "2026-01-01".into()),
            ("ProcessorVersion", "1.0".into()),
            ("DateProcessed", "".into()),
        ]);
        assert!(matches!(md.validate(), Err(CoreError::Metadata(_))));
    }
}
