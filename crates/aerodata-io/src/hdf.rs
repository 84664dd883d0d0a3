//! HDF5 adapter over the `hdf5` crate.
//!
//! Dimensions use explicit dimension scales: a dimension is a 1-D dataset
//! marked with `CLASS = "DIMENSION_SCALE"` and labelled through the
//! `NAME` attribute; variables record the scales they follow in a
//! `DIMENSION_LABELS` attribute, and dimension listings scan those labels
//! rather than dataset names. A variable that references a scale absent
//! from its group fails the write. These bookkeeping attributes are
//! reserved and filtered out when converting to other formats.

use std::path::{Path, PathBuf};
use std::sync::Once;

use aerodata_core::metadata::{AttrValue, FileMetadata, Metadata};
use aerodata_core::Quantity;
use hdf5::types::{FloatSize, IntSize, TypeDescriptor, VarLenAscii, VarLenUnicode};
use ndarray::{ArrayD, IxDyn};
use tracing::{debug, error};

use crate::error::{FileError, FileResult};
use crate::file::{fill_to_nan, slice_range, Container, Perms, ReadOptions};
use crate::model::{FileModel, Ftype, GroupModel, VariableModel};

/// Attribute marking a dataset as a dimension scale.
pub const CLASS_ATTR: &str = "CLASS";
/// Scale label attribute on a dimension dataset.
pub const NAME_ATTR: &str = "NAME";
/// Per-variable list of the dimension labels it follows.
pub const DIMENSION_LABELS_ATTR: &str = "DIMENSION_LABELS";
const DIMENSION_SCALE: &str = "DIMENSION_SCALE";

/// Attributes used for dimension-scale bookkeeping, filtered on export.
pub const RESERVED_ATTRS: &[&str] = &[
    CLASS_ATTR,
    NAME_ATTR,
    DIMENSION_LABELS_ATTR,
    "DIMENSION_LIST",
    "REFERENCE_LIST",
];

/// Silence HDF5's automatic error printing to stderr.
///
/// The C library prints verbose error stacks even when errors are handled
/// gracefully (e.g. probing for an optional attribute). Safe to call any
/// number of times; call before the first HDF5 operation.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 with null handlers is the documented way to
        // disable automatic error reporting.
        unsafe {
            hdf5_sys::h5e::H5Eset_auto2(hdf5_sys::h5e::H5E_DEFAULT, None, std::ptr::null_mut());
        }
    });
}

/// Read one attribute generically, via its type descriptor.
fn read_attr(loc: &hdf5::Location, name: &str) -> FileResult<AttrValue> {
    let attr = loc
        .attr(name)
        .map_err(|_| FileError::not_found("attribute", name))?;
    let desc = attr.dtype()?.to_descriptor()?;
    let scalar = attr.shape().is_empty();

    let value = match desc {
        TypeDescriptor::Integer(size) => {
            if scalar {
                let v = match size {
                    IntSize::U1 => attr.read_scalar::<i8>()? as i64,
                    IntSize::U2 => attr.read_scalar::<i16>()? as i64,
                    IntSize::U4 => attr.read_scalar::<i32>()? as i64,
                    IntSize::U8 => attr.read_scalar::<i64>()?,
                };
                AttrValue::Int(v)
            } else {
                let v: Vec<i64> = match size {
                    IntSize::U1 => attr.read_raw::<i8>()?.into_iter().map(|x| x as i64).collect(),
                    IntSize::U2 => attr.read_raw::<i16>()?.into_iter().map(|x| x as i64).collect(),
                    IntSize::U4 => attr.read_raw::<i32>()?.into_iter().map(|x| x as i64).collect(),
                    IntSize::U8 => attr.read_raw::<i64>()?,
                };
                AttrValue::Ints(v)
            }
        }
        TypeDescriptor::Unsigned(size) => {
            if scalar {
                let v = match size {
                    IntSize::U1 => attr.read_scalar::<u8>()? as i64,
                    IntSize::U2 => attr.read_scalar::<u16>()? as i64,
                    IntSize::U4 => attr.read_scalar::<u32>()? as i64,
                    IntSize::U8 => attr.read_scalar::<u64>()? as i64,
                };
                AttrValue::Int(v)
            } else {
                let v: Vec<i64> = match size {
                    IntSize::U1 => attr.read_raw::<u8>()?.into_iter().map(|x| x as i64).collect(),
                    IntSize::U2 => attr.read_raw::<u16>()?.into_iter().map(|x| x as i64).collect(),
                    IntSize::U4 => attr.read_raw::<u32>()?.into_iter().map(|x| x as i64).collect(),
                    IntSize::U8 => attr.read_raw::<u64>()?.into_iter().map(|x| x as i64).collect(),
                };
                AttrValue::Ints(v)
            }
        }
        TypeDescriptor::Float(size) => {
            if scalar {
                let v = match size {
                    FloatSize::U4 => attr.read_scalar::<f32>()? as f64,
                    FloatSize::U8 => attr.read_scalar::<f64>()?,
                };
                AttrValue::Float(v)
            } else {
                let v: Vec<f64> = match size {
                    FloatSize::U4 => attr.read_raw::<f32>()?.into_iter().map(|x| x as f64).collect(),
                    FloatSize::U8 => attr.read_raw::<f64>()?,
                };
                AttrValue::Floats(v)
            }
        }
        TypeDescriptor::Boolean => {
            if scalar {
                AttrValue::Int(attr.read_scalar::<bool>()? as i64)
            } else {
                AttrValue::Ints(
                    attr.read_raw::<bool>()?
                        .into_iter()
                        .map(|b| b as i64)
                        .collect(),
                )
            }
        }
        TypeDescriptor::VarLenAscii | TypeDescriptor::FixedAscii(_) => {
            if scalar {
                AttrValue::Str(attr.read_scalar::<VarLenAscii>()?.as_str().to_string())
            } else {
                AttrValue::Strs(
                    attr.read_raw::<VarLenAscii>()?
                        .into_iter()
                        .map(|s| s.as_str().to_string())
                        .collect(),
                )
            }
        }
        TypeDescriptor::VarLenUnicode | TypeDescriptor::FixedUnicode(_) => {
            if scalar {
                AttrValue::Str(attr.read_scalar::<VarLenUnicode>()?.as_str().to_string())
            } else {
                AttrValue::Strs(
                    attr.read_raw::<VarLenUnicode>()?
                        .into_iter()
                        .map(|s| s.as_str().to_string())
                        .collect(),
                )
            }
        }
        other => {
            return Err(FileError::Format(format!(
                "unsupported attribute type {:?} on '{}'",
                other, name
            )))
        }
    };
    Ok(value)
}

fn parse_unicode(s: &str) -> FileResult<VarLenUnicode> {
    s.parse::<VarLenUnicode>()
        .map_err(|e| FileError::Format(format!("invalid attribute string: {}", e)))
}

/// Create or replace one attribute.
fn write_attr(loc: &hdf5::Location, name: &str, value: &AttrValue) -> FileResult<()> {
    if loc.attr(name).is_ok() {
        delete_attr_raw(loc, name)?;
    }
    match value {
        AttrValue::Str(s) => {
            let v = parse_unicode(s)?;
            loc.new_attr::<VarLenUnicode>()
                .create(name)?
                .write_scalar(&v)?;
        }
        AttrValue::Int(i) => {
            loc.new_attr::<i64>().create(name)?.write_scalar(i)?;
        }
        AttrValue::Float(f) => {
            loc.new_attr::<f64>().create(name)?.write_scalar(f)?;
        }
        AttrValue::Ints(v) => {
            loc.new_attr::<i64>()
                .shape(v.len())
                .create(name)?
                .write(v.as_slice())?;
        }
        AttrValue::Floats(v) => {
            loc.new_attr::<f64>()
                .shape(v.len())
                .create(name)?
                .write(v.as_slice())?;
        }
        AttrValue::Strs(v) => {
            let converted: Vec<VarLenUnicode> =
                v.iter().map(|s| parse_unicode(s)).collect::<FileResult<_>>()?;
            loc.new_attr::<VarLenUnicode>()
                .shape(converted.len())
                .create(name)?
                .write(converted.as_slice())?;
        }
    }
    Ok(())
}

/// Remove an attribute through the low-level API (the high-level crate
/// does not expose deletion).
fn delete_attr_raw(loc: &hdf5::Location, name: &str) -> FileResult<()> {
    let cname = std::ffi::CString::new(name)
        .map_err(|_| FileError::Format(format!("invalid attribute name '{}'", name)))?;
    // SAFETY: the location id is valid for the lifetime of `loc` and the
    // name is a NUL-terminated C string.
    let status = unsafe { hdf5_sys::h5a::H5Adelete(loc.id(), cname.as_ptr()) };
    if status < 0 {
        return Err(FileError::not_found("attribute", name));
    }
    Ok(())
}

fn attr_names(loc: &hdf5::Location) -> FileResult<Vec<String>> {
    Ok(loc.attr_names()?)
}

/// Whether a dataset is marked as a dimension scale.
fn is_dimension_scale(ds: &hdf5::Dataset) -> bool {
    matches!(read_attr(ds, CLASS_ATTR), Ok(AttrValue::Str(s)) if s == DIMENSION_SCALE)
}

/// Dimension labels recorded on a variable.
fn dimension_labels(ds: &hdf5::Dataset) -> Vec<String> {
    match read_attr(ds, DIMENSION_LABELS_ATTR) {
        Ok(AttrValue::Strs(labels)) => labels,
        Ok(AttrValue::Str(label)) => vec![label],
        _ => Vec::new(),
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Adapter for generic HDF5 files.
#[derive(Default)]
pub struct Hdf {
    file: Option<hdf5::File>,
    filename: Option<PathBuf>,
    perms: Perms,
}

impl Hdf {
    pub fn new() -> Hdf {
        Hdf::default()
    }

    /// Open an HDF5 file with the given permissions.
    pub fn open(path: &Path, perms: Perms) -> FileResult<Hdf> {
        let mut file = Hdf::new();
        file.open_path(path, perms)?;
        Ok(file)
    }

    pub fn open_path(&mut self, path: &Path, perms: Perms) -> FileResult<()> {
        silence_hdf5_errors();
        self.close();
        let handle = match perms {
            Perms::Read => hdf5::File::open(path),
            Perms::ReadWrite => hdf5::File::open_rw(path),
            Perms::Append => hdf5::File::append(path),
            Perms::Write => hdf5::File::create(path),
        }
        .map_err(|e| {
            error!(file = %path.display(), "cannot open HDF5 file: {}", e);
            FileError::Hdf(e)
        })?;
        self.file = Some(handle);
        self.filename = Some(path.to_path_buf());
        self.perms = perms;
        debug!(file = %path.display(), perms = perms.as_str(), "HDF5 file open");
        Ok(())
    }

    fn file(&self) -> FileResult<&hdf5::File> {
        self.file.as_ref().ok_or(FileError::NoFileOpen)
    }

    fn require_writable(&self) -> FileResult<()> {
        if self.perms.writable() {
            Ok(())
        } else {
            Err(FileError::ReadOnly("HDF5 write".to_string()))
        }
    }

    fn with_location<R>(
        &self,
        target: Option<&str>,
        f: impl FnOnce(&hdf5::Location) -> FileResult<R>,
    ) -> FileResult<R> {
        let file = self.file()?;
        match target {
            None => f(file),
            Some(path) => {
                if let Ok(group) = file.group(path) {
                    f(&group)
                } else if let Ok(ds) = file.dataset(path) {
                    f(&ds)
                } else {
                    Err(FileError::not_found("object", path))
                }
            }
        }
    }

    /// Variable (dataset) names; `recursive` walks nested groups and
    /// `with_path` prefixes each name with its group path.
    pub fn get_variable_list_in(
        &self,
        group: Option<&str>,
        recursive: bool,
        with_path: bool,
    ) -> FileResult<Vec<String>> {
        let file = self.file()?;
        let root = match group {
            None => file.group("/")?,
            Some(path) => file
                .group(path)
                .map_err(|_| FileError::not_found("group", path))?,
        };
        let mut names = Vec::new();
        self.walk_variables(
            &root,
            group.unwrap_or("").trim_matches('/'),
            recursive,
            with_path,
            &mut names,
        )?;
        Ok(names)
    }

    fn walk_variables(
        &self,
        group: &hdf5::Group,
        prefix: &str,
        recursive: bool,
        with_path: bool,
        out: &mut Vec<String>,
    ) -> FileResult<()> {
        for name in group.member_names()? {
            if let Ok(child) = group.group(&name) {
                if recursive {
                    self.walk_variables(&child, &join_path(prefix, &name), recursive, with_path, out)?;
                }
            } else if group.dataset(&name).is_ok() {
                out.push(if with_path {
                    join_path(prefix, &name)
                } else {
                    name
                });
            }
        }
        Ok(())
    }

    /// Child group names, optionally path-prefixed.
    pub fn get_group_list(&self, group: Option<&str>, with_path: bool) -> FileResult<Vec<String>> {
        let file = self.file()?;
        let base = group.unwrap_or("").trim_matches('/');
        let root = match group {
            None => file.group("/")?,
            Some(path) => file
                .group(path)
                .map_err(|_| FileError::not_found("group", path))?,
        };
        let mut names = Vec::new();
        for name in root.member_names()? {
            if root.group(&name).is_ok() {
                names.push(if with_path {
                    join_path(base, &name)
                } else {
                    name
                });
            }
        }
        Ok(names)
    }

    /// Create a group (and intermediate groups) at the given path.
    pub fn add_group(&mut self, path: &str) -> FileResult<()> {
        self.require_writable()?;
        self.file()?.create_group(path)?;
        Ok(())
    }

    /// Create a dimension: a 1-D dataset marked and labelled as a scale.
    pub fn add_dim(&mut self, name: &str, data: &[f64], ftype: Ftype) -> FileResult<()> {
        self.require_writable()?;
        let file = self.file()?;
        let array = ArrayD::from_shape_vec(IxDyn(&[data.len()]), data.to_vec())
            .map_err(|e| FileError::Format(e.to_string()))?;
        let ds = create_dataset(file, name, &array, ftype)?;
        let label = name.rsplit('/').next().unwrap_or(name);
        write_attr(&ds, CLASS_ATTR, &AttrValue::Str(DIMENSION_SCALE.to_string()))?;
        write_attr(&ds, NAME_ATTR, &AttrValue::Str(label.to_string()))?;
        Ok(())
    }

    /// Create a variable attached to existing dimension scales. Every
    /// referenced scale must already exist in the variable's group.
    pub fn write_variable(
        &mut self,
        data: &ArrayD<f64>,
        name: &str,
        dims: &[&str],
        ftype: Ftype,
    ) -> FileResult<()> {
        self.require_writable()?;
        let file = self.file()?;
        let parent = match name.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        };
        for dim in dims {
            let dim_path = join_path(&parent, dim);
            let scale = file
                .dataset(&dim_path)
                .map_err(|_| FileError::not_found("dimension", dim_path.clone()))?;
            if !is_dimension_scale(&scale) {
                return Err(FileError::not_found("dimension", dim_path));
            }
        }

        let ds = create_dataset(file, name, data, ftype)?;
        write_attr(
            &ds,
            DIMENSION_LABELS_ATTR,
            &AttrValue::Strs(dims.iter().map(|d| d.to_string()).collect()),
        )?;
        debug!(variable = name, ftype = ftype.as_str(), "HDF5 variable written");
        Ok(())
    }

    pub fn delete_variable(&mut self, name: &str) -> FileResult<()> {
        self.require_writable()?;
        let file = self.file()?;
        if file.dataset(name).is_err() {
            return Err(FileError::not_found("variable", name));
        }
        file.unlink(name)?;
        Ok(())
    }

    pub fn delete_group(&mut self, path: &str) -> FileResult<()> {
        self.require_writable()?;
        let file = self.file()?;
        if file.group(path).is_err() {
            return Err(FileError::not_found("group", path));
        }
        file.unlink(path)?;
        Ok(())
    }

    /// Snapshot the open file into the format-neutral model. Dimension
    /// scales become model dimensions (and coordinate variables);
    /// bookkeeping attributes are filtered.
    pub fn snapshot(&self) -> FileResult<FileModel> {
        let file = self.file()?;
        let mut model = FileModel::new();
        for name in attr_names(file)? {
            model.attrs.insert(name.clone(), read_attr(file, &name)?);
        }
        let root = file.group("/")?;
        model.root = self.snapshot_group(&root, "")?;
        Ok(model)
    }

    fn snapshot_group(&self, group: &hdf5::Group, name: &str) -> FileResult<GroupModel> {
        let mut out = GroupModel::named(name);
        for member in group.member_names()? {
            if let Ok(child) = group.group(&member) {
                out.groups.push(self.snapshot_group(&child, &member)?);
                continue;
            }
            let Ok(ds) = group.dataset(&member) else {
                continue;
            };

            let shape = ds.shape();
            let data = ds
                .read_dyn::<f64>()
                .map_err(|e| FileError::Format(format!("cannot read '{}': {}", member, e)))?;
            let mut attrs = Metadata::new();
            for attr in attr_names(&ds)? {
                if RESERVED_ATTRS.contains(&attr.as_str()) {
                    continue;
                }
                attrs.insert(attr.clone(), read_attr(&ds, &attr)?);
            }

            let is_scale = is_dimension_scale(&ds);
            let dims = if is_scale {
                out.dims.push((member.clone(), shape.first().copied().unwrap_or(0)));
                vec![member.clone()]
            } else {
                dimension_labels(&ds)
            };

            out.vars.push(VariableModel {
                name: member.clone(),
                ftype: ftype_of_descriptor(&ds.dtype()?.to_descriptor()?),
                dims,
                data,
                attrs,
            });
        }
        Ok(out)
    }
}

/// Map an HDF5 type descriptor into the adapter's type table.
fn ftype_of_descriptor(desc: &TypeDescriptor) -> Ftype {
    match desc {
        TypeDescriptor::Integer(IntSize::U1) | TypeDescriptor::Unsigned(IntSize::U1) => Ftype::Byte,
        TypeDescriptor::Integer(IntSize::U2) | TypeDescriptor::Unsigned(IntSize::U2) => {
            Ftype::Short
        }
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => Ftype::Int,
        TypeDescriptor::Float(FloatSize::U4) => Ftype::Float,
        TypeDescriptor::Float(FloatSize::U8) => Ftype::Double,
        other => Ftype::from_name(&format!("{:?}", other)),
    }
}

/// Create a dataset of the requested on-disk type from f64 data.
fn create_dataset(
    file: &hdf5::File,
    name: &str,
    data: &ArrayD<f64>,
    ftype: Ftype,
) -> FileResult<hdf5::Dataset> {
    let ds = match ftype {
        Ftype::Double => file.new_dataset_builder().with_data(data).create(name)?,
        Ftype::Float => {
            let converted = data.mapv(|v| v as f32);
            file.new_dataset_builder().with_data(&converted).create(name)?
        }
        Ftype::Int => {
            let converted = data.mapv(|v| v as i32);
            file.new_dataset_builder().with_data(&converted).create(name)?
        }
        Ftype::Short => {
            let converted = data.mapv(|v| v as i16);
            file.new_dataset_builder().with_data(&converted).create(name)?
        }
        Ftype::Byte | Ftype::Char => {
            let converted = data.mapv(|v| v as i8);
            file.new_dataset_builder().with_data(&converted).create(name)?
        }
    };
    Ok(ds)
}

impl Container for Hdf {
    fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    fn perms(&self) -> Perms {
        self.perms
    }

    fn close(&mut self) {
        self.file = None;
        self.filename = None;
    }

    fn get_attribute_list(&self, target: Option<&str>) -> FileResult<Metadata> {
        self.with_location(target, |loc| {
            let mut attrs = Metadata::new();
            for name in attr_names(loc)? {
                attrs.insert(name.clone(), read_attr(loc, &name)?);
            }
            Ok(attrs)
        })
    }

    fn add_attribute(
        &mut self,
        name: &str,
        value: &AttrValue,
        target: Option<&str>,
    ) -> FileResult<()> {
        self.require_writable()?;
        self.with_location(target, |loc| write_attr(loc, name, value))
    }

    fn delete_attribute(&mut self, name: &str, target: Option<&str>) -> FileResult<()> {
        self.require_writable()?;
        self.with_location(target, |loc| delete_attr_raw(loc, name))
    }

    fn get_dimension_list(&self, target: Option<&str>) -> FileResult<Vec<(String, usize)>> {
        let file = self.file()?;
        match target {
            Some(name) => {
                let ds = file
                    .dataset(name)
                    .map_err(|_| FileError::not_found("variable", name))?;
                let labels = dimension_labels(&ds);
                let shape = ds.shape();
                Ok(labels.into_iter().zip(shape).collect())
            }
            None => {
                // Scan every variable's labels, keeping first-seen order.
                let mut dims: Vec<(String, usize)> = Vec::new();
                for name in self.get_variable_list_in(None, true, true)? {
                    let ds = file
                        .dataset(&name)
                        .map_err(|_| FileError::not_found("variable", name.clone()))?;
                    let shape = ds.shape();
                    for (label, len) in dimension_labels(&ds).into_iter().zip(shape) {
                        if !dims.iter().any(|(existing, _)| *existing == label) {
                            dims.push((label, len));
                        }
                    }
                }
                Ok(dims)
            }
        }
    }

    fn get_variable_list(&self) -> FileResult<Vec<String>> {
        self.get_variable_list_in(None, true, false)
    }

    fn read_variable(&self, name: &str, opts: &ReadOptions) -> FileResult<ArrayD<f64>> {
        let file = self.file()?;
        let ds = file
            .dataset(name)
            .map_err(|_| FileError::not_found("variable", name))?;
        let mut data = ds
            .read_dyn::<f64>()
            .map_err(|e| FileError::Format(format!("cannot read '{}': {}", name, e)))?;

        if let Some(range) = &opts.range {
            data = slice_range(data, range)?;
        }
        if opts.replace_fill {
            let attrs = self.get_attribute_list(Some(name))?;
            let fill = attrs
                .get("_FillValue")
                .or_else(|| attrs.get("missing_value"))
                .and_then(crate::model::attr_fill_value);
            match fill {
                Some(fill) => data = fill_to_nan(data, fill),
                None => {
                    return Err(FileError::not_found("attribute", "_FillValue"));
                }
            }
        }
        Ok(data)
    }
}

/// Quantity-aware HDF5 adapter.
#[derive(Default)]
pub struct AeroHdf {
    inner: Hdf,
}

impl AeroHdf {
    pub fn open(path: &Path, perms: Perms) -> FileResult<AeroHdf> {
        Ok(AeroHdf {
            inner: Hdf::open(path, perms)?,
        })
    }

    pub fn inner(&self) -> &Hdf {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut Hdf {
        &mut self.inner
    }

    /// Global metadata of the open file.
    pub fn file_metadata(&self) -> FileResult<FileMetadata> {
        let attrs = self.inner.get_attribute_list(None)?;
        let filename = self
            .inner
            .filename()
            .and_then(|p| p.to_str())
            .map(|s| s.to_string());
        Ok(FileMetadata::new(
            attrs.iter().map(|(k, v)| (k.to_string(), v.clone())),
            filename.as_deref(),
        ))
    }

    /// Read a variable into a Quantity parented to the file metadata.
    pub fn read_variable(&self, name: &str, opts: &ReadOptions) -> FileResult<Quantity> {
        let data = self.inner.read_variable(name, opts)?;
        let mut attrs = self.inner.get_attribute_list(Some(name))?;
        for reserved in RESERVED_ATTRS {
            attrs.remove(reserved);
        }
        attrs.insert("name", name.rsplit('/').next().unwrap_or(name));
        crate::file::hydrate_quantity(data, attrs, Some(self.file_metadata()?))
    }

    /// Write a Quantity and its metadata, replacing NaNs by the fill
    /// value when one is known.
    pub fn write_variable(
        &mut self,
        data: &Quantity,
        name: Option<&str>,
        dims: &[&str],
        ftype: Ftype,
    ) -> FileResult<()> {
        let name = crate::file::resolve_name(data, name)?;
        let fill = data
            .metadata
            .get("_FillValue")
            .or_else(|| data.metadata.get("missing_value"))
            .and_then(crate::model::attr_fill_value);

        let mut values = data.value().clone();
        if let Some(fill) = fill {
            values.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        self.inner.write_variable(&values, &name, dims, ftype)?;

        for (key, value) in data.metadata.iter() {
            if matches!(key, "name" | "cdf_name") {
                continue;
            }
            self.inner.add_attribute(key, value, Some(&name))?;
        }
        Ok(())
    }
}
