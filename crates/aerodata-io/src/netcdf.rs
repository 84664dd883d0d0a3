//! NetCDF4 adapter over the `netcdf` crate.
//!
//! The plain [`NetCdf`] adapter maps the uniform container surface onto
//! the library; groups are path-addressed with `/`. The quantity-aware
//! [`AeroNetCdf`] hydrates reads into [`Quantity`] values carrying the
//! file's global metadata and dehydrates writes, with `_FillValue` going
//! through the dedicated fill-value mechanism and NaNs exchanged with the
//! fill value at the boundary.

use std::path::{Path, PathBuf};

use aerodata_core::metadata::{AttrValue, FileMetadata, Metadata};
use aerodata_core::Quantity;
use ndarray::{ArrayD, IxDyn};
use tracing::{debug, error};

use crate::error::{FileError, FileResult};
use crate::file::{fill_to_nan, slice_range, Container, Perms, ReadOptions};
use crate::model::{FileModel, Ftype, GroupModel, VariableModel};

enum NcHandle {
    Read(netcdf::File),
    Write(netcdf::FileMut),
}

/// Adapter for generic NetCDF files.
#[derive(Default)]
pub struct NetCdf {
    handle: Option<NcHandle>,
    filename: Option<PathBuf>,
    perms: Perms,
}

/// Convert a library attribute value into the toolkit's representation.
fn nc_to_attr(value: netcdf::AttributeValue) -> AttrValue {
    use netcdf::AttributeValue as Av;
    match value {
        Av::Uchar(v) => AttrValue::Int(v as i64),
        Av::Schar(v) => AttrValue::Int(v as i64),
        Av::Ushort(v) => AttrValue::Int(v as i64),
        Av::Short(v) => AttrValue::Int(v as i64),
        Av::Uint(v) => AttrValue::Int(v as i64),
        Av::Int(v) => AttrValue::Int(v as i64),
        Av::Ulonglong(v) => AttrValue::Int(v as i64),
        Av::Longlong(v) => AttrValue::Int(v),
        Av::Float(v) => AttrValue::Float(v as f64),
        Av::Double(v) => AttrValue::Float(v),
        Av::Str(v) => AttrValue::Str(v),
        Av::Uchars(v) => AttrValue::Ints(v.into_iter().map(|x| x as i64).collect()),
        Av::Schars(v) => AttrValue::Ints(v.into_iter().map(|x| x as i64).collect()),
        Av::Ushorts(v) => AttrValue::Ints(v.into_iter().map(|x| x as i64).collect()),
        Av::Shorts(v) => AttrValue::Ints(v.into_iter().map(|x| x as i64).collect()),
        Av::Uints(v) => AttrValue::Ints(v.into_iter().map(|x| x as i64).collect()),
        Av::Ints(v) => AttrValue::Ints(v.into_iter().map(|x| x as i64).collect()),
        Av::Ulonglongs(v) => AttrValue::Ints(v.into_iter().map(|x| x as i64).collect()),
        Av::Longlongs(v) => AttrValue::Ints(v),
        Av::Floats(v) => AttrValue::Floats(v.into_iter().map(|x| x as f64).collect()),
        Av::Doubles(v) => AttrValue::Floats(v),
        Av::Strs(v) => AttrValue::Strs(v),
    }
}

/// Convert a toolkit attribute value into the library's representation.
fn attr_to_nc(value: &AttrValue) -> netcdf::AttributeValue {
    use netcdf::AttributeValue as Av;
    match value {
        AttrValue::Str(s) => Av::Str(s.clone()),
        AttrValue::Int(i) => Av::Longlong(*i),
        AttrValue::Float(f) => Av::Double(*f),
        AttrValue::Ints(v) => Av::Longlongs(v.clone()),
        AttrValue::Floats(v) => Av::Doubles(v.clone()),
        AttrValue::Strs(v) => Av::Strs(v.clone()),
    }
}

/// On-disk data type of a variable, mapped into the adapter's type table.
fn ftype_of(var: &netcdf::Variable) -> Ftype {
    use netcdf::types::{FloatType, IntType, NcVariableType};
    match var.vartype() {
        NcVariableType::Int(IntType::I8) | NcVariableType::Int(IntType::U8) => Ftype::Byte,
        NcVariableType::Int(IntType::I16) | NcVariableType::Int(IntType::U16) => Ftype::Short,
        NcVariableType::Int(IntType::I32) | NcVariableType::Int(IntType::U32) => Ftype::Int,
        NcVariableType::Int(IntType::I64) | NcVariableType::Int(IntType::U64) => Ftype::Int,
        NcVariableType::Float(FloatType::F32) => Ftype::Float,
        NcVariableType::Float(FloatType::F64) => Ftype::Double,
        NcVariableType::Char => Ftype::Char,
        // Fall back to the string representation of exotic types.
        other => Ftype::from_name(&format!("{:?}", other)),
    }
}

/// Split a path-addressed variable name into its group path and base name.
fn split_path(name: &str) -> (Option<&str>, &str) {
    match name.trim_start_matches('/').rsplit_once('/') {
        Some((dir, base)) if !dir.is_empty() => (Some(dir), base),
        _ => (None, name.trim_start_matches('/')),
    }
}

/// Run `f` against the mutable group at a `/`-separated path.
fn with_group_mut<R, F>(file: &mut netcdf::FileMut, path: &str, f: F) -> FileResult<R>
where
    F: FnOnce(&mut netcdf::GroupMut) -> FileResult<R>,
{
    fn descend<R, F>(group: &mut netcdf::GroupMut, segments: &[&str], f: F) -> FileResult<R>
    where
        F: FnOnce(&mut netcdf::GroupMut) -> FileResult<R>,
    {
        match segments.split_first() {
            None => f(group),
            Some((first, rest)) => {
                let mut child = group
                    .group_mut(first)
                    .ok_or_else(|| FileError::not_found("group", *first))?;
                descend(&mut child, rest, f)
            }
        }
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| FileError::not_found("group", path))?;
    let mut group = file
        .group_mut(first)?
        .ok_or_else(|| FileError::not_found("group", path))?;
    descend(&mut group, rest, f)
}

fn with_group<R, F>(file: &netcdf::File, path: &str, f: F) -> FileResult<R>
where
    F: FnOnce(&netcdf::Group) -> FileResult<R>,
{
    fn descend<R, F>(group: &netcdf::Group, segments: &[&str], f: F) -> FileResult<R>
    where
        F: FnOnce(&netcdf::Group) -> FileResult<R>,
    {
        match segments.split_first() {
            None => f(group),
            Some((first, rest)) => {
                let child = group
                    .group(first)
                    .ok_or_else(|| FileError::not_found("group", *first))?;
                descend(&child, rest, f)
            }
        }
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| FileError::not_found("group", path))?;
    let group = file
        .group(first)?
        .ok_or_else(|| FileError::not_found("group", path))?;
    descend(&group, rest, f)
}

macro_rules! create_typed_variable {
    ($owner:expr, $name:expr, $dims:expr, $ftype:expr, $values:expr, $fill:expr) => {{
        match $ftype {
            Ftype::Double => {
                let mut var = $owner.add_variable::<f64>($name, $dims)?;
                if let Some(fill) = $fill {
                    var.set_fill_value(fill)?;
                }
                var.put_values(&$values, ..)?;
            }
            Ftype::Float => {
                let mut var = $owner.add_variable::<f32>($name, $dims)?;
                if let Some(fill) = $fill {
                    var.set_fill_value(fill as f32)?;
                }
                let converted: Vec<f32> = $values.iter().map(|&v| v as f32).collect();
                var.put_values(&converted, ..)?;
            }
            Ftype::Int => {
                let mut var = $owner.add_variable::<i32>($name, $dims)?;
                if let Some(fill) = $fill {
                    var.set_fill_value(fill as i32)?;
                }
                let converted: Vec<i32> = $values.iter().map(|&v| v as i32).collect();
                var.put_values(&converted, ..)?;
            }
            Ftype::Short => {
                let mut var = $owner.add_variable::<i16>($name, $dims)?;
                if let Some(fill) = $fill {
                    var.set_fill_value(fill as i16)?;
                }
                let converted: Vec<i16> = $values.iter().map(|&v| v as i16).collect();
                var.put_values(&converted, ..)?;
            }
            Ftype::Byte | Ftype::Char => {
                let mut var = $owner.add_variable::<i8>($name, $dims)?;
                if let Some(fill) = $fill {
                    var.set_fill_value(fill as i8)?;
                }
                let converted: Vec<i8> = $values.iter().map(|&v| v as i8).collect();
                var.put_values(&converted, ..)?;
            }
        }
        FileResult::Ok(())
    }};
}

impl NetCdf {
    pub fn new() -> NetCdf {
        NetCdf::default()
    }

    /// Open a NetCDF file with the given permissions.
    pub fn open(path: &Path, perms: Perms) -> FileResult<NetCdf> {
        let mut file = NetCdf::new();
        file.open_path(path, perms)?;
        Ok(file)
    }

    pub fn open_path(&mut self, path: &Path, perms: Perms) -> FileResult<()> {
        self.close();
        let handle = match perms {
            Perms::Read => NcHandle::Read(netcdf::open(path).map_err(|e| {
                error!(file = %path.display(), "cannot open NetCDF file: {}", e);
                FileError::NetCdf(e)
            })?),
            Perms::Write => NcHandle::Write(netcdf::create(path)?),
            Perms::Append | Perms::ReadWrite => NcHandle::Write(netcdf::append(path)?),
        };
        self.handle = Some(handle);
        self.filename = Some(path.to_path_buf());
        self.perms = perms;
        debug!(file = %path.display(), perms = perms.as_str(), "NetCDF file open");
        Ok(())
    }

    fn file(&self) -> FileResult<&netcdf::File> {
        match self.handle.as_ref().ok_or(FileError::NoFileOpen)? {
            NcHandle::Read(f) => Ok(f),
            NcHandle::Write(f) => Ok(f),
        }
    }

    fn file_mut(&mut self) -> FileResult<&mut netcdf::FileMut> {
        match self.handle.as_mut().ok_or(FileError::NoFileOpen)? {
            NcHandle::Read(_) => Err(FileError::ReadOnly("NetCDF write".to_string())),
            NcHandle::Write(f) => Ok(f),
        }
    }

    fn with_variable<R, F>(&self, file: &netcdf::File, name: &str, f: F) -> FileResult<R>
    where
        F: FnOnce(&netcdf::Variable) -> FileResult<R>,
    {
        match split_path(name) {
            (Some(dir), base) => with_group(file, dir, |group| {
                let var = group
                    .variable(base)
                    .ok_or_else(|| FileError::not_found("variable", name))?;
                f(&var)
            }),
            (None, base) => {
                let var = file
                    .variable(base)
                    .ok_or_else(|| FileError::not_found("variable", name))?;
                f(&var)
            }
        }
    }

    /// Variable names; `recursive` walks nested groups, `with_path`
    /// prefixes names with their group path.
    pub fn get_variable_list_in(
        &self,
        group: Option<&str>,
        recursive: bool,
        with_path: bool,
    ) -> FileResult<Vec<String>> {
        fn walk(
            group: &netcdf::Group,
            prefix: &str,
            recursive: bool,
            with_path: bool,
            out: &mut Vec<String>,
        ) {
            for var in group.variables() {
                out.push(if with_path {
                    format!("{}/{}", prefix, var.name())
                } else {
                    var.name().to_string()
                });
            }
            if recursive {
                for child in group.groups() {
                    let child_prefix = format!("{}/{}", prefix, child.name());
                    walk(&child, &child_prefix, recursive, with_path, out);
                }
            }
        }

        let file = self.file()?;
        let mut names = Vec::new();
        match group {
            None => {
                for var in file.variables() {
                    names.push(var.name().to_string());
                }
                if recursive {
                    for child in file.groups()? {
                        let prefix = child.name().to_string();
                        walk(&child, &prefix, recursive, with_path, &mut names);
                    }
                }
            }
            Some(path) => {
                with_group(file, path, |parent| {
                    walk(
                        parent,
                        path.trim_matches('/'),
                        recursive,
                        with_path,
                        &mut names,
                    );
                    Ok(())
                })?;
            }
        }
        Ok(names)
    }

    /// Dimensions; `recursive` includes nested groups, `with_path`
    /// prefixes dimension names with their group path.
    pub fn get_dimension_list_in(
        &self,
        group: Option<&str>,
        recursive: bool,
        with_path: bool,
    ) -> FileResult<Vec<(String, usize)>> {
        fn walk(
            group: &netcdf::Group,
            prefix: &str,
            recursive: bool,
            with_path: bool,
            out: &mut Vec<(String, usize)>,
        ) {
            for dim in group.dimensions() {
                let name = if with_path {
                    format!("{}/{}", prefix, dim.name())
                } else {
                    dim.name().to_string()
                };
                out.push((name, dim.len()));
            }
            if recursive {
                for child in group.groups() {
                    let child_prefix = format!("{}/{}", prefix, child.name());
                    walk(&child, &child_prefix, recursive, with_path, out);
                }
            }
        }

        let file = self.file()?;
        let mut dims = Vec::new();
        match group {
            None => {
                for dim in file.dimensions() {
                    dims.push((dim.name().to_string(), dim.len()));
                }
                if recursive {
                    for child in file.groups()? {
                        let prefix = child.name().to_string();
                        walk(&child, &prefix, recursive, with_path, &mut dims);
                    }
                }
            }
            Some(path) => {
                with_group(file, path, |parent| {
                    walk(
                        parent,
                        path.trim_matches('/'),
                        recursive,
                        with_path,
                        &mut dims,
                    );
                    Ok(())
                })?;
            }
        }
        Ok(dims)
    }

    /// Names of child groups, path-addressed when requested.
    pub fn get_group_list(&self, group: Option<&str>, with_path: bool) -> FileResult<Vec<String>> {
        let file = self.file()?;
        let mut names = Vec::new();
        match group {
            None => {
                for g in file.groups()? {
                    names.push(if with_path {
                        format!("/{}", g.name())
                    } else {
                        g.name().to_string()
                    });
                }
            }
            Some(path) => {
                with_group(file, path, |parent| {
                    for g in parent.groups() {
                        names.push(if with_path {
                            format!("/{}/{}", path.trim_matches('/'), g.name())
                        } else {
                            g.name().to_string()
                        });
                    }
                    Ok(())
                })?;
            }
        }
        Ok(names)
    }

    /// Create a group (and any missing intermediate groups) at the path.
    pub fn add_group(&mut self, path: &str) -> FileResult<()> {
        fn ensure(group: &mut netcdf::GroupMut, segments: &[&str]) -> FileResult<()> {
            let Some((first, rest)) = segments.split_first() else {
                return Ok(());
            };
            if group.group_mut(first).is_none() {
                group.add_group(first)?;
            }
            let mut child = group
                .group_mut(first)
                .ok_or_else(|| FileError::not_found("group", *first))?;
            ensure(&mut child, rest)
        }

        let file = self.file_mut()?;
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| FileError::Format("empty group path".to_string()))?;
        if file.group_mut(first)?.is_none() {
            file.add_group(first)?;
        }
        let mut group = file
            .group_mut(first)?
            .ok_or_else(|| FileError::not_found("group", *first))?;
        ensure(&mut group, rest)
    }

    /// Create a dimension at the root or at a `/`-separated group path.
    pub fn add_dim(&mut self, name: &str, size: usize) -> FileResult<()> {
        let file = self.file_mut()?;
        match split_path(name) {
            (Some(dir), base) => with_group_mut(file, dir, |group| {
                group.add_dimension(base, size)?;
                Ok(())
            }),
            (None, base) => {
                file.add_dimension(base, size)?;
                Ok(())
            }
        }
    }

    /// Create a variable and write its values. An existing variable is
    /// overwritten in place; creation requires dimension names that
    /// already exist in the variable's group.
    pub fn write_variable(
        &mut self,
        data: &ArrayD<f64>,
        name: &str,
        dims: Option<&[&str]>,
        ftype: Ftype,
        fill: Option<f64>,
    ) -> FileResult<()> {
        let values: Vec<f64> = data.iter().copied().collect();
        let exists = {
            let file = self.file()?;
            self.with_variable(file, name, |_| Ok(())).is_ok()
        };
        let file = self.file_mut()?;

        match split_path(name) {
            (Some(dir), base) => with_group_mut(file, dir, |group| {
                if exists {
                    let mut var = group
                        .variable_mut(base)
                        .ok_or_else(|| FileError::not_found("variable", base))?;
                    var.put_values(&values, ..)?;
                    return Ok(());
                }
                let dims = dims.ok_or_else(|| {
                    FileError::Format(format!("dimensions required to create variable '{}'", base))
                })?;
                create_typed_variable!(group, base, dims, ftype, values, fill)
            }),
            (None, base) => {
                if exists {
                    let mut var = file
                        .variable_mut(base)
                        .ok_or_else(|| FileError::not_found("variable", base))?;
                    var.put_values(&values, ..)?;
                    return Ok(());
                }
                let dims = dims.ok_or_else(|| {
                    FileError::Format(format!("dimensions required to create variable '{}'", base))
                })?;
                create_typed_variable!(file, base, dims, ftype, values, fill)
            }
        }?;
        debug!(variable = name, ftype = ftype.as_str(), "NetCDF variable written");
        Ok(())
    }

    /// NetCDF cannot remove a variable once created.
    pub fn delete_variable(&mut self, name: &str) -> FileResult<()> {
        Err(FileError::Unsupported(format!(
            "the NetCDF backend cannot delete variable '{}'",
            name
        )))
    }

    /// Snapshot the open file into the format-neutral model.
    pub fn snapshot(&self) -> FileResult<FileModel> {
        let file = self.file()?;

        let mut model = FileModel::new();
        for attr in file.attributes() {
            model.attrs.insert(attr.name(), nc_to_attr(attr.value()?));
        }

        for dim in file.dimensions() {
            model.root.dims.push((dim.name().to_string(), dim.len()));
        }
        for var in file.variables() {
            model.root.vars.push(snapshot_variable(&var)?);
        }
        for group in file.groups()? {
            model.root.groups.push(snapshot_group(&group)?);
        }
        Ok(model)
    }
}

fn snapshot_group(group: &netcdf::Group) -> FileResult<GroupModel> {
    let mut out = GroupModel::named(&group.name());
    for dim in group.dimensions() {
        out.dims.push((dim.name().to_string(), dim.len()));
    }
    for var in group.variables() {
        out.vars.push(snapshot_variable(&var)?);
    }
    for child in group.groups() {
        out.groups.push(snapshot_group(&child)?);
    }
    Ok(out)
}

fn snapshot_variable(var: &netcdf::Variable) -> FileResult<VariableModel> {
    let mut attrs = Metadata::new();
    for attr in var.attributes() {
        attrs.insert(attr.name(), nc_to_attr(attr.value()?));
    }
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values: Vec<f64> = var.get_values(..)?;
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| FileError::Format(e.to_string()))?;
    Ok(VariableModel {
        name: var.name().to_string(),
        ftype: ftype_of(var),
        dims: var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect(),
        data,
        attrs,
    })
}

impl Container for NetCdf {
    fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    fn perms(&self) -> Perms {
        self.perms
    }

    fn close(&mut self) {
        self.handle = None;
        self.filename = None;
    }

    fn get_attribute_list(&self, target: Option<&str>) -> FileResult<Metadata> {
        let file = self.file()?;
        let mut attrs = Metadata::new();
        match target {
            None => {
                for attr in file.attributes() {
                    attrs.insert(attr.name(), nc_to_attr(attr.value()?));
                }
            }
            Some(name) => {
                self.with_variable(file, name, |var| {
                    for attr in var.attributes() {
                        attrs.insert(attr.name(), nc_to_attr(attr.value()?));
                    }
                    Ok(())
                })?;
            }
        }
        Ok(attrs)
    }

    fn add_attribute(
        &mut self,
        name: &str,
        value: &AttrValue,
        target: Option<&str>,
    ) -> FileResult<()> {
        let nc_value = attr_to_nc(value);
        let file = self.file_mut()?;
        match target {
            None => {
                file.add_attribute(name, nc_value)?;
            }
            Some(varname) => match split_path(varname) {
                (Some(dir), base) => {
                    with_group_mut(file, dir, |group| {
                        let mut var = group
                            .variable_mut(base)
                            .ok_or_else(|| FileError::not_found("variable", base))?;
                        var.put_attribute(name, nc_value)?;
                        Ok(())
                    })?;
                }
                (None, base) => {
                    let mut var = file
                        .variable_mut(base)
                        .ok_or_else(|| FileError::not_found("variable", base))?;
                    var.put_attribute(name, nc_value)?;
                }
            },
        }
        Ok(())
    }

    fn delete_attribute(&mut self, name: &str, _target: Option<&str>) -> FileResult<()> {
        Err(FileError::Unsupported(format!(
            "the NetCDF backend does not expose attribute deletion ('{}')",
            name
        )))
    }

    fn get_dimension_list(&self, target: Option<&str>) -> FileResult<Vec<(String, usize)>> {
        let file = self.file()?;
        let mut dims = Vec::new();
        match target {
            None => {
                for dim in file.dimensions() {
                    dims.push((dim.name().to_string(), dim.len()));
                }
            }
            Some(name) => {
                self.with_variable(file, name, |var| {
                    for dim in var.dimensions() {
                        dims.push((dim.name().to_string(), dim.len()));
                    }
                    Ok(())
                })?;
            }
        }
        Ok(dims)
    }

    fn get_variable_list(&self) -> FileResult<Vec<String>> {
        let file = self.file()?;
        Ok(file.variables().map(|v| v.name().to_string()).collect())
    }

    fn read_variable(&self, name: &str, opts: &ReadOptions) -> FileResult<ArrayD<f64>> {
        let file = self.file()?;
        let mut data = self.with_variable(file, name, |var| {
            let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
            let values: Vec<f64> = var.get_values(..)?;
            ArrayD::from_shape_vec(IxDyn(&shape), values)
                .map_err(|e| FileError::Format(e.to_string()))
        })?;

        if let Some(range) = &opts.range {
            data = slice_range(data, range)?;
        }
        if opts.replace_fill {
            let attrs = self.get_attribute_list(Some(name))?;
            let fill = attrs
                .get("_FillValue")
                .or_else(|| attrs.get("missing_value"))
                .and_then(crate::model::attr_fill_value);
            if let Some(fill) = fill {
                data = fill_to_nan(data, fill);
            }
        }
        Ok(data)
    }
}

/// Quantity-aware NetCDF adapter.
#[derive(Default)]
pub struct AeroNetCdf {
    inner: NetCdf,
}

impl AeroNetCdf {
    pub fn open(path: &Path, perms: Perms) -> FileResult<AeroNetCdf> {
        Ok(AeroNetCdf {
            inner: NetCdf::open(path, perms)?,
        })
    }

    pub fn inner(&self) -> &NetCdf {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut NetCdf {
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

    /// Read a variable and its attributes into a Quantity parented to the
    /// file metadata. With `replace_fill`, fill values come back as NaN.
    pub fn read_variable(&self, name: &str, opts: &ReadOptions) -> FileResult<Quantity> {
        let data = self.inner.read_variable(name, opts)?;
        let mut attrs = self.inner.get_attribute_list(Some(name))?;
        attrs.insert("cdf_name", name);
        crate::file::hydrate_quantity(data, attrs, Some(self.file_metadata()?))
    }

    /// Write a Quantity and its metadata. `_FillValue` goes through the
    /// dedicated fill mechanism and NaNs in the data are replaced by the
    /// fill value.
    pub fn write_variable(
        &mut self,
        data: &Quantity,
        name: Option<&str>,
        dims: Option<&[&str]>,
        ftype: Ftype,
        fill: Option<f64>,
    ) -> FileResult<()> {
        let name = crate::file::resolve_name(data, name)?;
        let fill = fill.or_else(|| {
            data.metadata
                .get("_FillValue")
                .or_else(|| data.metadata.get("missing_value"))
                .and_then(crate::model::attr_fill_value)
        });

        let mut values = data.value().clone();
        if let Some(fill) = fill {
            values.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        self.inner
            .write_variable(&values, &name, dims, ftype, fill)?;

        for (key, value) in data.metadata.iter() {
            if matches!(key, "_FillValue" | "name" | "cdf_name") {
                continue;
            }
            self.inner.add_attribute(key, value, Some(&name))?;
        }
        Ok(())
    }
}
