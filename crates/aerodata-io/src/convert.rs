//! Cross-format converters.
//!
//! Conversions run through the format-neutral [`FileModel`]: the source
//! adapter snapshots its file, a `history` note is appended, and the
//! target format's model writer emits the result. NASA Ames is the
//! restrictive target: it accepts exactly one root dimension and no group
//! hierarchy, and flattening is refused rather than silently applied
//! because variable names would collide.

use std::fs;
use std::path::Path;

use aerodata_core::metadata::AttrValue;
use chrono::{Datelike, Utc};
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::error::{FileError, FileResult};
use crate::file::{Container, Perms};
use crate::hdf::Hdf;
use crate::model::{attr_fill_value, parse_origin_date, FileModel, Ftype, GroupModel, VariableModel};
use crate::nasa_ames::{join_name_units, split_name_units, NaDict, NaSaveOptions, NasaAmes};
use crate::netcdf::NetCdf;

/// Attribute keys that map onto dedicated NASA Ames header keywords.
const NA_MAPPED_GLOBALS: &[&str] = &["institution", "authors", "source", "title"];

/// Variable attributes with dedicated NASA Ames slots (VNAME/VMISS/VSCAL).
const NA_MAPPED_VAR_ATTRS: &[&str] = &["units", "_FillValue", "missing_value", "scale_factor"];

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Write a model out as a NetCDF file.
pub fn write_model_netcdf(model: &FileModel, path: &Path) -> FileResult<()> {
    let mut out = NetCdf::open(path, Perms::Write)?;
    for (key, value) in model.attrs.iter() {
        out.add_attribute(key, value, None)?;
    }
    write_group_netcdf(&mut out, &model.root, "")?;
    debug!(file = %path.display(), "model written as NetCDF");
    Ok(())
}

fn write_group_netcdf(out: &mut NetCdf, group: &GroupModel, prefix: &str) -> FileResult<()> {
    for (name, size) in &group.dims {
        out.add_dim(&join_path(prefix, name), *size)?;
    }
    for var in &group.vars {
        let path = join_path(prefix, &var.name);
        let dims: Vec<&str> = var.dims.iter().map(|d| d.as_str()).collect();
        let fill = var.attrs.get("_FillValue").and_then(attr_fill_value);
        out.write_variable(&var.data, &path, Some(&dims), var.ftype, fill)?;
        for (key, value) in var.attrs.iter() {
            // _FillValue goes through the dedicated fill mechanism.
            if key == "_FillValue" {
                continue;
            }
            out.add_attribute(key, value, Some(&path))?;
        }
    }
    for sub in &group.groups {
        let sub_path = join_path(prefix, &sub.name);
        out.add_group(&sub_path)?;
        write_group_netcdf(out, sub, &sub_path)?;
    }
    Ok(())
}

/// Write a model out as an HDF5 file with dimension scales.
pub fn write_model_hdf(model: &FileModel, path: &Path) -> FileResult<()> {
    let mut out = Hdf::open(path, Perms::Write)?;
    for (key, value) in model.attrs.iter() {
        out.add_attribute(key, value, None)?;
    }
    write_group_hdf(&mut out, &model.root, "")?;
    debug!(file = %path.display(), "model written as HDF5");
    Ok(())
}

fn write_group_hdf(out: &mut Hdf, group: &GroupModel, prefix: &str) -> FileResult<()> {
    // Scales must exist before any variable that references them.
    for (name, size) in &group.dims {
        let dim_path = join_path(prefix, name);
        let coordinate = group.variable(name);
        let data: Vec<f64> = match coordinate {
            Some(var) => var.data.iter().copied().collect(),
            None => (0..*size).map(|i| i as f64).collect(),
        };
        let ftype = coordinate.map(|v| v.ftype).unwrap_or(Ftype::Double);
        out.add_dim(&dim_path, &data, ftype)?;
        if let Some(var) = coordinate {
            for (key, value) in var.attrs.iter() {
                out.add_attribute(key, value, Some(&dim_path))?;
            }
        }
    }
    for var in &group.vars {
        if group.dims.iter().any(|(d, _)| *d == var.name) {
            continue;
        }
        let path = join_path(prefix, &var.name);
        let dims: Vec<&str> = var.dims.iter().map(|d| d.as_str()).collect();
        out.write_variable(&var.data, &path, &dims, var.ftype)?;
        for (key, value) in var.attrs.iter() {
            out.add_attribute(key, value, Some(&path))?;
        }
    }
    for sub in &group.groups {
        let sub_path = join_path(prefix, &sub.name);
        out.add_group(&sub_path)?;
        write_group_hdf(out, sub, &sub_path)?;
    }
    Ok(())
}

/// Map a model onto the NASA Ames FFI 1001 dictionary. Fails on group
/// hierarchy or anything but exactly one root dimension.
pub fn model_to_na(model: &FileModel) -> FileResult<NaDict> {
    if model.has_groups() {
        return Err(FileError::Unsupported(
            "NASA Ames cannot represent a group hierarchy; flattening is refused because \
             variable names would collide"
                .to_string(),
        ));
    }
    let (dim_name, dim_len) = match model.root.dims.as_slice() {
        [dim] => dim.clone(),
        [] => {
            return Err(FileError::Unsupported(
                "NASA Ames needs one root dimension; the file has none".to_string(),
            ))
        }
        dims => {
            return Err(FileError::Unsupported(format!(
                "NASA Ames needs exactly one root dimension; the file has {}",
                dims.len()
            )))
        }
    };

    let mut na = NaDict::default();
    let attrs = &model.attrs;
    na.org = attrs.get_str("institution").unwrap_or_default().to_string();
    na.oname = attrs
        .get_str("authors")
        .or_else(|| attrs.get_str("institution"))
        .unwrap_or_default()
        .to_string();
    na.sname = attrs.get_str("source").unwrap_or_default().to_string();
    na.mname = attrs.get_str("title").unwrap_or_default().to_string();

    let today = Utc::now().date_naive();
    na.rdate = [today.year(), today.month() as i32, today.day() as i32];

    // Independent variable: the coordinate variable of the root dimension,
    // or a synthesized index axis.
    match model.root.variable(&dim_name) {
        Some(var) => {
            let units = var.attrs.get_str("units").unwrap_or_default();
            na.xname = join_name_units(&var.name, units);
            na.x = var.data.iter().copied().collect();
            if dim_name.to_lowercase().contains("time") {
                na.date = units
                    .split_once(" since ")
                    .and_then(|(_, ts)| parse_origin_date(ts))
                    .map(|(y, m, d)| [y, m as i32, d as i32])
                    .unwrap_or([999, 999, 999]);
            }
        }
        None => {
            na.xname = dim_name.clone();
            na.x = (0..dim_len).map(|i| i as f64).collect();
        }
    }

    for var in &model.root.vars {
        if var.name == dim_name {
            continue;
        }
        if var.dims != [dim_name.clone()] || var.data.ndim() != 1 {
            return Err(FileError::Unsupported(format!(
                "variable '{}' is not 1-D over the root dimension '{}'",
                var.name, dim_name
            )));
        }
        let units = var.attrs.get_str("units").unwrap_or_default();
        na.vname.push(join_name_units(&var.name, units));
        na.vmiss.push(
            var.attrs
                .get("_FillValue")
                .or_else(|| var.attrs.get("missing_value"))
                .and_then(attr_fill_value),
        );
        na.vscal.push(1.0);
        na.v.push(var.data.iter().copied().collect());

        let extra: Vec<(String, String)> = var
            .attrs
            .iter()
            .filter(|(key, _)| !NA_MAPPED_VAR_ATTRS.contains(key))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        if !extra.is_empty() {
            na.scom.push(format!("Variable {}:", var.name));
            for (key, value) in extra {
                na.scom.push(format!("  {}: {}", key, value));
            }
        }
    }

    for (key, value) in attrs.iter() {
        if NA_MAPPED_GLOBALS.contains(&key) {
            continue;
        }
        na.ncom.push(format!("{}: {}", key, value));
    }
    Ok(na)
}

/// Parse a textual attribute value back into a typed one.
fn parse_attr_text(text: &str) -> AttrValue {
    if let Ok(i) = text.parse::<i64>() {
        return AttrValue::Int(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        return AttrValue::Float(f);
    }
    AttrValue::Str(text.to_string())
}

/// Map a NASA Ames dictionary onto the file model: a single root
/// dimension for the independent variable, 1-D dependents over it, and
/// the header keywords as dedicated global attributes. `key: value`
/// comment lines written by [`model_to_na`] are restored as attributes.
pub fn na_to_model(na: &NaDict) -> FileResult<FileModel> {
    let mut model = FileModel::new();

    model.attrs.insert("authors", na.oname.clone());
    model.attrs.insert("institution", na.org.clone());
    model.attrs.insert("source", na.sname.clone());
    model.attrs.insert("title", na.mname.clone());
    model.attrs.insert(
        "first_valid_date_of_data",
        AttrValue::Ints(na.date.iter().map(|&d| d as i64).collect()),
    );
    model.attrs.insert("NLHEAD", na.nlhead as i64);
    model.attrs.insert("FFI", na.ffi as i64);
    model.attrs.insert("IVOL", na.ivol as i64);
    model.attrs.insert("NVOL", na.nvol as i64);
    model.attrs.insert(
        "RDATE",
        AttrValue::Ints(na.rdate.iter().map(|&d| d as i64).collect()),
    );
    model.attrs.insert("DX", na.dx);

    let mut normal_comments = Vec::new();
    for line in &na.ncom {
        match line.split_once(": ") {
            Some((key, value)) if !key.trim().is_empty() && !key.contains(' ') => {
                model.attrs.insert(key.trim(), parse_attr_text(value.trim()));
            }
            _ => normal_comments.push(line.clone()),
        }
    }
    if !normal_comments.is_empty() {
        model
            .attrs
            .insert("normal_comments", normal_comments.join("\n"));
    }

    // Per-variable comment blocks restore the attributes the forward
    // conversion spilled into SCOM.
    let mut var_attrs: Vec<(String, Vec<(String, AttrValue)>)> = Vec::new();
    let mut special_comments = Vec::new();
    for line in &na.scom {
        if let Some(name) = line.strip_prefix("Variable ").and_then(|r| r.strip_suffix(':')) {
            var_attrs.push((name.to_string(), Vec::new()));
        } else if line.starts_with("  ") {
            if let Some((_, block)) = var_attrs.last_mut() {
                if let Some((key, value)) = line.trim().split_once(": ") {
                    block.push((key.to_string(), parse_attr_text(value.trim())));
                    continue;
                }
            }
            special_comments.push(line.clone());
        } else {
            special_comments.push(line.clone());
        }
    }
    if !special_comments.is_empty() {
        model
            .attrs
            .insert("special_comments", special_comments.join("\n"));
    }

    let (x_name, x_units) = split_name_units(&na.xname);
    model.root.dims.push((x_name.clone(), na.nx()));

    let x_data = ArrayD::from_shape_vec(IxDyn(&[na.nx()]), na.x.clone())
        .map_err(|e| FileError::Format(e.to_string()))?;
    let mut x_attrs = aerodata_core::Metadata::new();
    x_attrs.insert("units", x_units.unwrap_or_default());
    model.root.vars.push(VariableModel {
        name: x_name.clone(),
        ftype: Ftype::Double,
        dims: vec![x_name.clone()],
        data: x_data,
        attrs: x_attrs,
    });

    for (i, vname) in na.vname.iter().enumerate() {
        let (name, units) = split_name_units(vname);
        let mut attrs = aerodata_core::Metadata::new();
        attrs.insert("units", units.unwrap_or_default());
        if let Some(miss) = na.vmiss[i] {
            attrs.insert("_FillValue", miss);
        }
        attrs.insert("scale_factor", na.vscal[i]);
        if let Some((_, block)) = var_attrs.iter().find(|(n, _)| *n == name) {
            for (key, value) in block {
                attrs.insert(key.clone(), value.clone());
            }
        }
        let data = ArrayD::from_shape_vec(IxDyn(&[na.v[i].len()]), na.v[i].clone())
            .map_err(|e| FileError::Format(e.to_string()))?;
        model.root.vars.push(VariableModel {
            name,
            ftype: Ftype::Double,
            dims: vec![x_name.clone()],
            data,
            attrs,
        });
    }
    Ok(model)
}

impl NetCdf {
    /// Convert the open file to HDF5.
    pub fn convert_to_hdf(&self, path: &Path) -> FileResult<()> {
        let mut model = self.snapshot()?;
        model.append_history("HDF5");
        write_model_hdf(&model, path)
    }

    /// Convert the open file to NASA Ames FFI 1001.
    pub fn convert_to_nasa_ames(&self, path: &Path, opts: &NaSaveOptions) -> FileResult<()> {
        let mut model = self.snapshot()?;
        model.append_history("NASA Ames");
        let mut na = model_to_na(&model)?;
        fs::write(path, na.serialize(&opts.delimiter, opts.no_header))?;
        Ok(())
    }

    /// Convert the open file to CSV: NASA Ames with a comma delimiter.
    pub fn convert_to_csv(&self, path: &Path, no_header: bool) -> FileResult<()> {
        self.convert_to_nasa_ames(
            path,
            &NaSaveOptions {
                delimiter: ",".to_string(),
                no_header,
            },
        )
    }
}

impl Hdf {
    /// Convert the open file to NetCDF.
    pub fn convert_to_netcdf(&self, path: &Path) -> FileResult<()> {
        let mut model = self.snapshot()?;
        model.append_history("NetCDF");
        write_model_netcdf(&model, path)
    }

    /// Convert the open file to NASA Ames FFI 1001.
    pub fn convert_to_nasa_ames(&self, path: &Path, opts: &NaSaveOptions) -> FileResult<()> {
        let mut model = self.snapshot()?;
        model.append_history("NASA Ames");
        let mut na = model_to_na(&model)?;
        fs::write(path, na.serialize(&opts.delimiter, opts.no_header))?;
        Ok(())
    }

    /// Convert the open file to CSV: NASA Ames with a comma delimiter.
    pub fn convert_to_csv(&self, path: &Path, no_header: bool) -> FileResult<()> {
        self.convert_to_nasa_ames(
            path,
            &NaSaveOptions {
                delimiter: ",".to_string(),
                no_header,
            },
        )
    }
}

impl NasaAmes {
    /// Snapshot the open file into the format-neutral model.
    pub fn snapshot(&self) -> FileResult<FileModel> {
        na_to_model(self.na_dict()?)
    }

    /// Convert the open file to NetCDF.
    pub fn convert_to_netcdf(&self, path: &Path) -> FileResult<()> {
        let mut model = self.snapshot()?;
        model.append_history("NetCDF");
        write_model_netcdf(&model, path)
    }

    /// Convert the open file to HDF5.
    pub fn convert_to_hdf(&self, path: &Path) -> FileResult<()> {
        let mut model = self.snapshot()?;
        model.append_history("HDF5");
        write_model_hdf(&model, path)
    }

    /// Convert the open file to CSV: the same data block with a comma
    /// delimiter.
    pub fn convert_to_csv(&self, path: &Path, no_header: bool) -> FileResult<()> {
        let mut na = self.na_dict()?.clone();
        fs::write(path, na.serialize(",", no_header))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> FileModel {
        let mut model = FileModel::new();
        model.attrs.insert("institution", "EUFAR");
        model.attrs.insert("authors", "John Doe");
        model.attrs.insert("source", "computer");
        model.attrs.insert("title", "a test file");

        model.root.dims.push(("time".to_string(), 5));

        let mut time_attrs = aerodata_core::Metadata::new();
        time_attrs.insert("units", "days since 20170101 00:00:00Z");
        model.root.vars.push(VariableModel {
            name: "time".to_string(),
            ftype: Ftype::Double,
            dims: vec!["time".to_string()],
            data: ArrayD::from_shape_vec(IxDyn(&[5]), vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap(),
            attrs: time_attrs,
        });

        let mut attrs = aerodata_core::Metadata::new();
        attrs.insert("units", "mm");
        attrs.insert("long_name", "a common data");
        attrs.insert("scale_factor", 1i64);
        attrs.insert("_FillValue", -999.0);
        model.root.vars.push(VariableModel {
            name: "data".to_string(),
            ftype: Ftype::Double,
            dims: vec!["time".to_string()],
            data: ArrayD::from_shape_vec(IxDyn(&[5]), vec![0.5, 2.3, 6.2, 8.1, 4.0]).unwrap(),
            attrs,
        });
        model
    }

    #[test]
    fn test_model_to_na_mapping() {
        let na = model_to_na(&sample_model()).unwrap();
        assert_eq!(na.oname, "John Doe");
        assert_eq!(na.org, "EUFAR");
        assert_eq!(na.sname, "computer");
        assert_eq!(na.mname, "a test file");
        assert_eq!(na.date, [2017, 1, 1]);
        assert_eq!(na.nv(), 1);
        assert_eq!(na.x, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(na.v[0], vec![0.5, 2.3, 6.2, 8.1, 4.0]);
        assert_eq!(na.vmiss[0], Some(-999.0));
        assert_eq!(na.vscal[0], 1.0);
        // Non-standard variable metadata lands in SCOM under a heading.
        assert!(na.scom.iter().any(|l| l == "Variable data:"));
        assert!(na.scom.iter().any(|l| l.contains("long_name: a common data")));
    }

    #[test]
    fn test_model_to_na_unparsable_time_origin() {
        let mut model = sample_model();
        if let Some(var) = model
            .root
            .vars
            .iter_mut()
            .find(|v| v.name == "time")
        {
            var.attrs.insert("units", "days since the dawn of aviation");
        }
        let na = model_to_na(&model).unwrap();
        assert_eq!(na.date, [999, 999, 999]);
    }

    #[test]
    fn test_model_to_na_rejects_groups() {
        let mut model = sample_model();
        model.root.groups.push(GroupModel::named("sub"));
        assert!(matches!(
            model_to_na(&model),
            Err(FileError::Unsupported(_))
        ));
    }

    #[test]
    fn test_model_to_na_rejects_multiple_dimensions() {
        let mut model = sample_model();
        model.root.dims.push(("bins".to_string(), 3));
        assert!(matches!(
            model_to_na(&model),
            Err(FileError::Unsupported(_))
        ));
    }

    #[test]
    fn test_na_model_roundtrip() {
        let na = model_to_na(&sample_model()).unwrap();
        let model = na_to_model(&na).unwrap();

        assert_eq!(model.attrs.get_str("authors"), Some("John Doe"));
        assert_eq!(model.attrs.get_str("institution"), Some("EUFAR"));
        assert_eq!(model.attrs.get_str("source"), Some("computer"));
        assert_eq!(model.attrs.get_str("title"), Some("a test file"));
        assert_eq!(model.root.dims, vec![("time".to_string(), 5)]);

        let data = model.root.variable("data").unwrap();
        assert_eq!(data.dims, vec!["time".to_string()]);
        assert_eq!(data.attrs.get_str("units"), Some("mm"));
        // SCOM blocks restore the spilled attributes.
        assert_eq!(
            data.attrs.get_str("long_name"),
            Some("a common data")
        );
        assert_eq!(
            data.attrs.get("_FillValue"),
            Some(&AttrValue::Float(-999.0))
        );
    }
}
