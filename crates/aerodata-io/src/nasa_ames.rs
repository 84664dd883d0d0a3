//! NASA Ames FFI 1001 adapter.
//!
//! FFI 1001 is the simplest member of the NASA Ames family: one 1-D
//! independent variable (typically time) and any number of equally long
//! dependent variables, preceded by a whitespace-delimited text header.
//! The adapter keeps the whole file as an in-memory dictionary of the
//! canonical header keywords and rewrites NLHEAD from the actual header
//! line count on save.

use std::fs;
use std::path::{Path, PathBuf};

use aerodata_core::metadata::{AttrValue, FileMetadata, Metadata};
use aerodata_core::Quantity;
use ndarray::{ArrayD, IxDyn};
use tracing::{debug, error};

use crate::error::{FileError, FileResult};
use crate::file::{fill_to_nan, slice_range, Container, Perms, ReadOptions};

/// The File Format Index this adapter implements.
pub const FFI: u32 = 1001;

/// Default delimiter between data items: four spaces.
pub const DEFAULT_DELIMITER: &str = "    ";

/// In-memory form of an FFI 1001 file: the canonical header keywords plus
/// the data columns.
#[derive(Debug, Clone)]
pub struct NaDict {
    pub nlhead: usize,
    pub ffi: u32,
    /// Originator (authors).
    pub oname: String,
    /// Originating organisation.
    pub org: String,
    /// Source of data (instrument, platform, model).
    pub sname: String,
    /// Mission or project name.
    pub mname: String,
    pub ivol: u32,
    pub nvol: u32,
    /// First date of data, `[year, month, day]`.
    pub date: [i32; 3],
    /// Revision date, `[year, month, day]`.
    pub rdate: [i32; 3],
    /// Independent variable interval identifier.
    pub dx: f64,
    /// Name (and units) of the independent variable.
    pub xname: String,
    /// Scaling factors of the dependent variables.
    pub vscal: Vec<f64>,
    /// Missing value markers of the dependent variables; `None` renders
    /// as `null`.
    pub vmiss: Vec<Option<f64>>,
    /// Names (and units) of the dependent variables.
    pub vname: Vec<String>,
    pub scom: Vec<String>,
    pub ncom: Vec<String>,
    /// Independent variable values.
    pub x: Vec<f64>,
    /// Dependent variable columns, one per `vname`.
    pub v: Vec<Vec<f64>>,
}

impl Default for NaDict {
    fn default() -> Self {
        NaDict {
            nlhead: 0,
            ffi: FFI,
            oname: String::new(),
            org: String::new(),
            sname: String::new(),
            mname: String::new(),
            ivol: 1,
            nvol: 1,
            date: [999, 999, 999],
            rdate: [999, 999, 999],
            dx: 0.0,
            xname: String::new(),
            vscal: Vec::new(),
            vmiss: Vec::new(),
            vname: Vec::new(),
            scom: Vec::new(),
            ncom: Vec::new(),
            x: Vec::new(),
            v: Vec::new(),
        }
    }
}

/// Split a `"<name> (<units>)"` item into name and units.
pub(crate) fn split_name_units(item: &str) -> (String, Option<String>) {
    if let Some(open) = item.find('(') {
        if let Some(rel) = item[open..].find(')') {
            let close = open + rel;
            let units = item[open + 1..close].trim().to_string();
            let name = format!("{} {}", item[..open].trim(), item[close + 1..].trim());
            return (name.trim().to_string(), Some(units));
        }
    }
    (item.trim().to_string(), None)
}

/// Compose a `"<name> (<units>)"` item.
pub(crate) fn join_name_units(name: &str, units: &str) -> String {
    if units.is_empty() {
        name.to_string()
    } else {
        format!("{} ({})", name, units)
    }
}

impl NaDict {
    pub fn nv(&self) -> usize {
        self.vname.len()
    }

    pub fn nx(&self) -> usize {
        self.x.len()
    }

    /// Parsed name of the independent variable.
    pub fn x_name(&self) -> String {
        split_name_units(&self.xname).0
    }

    /// Parsed names of the dependent variables.
    pub fn variable_names(&self) -> Vec<String> {
        self.vname.iter().map(|v| split_name_units(v).0).collect()
    }

    /// Index of a dependent variable by parsed name.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_names().iter().position(|n| n == name)
    }

    /// Parse an FFI 1001 file from text.
    pub fn parse(text: &str) -> FileResult<NaDict> {
        let mut lines = text.lines();
        let mut next = |what: &str| {
            lines
                .next()
                .ok_or_else(|| FileError::Format(format!("truncated header: missing {}", what)))
        };

        let first = next("NLHEAD FFI")?;
        let mut head = first.split_whitespace();
        let nlhead: usize = head
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| FileError::Format("invalid NLHEAD".to_string()))?;
        let ffi: u32 = head
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| FileError::Format("invalid FFI".to_string()))?;
        if ffi != FFI {
            return Err(FileError::Unsupported(format!(
                "only FFI {} is supported, file declares {}",
                FFI, ffi
            )));
        }

        let oname = next("ONAME")?.trim_end().to_string();
        let org = next("ORG")?.trim_end().to_string();
        let sname = next("SNAME")?.trim_end().to_string();
        let mname = next("MNAME")?.trim_end().to_string();

        let volumes = next("IVOL NVOL")?;
        let mut vol = volumes.split_whitespace();
        let ivol: u32 = vol
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| FileError::Format("invalid IVOL".to_string()))?;
        let nvol: u32 = vol
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| FileError::Format("invalid NVOL".to_string()))?;

        let dates = next("DATE RDATE")?;
        let parts: Vec<i32> = dates
            .split_whitespace()
            .map(|t| t.parse())
            .collect::<Result<_, _>>()
            .map_err(|_| FileError::Format("invalid DATE/RDATE line".to_string()))?;
        if parts.len() != 6 {
            return Err(FileError::Format(
                "DATE/RDATE line must carry six integers".to_string(),
            ));
        }
        let date = [parts[0], parts[1], parts[2]];
        let rdate = [parts[3], parts[4], parts[5]];

        let dx: f64 = next("DX")?
            .trim()
            .parse()
            .map_err(|_| FileError::Format("invalid DX".to_string()))?;
        let xname = next("XNAME")?.trim_end().to_string();

        let nv: usize = next("NV")?
            .trim()
            .parse()
            .map_err(|_| FileError::Format("invalid NV".to_string()))?;

        let vscal: Vec<f64> = next("VSCAL")?
            .split_whitespace()
            .map(|t| t.parse())
            .collect::<Result<_, _>>()
            .map_err(|_| FileError::Format("invalid VSCAL line".to_string()))?;
        let vmiss: Vec<Option<f64>> = next("VMISS")?
            .split_whitespace()
            .map(|t| {
                if t == "null" {
                    Ok(None)
                } else {
                    t.parse::<f64>()
                        .map(Some)
                        .map_err(|_| FileError::Format("invalid VMISS line".to_string()))
                }
            })
            .collect::<FileResult<_>>()?;
        if vscal.len() != nv || vmiss.len() != nv {
            return Err(FileError::Format(format!(
                "VSCAL/VMISS carry {}/{} entries for NV={}",
                vscal.len(),
                vmiss.len(),
                nv
            )));
        }

        let mut vname = Vec::with_capacity(nv);
        for _ in 0..nv {
            vname.push(next("VNAME")?.trim_end().to_string());
        }

        let nscoml: usize = next("NSCOML")?
            .trim()
            .parse()
            .map_err(|_| FileError::Format("invalid NSCOML".to_string()))?;
        let mut scom = Vec::with_capacity(nscoml);
        for _ in 0..nscoml {
            scom.push(next("SCOM")?.trim_end().to_string());
        }

        let nncoml: usize = next("NNCOML")?
            .trim()
            .parse()
            .map_err(|_| FileError::Format("invalid NNCOML".to_string()))?;
        let mut ncom = Vec::with_capacity(nncoml);
        for _ in 0..nncoml {
            ncom.push(next("NCOM")?.trim_end().to_string());
        }

        let mut x = Vec::new();
        let mut v: Vec<Vec<f64>> = vec![Vec::new(); nv];
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let row: Vec<f64> = line
                .split_whitespace()
                .map(|t| t.parse())
                .collect::<Result<_, _>>()
                .map_err(|_| FileError::Format(format!("invalid data row '{}'", line)))?;
            if row.len() != nv + 1 {
                return Err(FileError::Format(format!(
                    "data row carries {} values, expected {}",
                    row.len(),
                    nv + 1
                )));
            }
            x.push(row[0]);
            for (column, value) in v.iter_mut().zip(&row[1..]) {
                column.push(*value);
            }
        }

        Ok(NaDict {
            nlhead,
            ffi,
            oname,
            org,
            sname,
            mname,
            ivol,
            nvol,
            date,
            rdate,
            dx,
            xname,
            vscal,
            vmiss,
            vname,
            scom,
            ncom,
            x,
            v,
        })
    }

    /// Serialise to FFI 1001 text. NLHEAD is recomputed from the header
    /// lines actually written and stored back on `self`. An empty
    /// delimiter falls back to four spaces.
    pub fn serialize(&mut self, delimiter: &str, no_header: bool) -> String {
        let delim = if delimiter.is_empty() {
            DEFAULT_DELIMITER
        } else {
            delimiter
        };

        let mut out = String::new();
        if !no_header {
            let mut header: Vec<String> = Vec::new();
            header.push(self.oname.clone());
            header.push(self.org.clone());
            header.push(self.sname.clone());
            header.push(self.mname.clone());
            header.push(format!("{}{}{}", self.ivol, delim, self.nvol));
            header.push(format!(
                "{} {} {}{}{} {} {}",
                self.date[0], self.date[1], self.date[2], delim, self.rdate[0], self.rdate[1],
                self.rdate[2]
            ));
            header.push(format!("{}", self.dx));
            header.push(self.xname.clone());
            header.push(format!("{}", self.nv()));
            header.push(
                self.vscal
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(delim),
            );
            header.push(
                self.vmiss
                    .iter()
                    .map(|m| match m {
                        Some(v) => v.to_string(),
                        None => "null".to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(delim),
            );
            header.extend(self.vname.iter().cloned());
            header.push(format!("{}", self.scom.len()));
            header.extend(self.scom.iter().cloned());
            header.push(format!("{}", self.ncom.len()));
            header.extend(self.ncom.iter().cloned());

            // The NLHEAD/FFI line itself counts.
            self.nlhead = header.len() + 1;
            out.push_str(&format!("{}{}{}\n", self.nlhead, delim, self.ffi));
            for line in header {
                out.push_str(&line);
                out.push('\n');
            }
        }

        for (i, xv) in self.x.iter().enumerate() {
            let mut row = vec![xv.to_string()];
            for column in &self.v {
                row.push(column.get(i).copied().unwrap_or(f64::NAN).to_string());
            }
            out.push_str(&row.join(delim));
            out.push('\n');
        }
        out
    }
}

/// Options for [`NasaAmes::save`].
#[derive(Debug, Clone, Default)]
pub struct NaSaveOptions {
    /// Delimiter between data items; empty means four spaces.
    pub delimiter: String,
    /// Write only the data block.
    pub no_header: bool,
}

/// Adapter for NASA Ames FFI 1001 text files.
#[derive(Debug, Default)]
pub struct NasaAmes {
    na: Option<NaDict>,
    filename: Option<PathBuf>,
    perms: Perms,
}

impl NasaAmes {
    pub fn new() -> NasaAmes {
        NasaAmes::default()
    }

    /// Open a NASA Ames file. `w` starts from an empty in-memory
    /// dictionary; every other mode parses the existing file.
    pub fn open(path: &Path, perms: Perms) -> FileResult<NasaAmes> {
        let mut file = NasaAmes::new();
        file.open_path(path, perms)?;
        Ok(file)
    }

    pub fn open_path(&mut self, path: &Path, perms: Perms) -> FileResult<()> {
        self.close();
        let na = if perms == Perms::Write {
            NaDict::default()
        } else {
            let text = fs::read_to_string(path).map_err(|e| {
                error!(file = %path.display(), "cannot open NASA Ames file: {}", e);
                FileError::Io(e)
            })?;
            NaDict::parse(&text)?
        };
        self.na = Some(na);
        self.filename = Some(path.to_path_buf());
        self.perms = perms;
        debug!(file = %path.display(), perms = perms.as_str(), "NASA Ames file open");
        Ok(())
    }

    pub fn na_dict(&self) -> FileResult<&NaDict> {
        self.na.as_ref().ok_or(FileError::NoFileOpen)
    }

    pub fn na_dict_mut(&mut self) -> FileResult<&mut NaDict> {
        if !self.perms.writable() {
            return Err(FileError::ReadOnly(
                "NASA Ames dictionary mutation".to_string(),
            ));
        }
        self.na.as_mut().ok_or(FileError::NoFileOpen)
    }

    /// Replace the independent variable.
    pub fn write_independent(&mut self, data: &[f64], name: &str, units: &str) -> FileResult<()> {
        let na = self.na_dict_mut()?;
        na.xname = join_name_units(name, units);
        na.x = data.to_vec();
        Ok(())
    }

    /// Create or replace a dependent variable. The column length must
    /// match the independent axis when one is present.
    pub fn write_variable(
        &mut self,
        data: &[f64],
        name: &str,
        units: &str,
        fill: Option<f64>,
        scale: f64,
    ) -> FileResult<()> {
        let na = self.na_dict_mut()?;
        if !na.x.is_empty() && data.len() != na.x.len() {
            return Err(FileError::Format(format!(
                "variable '{}' carries {} values but the independent axis has {}",
                name,
                data.len(),
                na.x.len()
            )));
        }
        let composed = join_name_units(name, units);
        match na.variable_index(name) {
            Some(i) => {
                na.vname[i] = composed;
                na.vmiss[i] = fill;
                na.vscal[i] = scale;
                na.v[i] = data.to_vec();
            }
            None => {
                na.vname.push(composed);
                na.vmiss.push(fill);
                na.vscal.push(scale);
                na.v.push(data.to_vec());
            }
        }
        Ok(())
    }

    pub fn delete_variable(&mut self, name: &str) -> FileResult<()> {
        let na = self.na_dict_mut()?;
        let i = na
            .variable_index(name)
            .ok_or_else(|| FileError::not_found("variable", name))?;
        na.vname.remove(i);
        na.vmiss.remove(i);
        na.vscal.remove(i);
        na.v.remove(i);
        Ok(())
    }

    /// Write the in-memory dictionary out. With no path, the file it was
    /// opened from is rewritten.
    pub fn save(&mut self, path: Option<&Path>, opts: &NaSaveOptions) -> FileResult<()> {
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => {
                if !self.perms.writable() {
                    return Err(FileError::ReadOnly("NASA Ames save in place".to_string()));
                }
                self.filename.clone().ok_or(FileError::NoFileOpen)?
            }
        };
        let na = self.na.as_mut().ok_or(FileError::NoFileOpen)?;
        let text = na.serialize(&opts.delimiter, opts.no_header);
        fs::write(&target, text)?;
        debug!(file = %target.display(), nlhead = na.nlhead, "NASA Ames file saved");
        Ok(())
    }

    fn variable_attrs(&self, name: &str) -> FileResult<Metadata> {
        let na = self.na_dict()?;
        if name == na.x_name() {
            let (_, units) = split_name_units(&na.xname);
            let mut attrs = Metadata::new();
            attrs.insert("name", name);
            attrs.insert("units", units.unwrap_or_default());
            return Ok(attrs);
        }
        let i = na
            .variable_index(name)
            .ok_or_else(|| FileError::not_found("variable", name))?;
        let (_, units) = split_name_units(&na.vname[i]);
        let mut attrs = Metadata::new();
        attrs.insert("name", name);
        attrs.insert("units", units.unwrap_or_default());
        if let Some(miss) = na.vmiss[i] {
            attrs.insert("_FillValue", miss);
        }
        attrs.insert("scale_factor", na.vscal[i]);
        Ok(attrs)
    }
}

impl Container for NasaAmes {
    fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    fn perms(&self) -> Perms {
        self.perms
    }

    fn close(&mut self) {
        self.na = None;
        self.filename = None;
    }

    fn get_attribute_list(&self, target: Option<&str>) -> FileResult<Metadata> {
        match target {
            Some(name) => self.variable_attrs(name),
            None => {
                let na = self.na_dict()?;
                let mut attrs = Metadata::new();
                attrs.insert("NLHEAD", na.nlhead as i64);
                attrs.insert("FFI", na.ffi as i64);
                attrs.insert("ONAME", na.oname.clone());
                attrs.insert("ORG", na.org.clone());
                attrs.insert("SNAME", na.sname.clone());
                attrs.insert("MNAME", na.mname.clone());
                attrs.insert("IVOL", na.ivol as i64);
                attrs.insert("NVOL", na.nvol as i64);
                attrs.insert("DATE", AttrValue::Ints(na.date.iter().map(|&d| d as i64).collect()));
                attrs.insert("RDATE", AttrValue::Ints(na.rdate.iter().map(|&d| d as i64).collect()));
                attrs.insert("DX", na.dx);
                attrs.insert("NIV", 1i64);
                attrs.insert("XNAME", na.xname.clone());
                attrs.insert("NV", na.nv() as i64);
                attrs.insert(
                    "VSCAL",
                    AttrValue::Floats(na.vscal.clone()),
                );
                attrs.insert(
                    "VMISS",
                    AttrValue::Floats(
                        na.vmiss
                            .iter()
                            .map(|m| m.unwrap_or(f64::NAN))
                            .collect(),
                    ),
                );
                attrs.insert("VNAME", AttrValue::Strs(na.vname.clone()));
                attrs.insert("NSCOML", na.scom.len() as i64);
                attrs.insert("SCOM", AttrValue::Strs(na.scom.clone()));
                attrs.insert("NNCOML", na.ncom.len() as i64);
                attrs.insert("NCOM", AttrValue::Strs(na.ncom.clone()));
                attrs.insert("NX", na.nx() as i64);
                Ok(attrs)
            }
        }
    }

    fn add_attribute(
        &mut self,
        name: &str,
        value: &AttrValue,
        target: Option<&str>,
    ) -> FileResult<()> {
        match target {
            Some(var) => {
                let var = var.to_string();
                let na = self.na_dict_mut()?;
                let i = na
                    .variable_index(&var)
                    .ok_or_else(|| FileError::not_found("variable", var.clone()))?;
                match name {
                    "units" => {
                        let (vname, _) = split_name_units(&na.vname[i]);
                        na.vname[i] = join_name_units(&vname, &value.to_string());
                    }
                    "_FillValue" | "missing_value" => {
                        na.vmiss[i] = crate::model::attr_fill_value(value);
                    }
                    "scale_factor" => {
                        na.vscal[i] = crate::model::attr_fill_value(value).unwrap_or(1.0);
                    }
                    other => {
                        return Err(FileError::Unsupported(format!(
                            "NASA Ames variables carry only units, fill and scale; got '{}'",
                            other
                        )))
                    }
                }
                Ok(())
            }
            None => {
                let text = value.to_string();
                let na = self.na_dict_mut()?;
                match name {
                    "ONAME" => na.oname = text,
                    "ORG" => na.org = text,
                    "SNAME" => na.sname = text,
                    "MNAME" => na.mname = text,
                    "XNAME" => na.xname = text,
                    "DX" => na.dx = crate::model::attr_fill_value(value).unwrap_or(0.0),
                    "IVOL" => na.ivol = crate::model::attr_fill_value(value).unwrap_or(1.0) as u32,
                    "NVOL" => na.nvol = crate::model::attr_fill_value(value).unwrap_or(1.0) as u32,
                    "DATE" | "RDATE" => {
                        let parts = match value {
                            AttrValue::Ints(v) if v.len() == 3 => {
                                [v[0] as i32, v[1] as i32, v[2] as i32]
                            }
                            _ => {
                                return Err(FileError::Format(
                                    "DATE/RDATE must be a three-integer list".to_string(),
                                ))
                            }
                        };
                        if name == "DATE" {
                            na.date = parts;
                        } else {
                            na.rdate = parts;
                        }
                    }
                    "SCOM" => {
                        na.scom = match value {
                            AttrValue::Strs(v) => v.clone(),
                            other => vec![other.to_string()],
                        }
                    }
                    "NCOM" => {
                        na.ncom = match value {
                            AttrValue::Strs(v) => v.clone(),
                            other => vec![other.to_string()],
                        }
                    }
                    other => {
                        return Err(FileError::Unsupported(format!(
                            "'{}' is not a NASA Ames header keyword",
                            other
                        )))
                    }
                }
                Ok(())
            }
        }
    }

    fn delete_attribute(&mut self, name: &str, _target: Option<&str>) -> FileResult<()> {
        Err(FileError::Unsupported(format!(
            "NASA Ames header keywords cannot be deleted ('{}')",
            name
        )))
    }

    fn get_dimension_list(&self, target: Option<&str>) -> FileResult<Vec<(String, usize)>> {
        let na = self.na_dict()?;
        let dim = (na.x_name(), na.nx());
        match target {
            None => Ok(vec![dim]),
            Some(name) => {
                if name == na.x_name() || na.variable_index(name).is_some() {
                    Ok(vec![dim])
                } else {
                    Err(FileError::not_found("variable", name))
                }
            }
        }
    }

    fn get_variable_list(&self) -> FileResult<Vec<String>> {
        Ok(self.na_dict()?.variable_names())
    }

    fn read_variable(&self, name: &str, opts: &ReadOptions) -> FileResult<ArrayD<f64>> {
        let na = self.na_dict()?;
        let (column, fill) = if name == na.x_name() {
            (na.x.clone(), None)
        } else {
            let i = na
                .variable_index(name)
                .ok_or_else(|| FileError::not_found("variable", name))?;
            (na.v[i].clone(), na.vmiss[i])
        };

        let mut data = ArrayD::from_shape_vec(IxDyn(&[column.len()]), column)
            .map_err(|e| FileError::Format(e.to_string()))?;
        if let Some(range) = &opts.range {
            data = slice_range(data, range)?;
        }
        if opts.replace_fill {
            if let Some(fill) = fill {
                data = fill_to_nan(data, fill);
            }
        }
        Ok(data)
    }
}

/// Quantity-aware NASA Ames adapter: reads hydrate [`Quantity`] values
/// parented to the file's global metadata, writes dehydrate them.
#[derive(Debug, Default)]
pub struct AeroNasaAmes {
    inner: NasaAmes,
}

impl AeroNasaAmes {
    pub fn open(path: &Path, perms: Perms) -> FileResult<AeroNasaAmes> {
        Ok(AeroNasaAmes {
            inner: NasaAmes::open(path, perms)?,
        })
    }

    pub fn inner(&self) -> &NasaAmes {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut NasaAmes {
        &mut self.inner
    }

    /// Global metadata of the open file as a [`FileMetadata`] declared to
    /// follow the NASA Ames conventions.
    pub fn file_metadata(&self) -> FileResult<FileMetadata> {
        let attrs = self.inner.get_attribute_list(None)?;
        let filename = self
            .inner
            .filename()
            .and_then(|p| p.to_str())
            .map(|s| s.to_string());
        let mut md = FileMetadata::new(
            attrs.iter().map(|(k, v)| (k.to_string(), v.clone())),
            filename.as_deref(),
        );
        md.set_conventions(vec!["NASAAmes".to_string()]);
        Ok(md)
    }

    /// Read a dependent (or the independent) variable into a Quantity.
    pub fn read_variable(&self, name: &str, opts: &ReadOptions) -> FileResult<Quantity> {
        let data = self.inner.read_variable(name, opts)?;
        let attrs = self.inner.variable_attrs(name)?;
        let parent = self.file_metadata()?;
        crate::file::hydrate_quantity(data, attrs, Some(parent))
    }

    /// Write a Quantity as a dependent variable. The name is taken from
    /// the argument or, failing that, resolved from the metadata.
    pub fn write_variable(&mut self, data: &Quantity, name: Option<&str>) -> FileResult<()> {
        let name = crate::file::resolve_name(data, name)?;
        let units = data
            .metadata
            .get_str("units")
            .unwrap_or_else(|| data.units())
            .to_string();
        let fill = data
            .metadata
            .get("_FillValue")
            .or_else(|| data.metadata.get("missing_value"))
            .and_then(crate::model::attr_fill_value);
        let scale = data
            .metadata
            .get("scale_factor")
            .and_then(crate::model::attr_fill_value)
            .unwrap_or(1.0);
        let values: Vec<f64> = data.value().iter().copied().collect();
        self.inner
            .write_variable(&values, &name, &units, fill, scale)
    }

    pub fn save(&mut self, path: Option<&Path>, opts: &NaSaveOptions) -> FileResult<()> {
        self.inner.save(path, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        let mut na = NaDict {
            oname: "John Doe".to_string(),
            org: "EUFAR".to_string(),
            sname: "computer".to_string(),
            mname: "a test file".to_string(),
            date: [2017, 1, 1],
            rdate: [2017, 1, 2],
            dx: 1.0,
            xname: "time (days since 2017-01-01 00:00:00Z)".to_string(),
            vscal: vec![1.0],
            vmiss: vec![Some(-999.0)],
            vname: vec!["a common data (mm)".to_string()],
            ncom: vec!["a normal comment".to_string()],
            x: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            v: vec![vec![0.5, 2.3, 6.2, 8.1, 4.0]],
            ..NaDict::default()
        };
        na.serialize("", false)
    }

    #[test]
    fn test_split_name_units() {
        let (name, units) = split_name_units("a common data (mm)");
        assert_eq!(name, "a common data");
        assert_eq!(units.as_deref(), Some("mm"));

        let (name, units) = split_name_units("plain name");
        assert_eq!(name, "plain name");
        assert!(units.is_none());
    }

    #[test]
    fn test_parse_roundtrip() {
        let text = sample();
        let na = NaDict::parse(&text).unwrap();
        assert_eq!(na.oname, "John Doe");
        assert_eq!(na.org, "EUFAR");
        assert_eq!(na.date, [2017, 1, 1]);
        assert_eq!(na.nv(), 1);
        assert_eq!(na.nx(), 5);
        assert_eq!(na.v[0], vec![0.5, 2.3, 6.2, 8.1, 4.0]);
        assert_eq!(na.variable_names(), vec!["a common data"]);
    }

    #[test]
    fn test_nlhead_matches_header_lines() {
        let text = sample();
        let first: usize = text
            .lines()
            .next()
            .unwrap()
            .split_whitespace()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        let data_rows = 5;
        let total_lines = text.lines().count();
        assert_eq!(first, total_lines - data_rows);
    }

    #[test]
    fn test_empty_axis_saves_header_only() {
        let mut na = NaDict {
            xname: "time (s)".to_string(),
            ..NaDict::default()
        };
        let text = na.serialize("", false);
        assert_eq!(text.lines().count(), na.nlhead);
        // And it parses back.
        let parsed = NaDict::parse(&text).unwrap();
        assert_eq!(parsed.nx(), 0);
    }

    #[test]
    fn test_write_variable_length_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.na");
        std::fs::write(&path, sample()).unwrap();

        let mut file = NasaAmes::open(&path, Perms::ReadWrite).unwrap();
        let err = file.write_variable(&[1.0, 2.0], "short", "m", None, 1.0);
        assert!(err.is_err());

        file.write_variable(&[1.0; 5], "extra", "m", Some(-999.0), 1.0)
            .unwrap();
        file.save(None, &NaSaveOptions::default()).unwrap();

        let reopened = NasaAmes::open(&path, Perms::Read).unwrap();
        assert_eq!(
            reopened.get_variable_list().unwrap(),
            vec!["a common data", "extra"]
        );
    }

    #[test]
    fn test_read_variable_replace_fill() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fill.na");
        let mut na = NaDict {
            xname: "time (s)".to_string(),
            vscal: vec![1.0],
            vmiss: vec![Some(-999.0)],
            vname: vec!["data (mm)".to_string()],
            x: vec![0.0, 1.0],
            v: vec![vec![5.0, -999.0]],
            ..NaDict::default()
        };
        std::fs::write(&path, na.serialize("", false)).unwrap();

        let file = NasaAmes::open(&path, Perms::Read).unwrap();
        let data = file
            .read_variable("data", &ReadOptions::replacing_fill())
            .unwrap();
        assert_eq!(data[[0]], 5.0);
        assert!(data[[1]].is_nan());
    }

    #[test]
    fn test_aware_read_hydrates_quantity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aware.na");
        std::fs::write(&path, sample()).unwrap();

        let file = AeroNasaAmes::open(&path, Perms::Read).unwrap();
        let q = file
            .read_variable("a common data", &ReadOptions::all())
            .unwrap();
        assert_eq!(q.units(), "mm");
        assert_eq!(q.shape(), &[5]);
        assert_eq!(
            q.metadata.parent().unwrap().get_str("ORG"),
            Some("EUFAR")
        );
    }
}
