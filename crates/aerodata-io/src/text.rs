//! Generic text and delimited-column file access.
//!
//! [`TextFile`] is a thin positioned text handle; [`CsvFile`] reads and
//! writes delimited columns with optional `"<name> (<units>)"` headers,
//! the shape flight-test CSV exports usually take.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FileError, FileResult};
use crate::file::Perms;
use crate::nasa_ames::split_name_units;

/// Where a [`TextFile::seek`] offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    Beginning,
    Current,
    End,
}

/// A positioned text file handle.
#[derive(Debug, Default)]
pub struct TextFile {
    file: Option<File>,
    filename: Option<PathBuf>,
    perms: Perms,
}

impl TextFile {
    pub fn new() -> TextFile {
        TextFile::default()
    }

    pub fn open(path: &Path, perms: Perms) -> FileResult<TextFile> {
        let file = match perms {
            Perms::Read => OpenOptions::new().read(true).open(path)?,
            Perms::ReadWrite => OpenOptions::new().read(true).write(true).open(path)?,
            Perms::Append => OpenOptions::new()
                .read(true)
                .append(true)
                .create(true)
                .open(path)?,
            Perms::Write => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
        };
        debug!(file = %path.display(), perms = perms.as_str(), "text file open");
        Ok(TextFile {
            file: Some(file),
            filename: Some(path.to_path_buf()),
            perms,
        })
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn perms(&self) -> Perms {
        self.perms
    }

    pub fn close(&mut self) {
        self.file = None;
        self.filename = None;
    }

    fn handle(&mut self) -> FileResult<&mut File> {
        self.file.as_mut().ok_or(FileError::NoFileOpen)
    }

    /// Current position in the file.
    pub fn position(&mut self) -> FileResult<u64> {
        Ok(self.handle()?.stream_position()?)
    }

    /// Move the read/write position.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> FileResult<u64> {
        let pos = match origin {
            SeekOrigin::Beginning => SeekFrom::Start(offset.max(0) as u64),
            SeekOrigin::Current => SeekFrom::Current(offset),
            SeekOrigin::End => SeekFrom::End(offset),
        };
        Ok(self.handle()?.seek(pos)?)
    }

    /// Read `size` bytes, or the rest of the file.
    pub fn read(&mut self, size: Option<usize>) -> FileResult<String> {
        let file = self.handle()?;
        let mut out = String::new();
        match size {
            None => {
                file.read_to_string(&mut out)?;
            }
            Some(n) => {
                let mut buf = vec![0u8; n];
                let read = file.read(&mut buf)?;
                buf.truncate(read);
                out = String::from_utf8_lossy(&buf).into_owned();
            }
        }
        Ok(out)
    }

    /// Read one line, without its terminator. `None` at end of file.
    pub fn read_line(&mut self) -> FileResult<Option<String>> {
        let file = self.handle()?;
        let mut reader = BufReader::new(file.try_clone()?);
        let start = file.stream_position()?;
        reader.seek(SeekFrom::Start(start))?;

        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        file.seek(SeekFrom::Start(start + read as u64))?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Write text at the current position.
    pub fn write(&mut self, data: &str) -> FileResult<()> {
        if !self.perms.writable() {
            return Err(FileError::ReadOnly("text write".to_string()));
        }
        self.handle()?.write_all(data.as_bytes())?;
        Ok(())
    }
}

/// A delimited-column text file with an optional header row.
#[derive(Debug, Clone)]
pub struct CsvFile {
    pub delimiter: char,
    /// Column titles from the header row, when one was read or set.
    pub titles: Vec<String>,
    /// Column-major data.
    pub columns: Vec<Vec<String>>,
}

impl CsvFile {
    pub fn new(delimiter: char) -> CsvFile {
        CsvFile {
            delimiter,
            titles: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Read a delimited file; with `headers`, the first row supplies the
    /// column titles.
    pub fn read(path: &Path, delimiter: char, headers: bool) -> FileResult<CsvFile> {
        let text = std::fs::read_to_string(path)?;
        let mut out = CsvFile::new(delimiter);
        let mut lines = text.lines();

        if headers {
            if let Some(first) = lines.next() {
                out.titles = first
                    .split(delimiter)
                    .map(|t| t.trim().to_string())
                    .collect();
                out.columns = vec![Vec::new(); out.titles.len()];
            }
        }

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(delimiter).collect();
            if out.columns.is_empty() {
                out.columns = vec![Vec::new(); fields.len()];
            }
            if fields.len() != out.columns.len() {
                return Err(FileError::Format(format!(
                    "row carries {} fields, expected {}",
                    fields.len(),
                    out.columns.len()
                )));
            }
            for (column, field) in out.columns.iter_mut().zip(fields) {
                column.push(field.trim().to_string());
            }
        }
        Ok(out)
    }

    /// Write the columns out, with the header row when titles are set.
    pub fn write(&self, path: &Path) -> FileResult<()> {
        let mut out = String::new();
        let delim = self.delimiter.to_string();
        if !self.titles.is_empty() {
            out.push_str(&self.titles.join(&delim));
            out.push('\n');
        }
        let rows = self.columns.iter().map(|c| c.len()).max().unwrap_or(0);
        for row in 0..rows {
            let fields: Vec<&str> = self
                .columns
                .iter()
                .map(|c| c.get(row).map(|s| s.as_str()).unwrap_or(""))
                .collect();
            out.push_str(&fields.join(&delim));
            out.push('\n');
        }
        std::fs::write(path, out)?;
        Ok(())
    }

    /// A column by title (matching the parsed `"<name> (<units>)"` form)
    /// or by plain title text.
    pub fn column(&self, title: &str) -> FileResult<&[String]> {
        let index = self
            .titles
            .iter()
            .position(|t| t == title || split_name_units(t).0 == title)
            .ok_or_else(|| FileError::not_found("variable", title))?;
        self.columns
            .get(index)
            .map(|c| c.as_slice())
            .ok_or_else(|| FileError::not_found("variable", title))
    }

    /// A column parsed as numbers.
    pub fn numeric_column(&self, title: &str) -> FileResult<Vec<f64>> {
        self.column(title)?
            .iter()
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|_| FileError::Format(format!("non-numeric field '{}'", s)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_file_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");

        let mut file = TextFile::open(&path, Perms::Write).unwrap();
        file.write("line one\nline two\n").unwrap();
        file.seek(0, SeekOrigin::Beginning).unwrap();
        assert_eq!(file.read_line().unwrap().as_deref(), Some("line one"));
        assert_eq!(file.read_line().unwrap().as_deref(), Some("line two"));
        assert_eq!(file.read_line().unwrap(), None);
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");

        let mut csv = CsvFile::new(',');
        csv.titles = vec!["time (s)".to_string(), "alt (m)".to_string()];
        csv.columns = vec![
            vec!["0".to_string(), "1".to_string()],
            vec!["100.5".to_string(), "110.25".to_string()],
        ];
        csv.write(&path).unwrap();

        let read = CsvFile::read(&path, ',', true).unwrap();
        assert_eq!(read.titles, csv.titles);
        assert_eq!(read.numeric_column("alt").unwrap(), vec![100.5, 110.25]);
        assert_eq!(read.numeric_column("time (s)").unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_csv_ragged_row_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();
        assert!(CsvFile::read(&path, ',', true).is_err());
    }
}
