//! Spreadsheet rows of file metadata, one row per file.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::bwf::{BwfMetaEdit, FileMetadata, ToolRunner};

use super::{BatchReport, ExportError};

/// Columns written for every file.
pub const COLUMNS: [&str; 22] = [
    "OriginalFilename",
    "FileContent",
    "FileUse",
    "INAM",
    "ICRD",
    "form",
    "Duration",
    "language",
    "ISRC",
    "creator",
    "xmp_description",
    "interviewer",
    "interviewee",
    "host",
    "speaker",
    "performer",
    "topics",
    "names",
    "events",
    "places",
    "owner",
    "ICOP",
];

/// Extra columns when digests are verified.
pub const DIGEST_COLUMNS: [&str; 3] = ["MD5Stored", "MD5Generated", "Errors"];

pub fn columns(with_digest: bool) -> Vec<&'static str> {
    let mut columns = COLUMNS.to_vec();
    if with_digest {
        columns.extend(DIGEST_COLUMNS);
    }
    columns
}

/// Streams rows to a CSV destination.
pub struct RowWriter<W: Write> {
    writer: csv::Writer<W>,
    columns: Vec<&'static str>,
}

impl<W: Write> RowWriter<W> {
    /// Start a table, writing the header unless appending to existing rows.
    pub fn new(inner: W, columns: Vec<&'static str>, header: bool) -> Result<Self, ExportError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        if header {
            writer.write_record(&columns)?;
        }
        Ok(Self { writer, columns })
    }

    pub fn write(&mut self, metadata: &FileMetadata) -> Result<(), ExportError> {
        let row: Vec<String> = self
            .columns
            .iter()
            .map(|column| metadata.lookup(column))
            .collect();
        self.writer.write_record(&row)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), ExportError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl RowWriter<Box<dyn Write>> {
    /// Rows for `path`, or stdout when `None`.
    ///
    /// An existing file is assumed to hold earlier rows and is appended to
    /// without a header.
    pub fn open(path: Option<&Path>, columns: Vec<&'static str>) -> Result<Self, ExportError> {
        let Some(path) = path else {
            return Self::new(Box::new(io::stdout()), columns, true);
        };
        let exists = path.is_file();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ExportError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(Box::new(file), columns, !exists)
    }
}

/// Metadata for one row; `digest` re-reads the technical columns with MD5
/// verification.
pub fn read_row<R: ToolRunner>(
    tool: &BwfMetaEdit<R>,
    file: &Path,
    digest: bool,
) -> Result<FileMetadata, ExportError> {
    let mut metadata = tool.load(file)?;
    if digest {
        metadata.tech = tool.read_tech(file, true)?;
    }
    Ok(metadata)
}

/// Write one row per file. A file that cannot be read is reported and
/// skipped.
pub fn write_rows<R: ToolRunner, W: Write>(
    tool: &BwfMetaEdit<R>,
    files: &[PathBuf],
    digest: bool,
    writer: &mut RowWriter<W>,
) -> BatchReport {
    let mut report = BatchReport::default();
    for file in files {
        let result = read_row(tool, file, digest).and_then(|metadata| writer.write(&metadata));
        report.record(file, result);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bwf::{CoreMetadata, Field, TechMetadata, XmpMetadata};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn sample() -> FileMetadata {
        let mut core = BTreeMap::new();
        core.insert(
            "Description".to_string(),
            "File content: X1; File use: Production Master; Original filename: x.wav".to_string(),
        );
        core.insert("INAM".to_string(), "Talk, part 1".to_string());
        let mut tech = BTreeMap::new();
        tech.insert("Duration".to_string(), "00:10:00.000".to_string());
        tech.insert("MD5Stored".to_string(), "abc".to_string());
        let mut xmp = XmpMetadata::default();
        xmp.set(Field::Language, "English");
        FileMetadata {
            path: PathBuf::from("x.wav"),
            tech: TechMetadata::new(tech),
            core: CoreMetadata::new(core),
            xmp,
        }
    }

    #[test]
    fn rows_follow_column_order() {
        let mut out = Vec::new();
        {
            let mut writer = RowWriter::new(&mut out, columns(false), true).unwrap();
            writer.write(&sample()).unwrap();
            writer.finish().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("OriginalFilename,FileContent,FileUse,INAM"));
        assert_eq!(
            lines.next().unwrap(),
            "x.wav,X1,Production Master,\"Talk, part 1\",,,00:10:00.000,English,,,,,,,,,,,,,,"
        );
    }

    #[test]
    fn existing_file_is_appended_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        for _ in 0..2 {
            let mut writer = RowWriter::open(Some(&path), columns(true)).unwrap();
            writer.write(&sample()).unwrap();
            writer.finish().unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.matches("OriginalFilename").count(), 1);
        assert!(text.lines().nth(1).unwrap().ends_with(",abc,,"));
    }
}
