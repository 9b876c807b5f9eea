//! MP3 access copies encoded by `lame`, tagged from the BWF metadata.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::bwf::{BwfMetaEdit, Field, FileMetadata, ToolRunner};

use super::{BatchReport, ExportError, sibling_path};

pub const LAME: &str = "lame";
pub const DEFAULT_VBR_LEVEL: u8 = 7;

/// Arguments for encoding `input` to `output` with ID3v2 tags.
///
/// Empty values are left out, except the language tag which is always set.
pub fn arguments(input: &Path, output: &Path, metadata: &FileMetadata, vbr_level: u8) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-V".into(), vbr_level.to_string().into(), "--vbr-new".into()];
    let mut tag = |frame: &str, value: &str| {
        if !value.is_empty() {
            args.push("--tv".into());
            args.push(format!("{frame}={value}").into());
        }
    };
    tag("TIT2", metadata.value(Field::Title));
    tag("TOWN", metadata.value(Field::ArchivalLocation));
    tag("TCOP", metadata.value(Field::Copyright));
    tag("TIT1", metadata.value(Field::Source));
    tag("TIT3", file_content(metadata.value(Field::Description)));

    let year = metadata.value(Field::CreationDate);
    if !year.is_empty() {
        args.push("--ty".into());
        args.push(year.into());
    }
    args.push("--tv".into());
    args.push(format!("TLAN={}", metadata.value(Field::Language)).into());
    args.push("--id3v2-only".into());
    args.push(input.as_os_str().to_os_string());
    args.push(output.as_os_str().to_os_string());
    args
}

/// The `File content:` entry of a Description, even when the rest of the
/// convention is missing.
fn file_content(description: &str) -> &str {
    static FILE_CONTENT: OnceLock<Regex> = OnceLock::new();
    let pattern = FILE_CONTENT
        .get_or_init(|| Regex::new(r"File content: +(.+?);").expect("file content regex must compile"));
    pattern
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map_or("", |content| content.as_str())
}

/// Run `lame` on the file behind `metadata`.
pub fn encode<R: ToolRunner>(
    runner: &R,
    metadata: &FileMetadata,
    output: &Path,
    vbr_level: u8,
) -> Result<(), ExportError> {
    let args = arguments(&metadata.path, output, metadata, vbr_level);
    tracing::info!("Encoding {} to {}", metadata.path.display(), output.display());
    let result = runner.run(LAME, &args)?;
    if !result.success {
        return Err(ExportError::ToolFailed {
            program: LAME.to_string(),
            code: result.code,
            stderr: result.stderr.trim().to_string(),
        });
    }
    Ok(())
}

/// Encode every file, to `output` when given (single input) or next to
/// each input. A file that fails is reported and skipped.
pub fn encode_files<R: ToolRunner>(
    tool: &BwfMetaEdit<R>,
    files: &[PathBuf],
    output: Option<&Path>,
    vbr_level: u8,
) -> BatchReport {
    let mut report = BatchReport::default();
    for file in files {
        let target = output.map_or_else(|| sibling_path(file, ".mp3"), Path::to_path_buf);
        let result = tool
            .load(file)
            .map_err(ExportError::from)
            .and_then(|metadata| encode(tool.runner(), &metadata, &target, vbr_level));
        report.record(file, result);
    }
    report
}
