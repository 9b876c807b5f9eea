//! Splicing edits described in an edit decision list (EDL) with SoX.
//!
//! Each EDL line starts with a `.wav` file name. Lines with an in and an out
//! point are sources; the first line without them names the output and ends
//! the list:
//!
//! ```text
//! side_a.wav 0 1:02.5 fade 0.5 1
//! side_b.wav 3.2 44:10 pad 0 2
//! tape_pres_20200102.wav contrast 20
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::bwf::{BwfError, BwfMetaEdit, ToolRunner};

pub const SOX: &str = "sox";

/// Errors raised while splicing.
#[derive(Debug, thiserror::Error)]
pub enum SpliceError {
    /// Tokens left over after parsing a line.
    #[error("Syntax error in EDL line {line}: {text}")]
    Syntax { line: usize, text: String },
    /// No line names the output file.
    #[error("EDL has no output line")]
    NoOutput,
    /// SoX ran but failed.
    #[error("sox exited with status {code:?}: {stderr}")]
    SoxFailed { code: Option<i32>, stderr: String },
    #[error(transparent)]
    Bwf(#[from] BwfError),
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One parsed EDL line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edit {
    pub file: String,
    /// In and out points.
    pub range: Option<(String, String)>,
    /// Fade-in length and fade-out length.
    pub fade: Option<(String, String)>,
    /// Silence added at the start and the end.
    pub pad: Option<(String, String)>,
    pub contrast: Option<String>,
}

fn take_pair(line: &mut String, pattern: &Regex) -> Option<(String, String)> {
    let (range, pair) = {
        let caps = pattern.captures(line)?;
        let whole = caps.get(0)?.range();
        (whole, (caps[1].to_string(), caps[2].to_string()))
    };
    line.replace_range(range, "");
    Some(pair)
}

/// Parse one line; `Ok(None)` for lines that do not start with a file name.
pub fn parse_line(line: &str, number: usize) -> Result<Option<Edit>, SpliceError> {
    static FILE: OnceLock<Regex> = OnceLock::new();
    static FADE: OnceLock<Regex> = OnceLock::new();
    static PAD: OnceLock<Regex> = OnceLock::new();
    static CONTRAST: OnceLock<Regex> = OnceLock::new();
    static RANGE: OnceLock<Regex> = OnceLock::new();
    let file = FILE.get_or_init(|| Regex::new(r"(?i)^\S+\.wav").expect("file regex must compile"));
    let fade =
        FADE.get_or_init(|| Regex::new(r"fade (\S+) (\S+)").expect("fade regex must compile"));
    let pad = PAD.get_or_init(|| Regex::new(r"pad (\S+) (\S+)").expect("pad regex must compile"));
    let contrast = CONTRAST
        .get_or_init(|| Regex::new(r"contrast (\S+)").expect("contrast regex must compile"));
    let range =
        RANGE.get_or_init(|| Regex::new(r"\s*(\S+)\s+(\S+)").expect("range regex must compile"));

    let Some(name) = file.find(line) else {
        return Ok(None);
    };
    let mut edit = Edit {
        file: name.as_str().to_string(),
        ..Edit::default()
    };
    let mut rest = line[name.end()..].to_string();
    edit.fade = take_pair(&mut rest, fade);
    edit.pad = take_pair(&mut rest, pad);
    if let Some(caps) = contrast.captures(&rest) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
        edit.contrast = Some(caps[1].to_string());
        rest.replace_range(whole, "");
    }
    edit.range = take_pair(&mut rest, range);
    if !rest.trim().is_empty() {
        return Err(SpliceError::Syntax {
            line: number,
            text: line.trim_end().to_string(),
        });
    }
    Ok(Some(edit))
}

/// Sources and output of an EDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplicePlan {
    pub sources: Vec<Edit>,
    pub output: Edit,
}

/// Parse an EDL, stopping at the output line.
pub fn parse_edl(text: &str) -> Result<SplicePlan, SpliceError> {
    let mut sources = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let Some(edit) = parse_line(line, idx + 1)? else {
            continue;
        };
        if edit.range.is_some() {
            sources.push(edit);
        } else {
            return Ok(SplicePlan {
                sources,
                output: edit,
            });
        }
    }
    Err(SpliceError::NoOutput)
}

impl Edit {
    /// SoX pipe input producing the trimmed, faded and padded source.
    fn pipe_input(&self) -> String {
        let mut input = format!("|sox {} -t wav -", self.file);
        if let Some((start, end)) = &self.range {
            input.push_str(&format!(" trim {start} ={end}"));
        }
        if let Some((fade_in, fade_out)) = &self.fade {
            input.push_str(&format!(" fade {fade_in} -0 {fade_out}"));
        }
        if let Some((before, after)) = &self.pad {
            input.push_str(&format!(" pad {before} {after}"));
        }
        input
    }
}

impl SplicePlan {
    /// Arguments of the top-level `sox` invocation.
    pub fn sox_arguments(&self) -> Vec<String> {
        let mut args = vec!["-V6".to_string()];
        args.extend(self.sources.iter().map(Edit::pipe_input));
        args.push(self.output.file.clone());
        if let Some(level) = &self.output.contrast {
            args.push("contrast".to_string());
            args.push(level.clone());
        }
        args
    }

    /// Shell-style rendering, stored alongside the output for the record.
    pub fn command_line(&self) -> String {
        let mut parts = vec![SOX.to_string()];
        for arg in self.sox_arguments() {
            if arg.starts_with('|') {
                parts.push(format!("\"| {}\"", &arg[1..]));
            } else {
                parts.push(arg);
            }
        }
        parts.join(" ")
    }
}

/// Files written by a splice run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceReport {
    pub output: PathBuf,
    pub command_file: PathBuf,
    pub log_file: PathBuf,
    pub sox_version: String,
}

/// `autosplice<timestamp>`, the stem of the `.cmd`/`.out` record files.
pub fn record_stem(now: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]T[hour][minute][second]");
    let stamp = now
        .format(format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("autosplice{stamp}")
}

fn write(path: PathBuf, contents: &[u8]) -> Result<PathBuf, SpliceError> {
    fs::write(&path, contents).map_err(|source| SpliceError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Run the splice, then embed an MD5 digest, the command (`ICMT`) and the
/// SoX version (`ISFT`) in the output.
///
/// Record files go to `record_dir`; relative file names in the plan resolve
/// against the current directory.
pub fn run<R: ToolRunner>(
    plan: &SplicePlan,
    tool: &BwfMetaEdit<R>,
    record_dir: &Path,
    now: OffsetDateTime,
) -> Result<SpliceReport, SpliceError> {
    let command = plan.command_line();
    let stem = record_stem(now);
    let command_file = write(record_dir.join(format!("{stem}.cmd")), command.as_bytes())?;

    let args: Vec<OsString> = plan.sox_arguments().into_iter().map(OsString::from).collect();
    tracing::info!("Splicing {} source(s) into {}", plan.sources.len(), plan.output.file);
    let result = tool.runner().run(SOX, &args)?;
    let log_file = write(record_dir.join(format!("{stem}.out")), result.stderr.as_bytes())?;
    if !result.success {
        return Err(SpliceError::SoxFailed {
            code: result.code,
            stderr: result.stderr.trim().to_string(),
        });
    }

    let output = PathBuf::from(&plan.output.file);
    tool.embed_digest(&output)?;
    tool.write_field(&output, "ICMT", &command, "")?;
    let version = sox_version(tool.runner())?;
    tool.write_field(&output, "ISFT", &version, "")?;
    Ok(SpliceReport {
        output,
        command_file,
        log_file,
        sox_version: version,
    })
}

fn sox_version<R: ToolRunner>(runner: &R) -> Result<String, SpliceError> {
    let output = runner.run(SOX, &[OsString::from("--version")])?;
    let text = output.stdout.trim();
    let version = text
        .strip_prefix("sox:")
        .map(str::trim_start)
        .unwrap_or(text);
    Ok(version.to_string())
}
