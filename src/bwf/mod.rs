//! Metadata I/O through the FADGI BWFMetaEdit command-line tool.
//!
//! Reading runs `--out-tech`, `--out-core` and `--out-XMP-xml` and parses the
//! CSV/XML reports into [`FileMetadata`]. Writing issues one `--<Field>=<value>`
//! call per changed field, plus `--in-XMP` for the XMP packet.

mod csv_output;
pub mod fields;
pub mod metadata;
mod runner;
mod tool;
pub mod xmp;

use std::path::PathBuf;

pub use fields::{Field, FieldGroup, UnknownField, write_flag_name};
pub use metadata::{CoreMetadata, DescriptionParts, FileMetadata, TechMetadata, XmpMetadata};
pub use runner::{SystemRunner, ToolOutput, ToolRunner};
pub use tool::{BWFMETAEDIT, BwfMetaEdit, WriteOutcome};

/// Errors raised while running or interpreting bwfmetaedit.
#[derive(Debug, thiserror::Error)]
pub enum BwfError {
    /// The external tool is not installed or not on `PATH`.
    #[error("'{program}' was not found. {}", install_hint(.program))]
    ToolMissing { program: String },
    /// The tool could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// The tool ran but exited unsuccessfully.
    #[error("{program} exited with status {code:?}: {stderr}")]
    ToolFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    /// The technical report flags the file as unreadable.
    #[error("{} does not appear to be a valid Wave file: {reason}", .path.display())]
    NotWave { path: PathBuf, reason: String },
    /// A report had a header but no data row.
    #[error("bwfmetaedit produced an empty report")]
    EmptyReport,
    #[error("Malformed CSV report: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed XMP packet: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Reading the XMP sidecar failed.
    #[error("Failed to read XMP sidecar {}: {source}", .path.display())]
    Sidecar {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn install_hint(program: &str) -> &'static str {
    match program {
        BWFMETAEDIT => {
            "Install the BWFMetaEdit CLI from https://mediaarea.net/BWFMetaEdit/Download (the CLI is separate from the GUI)"
        }
        "sox" => {
            "SoX v14.4.2 or higher is required; install it from http://sox.sourceforge.net or your package manager"
        }
        "lame" => "Install LAME from https://lame.sourceforge.io or your package manager",
        _ => "Check that it is installed and on PATH",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_message_names_install_source() {
        let err = BwfError::ToolMissing {
            program: BWFMETAEDIT.to_string(),
        };
        assert!(err.to_string().contains("mediaarea.net"));
        let err = BwfError::ToolMissing {
            program: "sox".to_string(),
        };
        assert!(err.to_string().starts_with("'sox' was not found. SoX v14.4.2"));
    }
}
