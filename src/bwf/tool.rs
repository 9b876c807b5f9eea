use std::ffi::OsString;
use std::io::Write;
use std::path::Path;

use super::csv_output::parse_first_row;
use super::fields::write_flag_name;
use super::metadata::{CoreMetadata, FileMetadata, TechMetadata, XmpMetadata};
use super::runner::{SystemRunner, ToolOutput, ToolRunner};
use super::xmp::{Sidecar, parse_packet, render_packet, sidecar_path};
use super::BwfError;

/// Program name of the BWFMetaEdit CLI.
pub const BWFMETAEDIT: &str = "bwfmetaedit";

/// Result of a single field write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The value matched what the file already holds; no call was made.
    Unchanged,
}

/// Adapter around the bwfmetaedit command line.
#[derive(Debug, Clone)]
pub struct BwfMetaEdit<R = SystemRunner> {
    runner: R,
    program: String,
    accept_nopadding: bool,
}

impl BwfMetaEdit<SystemRunner> {
    /// Adapter running the installed `bwfmetaedit`.
    pub fn system(accept_nopadding: bool) -> Self {
        Self::new(SystemRunner, accept_nopadding)
    }
}

impl<R: ToolRunner> BwfMetaEdit<R> {
    pub fn new(runner: R, accept_nopadding: bool) -> Self {
        Self {
            runner,
            program: BWFMETAEDIT.to_string(),
            accept_nopadding,
        }
    }

    /// Use a different executable name or path.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn accepts_nopadding(&self) -> bool {
        self.accept_nopadding
    }

    /// Fail with [`BwfError::ToolMissing`] unless the tool can be started.
    pub fn ensure_installed(&self) -> Result<(), BwfError> {
        self.runner
            .run(&self.program, &[OsString::from("--version")])
            .map(|_| ())
    }

    fn base_args(&self) -> Vec<OsString> {
        let mut args = vec![OsString::from("--specialchars")];
        if self.accept_nopadding {
            args.push(OsString::from("--accept-nopadding"));
        }
        args
    }

    fn invoke(&self, flags: &[OsString], path: &Path) -> Result<ToolOutput, BwfError> {
        let mut args = self.base_args();
        args.extend(flags.iter().cloned());
        args.push(path.as_os_str().to_os_string());
        let output = self.runner.run(&self.program, &args)?;
        if !output.success {
            return Err(BwfError::ToolFailed {
                program: self.program.clone(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Technical report, optionally verifying the stored MD5 digest.
    pub fn read_tech(&self, path: &Path, verify_digest: bool) -> Result<TechMetadata, BwfError> {
        let mut flags = vec![OsString::from("--out-tech")];
        if verify_digest {
            flags.push(OsString::from("--MD5-verify"));
        }
        let output = self.invoke(&flags, path)?;
        Ok(TechMetadata::new(parse_first_row(&output.stdout)?))
    }

    /// Confirm `path` is a readable Wave file and return its technical report.
    ///
    /// Works even when the file has no BWF chunk yet. A failing run or a
    /// non-empty `Errors` column is reported as [`BwfError::NotWave`].
    pub fn check_wave(&self, path: &Path) -> Result<TechMetadata, BwfError> {
        let tech = match self.read_tech(path, false) {
            Ok(tech) => tech,
            Err(BwfError::ToolFailed { stderr, .. }) => {
                return Err(BwfError::NotWave {
                    path: path.to_path_buf(),
                    reason: stderr,
                });
            }
            Err(err) => return Err(err),
        };
        if !tech.errors().is_empty() {
            return Err(BwfError::NotWave {
                path: path.to_path_buf(),
                reason: tech.errors().to_string(),
            });
        }
        Ok(tech)
    }

    pub fn read_core(&self, path: &Path) -> Result<CoreMetadata, BwfError> {
        let output = self.invoke(&[OsString::from("--out-core")], path)?;
        Ok(CoreMetadata::new(parse_first_row(&output.stdout)?))
    }

    /// XMP fields; all empty when the file has no XMP chunk.
    pub fn read_xmp(&self, path: &Path) -> Result<XmpMetadata, BwfError> {
        let sidecar = Sidecar::new(sidecar_path(path));
        self.invoke(&[OsString::from("--out-XMP-xml")], path)?;
        match sidecar.read()? {
            Some(text) if !text.trim().is_empty() => parse_packet(&text),
            _ => Ok(XmpMetadata::default()),
        }
    }

    /// Validate and read everything the form needs from `path`.
    pub fn load(&self, path: &Path) -> Result<FileMetadata, BwfError> {
        let tech = self.check_wave(path)?;
        let core = self.read_core(path)?;
        let xmp = self.read_xmp(path)?;
        tracing::debug!("Loaded metadata from {}", path.display());
        Ok(FileMetadata {
            path: path.to_path_buf(),
            tech,
            core,
            xmp,
        })
    }

    /// Write one core/INFO value, skipping the call when it equals `original`.
    ///
    /// `key` is the name the field is read under; the write flag is remapped
    /// where bwfmetaedit uses a different name.
    pub fn write_field(
        &self,
        path: &Path,
        key: &str,
        value: &str,
        original: &str,
    ) -> Result<WriteOutcome, BwfError> {
        if value == original {
            tracing::debug!("Skipping {key}: value unchanged");
            return Ok(WriteOutcome::Unchanged);
        }
        let flag = format!("--{}={value}", write_flag_name(key));
        tracing::info!("Writing {key} to {}", path.display());
        self.invoke(&[OsString::from(flag)], path)?;
        Ok(WriteOutcome::Written)
    }

    /// Compute and store an MD5 digest of the data chunk.
    pub fn embed_digest(&self, path: &Path) -> Result<(), BwfError> {
        tracing::info!("Embedding MD5 digest in {}", path.display());
        self.invoke(&[OsString::from("--MD5-embed")], path)?;
        Ok(())
    }

    /// Replace the XMP chunk with `fields` stamped with `metadata_date`.
    ///
    /// The packet goes through a temporary file that is deleted afterwards.
    pub fn write_xmp(
        &self,
        path: &Path,
        fields: &XmpMetadata,
        metadata_date: &str,
    ) -> Result<(), BwfError> {
        let packet = render_packet(fields, metadata_date)?;
        let mut file = tempfile::Builder::new()
            .prefix("autobwf-xmp-")
            .suffix(".xml")
            .tempfile()?;
        file.write_all(packet.as_bytes())?;
        file.flush()?;
        let mut flag = OsString::from("--in-XMP=");
        flag.push(file.path().as_os_str());
        tracing::info!("Writing XMP packet to {}", path.display());
        self.invoke(&[flag], path)?;
        Ok(())
    }
}
