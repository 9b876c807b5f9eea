//! Seam between the adapters and the external command-line tools.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::process::Command;

use super::BwfError;

/// Captured result of one external tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed run with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs external programs synchronously.
///
/// Implementations must report a program that cannot be found as
/// [`BwfError::ToolMissing`] and must not treat a non-zero exit as an error;
/// callers inspect [`ToolOutput::success`].
pub trait ToolRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, BwfError>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, BwfError> {
        (**self).run(program, args)
    }
}

/// Runs tools as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, BwfError> {
        tracing::debug!(program, ?args, "Running external tool");
        let output = Command::new(program).args(args).output().map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                BwfError::ToolMissing {
                    program: program.to_string(),
                }
            } else {
                BwfError::Spawn {
                    program: program.to_string(),
                    source,
                }
            }
        })?;
        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_reported_as_tool_missing() {
        let err = SystemRunner
            .run("autobwf-definitely-not-installed", &[])
            .unwrap_err();
        assert!(matches!(err, BwfError::ToolMissing { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_exit_status() {
        let output = SystemRunner
            .run("sh", &["-c".into(), "printf hello; exit 3".into()])
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "hello");
    }
}
