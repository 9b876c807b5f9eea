//! In-memory stand-in for the bwfmetaedit CLI (plus `lame` and `sox`).

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use autobwf::bwf::xmp::sidecar_path;
use autobwf::bwf::{BWFMETAEDIT, BwfError, ToolOutput, ToolRunner};

pub const STORED_DIGEST: &str = "0123456789abcdef0123456789abcdef";

#[derive(Debug, Clone, Default)]
struct FakeFile {
    core: BTreeMap<String, String>,
    tech: BTreeMap<String, String>,
    xmp_packet: Option<String>,
}

#[derive(Default)]
struct FakeState {
    files: BTreeMap<PathBuf, FakeFile>,
    calls: Vec<(String, Vec<String>)>,
    failing_flags: BTreeSet<String>,
}

/// Serves CSV reports from stored fields and applies `--Field=value` writes.
#[derive(Default)]
pub struct FakeTool {
    state: RefCell<FakeState>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stereo 96 kHz/24-bit file with the given core and tech values.
    pub fn add_file(&self, path: &Path, core: &[(&str, &str)], tech: &[(&str, &str)]) {
        let mut file = FakeFile::default();
        for (key, value) in [
            ("SampleRate", "96000"),
            ("BitPerSample", "24"),
            ("Channels", "2"),
            ("Duration", "00:01:00.000"),
            ("Errors", ""),
            ("MD5Stored", ""),
        ] {
            file.tech.insert(key.to_string(), value.to_string());
        }
        for (key, value) in tech {
            file.tech.insert(key.to_string(), value.to_string());
        }
        for (key, value) in core {
            file.core.insert(key.to_string(), value.to_string());
        }
        self.state.borrow_mut().files.insert(path.to_path_buf(), file);
    }

    /// Make writes through `flag` (e.g. `ICOP`) fail.
    pub fn fail_writes_to(&self, flag: &str) {
        self.state
            .borrow_mut()
            .failing_flags
            .insert(flag.to_string());
    }

    pub fn core_value(&self, path: &Path, key: &str) -> String {
        self.state.borrow().files[path]
            .core
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn xmp_packet(&self, path: &Path) -> Option<String> {
        self.state.borrow().files[path].xmp_packet.clone()
    }

    /// Every invocation as `(program, args)`.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.state.borrow().calls.clone()
    }

    /// Operation flags of bwfmetaedit calls, without the shared flags and path.
    pub fn operations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(program, _)| program == BWFMETAEDIT)
            .filter_map(|(_, args)| {
                args.into_iter()
                    .filter(|arg| arg.starts_with("--"))
                    .find(|arg| arg != "--specialchars" && arg != "--accept-nopadding")
            })
            .collect()
    }

    /// Field writes (`--Name=value`) in call order, XMP excluded.
    pub fn field_writes(&self) -> Vec<String> {
        self.operations()
            .into_iter()
            .filter(|op| op.contains('=') && !op.starts_with("--in-XMP="))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn bwfmetaedit(&self, args: &[String]) -> ToolOutput {
        let Some(path) = args.last().map(PathBuf::from) else {
            return ToolOutput::failed(1, "no file given");
        };
        let flags: Vec<&str> = args[..args.len() - 1]
            .iter()
            .map(String::as_str)
            .filter(|flag| *flag != "--specialchars" && *flag != "--accept-nopadding")
            .collect();
        let mut state = self.state.borrow_mut();
        let failing = state.failing_flags.clone();
        let Some(file) = state.files.get_mut(&path) else {
            return ToolOutput::failed(1, format!("{}: not a RIFF file", path.display()));
        };

        match flags.first().copied() {
            Some("--out-tech") => {
                let mut tech = file.tech.clone();
                if flags.contains(&"--MD5-verify") {
                    let stored = tech.get("MD5Stored").cloned().unwrap_or_default();
                    tech.insert("MD5Generated".to_string(), stored);
                }
                ToolOutput::ok(report(&path, &tech))
            }
            Some("--out-core") => ToolOutput::ok(report(&path, &file.core)),
            Some("--out-XMP-xml") => {
                if let Some(packet) = &file.xmp_packet {
                    std::fs::write(sidecar_path(&path), packet).expect("write XMP sidecar");
                }
                ToolOutput::ok("")
            }
            Some("--MD5-embed") => {
                file.tech
                    .insert("MD5Stored".to_string(), STORED_DIGEST.to_string());
                ToolOutput::ok("")
            }
            Some(flag) if flag.starts_with("--in-XMP=") => {
                let packet_path = &flag["--in-XMP=".len()..];
                match std::fs::read_to_string(packet_path) {
                    Ok(packet) => {
                        file.xmp_packet = Some(packet);
                        ToolOutput::ok("")
                    }
                    Err(err) => ToolOutput::failed(1, err.to_string()),
                }
            }
            Some(flag) => {
                let Some((name, value)) = flag[2..].split_once('=') else {
                    return ToolOutput::failed(1, format!("unknown option {flag}"));
                };
                if failing.contains(name) {
                    return ToolOutput::failed(2, format!("cannot write {name}"));
                }
                let key = match name {
                    "History" => "CodingHistory",
                    "Timereference" => "TimeReference",
                    other => other,
                };
                file.core.insert(key.to_string(), value.to_string());
                ToolOutput::ok("")
            }
            None => ToolOutput::failed(1, "no operation"),
        }
    }
}

fn report(path: &Path, values: &BTreeMap<String, String>) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["FileName".to_string()];
    header.extend(values.keys().cloned());
    let mut row = vec![path.display().to_string()];
    row.extend(values.values().cloned());
    writer.write_record(&header).expect("write header");
    writer.write_record(&row).expect("write row");
    String::from_utf8(writer.into_inner().expect("flush csv")).expect("utf-8 csv")
}

impl ToolRunner for FakeTool {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, BwfError> {
        let args: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        self.state
            .borrow_mut()
            .calls
            .push((program.to_string(), args.clone()));
        Ok(match program {
            BWFMETAEDIT if args == ["--version"] => ToolOutput::ok("BWF MetaEdit 21.07"),
            BWFMETAEDIT => self.bwfmetaedit(&args),
            "sox" if args == ["--version"] => ToolOutput::ok("sox:      SoX v14.4.2\n"),
            "sox" | "lame" => ToolOutput::ok(""),
            other => {
                return Err(BwfError::ToolMissing {
                    program: other.to_string(),
                });
            }
        })
    }
}
