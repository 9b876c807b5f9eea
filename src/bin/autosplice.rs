//! CLI utility to splice WAV sources with SoX from an edit decision list.

use std::path::PathBuf;

use autobwf::bwf::BwfMetaEdit;
use autobwf::export::splice;
use autobwf::logging;
use time::OffsetDateTime;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(edl) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init("autosplice") {
        eprintln!("Logging disabled: {err}");
    }
    let text = std::fs::read_to_string(&edl)
        .map_err(|err| format!("Failed to read {}: {err}", edl.display()))?;
    let plan = splice::parse_edl(&text).map_err(|err| err.to_string())?;
    let tool = BwfMetaEdit::system(false);
    tool.ensure_installed().map_err(|err| err.to_string())?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let report = splice::run(&plan, &tool, std::path::Path::new("."), now)
        .map_err(|err| err.to_string())?;
    println!(
        "Wrote {} ({}); command in {}, SoX log in {}",
        report.output.display(),
        report.sox_version,
        report.command_file.display(),
        report.log_file.display()
    );
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<PathBuf>, String> {
    let mut edl = None;
    for arg in &args {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
            path => {
                if edl.is_some() {
                    return Err(format!("Only one EDL file may be given\n\n{}", help_text()));
                }
                edl = Some(PathBuf::from(path));
            }
        }
    }
    edl.map(Some)
        .ok_or_else(|| format!("An EDL file is required\n\n{}", help_text()))
}

fn help_text() -> String {
    [
        "autosplice",
        "",
        "Splices WAV sources into one file with SoX, following an edit decision list.",
        "",
        "Each line: <file.wav> [in out] [fade <in> <out>] [pad <start> <end>] [contrast <n>]",
        "Lines with in/out points are sources; the first line without them names the output.",
        "The SoX command and log are kept in autosplice<timestamp>.cmd/.out, and the output",
        "receives an MD5 digest, the command (ICMT) and the SoX version (ISFT).",
        "",
        "Usage:",
        "  autosplice <edl.txt>",
    ]
    .join("\n")
}
