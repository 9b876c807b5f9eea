//! CLI utility to describe a BWF file as a PBCore XML document.

use std::path::PathBuf;

use autobwf::bwf::BwfMetaEdit;
use autobwf::config;
use autobwf::export::{pbcore, sibling_path};
use autobwf::logging;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init("bwf2pbcore") {
        eprintln!("Logging disabled: {err}");
    }
    let config = config::load_or_default().map_err(|err| err.to_string())?;
    let tool = BwfMetaEdit::system(config.accept_nopadding);
    tool.ensure_installed().map_err(|err| err.to_string())?;

    let metadata = tool.load(&options.file).map_err(|err| err.to_string())?;
    let output = options
        .output
        .unwrap_or_else(|| sibling_path(&options.file, "_pbcore.xml"));
    pbcore::write_file(&output, &metadata).map_err(|err| err.to_string())?;
    println!("Wrote {}", output.display());
    Ok(())
}

struct Options {
    file: PathBuf,
    output: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut file = None;
    let mut output = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "-o" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "-o requires a value".to_string())?;
                output = Some(PathBuf::from(value));
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
            path => {
                if file.is_some() {
                    return Err(format!("Only one WAV file may be given\n\n{}", help_text()));
                }
                file = Some(PathBuf::from(path));
            }
        }
        idx += 1;
    }
    let file = file.ok_or_else(|| format!("A WAV file is required\n\n{}", help_text()))?;
    Ok(Some(Options { file, output }))
}

fn help_text() -> String {
    [
        "bwf2pbcore",
        "",
        "Creates a PBCore XML description from the BWF and XMP metadata of a file.",
        "",
        "Usage:",
        "  bwf2pbcore [-o out.xml] <file.wav>",
        "",
        "Options:",
        "  -o <path>   Output file (default <stem>_pbcore.xml).",
        "  -h, --help  Show this help.",
    ]
    .join("\n")
}
