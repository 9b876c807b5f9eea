//! CLI utility to encode MP3 access copies with ID3 tags from BWF metadata.

use std::path::PathBuf;

use autobwf::bwf::BwfMetaEdit;
use autobwf::config;
use autobwf::export::lame;
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
    if let Err(err) = logging::init("autolame") {
        eprintln!("Logging disabled: {err}");
    }
    let config = config::load_or_default().map_err(|err| err.to_string())?;
    let tool = BwfMetaEdit::system(config.accept_nopadding);
    tool.ensure_installed().map_err(|err| err.to_string())?;

    let report = lame::encode_files(
        &tool,
        &options.files,
        options.output.as_deref(),
        options.vbr_level,
    );
    for file in &report.processed {
        println!("Encoded {}", file.display());
    }
    for failure in &report.failures {
        eprintln!("{}: {}", failure.path.display(), failure.error);
    }
    if !report.is_success() {
        return Err(format!(
            "{} of {} file(s) failed",
            report.failures.len(),
            options.files.len()
        ));
    }
    Ok(())
}

struct Options {
    files: Vec<PathBuf>,
    output: Option<PathBuf>,
    vbr_level: u8,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options {
        files: Vec::new(),
        output: None,
        vbr_level: lame::DEFAULT_VBR_LEVEL,
    };
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
                options.output = Some(PathBuf::from(value));
            }
            "--vbr-level" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--vbr-level requires a value".to_string())?;
                options.vbr_level = value
                    .parse()
                    .map_err(|_| format!("--vbr-level expects a number, got {value}"))?;
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
            path => options.files.push(PathBuf::from(path)),
        }
        idx += 1;
    }
    if options.files.is_empty() {
        return Err(format!("At least one WAV file is required\n\n{}", help_text()));
    }
    if options.output.is_some() && options.files.len() > 1 {
        return Err("Can only have one input file if output file is specified.".to_string());
    }
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "autolame",
        "",
        "Uses lame to create MP3 files from BWF files, filling ID3v2 tags from the metadata.",
        "",
        "Usage:",
        "  autolame [-o out.mp3] [--vbr-level N] <file.wav>...",
        "",
        "Options:",
        "  -o <path>          Output file; only valid with a single input (default <stem>.mp3).",
        "  --vbr-level <n>    lame VBR level (default 7).",
        "  -h, --help         Show this help.",
    ]
    .join("\n")
}
