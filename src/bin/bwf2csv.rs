//! CLI utility to tabulate BWF and XMP metadata of WAV files as CSV.

use std::path::PathBuf;

use autobwf::bwf::BwfMetaEdit;
use autobwf::config;
use autobwf::export::csv_rows::{self, RowWriter};
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
    if let Err(err) = logging::init("bwf2csv") {
        eprintln!("Logging disabled: {err}");
    }
    let config = config::load_or_default().map_err(|err| err.to_string())?;
    let tool = BwfMetaEdit::system(config.accept_nopadding);
    tool.ensure_installed().map_err(|err| err.to_string())?;

    let columns = csv_rows::columns(options.digest);
    let mut writer =
        RowWriter::open(options.output.as_deref(), columns).map_err(|err| err.to_string())?;
    let report = csv_rows::write_rows(&tool, &options.files, options.digest, &mut writer);
    writer.finish().map_err(|err| err.to_string())?;
    for failure in &report.failures {
        eprintln!("{}: {}", failure.path.display(), failure.error);
    }
    if !report.is_success() {
        return Err(format!(
            "{} of {} file(s) could not be read",
            report.failures.len(),
            options.files.len()
        ));
    }
    Ok(())
}

#[derive(Default)]
struct Options {
    digest: bool,
    output: Option<PathBuf>,
    files: Vec<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--digest" => options.digest = true,
            "-o" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "-o requires a value".to_string())?;
                options.output = Some(PathBuf::from(value));
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
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "bwf2csv",
        "",
        "Extracts metadata from BWF files into CSV rows.",
        "",
        "Usage:",
        "  bwf2csv [--digest] [-o out.csv] <file.wav>...",
        "",
        "Options:",
        "  --digest    Verify the MD5 digest of the data chunk and add digest columns.",
        "  -o <path>   Output file. Rows are appended without a header when it exists.",
        "              Defaults to stdout.",
        "  -h, --help  Show this help.",
    ]
    .join("\n")
}
