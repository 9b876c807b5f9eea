//! CLI utility to turn Audacity label exports into minimal OHMS index files.

use std::path::PathBuf;

use autobwf::export::ohms;
use autobwf::logging;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(files) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init("label2ohms") {
        eprintln!("Logging disabled: {err}");
    }
    for file in &files {
        let output = ohms::convert(file).map_err(|err| err.to_string())?;
        println!("Wrote {}", output.display());
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<Vec<PathBuf>>, String> {
    let mut files = Vec::new();
    for arg in &args {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
            path => files.push(PathBuf::from(path)),
        }
    }
    if files.is_empty() {
        return Err(format!("At least one label file is required\n\n{}", help_text()));
    }
    Ok(Some(files))
}

fn help_text() -> String {
    [
        "label2ohms",
        "",
        "Converts labels exported from Audacity into index points of a minimal OHMS XML file.",
        "<name>_labels.txt becomes <name>_ohms.xml.",
        "",
        "Usage:",
        "  label2ohms <labels.txt>...",
    ]
    .join("\n")
}
