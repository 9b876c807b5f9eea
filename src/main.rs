//! Headless autoBWF editor: open a file, apply edits and save them.

use std::path::PathBuf;

use autobwf::bwf::{BwfMetaEdit, Field, ToolRunner};
use autobwf::coding_history::TransferChain;
use autobwf::config;
use autobwf::logging;
use autobwf::naming::DateChoice;
use autobwf::provenance::Candidate;
use autobwf::session::{ExportOptions, SaveOptions, Session};

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
    if let Err(err) = logging::init("autobwf") {
        eprintln!("Logging disabled: {err}");
    }
    if options.print_config {
        let path = config::config_path().map_err(|err| err.to_string())?;
        println!("{}", path.display());
        return Ok(());
    }
    let file = options
        .file
        .clone()
        .ok_or_else(|| format!("A WAV file is required\n\n{}", help_text()))?;

    let config = config::load_or_default().map_err(|err| err.to_string())?;
    let tool = BwfMetaEdit::system(config.accept_nopadding);
    tool.ensure_installed().map_err(|err| err.to_string())?;
    let mut session = Session::new(config, tool).map_err(|err| err.to_string())?;

    let outcome = session.open(&file).map_err(|err| err.to_string())?;
    for warning in &outcome.warnings {
        eprintln!("Warning: {warning}");
    }
    if let Some(conflict) = &outcome.conflict {
        let choice = options.date.unwrap_or_default();
        eprintln!(
            "Using {} date (filename: {}, timestamp: {}); pass --date to choose",
            match choice {
                DateChoice::Filename => "filename",
                DateChoice::Timestamp => "timestamp",
            },
            conflict.from_filename,
            conflict.from_timestamp
        );
        session
            .resolve_date_conflict(choice)
            .map_err(|err| err.to_string())?;
    }
    if outcome.digest_stored && options.embed_digest {
        eprintln!("MD5 digest already stored; --md5 ignored");
    }

    apply_edits(&mut session, &options)?;
    print_form(&session);

    if options.save {
        let save_options = SaveOptions {
            embed_digest: options.embed_digest,
        };
        let report = session
            .save(&save_options, |progress| eprintln!("{}", progress.message()))
            .map_err(|err| err.to_string())?;
        if report.unchanged {
            println!("Metadata is unchanged. Nothing to update.");
        } else {
            for failure in &report.failures {
                eprintln!("Failed: {} ({})", failure.step, failure.error);
            }
            session.reload().map_err(|err| err.to_string())?;
            println!("Metadata save completed");
            print_form(&session);
            if !report.is_success() {
                return Err(format!("{} write(s) failed", report.failures.len()));
            }
        }
    }

    if options.pbcore.is_some() || options.mp3.is_some() {
        let defaults = ExportOptions::defaults_for(&file);
        let export = ExportOptions {
            pbcore: options.pbcore.clone().map(|path| path.unwrap_or_else(|| {
                defaults.pbcore.clone().unwrap_or_default()
            })),
            mp3: options.mp3.clone().map(|path| path.unwrap_or_else(|| {
                defaults.mp3.clone().unwrap_or_default()
            })),
            vbr_level: options.vbr_level,
        };
        let report = session.export(&export).map_err(|err| err.to_string())?;
        for path in report.pbcore.iter().chain(report.mp3.iter()) {
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn apply_edits<R: ToolRunner>(session: &mut Session<R>, options: &Options) -> Result<(), String> {
    if let Some(template) = &options.template {
        let switched = session
            .open_template(template)
            .map_err(|err| err.to_string())?;
        eprintln!("Template supplied {} field(s)", switched.len());
    }
    if options.equipment.iter().any(Option::is_some) {
        let mut chain = session
            .transfer_chain()
            .cloned()
            .unwrap_or_else(|| TransferChain::initial(session.config()));
        let [deck, adc, software, media, speed, eq, tape_type] = options.equipment.clone();
        let slots = [
            (&mut chain.deck, deck),
            (&mut chain.adc, adc),
            (&mut chain.software, software),
            (&mut chain.media, media),
            (&mut chain.speed, speed),
            (&mut chain.eq, eq),
            (&mut chain.tape_type, tape_type),
        ];
        for (slot, value) in slots {
            if let Some(value) = value {
                *slot = value;
            }
        }
        session
            .select_equipment(chain)
            .map_err(|err| err.to_string())?;
    }
    if let Some(name) = &options.copyright {
        session
            .select_copyright(name)
            .map_err(|err| err.to_string())?;
    }
    for (field, value) in &options.sets {
        session
            .edit(*field, value.clone())
            .map_err(|err| err.to_string())?;
    }
    for (field, candidate) in &options.reverts {
        session
            .revert(*field, *candidate)
            .map_err(|err| err.to_string())?;
    }
    Ok(())
}

fn print_form<R: ToolRunner>(session: &Session<R>) {
    let Some(record) = session.record() else {
        return;
    };
    for (field, entry) in record.iter() {
        println!(
            "{:<22} {:<9} {}",
            field.label(),
            entry.state().label(),
            entry.display().replace("\r\n", " | ")
        );
    }
}

const EQUIPMENT_FLAGS: [&str; 7] = [
    "--deck",
    "--adc",
    "--software",
    "--media",
    "--speed",
    "--eq",
    "--type",
];

struct Options {
    file: Option<PathBuf>,
    template: Option<PathBuf>,
    print_config: bool,
    sets: Vec<(Field, String)>,
    reverts: Vec<(Field, Candidate)>,
    equipment: [Option<String>; 7],
    copyright: Option<String>,
    date: Option<DateChoice>,
    embed_digest: bool,
    save: bool,
    pbcore: Option<Option<PathBuf>>,
    mp3: Option<Option<PathBuf>>,
    vbr_level: u8,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            file: None,
            template: None,
            print_config: false,
            sets: Vec::new(),
            reverts: Vec::new(),
            equipment: Default::default(),
            copyright: None,
            date: None,
            embed_digest: false,
            save: false,
            pbcore: None,
            mp3: None,
            vbr_level: autobwf::export::lame::DEFAULT_VBR_LEVEL,
        }
    }
}

fn next_value<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    args.get(*idx)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn split_assignment(value: &str, flag: &str) -> Result<(Field, String), String> {
    let (name, text) = value
        .split_once('=')
        .ok_or_else(|| format!("{flag} expects FIELD=VALUE, got {value}"))?;
    let field: Field = name.parse().map_err(|err| format!("{err}"))?;
    Ok((field, text.to_string()))
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let arg = args[idx].as_str();
        match arg {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => options.print_config = true,
            "-t" | "--template" => {
                options.template = Some(PathBuf::from(next_value(&args, &mut idx, arg)?));
            }
            "--set" => {
                let value = next_value(&args, &mut idx, arg)?;
                options.sets.push(split_assignment(value, arg)?);
            }
            "--revert" => {
                let value = next_value(&args, &mut idx, arg)?;
                let (field, target) = split_assignment(value, arg)?;
                let candidate = match target.as_str() {
                    "original" => Candidate::Original,
                    "template" => Candidate::Template,
                    other => return Err(format!("--revert target must be original or template, got {other}")),
                };
                options.reverts.push((field, candidate));
            }
            "--copyright" => {
                options.copyright = Some(next_value(&args, &mut idx, arg)?.to_string());
            }
            "--date" => {
                options.date = Some(match next_value(&args, &mut idx, arg)? {
                    "filename" => DateChoice::Filename,
                    "timestamp" => DateChoice::Timestamp,
                    other => return Err(format!("--date must be filename or timestamp, got {other}")),
                });
            }
            "--md5" => options.embed_digest = true,
            "--save" => options.save = true,
            "--pbcore" => options.pbcore = Some(None),
            "--mp3" => options.mp3 = Some(None),
            flag if flag.starts_with("--pbcore=") => {
                options.pbcore = Some(Some(export_path(flag)?));
            }
            flag if flag.starts_with("--mp3=") => {
                options.mp3 = Some(Some(export_path(flag)?));
            }
            "--vbr-level" => {
                let value = next_value(&args, &mut idx, arg)?;
                options.vbr_level = value
                    .parse()
                    .map_err(|_| format!("--vbr-level expects a number, got {value}"))?;
            }
            flag if EQUIPMENT_FLAGS.contains(&flag) => {
                let slot = EQUIPMENT_FLAGS
                    .iter()
                    .position(|candidate| *candidate == flag)
                    .unwrap_or_default();
                options.equipment[slot] = Some(next_value(&args, &mut idx, flag)?.to_string());
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
            path => {
                if options.file.is_some() {
                    return Err(format!("Only one WAV file may be given\n\n{}", help_text()));
                }
                options.file = Some(PathBuf::from(path));
            }
        }
        idx += 1;
    }
    Ok(Some(options))
}

/// Path of an `--export=<path>` flag; the bare flag uses the default path.
fn export_path(flag: &str) -> Result<PathBuf, String> {
    match flag.split_once('=') {
        Some((_, path)) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Err(format!("{flag} needs a path after '='")),
    }
}

fn help_text() -> String {
    [
        "autobwf",
        "",
        "Embeds archival metadata in a Broadcast Wave file through bwfmetaedit.",
        "Prints the form (field, provenance, value); changes are written only with --save.",
        "",
        "Usage:",
        "  autobwf [options] <file.wav>",
        "  autobwf --config",
        "",
        "Options:",
        "  -t, --template <file>        Offer metadata from another BWF file.",
        "  --set <FIELD=VALUE>          Edit a field (repeatable). Fields use their form keys, e.g. INAM, ICOP, language.",
        "  --revert <FIELD=original|template>",
        "                               Restore a candidate value (repeatable).",
        "  --copyright <name>           Use a configured copyright statement.",
        "  --deck/--adc/--software <name>, --media/--speed/--eq/--type <value>",
        "                               Transfer chain used for the Coding History.",
        "  --date filename|timestamp    Date to use when filename and timestamp disagree.",
        "  --md5                        Embed an MD5 digest when saving.",
        "  --save                       Write changed fields, then reload and print the form.",
        "  --pbcore[=<path>]            Export PBCore XML (default <stem>_pbcore.xml).",
        "  --mp3[=<path>]               Encode an MP3 access copy with lame (default <stem>.mp3).",
        "  --vbr-level <n>              lame VBR level (default 7).",
        "  --config                     Print the configuration file location.",
        "  -h, --help                   Show this help.",
    ]
    .join("\n")
}
