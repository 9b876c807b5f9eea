//! Default metadata derived from the filename convention and file timestamps.
//!
//! A conforming filename yields the identifier, the file-use code and the
//! transfer date; the filesystem creation time yields the origination time and
//! a second opinion on the date. Nothing here fails: problems degrade to
//! timestamp-based defaults and are reported as [`NamingWarning`]s.

use std::fmt;
use std::path::Path;

use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::bwf::DescriptionParts;
use crate::config::NamingRules;

/// File-use text used when a code has no configured translation.
pub const UNKNOWN_FILE_USE: &str = "Unknown";

/// Creation date and time of a file, local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTimestamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
}

impl FileTimestamp {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }

    pub fn from_datetime(moment: OffsetDateTime) -> Self {
        let date = format!(
            "{:04}-{:02}-{:02}",
            moment.year(),
            u8::from(moment.month()),
            moment.day()
        );
        let time = format!(
            "{:02}:{:02}:{:02}",
            moment.hour(),
            moment.minute(),
            moment.second()
        );
        Self { date, time }
    }

    /// Creation time of `path` (modification time where the platform has no
    /// creation time), in the local offset.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let system_time = metadata.created().or_else(|_| metadata.modified())?;
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Ok(Self::from_datetime(
            OffsetDateTime::from(system_time).to_offset(offset),
        ))
    }
}

/// Which date to use when the filename and the timestamp disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateChoice {
    #[default]
    Filename,
    Timestamp,
}

/// The two candidate origination dates of a disagreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateConflict {
    pub from_filename: String,
    pub from_timestamp: String,
}

/// Recoverable problems found while deriving defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingWarning {
    /// The filename does not match the configured pattern.
    NonConformingFilename { file_name: String },
    /// The file-use code has no configured translation.
    UnknownFileUse { code: String },
    /// The date group is not a `YYYYMMDD` calendar date.
    InvalidFilenameDate { value: String },
    /// Filename and timestamp dates differ; the caller should pick one.
    DateDisagreement(DateConflict),
}

impl fmt::Display for NamingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingWarning::NonConformingFilename { file_name } => {
                write!(f, "{file_name} does not follow file naming convention")
            }
            NamingWarning::UnknownFileUse { code } => {
                write!(f, "{code} does not have a standard translation")
            }
            NamingWarning::InvalidFilenameDate { value } => {
                write!(f, "{value} in filename is not a valid YYYYMMDD date")
            }
            NamingWarning::DateDisagreement(conflict) => write!(
                f,
                "Filename and timestamp dates disagree (filename: {}, timestamp: {})",
                conflict.from_filename, conflict.from_timestamp
            ),
        }
    }
}

/// Defaults derived for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    /// Regenerated Description, `None` for non-conforming filenames.
    pub description: Option<String>,
    pub filename_date: Option<String>,
    pub timestamp: FileTimestamp,
    pub conflict: Option<DateConflict>,
    pub warnings: Vec<NamingWarning>,
    repository_code: String,
}

impl Derivation {
    /// Origination date under `choice`; the filename date wins unless the
    /// timestamp is chosen explicitly or the filename has no usable date.
    pub fn origination_date(&self, choice: DateChoice) -> &str {
        match (&self.filename_date, choice) {
            (Some(date), DateChoice::Filename) => date,
            _ => &self.timestamp.date,
        }
    }

    pub fn origination_time(&self) -> &str {
        &self.timestamp.time
    }

    /// `<repocode> <YYYYMMDD> <HHMMSS>`
    pub fn originator_reference(&self, choice: DateChoice) -> String {
        format!(
            "{} {} {}",
            self.repository_code,
            self.origination_date(choice).replace('-', ""),
            self.origination_time().replace(':', "")
        )
    }
}

/// Derive default metadata for `file_name` created at `timestamp`.
pub fn derive(file_name: &str, timestamp: FileTimestamp, rules: &NamingRules) -> Derivation {
    let mut warnings = Vec::new();
    let Some(caps) = rules.pattern.captures(file_name) else {
        tracing::warn!("{file_name} does not follow file naming convention");
        warnings.push(NamingWarning::NonConformingFilename {
            file_name: file_name.to_string(),
        });
        return Derivation {
            description: None,
            filename_date: None,
            timestamp,
            conflict: None,
            warnings,
            repository_code: rules.repository_code.clone(),
        };
    };
    let group = |idx: usize| caps.get(idx).map(|m| m.as_str()).unwrap_or_default();

    let identifier = normalize_identifier(group(1));
    let code = group(2);
    let file_use = match rules.file_uses.get(code) {
        Some(text) => text.clone(),
        None => {
            tracing::warn!("File use code {code} does not have a standard translation");
            warnings.push(NamingWarning::UnknownFileUse {
                code: code.to_string(),
            });
            UNKNOWN_FILE_USE.to_string()
        }
    };

    let filename_date = match parse_compact_date(group(3)) {
        Some(date) => Some(date),
        None => {
            tracing::warn!("{} in {file_name} is not a valid date", group(3));
            warnings.push(NamingWarning::InvalidFilenameDate {
                value: group(3).to_string(),
            });
            None
        }
    };

    let conflict = filename_date
        .as_ref()
        .filter(|date| **date != timestamp.date)
        .map(|date| DateConflict {
            from_filename: date.clone(),
            from_timestamp: timestamp.date.clone(),
        });
    if let Some(conflict) = &conflict {
        tracing::warn!(
            "Filename date {} disagrees with timestamp date {}",
            conflict.from_filename,
            conflict.from_timestamp
        );
        warnings.push(NamingWarning::DateDisagreement(conflict.clone()));
    }

    let description = DescriptionParts {
        file_content: identifier,
        file_use,
        original_filename: file_name.to_string(),
    }
    .render();

    Derivation {
        description: Some(description),
        filename_date,
        timestamp,
        conflict,
        warnings,
        repository_code: rules.repository_code.clone(),
    }
}

/// Derive defaults for a file on disk, using its basename and creation time.
pub fn derive_for_path(path: &Path, rules: &NamingRules) -> std::io::Result<Derivation> {
    let timestamp = FileTimestamp::of_file(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(derive(&file_name, timestamp, rules))
}

/// Dashes become dots and underscores are dropped.
fn normalize_identifier(raw: &str) -> String {
    raw.replace('-', ".").replace('_', "")
}

/// `YYYYMMDD` to `YYYY-MM-DD`, `None` for anything that is not a calendar date.
fn parse_compact_date(raw: &str) -> Option<String> {
    let format = format_description!("[year][month][day]");
    let date = Date::parse(raw, format).ok()?;
    Some(format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rules() -> NamingRules {
        let mut uses = BTreeMap::new();
        uses.insert("pres".to_string(), "Preservation Master".to_string());
        uses.insert("prod".to_string(), "Production Master".to_string());
        NamingRules::new(
            r"([a-z]+_[0-9-]+_[A-Z]{2}\d+)_\d+_([a-zA-Z]+)_(\d+)\.wav",
            uses,
            "ApoSU",
        )
        .unwrap()
    }

    const CONFORMING: &str = "acc_2020-01-02_RL1_010101_pres_20200102.wav";

    #[test]
    fn conforming_name_with_matching_timestamp() {
        let derived = derive(CONFORMING, FileTimestamp::new("2020-01-02", "10:11:12"), &rules());
        let description = derived.description.as_deref().unwrap();
        assert!(description.contains("File use: Preservation Master"));
        assert_eq!(
            description,
            "File content: acc2020.01.02RL1; File use: Preservation Master; Original filename: acc_2020-01-02_RL1_010101_pres_20200102.wav"
        );
        assert_eq!(derived.origination_date(DateChoice::default()), "2020-01-02");
        assert_eq!(derived.origination_time(), "10:11:12");
        assert_eq!(derived.conflict, None);
        assert!(derived.warnings.is_empty());
        assert_eq!(
            derived.originator_reference(DateChoice::default()),
            "ApoSU 20200102 101112"
        );
    }

    #[test]
    fn disagreeing_dates_offer_a_choice_defaulting_to_filename() {
        let derived = derive(CONFORMING, FileTimestamp::new("2020-03-04", "09:00:00"), &rules());
        assert_eq!(
            derived.conflict,
            Some(DateConflict {
                from_filename: "2020-01-02".into(),
                from_timestamp: "2020-03-04".into(),
            })
        );
        assert_eq!(derived.origination_date(DateChoice::default()), "2020-01-02");
        assert_eq!(derived.origination_date(DateChoice::Timestamp), "2020-03-04");
        assert_eq!(
            derived.originator_reference(DateChoice::Timestamp),
            "ApoSU 20200304 090000"
        );
        assert!(matches!(derived.warnings[0], NamingWarning::DateDisagreement(_)));
    }

    #[test]
    fn unknown_file_use_is_substituted_not_fatal() {
        let name = "acc_2020-01-02_RL1_010101_weird_20200102.wav";
        let derived = derive(name, FileTimestamp::new("2020-01-02", "00:00:00"), &rules());
        assert!(derived.description.unwrap().contains("File use: Unknown;"));
        assert_eq!(
            derived.warnings,
            vec![NamingWarning::UnknownFileUse { code: "weird".into() }]
        );
    }

    #[test]
    fn non_conforming_name_falls_back_to_timestamp() {
        let derived = derive("tape.wav", FileTimestamp::new("2021-05-06", "07:08:09"), &rules());
        assert_eq!(derived.description, None);
        assert_eq!(derived.origination_date(DateChoice::Filename), "2021-05-06");
        assert_eq!(derived.originator_reference(DateChoice::Filename), "ApoSU 20210506 070809");
        assert_eq!(
            derived.warnings[0].to_string(),
            "tape.wav does not follow file naming convention"
        );
    }

    #[test]
    fn impossible_filename_date_uses_timestamp() {
        let name = "acc_2020-01-02_RL1_010101_pres_20201399.wav";
        let derived = derive(name, FileTimestamp::new("2020-01-02", "00:00:00"), &rules());
        assert_eq!(derived.filename_date, None);
        assert_eq!(derived.conflict, None);
        assert_eq!(derived.origination_date(DateChoice::Filename), "2020-01-02");
        assert!(matches!(
            derived.warnings[0],
            NamingWarning::InvalidFilenameDate { .. }
        ));
    }

    #[test]
    fn timestamp_formats_with_padding() {
        let moment = OffsetDateTime::from_unix_timestamp(1_577_934_245).unwrap();
        assert_eq!(
            FileTimestamp::from_datetime(moment),
            FileTimestamp::new("2020-01-02", "03:04:05")
        );
    }

    #[test]
    fn timestamp_of_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let stamp = FileTimestamp::of_file(file.path()).unwrap();
        assert_eq!(stamp.date.len(), 10);
        assert_eq!(stamp.time.len(), 8);
    }
}
