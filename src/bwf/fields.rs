//! Catalogue of the metadata fields shown in the form.

use std::fmt;
use std::str::FromStr;

/// Where a field is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    /// BWF `bext` chunk.
    Bext,
    /// RIFF `LIST/INFO` chunk.
    Info,
    /// XMP packet.
    Xmp,
}

/// Every editable metadata field.
///
/// Declaration order is display order, and also the order in which changed
/// core fields are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Description,
    Originator,
    OriginationDate,
    OriginationTime,
    OriginatorReference,
    CodingHistory,
    Title,
    CreationDate,
    Technician,
    Software,
    Source,
    Comment,
    Copyright,
    ArchivalLocation,
    XmpDescription,
    Owner,
    Language,
    Interviewer,
    Interviewee,
    Form,
    Host,
    Speaker,
    Performer,
    Topics,
    Names,
    Events,
    Places,
    Creator,
}

impl Field {
    pub const ALL: [Field; 28] = [
        Field::Description,
        Field::Originator,
        Field::OriginationDate,
        Field::OriginationTime,
        Field::OriginatorReference,
        Field::CodingHistory,
        Field::Title,
        Field::CreationDate,
        Field::Technician,
        Field::Software,
        Field::Source,
        Field::Comment,
        Field::Copyright,
        Field::ArchivalLocation,
        Field::XmpDescription,
        Field::Owner,
        Field::Language,
        Field::Interviewer,
        Field::Interviewee,
        Field::Form,
        Field::Host,
        Field::Speaker,
        Field::Performer,
        Field::Topics,
        Field::Names,
        Field::Events,
        Field::Places,
        Field::Creator,
    ];

    /// Fields a template file may offer values for.
    pub const TEMPLATED: [Field; 21] = [
        Field::CodingHistory,
        Field::Title,
        Field::CreationDate,
        Field::Technician,
        Field::Source,
        Field::Copyright,
        Field::ArchivalLocation,
        Field::XmpDescription,
        Field::Owner,
        Field::Language,
        Field::Interviewer,
        Field::Interviewee,
        Field::Form,
        Field::Host,
        Field::Speaker,
        Field::Performer,
        Field::Topics,
        Field::Names,
        Field::Events,
        Field::Places,
        Field::Creator,
    ];

    /// Name used by `--out-core` columns and by the form.
    pub fn key(self) -> &'static str {
        match self {
            Field::Description => "Description",
            Field::Originator => "Originator",
            Field::OriginationDate => "OriginationDate",
            Field::OriginationTime => "OriginationTime",
            Field::OriginatorReference => "OriginatorReference",
            Field::CodingHistory => "CodingHistory",
            Field::Title => "INAM",
            Field::CreationDate => "ICRD",
            Field::Technician => "ITCH",
            Field::Software => "ISFT",
            Field::Source => "ISRC",
            Field::Comment => "ICMT",
            Field::Copyright => "ICOP",
            Field::ArchivalLocation => "IARL",
            Field::XmpDescription => "xmp_description",
            Field::Owner => "owner",
            Field::Language => "language",
            Field::Interviewer => "interviewer",
            Field::Interviewee => "interviewee",
            Field::Form => "form",
            Field::Host => "host",
            Field::Speaker => "speaker",
            Field::Performer => "performer",
            Field::Topics => "topics",
            Field::Names => "names",
            Field::Events => "events",
            Field::Places => "places",
            Field::Creator => "creator",
        }
    }

    pub fn group(self) -> FieldGroup {
        match self {
            Field::Description
            | Field::Originator
            | Field::OriginationDate
            | Field::OriginationTime
            | Field::OriginatorReference
            | Field::CodingHistory => FieldGroup::Bext,
            Field::Title
            | Field::CreationDate
            | Field::Technician
            | Field::Software
            | Field::Source
            | Field::Comment
            | Field::Copyright
            | Field::ArchivalLocation => FieldGroup::Info,
            _ => FieldGroup::Xmp,
        }
    }

    pub fn is_xmp(self) -> bool {
        self.group() == FieldGroup::Xmp
    }

    pub fn is_templated(self) -> bool {
        Self::TEMPLATED.contains(&self)
    }

    /// Human label for listings.
    pub fn label(self) -> &'static str {
        match self {
            Field::Description => "Description",
            Field::Originator => "Originator",
            Field::OriginationDate => "Origination date",
            Field::OriginationTime => "Origination time",
            Field::OriginatorReference => "Originator reference",
            Field::CodingHistory => "Coding history",
            Field::Title => "Title",
            Field::CreationDate => "Creation date",
            Field::Technician => "Technician",
            Field::Software => "Software",
            Field::Source => "Source",
            Field::Comment => "Comment",
            Field::Copyright => "Copyright",
            Field::ArchivalLocation => "Archival location",
            Field::XmpDescription => "Description (XMP)",
            Field::Owner => "Rights owner",
            Field::Language => "Language",
            Field::Interviewer => "Interviewer",
            Field::Interviewee => "Interviewee",
            Field::Form => "Form",
            Field::Host => "Host",
            Field::Speaker => "Speaker",
            Field::Performer => "Performer",
            Field::Topics => "Topics",
            Field::Names => "Names",
            Field::Events => "Events",
            Field::Places => "Places",
            Field::Creator => "Creator",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when a string names no known field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown metadata field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Flag name bwfmetaedit expects when writing a field read as `key`.
///
/// The tool reads `TimeReference` and `CodingHistory` but writes them as
/// `--Timereference` and `--History`.
pub fn write_flag_name(key: &str) -> &str {
    match key {
        "TimeReference" => "Timereference",
        "CodingHistory" => "History",
        other => other,
    }
}
