//! PBCore description documents built from BWF and XMP metadata.
//!
//! Multi-valued fields are `;`-separated. An item written as `Name {Q123}`
//! becomes a Wikidata-referenced value.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use regex::Regex;

use crate::bwf::{Field, FileMetadata};

use super::ExportError;

pub const NS_PBCORE: &str = "http://www.pbcore.org/PBCore/PBCoreNamespace.html";

type XmlWriter = Writer<Vec<u8>>;

/// Subject fields and their `subjectType`.
const SUBJECTS: [(Field, &str); 4] = [
    (Field::Topics, "topic"),
    (Field::Names, "name"),
    (Field::Events, "period"),
    (Field::Places, "geographic"),
];

/// Contributor fields and their role.
const CONTRIBUTORS: [(Field, &str); 5] = [
    (Field::Interviewer, "interviewer"),
    (Field::Interviewee, "interviewee"),
    (Field::Host, "host"),
    (Field::Speaker, "speaker"),
    (Field::Performer, "performer"),
];

/// One `;`-separated item, split into its text and optional Wikidata item.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    text: String,
    wikidata: Option<String>,
}

fn items(value: &str) -> Vec<Item> {
    static WIKIDATA: OnceLock<Regex> = OnceLock::new();
    let pattern = WIKIDATA
        .get_or_init(|| Regex::new(r"^(.+?)\s+\{(Q\d+)\}$").expect("wikidata regex must compile"));
    value
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match pattern.captures(item) {
            Some(caps) => Item {
                text: caps[1].to_string(),
                wikidata: Some(format!("https://www.wikidata.org/wiki/{}", &caps[2])),
            },
            None => Item {
                text: item.to_string(),
                wikidata: None,
            },
        })
        .collect()
}

/// Serialize the PBCore document for `metadata`.
pub fn render(metadata: &FileMetadata) -> Result<String, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("pbcoreDescriptionDocument");
    root.push_attribute(("xmlns", NS_PBCORE));
    writer.write_event(Event::Start(root))?;
    let note = format!(
        " Automatically generated by bwf2pbcore from {}. Do not edit by hand. ",
        metadata.path.display()
    );
    writer.write_event(Event::Comment(BytesText::new(&note)))?;

    let value = |field: Field| metadata.value(field);
    text_element(&mut writer, "pbcoreAssetType", value(Field::Form), &[])?;
    text_element(&mut writer, "pbcoreAssetDate", value(Field::CreationDate), &[])?;
    text_element(&mut writer, "pbcoreTitle", value(Field::Title), &[])?;

    for (field, kind) in SUBJECTS {
        for item in items(value(field)) {
            item_element(&mut writer, "pbcoreSubject", &item, &[("subjectType", kind)])?;
        }
    }

    text_element(&mut writer, "pbcoreDescription", value(Field::XmpDescription), &[])?;

    for (field, role) in CONTRIBUTORS {
        for item in items(value(field)) {
            writer.write_event(Event::Start(BytesStart::new("pbcoreContributor")))?;
            item_element(&mut writer, "contributor", &item, &[])?;
            text_element(&mut writer, "contributorRole", role, &[])?;
            writer.write_event(Event::End(BytesEnd::new("pbcoreContributor")))?;
        }
    }

    writer.write_event(Event::Start(BytesStart::new("pbcorePublisher")))?;
    text_element(&mut writer, "publisher", value(Field::Owner), &[])?;
    text_element(&mut writer, "publisherRole", "copyright holder", &[])?;
    writer.write_event(Event::End(BytesEnd::new("pbcorePublisher")))?;

    write_instantiation(&mut writer, metadata)?;

    writer.write_event(Event::End(BytesEnd::new("pbcoreDescriptionDocument")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_instantiation(writer: &mut XmlWriter, metadata: &FileMetadata) -> Result<(), ExportError> {
    let parts = metadata.core.description_parts();
    let identifier = if parts.original_filename.is_empty() {
        metadata
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        parts.original_filename.clone()
    };
    writer.write_event(Event::Start(BytesStart::new("pbcoreInstantiation")))?;
    text_element(
        writer,
        "instantiationIdentifier",
        &identifier,
        &[("source", "File Name")],
    )?;
    text_element(
        writer,
        "instantiationDate",
        metadata.value(Field::OriginationDate),
        &[("dateType", "created")],
    )?;
    text_element(writer, "instantiationDigital", "audio/x-wav", &[])?;
    text_element(writer, "instantiationMediaType", "Sound", &[])?;
    text_element(writer, "instantiationGenerations", &parts.file_use, &[])?;
    text_element(writer, "instantiationDuration", metadata.tech.duration(), &[])?;
    text_element(
        writer,
        "instantiationChannelConfiguration",
        metadata.tech.channels(),
        &[],
    )?;
    writer.write_event(Event::Start(BytesStart::new("instantiationEssenceTrack")))?;
    text_element(writer, "essenceTrackType", "Audio", &[])?;
    text_element(
        writer,
        "essenceTrackSamplingRate",
        metadata.tech.sample_rate(),
        &[("unitsOfMeasure", "Hz")],
    )?;
    text_element(writer, "essenceTrackBitDepth", metadata.tech.bit_per_sample(), &[])?;
    writer.write_event(Event::End(BytesEnd::new("instantiationEssenceTrack")))?;
    writer.write_event(Event::End(BytesEnd::new("pbcoreInstantiation")))?;
    Ok(())
}

/// Element with text content; nothing is written for empty text.
fn text_element(
    writer: &mut XmlWriter,
    name: &str,
    text: &str,
    attributes: &[(&str, &str)],
) -> Result<(), ExportError> {
    if text.is_empty() {
        return Ok(());
    }
    let mut start = BytesStart::new(name);
    for attribute in attributes {
        start.push_attribute(*attribute);
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn item_element(
    writer: &mut XmlWriter,
    name: &str,
    item: &Item,
    attributes: &[(&str, &str)],
) -> Result<(), ExportError> {
    let mut all = attributes.to_vec();
    if let Some(reference) = &item.wikidata {
        all.push(("source", "wikidata"));
        all.push(("ref", reference.as_str()));
    }
    text_element(writer, name, &item.text, &all)
}

/// Render and write the document to `path`.
pub fn write_file(path: &Path, metadata: &FileMetadata) -> Result<(), ExportError> {
    let document = render(metadata)?;
    fs::write(path, document).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote PBCore document {}", path.display());
    Ok(())
}
