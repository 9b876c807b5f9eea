//! XMP packet reading and writing for the XMP-backed form fields.
//!
//! bwfmetaedit exchanges XMP as XML files: `--out-XMP-xml` dumps the chunk
//! next to the audio file and `--in-XMP=<path>` replaces the chunk with the
//! contents of a file. Multi-valued properties are `;`-separated in the form.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::BwfError;
use super::fields::Field;
use super::metadata::XmpMetadata;

pub const NS_X: &str = "adobe:ns:meta/";
pub const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub const NS_XMP: &str = "http://ns.adobe.com/xap/1.0/";
pub const NS_XMP_RIGHTS: &str = "http://ns.adobe.com/xap/1.0/rights/";
pub const NS_AUTOBWF: &str = "http://ns.ukrhec.org/autoBWF/0.1";

/// RDF container used for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Alt,
    Bag,
    Seq,
}

impl Container {
    fn element(self) -> &'static str {
        match self {
            Container::Alt => "rdf:Alt",
            Container::Bag => "rdf:Bag",
            Container::Seq => "rdf:Seq",
        }
    }
}

fn property(field: Field) -> Option<(String, Container)> {
    let mapped = match field {
        Field::XmpDescription => ("dc:description".to_string(), Container::Alt),
        Field::Owner => ("xmpRights:Owner".to_string(), Container::Bag),
        Field::Language => ("dc:language".to_string(), Container::Bag),
        Field::Creator => ("dc:creator".to_string(), Container::Seq),
        Field::Form => ("dc:type".to_string(), Container::Bag),
        other if other.is_xmp() => (format!("autoBWF:{}", other.key()), Container::Bag),
        _ => return None,
    };
    Some(mapped)
}

fn field_for_element(name: &[u8]) -> Option<Field> {
    Field::ALL.into_iter().find(|field| {
        property(*field).is_some_and(|(element, _)| element.as_bytes() == name)
    })
}

/// Value of the XMP property being captured.
struct Capture {
    field: Field,
    depth: usize,
    items: Vec<String>,
    simple: String,
}

impl Capture {
    fn finish(self) -> String {
        if self.items.is_empty() {
            self.simple
        } else {
            self.items.join(";")
        }
    }
}

/// Parse an XMP packet into the form's XMP fields.
pub fn parse_packet(xml: &str) -> Result<XmpMetadata, BwfError> {
    let mut reader = Reader::from_str(xml);
    let mut fields = XmpMetadata::default();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<Capture> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = element.name().as_ref().to_vec();
                match current.as_mut() {
                    None => {
                        if let Some(field) = field_for_element(&name) {
                            current = Some(Capture {
                                field,
                                depth: stack.len(),
                                items: Vec::new(),
                                simple: String::new(),
                            });
                        }
                    }
                    Some(capture) if name == b"rdf:li" => capture.items.push(String::new()),
                    Some(_) => {}
                }
                stack.push(name);
            }
            Event::Empty(element) => {
                if let Some(capture) = current.as_mut()
                    && element.name().as_ref() == b"rdf:li"
                {
                    capture.items.push(String::new());
                }
            }
            Event::Text(text) => {
                if let Some(capture) = current.as_mut() {
                    let text = text.unescape()?;
                    push_text(capture, &stack, &text);
                }
            }
            Event::CData(data) => {
                if let Some(capture) = current.as_mut() {
                    let bytes = data.into_inner();
                    push_text(capture, &stack, &String::from_utf8_lossy(&bytes));
                }
            }
            Event::End(_) => {
                stack.pop();
                if let Some(capture) = current.take_if(|capture| capture.depth == stack.len()) {
                    fields.set(capture.field, capture.finish());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(fields)
}

fn push_text(capture: &mut Capture, stack: &[Vec<u8>], text: &str) {
    match stack.last() {
        Some(top) if top.as_slice() == b"rdf:li" => {
            if let Some(item) = capture.items.last_mut() {
                item.push_str(text);
            }
        }
        Some(_) if stack.len() == capture.depth + 1 && !text.trim().is_empty() => {
            capture.simple.push_str(text);
        }
        _ => {}
    }
}

/// Serialize the XMP fields plus `xmp:MetadataDate` into a packet.
///
/// Empty fields are left out of the packet.
pub fn render_packet(fields: &XmpMetadata, metadata_date: &str) -> Result<String, BwfError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("x:xmpmeta");
    root.push_attribute(("xmlns:x", NS_X));
    writer.write_event(Event::Start(root))?;
    let mut rdf = BytesStart::new("rdf:RDF");
    rdf.push_attribute(("xmlns:rdf", NS_RDF));
    writer.write_event(Event::Start(rdf))?;

    let mut description = BytesStart::new("rdf:Description");
    description.push_attribute(("rdf:about", ""));
    description.push_attribute(("xmlns:dc", NS_DC));
    description.push_attribute(("xmlns:xmp", NS_XMP));
    description.push_attribute(("xmlns:xmpRights", NS_XMP_RIGHTS));
    description.push_attribute(("xmlns:autoBWF", NS_AUTOBWF));
    writer.write_event(Event::Start(description))?;

    write_text_element(&mut writer, "xmp:MetadataDate", metadata_date)?;

    for (field, value) in fields.iter().filter(|(_, value)| !value.is_empty()) {
        let Some((element, container)) = property(field) else {
            continue;
        };
        writer.write_event(Event::Start(BytesStart::new(element.as_str())))?;
        writer.write_event(Event::Start(BytesStart::new(container.element())))?;
        if container == Container::Alt {
            let mut item = BytesStart::new("rdf:li");
            item.push_attribute(("xml:lang", "x-default"));
            writer.write_event(Event::Start(item))?;
            writer.write_event(Event::Text(BytesText::new(value)))?;
            writer.write_event(Event::End(BytesEnd::new("rdf:li")))?;
        } else {
            for entry in value.split(';') {
                write_text_element(&mut writer, "rdf:li", entry)?;
            }
        }
        writer.write_event(Event::End(BytesEnd::new(container.element())))?;
        writer.write_event(Event::End(BytesEnd::new(element.as_str())))?;
    }

    writer.write_event(Event::End(BytesEnd::new("rdf:Description")))?;
    writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;
    writer.write_event(Event::End(BytesEnd::new("x:xmpmeta")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), BwfError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Path of the sidecar bwfmetaedit writes for `--out-XMP-xml`.
pub fn sidecar_path(audio: &Path) -> PathBuf {
    let mut name = audio.as_os_str().to_os_string();
    name.push(".XMP.xml");
    PathBuf::from(name)
}

/// Removes a tool-produced sidecar file when dropped.
pub(crate) struct Sidecar {
    path: PathBuf,
}

impl Sidecar {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the sidecar, `None` when the tool produced no file.
    pub(crate) fn read(&self) -> Result<Option<String>, BwfError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BwfError::Sidecar {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path)
            && err.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("Failed to remove XMP sidecar {}: {err}", self.path.display());
        }
    }
}
