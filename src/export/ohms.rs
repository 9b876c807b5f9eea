//! Minimal OHMS index documents from Audacity label exports.
//!
//! A label file is tab-separated `start<TAB>end<TAB>title`, times in seconds.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::ExportError;

pub const NS_OHMS: &str = "https://www.weareavp.com/nunncenter/ohms";
const OHMS_VERSION: &str = "5.4";
const PLACEHOLDER_MEDIA_URL: &str = "https://example.com/replace-this-with-real-url.mp3";
const LABELS_SUFFIX: &str = "_labels.txt";

/// One index point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPoint {
    /// Whole seconds.
    pub time: u64,
    pub title: String,
}

/// Whole seconds for an index point: the floor, rounded up past `.8`.
pub fn index_seconds(seconds: f64) -> u64 {
    let whole = seconds.floor();
    let rounded = if seconds - whole > 0.8 { whole + 1.0 } else { whole };
    rounded.max(0.0) as u64
}

/// Content name of a label file: its path without the `_labels.txt` suffix.
pub fn content_name(labels: &Path) -> String {
    let text = labels.to_string_lossy();
    text.strip_suffix(LABELS_SUFFIX).unwrap_or(&text).to_string()
}

pub fn output_path(labels: &Path) -> PathBuf {
    PathBuf::from(format!("{}_ohms.xml", content_name(labels)))
}

/// Parse label lines into index points.
pub fn parse_labels(text: &str, source: &Path) -> Result<Vec<IndexPoint>, ExportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut points = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let invalid = |reason: &str| ExportError::InvalidLabel {
            path: source.to_path_buf(),
            line: idx + 1,
            reason: reason.to_string(),
        };
        let start = record.get(0).ok_or_else(|| invalid("missing start time"))?;
        let seconds: f64 = start
            .trim()
            .parse()
            .map_err(|_| invalid("start time is not a number"))?;
        let title = record.get(2).ok_or_else(|| invalid("missing label text"))?;
        points.push(IndexPoint {
            time: index_seconds(seconds),
            title: title.to_string(),
        });
    }
    Ok(points)
}

/// Serialize an OHMS record titled `title` holding `points`.
pub fn render(title: &str, points: &[IndexPoint]) -> Result<String, ExportError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    let mut root = BytesStart::new("ohms:ROOT");
    root.push_attribute(("xmlns:ohms", NS_OHMS));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("record")))?;
    element(&mut writer, "version", OHMS_VERSION)?;
    element(&mut writer, "date_nonpreferred_format", "Unknown Date")?;
    element(&mut writer, "title", title)?;
    element(&mut writer, "translate", "0")?;
    element(&mut writer, "media_url", PLACEHOLDER_MEDIA_URL)?;
    writer.write_event(Event::Start(BytesStart::new("mediafile")))?;
    element(&mut writer, "host", "Other")?;
    element(&mut writer, "clip_format", "audio")?;
    writer.write_event(Event::End(BytesEnd::new("mediafile")))?;
    writer.write_event(Event::Start(BytesStart::new("index")))?;
    for point in points {
        writer.write_event(Event::Start(BytesStart::new("point")))?;
        element(&mut writer, "time", &point.time.to_string())?;
        element(&mut writer, "title", &point.title)?;
        writer.write_event(Event::End(BytesEnd::new("point")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("index")))?;
    writer.write_event(Event::End(BytesEnd::new("record")))?;
    writer.write_event(Event::End(BytesEnd::new("ohms:ROOT")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Convert one label file, returning the path of the written OHMS document.
pub fn convert(labels: &Path) -> Result<PathBuf, ExportError> {
    let text = fs::read_to_string(labels).map_err(|source| ExportError::Read {
        path: labels.to_path_buf(),
        source,
    })?;
    let points = parse_labels(&text, labels)?;
    let document = render(&content_name(labels), &points)?;
    let target = output_path(labels);
    fs::write(&target, document).map_err(|source| ExportError::Write {
        path: target.clone(),
        source,
    })?;
    tracing::info!("Wrote {} index point(s) to {}", points.len(), target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_time_rounds_up_only_past_point_eight() {
        assert_eq!(index_seconds(12.75), 12);
        assert_eq!(index_seconds(12.85), 13);
        assert_eq!(index_seconds(0.2), 0);
    }

    #[test]
    fn label_file_converts_to_ohms_document() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("tape1_labels.txt");
        fs::write(&labels, "0.000000\t0.000000\tIntro\n65.900000\t70.0\tWar years & after\n")
            .unwrap();
        let target = convert(&labels).unwrap();
        assert_eq!(target, dir.path().join("tape1_ohms.xml"));
        let xml = fs::read_to_string(target).unwrap();
        assert!(xml.contains("<point><time>0</time><title>Intro</title></point>"));
        assert!(xml.contains("<point><time>66</time><title>War years &amp; after</title></point>"));
        assert!(xml.contains("tape1</title>"));
    }

    #[test]
    fn malformed_label_reports_line() {
        let err = parse_labels("1.0\t2.0\tok\nabc\t1\tbad\n", Path::new("l.txt")).unwrap_err();
        assert!(matches!(err, ExportError::InvalidLabel { line: 2, .. }));
    }
}
