use time::OffsetDateTime;
use time::macros::format_description;

use crate::bwf::{BwfError, BwfMetaEdit, Field, FileMetadata, ToolRunner, WriteOutcome, XmpMetadata};
use crate::provenance::MetadataRecord;

/// Save-time choices that are not metadata fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Embed an MD5 digest of the audio data. Ignored when one is stored.
    pub embed_digest: bool,
}

/// One bwfmetaedit call of a save batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStep {
    Digest,
    TimeReference,
    Field(Field),
    Xmp,
}

impl std::fmt::Display for SaveStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStep::Digest => f.write_str("Generating MD5 digest"),
            SaveStep::TimeReference => f.write_str("Saving time reference"),
            SaveStep::Field(Field::CodingHistory) => f.write_str("Saving coding history"),
            SaveStep::Field(field) => write!(f, "Saving {}", field.key()),
            SaveStep::Xmp => f.write_str("Saving XMP"),
        }
    }
}

/// Progress update emitted before each step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveProgress {
    pub step: SaveStep,
    /// 1-based position of the step.
    pub index: usize,
    pub total: usize,
}

impl SaveProgress {
    pub fn message(&self) -> String {
        format!("[{}/{}] {}", self.index, self.total, self.step)
    }
}

/// A step that failed without stopping the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub step: SaveStep,
    pub error: String,
}

/// Outcome of a save batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Nothing differed from the file; no call was made.
    pub unchanged: bool,
    pub digest_embedded: bool,
    pub time_reference_reset: bool,
    /// Core fields written, in call order.
    pub written: Vec<Field>,
    pub xmp_written: bool,
    pub failures: Vec<WriteFailure>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// `xmp:MetadataDate` text for `now`.
pub fn metadata_date(now: OffsetDateTime) -> String {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
    );
    now.format(format).unwrap_or_else(|_| now.unix_timestamp().to_string())
}

pub(super) fn run<R, F>(
    tool: &BwfMetaEdit<R>,
    metadata: &FileMetadata,
    record: &MetadataRecord,
    options: &SaveOptions,
    now: OffsetDateTime,
    mut progress: F,
) -> SaveReport
where
    R: ToolRunner,
    F: FnMut(SaveProgress),
{
    let path = metadata.path.as_path();
    let changes = record.change_set();
    if changes.is_empty() {
        tracing::info!("Metadata of {} is unchanged; nothing to update", path.display());
        return SaveReport {
            unchanged: true,
            ..SaveReport::default()
        };
    }

    let mut steps = Vec::new();
    if options.embed_digest {
        if metadata.tech.md5_stored().is_empty() {
            steps.push(SaveStep::Digest);
        } else {
            tracing::info!("MD5 digest already stored; skipping embed");
        }
    }
    if metadata.core.time_reference() != "0" {
        steps.push(SaveStep::TimeReference);
    }
    let core = changes.core_write_order();
    steps.extend(core.iter().map(|(field, _)| SaveStep::Field(*field)));
    steps.push(SaveStep::Xmp);

    let mut report = SaveReport::default();
    let total = steps.len();
    for (idx, step) in steps.into_iter().enumerate() {
        progress(SaveProgress {
            step,
            index: idx + 1,
            total,
        });
        let result = match step {
            SaveStep::Digest => tool.embed_digest(path).map(|()| {
                report.digest_embedded = true;
            }),
            SaveStep::TimeReference => tool
                .write_field(path, "TimeReference", "0", metadata.core.time_reference())
                .map(|_| {
                    report.time_reference_reset = true;
                }),
            SaveStep::Field(field) => {
                let value = record.display(field);
                tool.write_field(path, field.key(), value, record.entry(field).original())
                    .map(|outcome| {
                        if outcome == WriteOutcome::Written {
                            report.written.push(field);
                        }
                    })
            }
            SaveStep::Xmp => write_xmp(tool, path, record, now).map(|()| {
                report.xmp_written = true;
            }),
        };
        if let Err(err) = result {
            tracing::error!("{step} failed for {}: {err}", path.display());
            report.failures.push(WriteFailure {
                step,
                error: err.to_string(),
            });
        }
    }
    tracing::info!(
        "Saved {} field(s) to {} with {} failure(s)",
        report.written.len(),
        path.display(),
        report.failures.len()
    );
    report
}

/// The XMP chunk is replaced wholesale, so every XMP field goes in the packet.
fn write_xmp<R: ToolRunner>(
    tool: &BwfMetaEdit<R>,
    path: &std::path::Path,
    record: &MetadataRecord,
    now: OffsetDateTime,
) -> Result<(), BwfError> {
    let mut fields = XmpMetadata::default();
    for (field, entry) in record.iter().filter(|(field, _)| field.is_xmp()) {
        fields.set(field, entry.display());
    }
    tool.write_xmp(path, &fields, &metadata_date(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn metadata_date_carries_offset() {
        assert_eq!(
            metadata_date(datetime!(2020-01-02 03:04:05 -05:00)),
            "2020-01-02T03:04:05-05:00"
        );
        assert_eq!(
            metadata_date(datetime!(2020-01-02 03:04:05 UTC)),
            "2020-01-02T03:04:05+00:00"
        );
    }

    #[test]
    fn progress_message_names_step() {
        let progress = SaveProgress {
            step: SaveStep::Field(Field::CodingHistory),
            index: 3,
            total: 4,
        };
        assert_eq!(progress.message(), "[3/4] Saving coding history");
        assert_eq!(SaveStep::Field(Field::Title).to_string(), "Saving INAM");
    }
}
