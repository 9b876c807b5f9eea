//! Semantic views over the reports produced by bwfmetaedit.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use super::fields::Field;

/// Technical metadata from `--out-tech` (format, checksum, error columns).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechMetadata {
    values: BTreeMap<String, String>,
}

impl TechMetadata {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Column value, empty when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or_default()
    }

    pub fn errors(&self) -> &str {
        self.get("Errors")
    }

    pub fn md5_stored(&self) -> &str {
        self.get("MD5Stored")
    }

    pub fn md5_generated(&self) -> &str {
        self.get("MD5Generated")
    }

    pub fn sample_rate(&self) -> &str {
        self.get("SampleRate")
    }

    pub fn bit_per_sample(&self) -> &str {
        self.get("BitPerSample")
    }

    pub fn channels(&self) -> &str {
        self.get("Channels")
    }

    pub fn duration(&self) -> &str {
        self.get("Duration")
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Core metadata from `--out-core` (`bext` and `INFO` columns), missing columns read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreMetadata {
    values: BTreeMap<String, String>,
}

impl CoreMetadata {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or_default()
    }

    pub fn field(&self, field: Field) -> &str {
        self.get(field.key())
    }

    pub fn time_reference(&self) -> &str {
        self.get("TimeReference")
    }

    /// Components of a Description written with the repository convention.
    pub fn description_parts(&self) -> DescriptionParts {
        DescriptionParts::parse(self.field(Field::Description))
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// XMP-backed form fields; every XMP [`Field`] is present, empty when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmpMetadata {
    values: BTreeMap<Field, String>,
}

impl Default for XmpMetadata {
    fn default() -> Self {
        Self {
            values: Field::ALL
                .into_iter()
                .filter(|field| field.is_xmp())
                .map(|field| (field, String::new()))
                .collect(),
        }
    }
}

impl XmpMetadata {
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or_default()
    }

    /// Store a value; non-XMP fields are ignored.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        if field.is_xmp() {
            self.values.insert(field, value.into());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values.iter().map(|(field, value)| (*field, value.as_str()))
    }
}

/// `File content: …; File use: …; Original filename: …` split into parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionParts {
    pub file_content: String,
    pub file_use: String,
    pub original_filename: String,
}

impl DescriptionParts {
    pub fn parse(description: &str) -> Self {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^File content: (.+); File use: (.+); Original filename: (.+)")
                .expect("description regex must compile")
        });
        match pattern.captures(description) {
            Some(caps) => Self {
                file_content: caps[1].to_string(),
                file_use: caps[2].to_string(),
                original_filename: caps[3].to_string(),
            },
            None => Self::default(),
        }
    }

    /// Render the convention used when deriving a Description.
    pub fn render(&self) -> String {
        format!(
            "File content: {}; File use: {}; Original filename: {}",
            self.file_content, self.file_use, self.original_filename
        )
    }
}

/// Everything read from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub tech: TechMetadata,
    pub core: CoreMetadata,
    pub xmp: XmpMetadata,
}

impl FileMetadata {
    /// Stored value of a form field.
    pub fn value(&self, field: Field) -> &str {
        if field.is_xmp() {
            self.xmp.get(field)
        } else {
            self.core.field(field)
        }
    }

    /// Look up any named value across the core, technical and XMP reports,
    /// including the `FileContent`/`FileUse`/`OriginalFilename` description parts.
    pub fn lookup(&self, key: &str) -> String {
        if let Ok(field) = key.parse::<Field>() {
            return self.value(field).to_string();
        }
        let parts = self.core.description_parts();
        match key {
            "FileContent" => parts.file_content,
            "FileUse" => parts.file_use,
            "OriginalFilename" => parts.original_filename,
            other => {
                let core = self.core.get(other);
                if core.is_empty() {
                    self.tech.get(other).to_string()
                } else {
                    core.to_string()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileMetadata {
        let mut core = BTreeMap::new();
        core.insert(
            "Description".to_string(),
            "File content: ApoSU2014.01.02RL1; File use: Preservation Master; Original filename: a.wav"
                .to_string(),
        );
        core.insert("INAM".to_string(), "Interview".to_string());
        let mut tech = BTreeMap::new();
        tech.insert("Duration".to_string(), "00:01:00.000".to_string());
        let mut xmp = XmpMetadata::default();
        xmp.set(Field::Language, "English;Ukrainian");
        FileMetadata {
            path: PathBuf::from("a.wav"),
            tech: TechMetadata::new(tech),
            core: CoreMetadata::new(core),
            xmp,
        }
    }

    #[test]
    fn description_parts_follow_convention() {
        let parts = sample().core.description_parts();
        assert_eq!(parts.file_content, "ApoSU2014.01.02RL1");
        assert_eq!(parts.file_use, "Preservation Master");
        assert_eq!(parts.original_filename, "a.wav");
        assert_eq!(DescriptionParts::parse(&parts.render()), parts);
    }

    #[test]
    fn free_text_description_has_empty_parts() {
        assert_eq!(DescriptionParts::parse("Some tape"), DescriptionParts::default());
    }

    #[test]
    fn lookup_spans_all_reports() {
        let md = sample();
        assert_eq!(md.lookup("INAM"), "Interview");
        assert_eq!(md.lookup("language"), "English;Ukrainian");
        assert_eq!(md.lookup("Duration"), "00:01:00.000");
        assert_eq!(md.lookup("FileUse"), "Preservation Master");
        assert_eq!(md.lookup("MD5Stored"), "");
    }

    #[test]
    fn xmp_metadata_ignores_core_fields() {
        let mut xmp = XmpMetadata::default();
        xmp.set(Field::Title, "nope");
        assert_eq!(xmp.iter().count(), 14);
        assert!(xmp.iter().all(|(field, _)| field.is_xmp()));
    }
}
