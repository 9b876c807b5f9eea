//! Per-field provenance: which candidate value backs what the form shows.
//!
//! Every field has an immutable `original` (read from the file), an optional
//! `template` (read from a second file) and an optional `edited` value. The
//! [`FieldState`] alone decides the displayed text. Fields with no original
//! value stay [`FieldState::Unset`] and show a derived default instead.

use std::collections::BTreeMap;

use crate::bwf::{Field, FileMetadata};

/// Which candidate is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldState {
    /// No original value; the derived default (possibly empty) is shown.
    #[default]
    Unset,
    Original,
    Template,
    Edited,
}

impl FieldState {
    pub fn label(self) -> &'static str {
        match self {
            FieldState::Unset => "default",
            FieldState::Original => "original",
            FieldState::Template => "template",
            FieldState::Edited => "edited",
        }
    }
}

/// Candidate named in a revert request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Original,
    Template,
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Candidate::Original => f.write_str("original"),
            Candidate::Template => f.write_str("template"),
        }
    }
}

/// Errors raised by provenance transitions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProvenanceError {
    /// Revert requested to a candidate the field does not have.
    #[error("{field} has no {candidate} value to revert to")]
    NoCandidate { field: Field, candidate: Candidate },
}

/// Candidate values and provenance of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldEntry {
    original: String,
    template: Option<String>,
    edited: Option<String>,
    default_text: String,
    state: FieldState,
}

impl FieldEntry {
    fn from_original(original: &str) -> Self {
        let state = if original.is_empty() {
            FieldState::Unset
        } else {
            FieldState::Original
        };
        Self {
            original: original.to_string(),
            state,
            ..Self::default()
        }
    }

    /// Text currently displayed for the field.
    pub fn display(&self) -> &str {
        match self.state {
            FieldState::Unset => &self.default_text,
            FieldState::Original => &self.original,
            FieldState::Template => self.template.as_deref().unwrap_or_default(),
            FieldState::Edited => self.edited.as_deref().unwrap_or_default(),
        }
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn edited(&self) -> Option<&str> {
        self.edited.as_deref()
    }

    pub fn default_text(&self) -> &str {
        &self.default_text
    }

    /// True when saving would write this field.
    pub fn is_changed(&self) -> bool {
        self.display() != self.original
    }
}

/// Changed fields split by destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Changed bext/INFO fields, written one bwfmetaedit call each.
    pub core: BTreeMap<Field, String>,
    /// Changed XMP fields.
    pub xmp: BTreeMap<Field, String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.core.is_empty() && self.xmp.is_empty()
    }

    /// Core fields in write order: declaration order with Coding History moved
    /// to the end, since bwfmetaedit mangles its tail otherwise.
    pub fn core_write_order(&self) -> Vec<(Field, &str)> {
        let mut ordered: Vec<(Field, &str)> = self
            .core
            .iter()
            .filter(|(field, _)| **field != Field::CodingHistory)
            .map(|(field, value)| (*field, value.as_str()))
            .collect();
        if let Some(history) = self.core.get(&Field::CodingHistory) {
            ordered.push((Field::CodingHistory, history.as_str()));
        }
        ordered
    }
}

/// Provenance of every form field for one loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    entries: BTreeMap<Field, FieldEntry>,
}

impl MetadataRecord {
    /// Record whose originals are the stored values of `metadata`.
    pub fn from_metadata(metadata: &FileMetadata) -> Self {
        let entries = Field::ALL
            .into_iter()
            .map(|field| (field, FieldEntry::from_original(metadata.value(field))))
            .collect();
        Self { entries }
    }

    pub fn entry(&self, field: Field) -> &FieldEntry {
        &self.entries[&field]
    }

    fn entry_mut(&mut self, field: Field) -> &mut FieldEntry {
        self.entries.entry(field).or_default()
    }

    pub fn display(&self, field: Field) -> &str {
        self.entry(field).display()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldEntry)> {
        self.entries.iter().map(|(field, entry)| (*field, entry))
    }

    /// Text shown while the field has no original value.
    pub fn set_default(&mut self, field: Field, text: impl Into<String>) {
        self.entry_mut(field).default_text = text.into();
    }

    /// Offer the templated fields of `template` as candidates.
    ///
    /// Empty template values are ignored. Edited fields keep their edit; a
    /// template equal to the original leaves the field on its original.
    /// Returns the fields whose display switched to the template.
    pub fn apply_template(&mut self, template: &FileMetadata) -> Vec<Field> {
        let mut switched = Vec::new();
        for field in Field::TEMPLATED {
            let candidate = template.value(field);
            if candidate.is_empty() {
                continue;
            }
            let entry = self.entry_mut(field);
            entry.template = Some(candidate.to_string());
            match entry.state {
                FieldState::Edited => {
                    tracing::debug!("Keeping edited {field} over template value");
                }
                _ if entry.original == candidate => {}
                _ => {
                    entry.state = FieldState::Template;
                    switched.push(field);
                }
            }
        }
        switched
    }

    /// Replace the displayed text with `text`.
    ///
    /// Typing the original value back drops the edit and returns the field to
    /// its original.
    pub fn edit(&mut self, field: Field, text: impl Into<String>) {
        let text = text.into();
        let entry = self.entry_mut(field);
        if !entry.original.is_empty() && text == entry.original {
            entry.edited = None;
            entry.state = FieldState::Original;
        } else {
            entry.edited = Some(text);
            entry.state = FieldState::Edited;
        }
    }

    pub fn revert_to_original(&mut self, field: Field) -> Result<(), ProvenanceError> {
        let entry = self.entry_mut(field);
        if entry.original.is_empty() {
            return Err(ProvenanceError::NoCandidate {
                field,
                candidate: Candidate::Original,
            });
        }
        entry.edited = None;
        entry.state = FieldState::Original;
        Ok(())
    }

    pub fn revert_to_template(&mut self, field: Field) -> Result<(), ProvenanceError> {
        let entry = self.entry_mut(field);
        if entry.template.is_none() {
            return Err(ProvenanceError::NoCandidate {
                field,
                candidate: Candidate::Template,
            });
        }
        entry.edited = None;
        entry.state = FieldState::Template;
        Ok(())
    }

    pub fn revert(&mut self, field: Field, candidate: Candidate) -> Result<(), ProvenanceError> {
        match candidate {
            Candidate::Original => self.revert_to_original(field),
            Candidate::Template => self.revert_to_template(field),
        }
    }

    /// Displayed text of every field.
    pub fn current_values(&self) -> BTreeMap<Field, String> {
        self.entries
            .iter()
            .map(|(field, entry)| (*field, entry.display().to_string()))
            .collect()
    }

    /// Fields whose displayed text differs from the original.
    pub fn change_set(&self) -> ChangeSet {
        let mut changes = ChangeSet::default();
        for (field, entry) in self.entries.iter().filter(|(_, entry)| entry.is_changed()) {
            let target = if field.is_xmp() {
                &mut changes.xmp
            } else {
                &mut changes.core
            };
            target.insert(*field, entry.display().to_string());
        }
        changes
    }

    pub fn has_changes(&self) -> bool {
        self.entries.values().any(FieldEntry::is_changed)
    }
}
