//! Toolkit-agnostic form controller.
//!
//! A [`Session`] owns the configuration and the bwfmetaedit adapter, holds the
//! provenance record of the open file and exposes every form action as a
//! direct call. Conditions a GUI would show in a dialog come back as
//! [`Warning`] values.

mod save;

use std::fmt;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::bwf::{BwfError, BwfMetaEdit, Field, FileMetadata, SystemRunner, ToolRunner};
use crate::coding_history::{self, TransferChain};
use crate::config::{AppConfig, ConfigError, NamingRules};
use crate::export::{self, ExportError};
use crate::naming::{self, DateChoice, DateConflict, Derivation, NamingWarning};
use crate::provenance::{Candidate, MetadataRecord, ProvenanceError};

pub use save::{SaveOptions, SaveProgress, SaveReport, SaveStep, WriteFailure, metadata_date};

/// Errors raised by form actions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Bwf(#[from] BwfError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provenance(#[from] ProvenanceError),
    #[error(transparent)]
    Export(#[from] ExportError),
    /// The creation time of the file could not be read.
    #[error("Failed to read timestamp of {}: {source}", .path.display())]
    Timestamp {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The action needs an open file.
    #[error("No file is open")]
    NoFile,
    /// A selection names an entry missing from the configuration.
    #[error("'{name}' is not a configured {group} choice")]
    UnknownChoice { group: &'static str, name: String },
    /// Export was requested while the form differs from the file.
    #[error(
        "You have unsaved edits. Export would make internal and external metadata inconsistent; save before exporting"
    )]
    UnsavedChanges,
}

/// Recoverable conditions found while opening a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    Naming(NamingWarning),
    /// The stored Description does not match the filename; the derived text
    /// was entered as an edit and the original can still be restored.
    DescriptionRegenerated { stored: String, derived: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Naming(warning) => warning.fmt(f),
            Warning::DescriptionRegenerated { .. } => f.write_str(
                "BWF Description is inconsistent with filename. Field will be regenerated; revert to original to restore it",
            ),
        }
    }
}

/// What the caller should show after opening a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOutcome {
    pub warnings: Vec<Warning>,
    /// Present when the caller should offer a choice of origination date.
    pub conflict: Option<DateConflict>,
    /// The file already stores an MD5 digest, so embedding is unavailable.
    pub digest_stored: bool,
}

/// Where exports go; `None` skips that artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub pbcore: Option<PathBuf>,
    pub mp3: Option<PathBuf>,
    pub vbr_level: u8,
}

impl ExportOptions {
    /// `<stem>_pbcore.xml` and `<stem>.mp3` next to `path`.
    pub fn defaults_for(path: &Path) -> Self {
        Self {
            pbcore: Some(export::sibling_path(path, "_pbcore.xml")),
            mp3: Some(export::sibling_path(path, ".mp3")),
            vbr_level: export::lame::DEFAULT_VBR_LEVEL,
        }
    }
}

/// Artifacts produced by an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub pbcore: Option<PathBuf>,
    pub mp3: Option<PathBuf>,
}

struct OpenFile {
    metadata: FileMetadata,
    record: MetadataRecord,
    derivation: Derivation,
    date_choice: DateChoice,
    template: Option<PathBuf>,
    chain: TransferChain,
}

/// Editing state for one target file.
pub struct Session<R = SystemRunner> {
    config: AppConfig,
    rules: NamingRules,
    tool: BwfMetaEdit<R>,
    open: Option<OpenFile>,
}

impl<R: ToolRunner> Session<R> {
    pub fn new(config: AppConfig, tool: BwfMetaEdit<R>) -> Result<Self, SessionError> {
        let rules = config.naming_rules()?;
        Ok(Self {
            config,
            rules,
            tool,
            open: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn tool(&self) -> &BwfMetaEdit<R> {
        &self.tool
    }

    pub fn path(&self) -> Option<&Path> {
        self.open.as_ref().map(|open| open.metadata.path.as_path())
    }

    /// Metadata as read from the open file.
    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.open.as_ref().map(|open| &open.metadata)
    }

    pub fn record(&self) -> Option<&MetadataRecord> {
        self.open.as_ref().map(|open| &open.record)
    }

    pub fn transfer_chain(&self) -> Option<&TransferChain> {
        self.open.as_ref().map(|open| &open.chain)
    }

    pub fn template_path(&self) -> Option<&Path> {
        self.open.as_ref().and_then(|open| open.template.as_deref())
    }

    fn open_file(&self) -> Result<&OpenFile, SessionError> {
        self.open.as_ref().ok_or(SessionError::NoFile)
    }

    fn open_file_mut(&mut self) -> Result<&mut OpenFile, SessionError> {
        self.open.as_mut().ok_or(SessionError::NoFile)
    }

    /// Read `path`, derive defaults and replace any previously open file.
    pub fn open(&mut self, path: &Path) -> Result<OpenOutcome, SessionError> {
        self.load(path, DateChoice::default())
    }

    fn load(&mut self, path: &Path, date_choice: DateChoice) -> Result<OpenOutcome, SessionError> {
        let metadata = self.tool.load(path)?;
        let derivation = naming::derive_for_path(path, &self.rules).map_err(|source| {
            SessionError::Timestamp {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::info!("Opened {}", path.display());

        let mut warnings: Vec<Warning> = derivation
            .warnings
            .iter()
            .cloned()
            .map(Warning::Naming)
            .collect();
        let mut record = MetadataRecord::from_metadata(&metadata);
        let chain = TransferChain::initial(&self.config);
        self.apply_defaults(&mut record, &metadata, &derivation, date_choice, &chain);

        if let Some(derived) = &derivation.description {
            let stored = metadata.value(Field::Description);
            if stored.is_empty() {
                record.set_default(Field::Description, derived.clone());
            } else if stored != derived {
                tracing::warn!("BWF Description is inconsistent with filename; regenerating");
                record.edit(Field::Description, derived.clone());
                warnings.push(Warning::DescriptionRegenerated {
                    stored: stored.to_string(),
                    derived: derived.clone(),
                });
            }
        }

        let outcome = OpenOutcome {
            warnings,
            conflict: derivation.conflict.clone(),
            digest_stored: !metadata.tech.md5_stored().is_empty(),
        };
        self.open = Some(OpenFile {
            metadata,
            record,
            derivation,
            date_choice,
            template: None,
            chain,
        });
        Ok(outcome)
    }

    fn apply_defaults(
        &self,
        record: &mut MetadataRecord,
        metadata: &FileMetadata,
        derivation: &Derivation,
        date_choice: DateChoice,
        chain: &TransferChain,
    ) {
        let config = &self.config;
        let first = |list: &[String]| list.first().cloned().unwrap_or_default();
        record.set_default(Field::OriginationDate, derivation.origination_date(date_choice));
        record.set_default(Field::OriginationTime, derivation.origination_time());
        record.set_default(
            Field::OriginatorReference,
            derivation.originator_reference(date_choice),
        );
        record.set_default(Field::Originator, config.originator.clone());
        record.set_default(Field::ArchivalLocation, config.iarl.clone());
        record.set_default(Field::Copyright, config.default_copyright());
        record.set_default(Field::Technician, first(&config.technician));
        record.set_default(Field::Software, first(&config.isft));
        record.set_default(Field::Source, first(&config.source));
        record.set_default(Field::Owner, first(&config.owner));
        record.set_default(Field::Form, first(&config.form));
        record.set_default(Field::Creator, first(&config.creator));
        record.set_default(
            Field::CodingHistory,
            coding_history::build(config, chain, &metadata.tech),
        );
    }

    /// Pick which date backs the derived origination fields.
    pub fn resolve_date_conflict(&mut self, choice: DateChoice) -> Result<(), SessionError> {
        let open = self.open_file_mut()?;
        open.date_choice = choice;
        open.record.set_default(
            Field::OriginationDate,
            open.derivation.origination_date(choice),
        );
        open.record.set_default(
            Field::OriginatorReference,
            open.derivation.originator_reference(choice),
        );
        Ok(())
    }

    /// Offer the metadata of `path` as template candidates.
    ///
    /// Returns the fields whose display switched to the template value.
    pub fn open_template(&mut self, path: &Path) -> Result<Vec<Field>, SessionError> {
        self.open_file()?;
        let template = self.tool.load(path)?;
        let open = self.open_file_mut()?;
        let switched = open.record.apply_template(&template);
        open.template = Some(path.to_path_buf());
        tracing::info!(
            "Applied template {} to {} field(s)",
            path.display(),
            switched.len()
        );
        Ok(switched)
    }

    pub fn edit(&mut self, field: Field, text: impl Into<String>) -> Result<(), SessionError> {
        self.open_file_mut()?.record.edit(field, text);
        Ok(())
    }

    pub fn revert(&mut self, field: Field, candidate: Candidate) -> Result<(), SessionError> {
        self.open_file_mut()?.record.revert(field, candidate)?;
        Ok(())
    }

    /// Enter the configured text of copyright choice `name`.
    pub fn select_copyright(&mut self, name: &str) -> Result<(), SessionError> {
        let text = self
            .config
            .copyright
            .text(name)
            .ok_or_else(|| SessionError::UnknownChoice {
                group: "copyright",
                name: name.to_string(),
            })?
            .to_string();
        self.open_file_mut()?.record.edit(Field::Copyright, text);
        Ok(())
    }

    /// Change the transfer chain and regenerate the Coding History as an edit.
    pub fn select_equipment(&mut self, chain: TransferChain) -> Result<(), SessionError> {
        for (group, choices, name) in [
            ("deck", &self.config.deck, &chain.deck),
            ("adc", &self.config.adc, &chain.adc),
            ("software", &self.config.software, &chain.software),
        ] {
            if !choices.contains(name) {
                return Err(SessionError::UnknownChoice {
                    group,
                    name: name.clone(),
                });
            }
        }
        let open = self.open.as_mut().ok_or(SessionError::NoFile)?;
        let history = coding_history::build(&self.config, &chain, &open.metadata.tech);
        open.record.edit(Field::CodingHistory, history);
        open.chain = chain;
        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.open
            .as_ref()
            .is_some_and(|open| open.record.has_changes())
    }

    /// Persist every changed field, reporting each step to `progress`.
    pub fn save<F>(&self, options: &SaveOptions, progress: F) -> Result<SaveReport, SessionError>
    where
        F: FnMut(SaveProgress),
    {
        let open = self.open_file()?;
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Ok(save::run(
            &self.tool,
            &open.metadata,
            &open.record,
            options,
            now,
            progress,
        ))
    }

    /// Re-read the open file so originals reflect what was just written.
    ///
    /// The template and any unsaved edits are discarded; the date choice is kept.
    pub fn reload(&mut self) -> Result<OpenOutcome, SessionError> {
        let open = self.open_file()?;
        let path = open.metadata.path.clone();
        let choice = open.date_choice;
        self.load(&path, choice)
    }

    /// Write the PBCore document and/or MP3 access copy of the saved file.
    pub fn export(&self, options: &ExportOptions) -> Result<ExportReport, SessionError> {
        let open = self.open_file()?;
        if open.record.has_changes() {
            return Err(SessionError::UnsavedChanges);
        }
        let mut report = ExportReport::default();
        if let Some(target) = &options.pbcore {
            export::pbcore::write_file(target, &open.metadata)?;
            report.pbcore = Some(target.clone());
        }
        if let Some(target) = &options.mp3 {
            export::lame::encode(
                self.tool.runner(),
                &open.metadata,
                target,
                options.vbr_level,
            )?;
            report.mp3 = Some(target.clone());
        }
        Ok(report)
    }
}
