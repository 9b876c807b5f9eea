//! Library exports shared by the autoBWF binaries and tests.
/// Application data directory resolution.
pub mod app_dirs;
/// bwfmetaedit adapter, field catalogue and XMP packets.
pub mod bwf;
/// Coding History text from the transfer chain.
pub mod coding_history;
/// Repository configuration document.
pub mod config;
/// PBCore, CSV, MP3, OHMS and splice exports.
pub mod export;
/// Logging setup.
pub mod logging;
/// Defaults derived from filenames and timestamps.
pub mod naming;
/// Original/template/edited provenance of form fields.
pub mod provenance;
/// Form controller and save orchestration.
pub mod session;
