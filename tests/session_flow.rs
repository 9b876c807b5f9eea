mod support;

use std::path::{Path, PathBuf};

use autobwf::bwf::{BwfError, BwfMetaEdit, Field};
use autobwf::coding_history::TransferChain;
use autobwf::config::{AppConfig, DEFAULT_CONFIG_JSON, parse};
use autobwf::naming::{DateChoice, FileTimestamp};
use autobwf::provenance::{Candidate, FieldState};
use autobwf::session::{
    ExportOptions, SaveOptions, SaveStep, Session, SessionError, Warning,
};
use support::fake_tool::{FakeTool, STORED_DIGEST};
use tempfile::TempDir;

fn config() -> AppConfig {
    parse(DEFAULT_CONFIG_JSON).expect("default config parses")
}

/// A real (empty) file on disk, so timestamps can be read.
fn touch(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"RIFF").expect("create file");
    path
}

fn session(fake: &FakeTool) -> Session<&FakeTool> {
    Session::new(config(), BwfMetaEdit::new(fake, true)).expect("session")
}

fn save(session: &Session<&FakeTool>) -> autobwf::session::SaveReport {
    session
        .save(&SaveOptions::default(), |_| {})
        .expect("save runs")
}

#[test]
fn saved_values_become_originals_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(&dir, "tape.wav");
    let fake = FakeTool::new();
    fake.add_file(&path, &[("TimeReference", "1024")], &[]);
    let mut session = session(&fake);

    let outcome = session.open(&path).unwrap();
    assert!(matches!(
        outcome.warnings.as_slice(),
        [Warning::Naming(autobwf::naming::NamingWarning::NonConformingFilename { .. })]
    ));
    session.edit(Field::Title, "Interview with a DJ").unwrap();
    session.edit(Field::Language, "English;Ukrainian").unwrap();
    assert!(session.has_unsaved_changes());

    let report = save(&session);
    assert!(report.is_success());
    assert!(report.time_reference_reset);
    assert!(report.xmp_written);
    assert_eq!(fake.core_value(&path, "INAM"), "Interview with a DJ");
    assert_eq!(fake.core_value(&path, "TimeReference"), "0");

    session.reload().unwrap();
    let record = session.record().unwrap();
    assert_eq!(record.entry(Field::Title).original(), "Interview with a DJ");
    assert_eq!(record.entry(Field::Title).state(), FieldState::Original);
    assert_eq!(record.entry(Field::Language).original(), "English;Ukrainian");
    assert_eq!(
        record.entry(Field::Originator).original(),
        "Apocryphal St. U. Archives"
    );
    assert!(!session.has_unsaved_changes());
}

#[test]
fn second_save_without_edits_makes_no_calls() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(&dir, "tape.wav");
    let fake = FakeTool::new();
    fake.add_file(&path, &[("TimeReference", "0")], &[]);
    let mut session = session(&fake);
    session.open(&path).unwrap();
    save(&session);
    session.reload().unwrap();

    fake.clear_calls();
    let report = save(&session);
    assert!(report.unchanged);
    assert!(fake.calls().is_empty());
}

#[test]
fn only_changed_fields_are_written_with_history_last() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(&dir, "tape.wav");
    let fake = FakeTool::new();
    fake.add_file(&path, &[("TimeReference", "0")], &[]);
    let mut session = session(&fake);
    session.open(&path).unwrap();
    save(&session);
    session.reload().unwrap();
    fake.clear_calls();

    let chain = TransferChain {
        deck: "Realistic".into(),
        media: "cassette".into(),
        ..session.transfer_chain().cloned().unwrap()
    };
    session.select_equipment(chain).unwrap();
    session.edit(Field::Title, "Side B").unwrap();
    session.edit(Field::Comment, "Dropouts at 12:00").unwrap();
    let mut steps = Vec::new();
    let report = session
        .save(&SaveOptions::default(), |progress| steps.push(progress.step))
        .unwrap();

    let writes = fake.field_writes();
    assert_eq!(writes.len(), 3);
    assert_eq!(writes[0], "--INAM=Side B");
    assert_eq!(writes[1], "--ICMT=Dropouts at 12:00");
    assert!(writes[2].starts_with("--History=A=ANALOGUE,M=stereo,T=Realistic 909A SN:1234321; cassette"));
    assert_eq!(fake.operations().last().map(|op| op.starts_with("--in-XMP=")), Some(true));
    assert_eq!(
        report.written,
        vec![Field::Title, Field::Comment, Field::CodingHistory]
    );
    assert_eq!(steps.last(), Some(&SaveStep::Xmp));
    assert_eq!(steps[steps.len() - 2], SaveStep::Field(Field::CodingHistory));
}

#[test]
fn xmp_packet_is_rewritten_even_when_only_core_fields_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(&dir, "tape.wav");
    let fake = FakeTool::new();
    fake.add_file(&path, &[("TimeReference", "0")], &[]);
    let mut session = session(&fake);
    session.open(&path).unwrap();
    session.edit(Field::Topics, "Radio;Jazz").unwrap();
    save(&session);
    session.reload().unwrap();
    fake.clear_calls();

    session.edit(Field::Title, "Renamed").unwrap();
    save(&session);
    let packet = fake.xmp_packet(&path).unwrap();
    assert!(packet.contains("<rdf:li>Jazz</rdf:li>"));
    assert!(packet.contains("xmp:MetadataDate"));
    session.reload().unwrap();
    assert_eq!(
        session.record().unwrap().entry(Field::Topics).original(),
        "Radio;Jazz"
    );
}

#[test]
fn template_fills_fields_but_keeps_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(&dir, "tape.wav");
    let template = touch(&dir, "template.wav");
    let fake = FakeTool::new();
    fake.add_file(&path, &[("ICOP", "Own statement")], &[]);
    fake.add_file(
        &template,
        &[
            ("INAM", "Template title"),
            ("ITCH", "Doe, Jane"),
            ("ICOP", "Own statement"),
            ("Description", "Not templated"),
        ],
        &[],
    );
    let mut session = session(&fake);
    session.open(&path).unwrap();
    session.edit(Field::Title, "Typed first").unwrap();

    let switched = session.open_template(&template).unwrap();
    assert_eq!(switched, vec![Field::Technician]);
    let record = session.record().unwrap();
    assert_eq!(record.display(Field::Title), "Typed first");
    assert_eq!(record.display(Field::Technician), "Doe, Jane");
    assert_eq!(record.entry(Field::Copyright).state(), FieldState::Original);
    assert_eq!(record.entry(Field::Description).template(), None);

    session.revert(Field::Title, Candidate::Template).unwrap();
    assert_eq!(session.record().unwrap().display(Field::Title), "Template title");
}

#[test]
fn conforming_name_with_stale_description_is_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(&dir, "acc_2020-01-02_RL1_010101_pres_20200102.wav");
    let today = FileTimestamp::of_file(&path).unwrap();
    let fake = FakeTool::new();
    fake.add_file(&path, &[("Description", "Something else")], &[]);
    let mut session = session(&fake);

    let outcome = session.open(&path).unwrap();
    let record = session.record().unwrap();
    assert_eq!(
        record.display(Field::Description),
        "File content: 2020.01.02RL1; File use: Preservation Master; Original filename: acc_2020-01-02_RL1_010101_pres_20200102.wav"
    );
    assert_eq!(record.entry(Field::Description).state(), FieldState::Edited);
    assert!(outcome
        .warnings
        .iter()
        .any(|warning| matches!(warning, Warning::DescriptionRegenerated { .. })));
    if today.date != "2020-01-02" {
        let conflict = outcome.conflict.clone().unwrap();
        assert_eq!(conflict.from_filename, "2020-01-02");
        assert_eq!(record.display(Field::OriginationDate), "2020-01-02");
        session.resolve_date_conflict(DateChoice::Timestamp).unwrap();
        assert_eq!(
            session.record().unwrap().display(Field::OriginationDate),
            today.date
        );
    }

    session.revert(Field::Description, Candidate::Original).unwrap();
    assert_eq!(
        session.record().unwrap().display(Field::Description),
        "Something else"
    );
}

#[test]
fn failed_write_is_reported_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(&dir, "tape.wav");
    let fake = FakeTool::new();
    fake.add_file(&path, &[("TimeReference", "0")], &[]);
    fake.fail_writes_to("ICOP");
    let mut session = session(&fake);
    session.open(&path).unwrap();
    session.select_copyright("CC-BY-SA").unwrap();

    let report = save(&session);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].step, SaveStep::Field(Field::Copyright));
    assert!(report.written.contains(&Field::ArchivalLocation));
    assert!(report.written.contains(&Field::CodingHistory));
    assert!(report.xmp_written);
}

#[test]
fn digest_is_embedded_first_unless_already_stored() {
    let dir = tempfile::tempdir().unwrap();
    let fresh = touch(&dir, "fresh.wav");
    let stored = touch(&dir, "stored.wav");
    let fake = FakeTool::new();
    fake.add_file(&fresh, &[("TimeReference", "0")], &[]);
    fake.add_file(&stored, &[("TimeReference", "0")], &[("MD5Stored", STORED_DIGEST)]);
    let options = SaveOptions { embed_digest: true };

    let mut session = session(&fake);
    session.open(&fresh).unwrap();
    fake.clear_calls();
    let report = session.save(&options, |_| {}).unwrap();
    assert!(report.digest_embedded);
    assert_eq!(fake.operations()[0], "--MD5-embed");

    let outcome = session.open(&stored).unwrap();
    assert!(outcome.digest_stored);
    fake.clear_calls();
    let report = session.save(&options, |_| {}).unwrap();
    assert!(!report.digest_embedded);
    assert!(!fake.operations().contains(&"--MD5-embed".to_string()));
}

#[test]
fn invalid_wave_is_rejected_without_opening() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(&dir, "broken.wav");
    let fake = FakeTool::new();
    fake.add_file(&path, &[], &[("Errors", "RIFF size mismatch")]);
    let mut session = session(&fake);
    let err = session.open(&path).unwrap_err();
    assert!(matches!(err, SessionError::Bwf(BwfError::NotWave { .. })));
    assert!(session.record().is_none());
}

#[test]
fn export_requires_saved_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = touch(&dir, "tape.wav");
    let fake = FakeTool::new();
    fake.add_file(&path, &[("TimeReference", "0")], &[]);
    let mut session = session(&fake);
    session.open(&path).unwrap();
    session.edit(Field::Title, "Unsaved").unwrap();

    let options = ExportOptions::defaults_for(&path);
    assert_eq!(options.pbcore.as_deref(), Some(dir.path().join("tape_pbcore.xml").as_path()));
    assert!(matches!(
        session.export(&options),
        Err(SessionError::UnsavedChanges)
    ));

    save(&session);
    session.reload().unwrap();
    let report = session.export(&options).unwrap();
    let pbcore = std::fs::read_to_string(report.pbcore.unwrap()).unwrap();
    assert!(pbcore.contains("<pbcoreTitle>Unsaved</pbcoreTitle>"));
    let lame = fake
        .calls()
        .into_iter()
        .find(|(program, _)| program == "lame")
        .map(|(_, args)| args)
        .unwrap();
    assert!(lame.contains(&"TIT2=Unsaved".to_string()));
    assert_eq!(lame.last().map(|arg| Path::new(arg).to_path_buf()), Some(dir.path().join("tape.mp3")));
}
