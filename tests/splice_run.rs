mod support;

use autobwf::bwf::BwfMetaEdit;
use autobwf::export::splice::{self, SpliceError};
use support::fake_tool::FakeTool;
use time::macros::datetime;

#[test]
fn splice_records_command_and_tags_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("joined.wav");
    let edl = format!(
        "a.wav 0 10 fade 0.5 1\nb.wav 2 5\n{} contrast 20\n",
        output.display()
    );
    let plan = splice::parse_edl(&edl).unwrap();
    let fake = FakeTool::new();
    fake.add_file(&output, &[], &[]);
    let tool = BwfMetaEdit::new(&fake, false);

    let report = splice::run(&plan, &tool, dir.path(), datetime!(2021-06-07 08:09:10 UTC)).unwrap();

    assert_eq!(report.command_file, dir.path().join("autosplice2021-06-07T080910.cmd"));
    let command = std::fs::read_to_string(&report.command_file).unwrap();
    assert!(command.starts_with("sox -V6 \"| sox a.wav -t wav - trim 0 =10 fade 0.5 -0 1\""));
    assert!(report.log_file.exists());
    assert_eq!(report.sox_version, "SoX v14.4.2");
    assert_eq!(fake.core_value(&output, "ICMT"), command);
    assert_eq!(fake.core_value(&output, "ISFT"), "SoX v14.4.2");
    assert_eq!(fake.operations()[0], "--MD5-embed");
}

#[test]
fn edl_without_output_line_is_rejected() {
    assert!(matches!(
        splice::parse_edl("a.wav 0 10\n"),
        Err(SpliceError::NoOutput)
    ));
}
