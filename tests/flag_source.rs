//! FlagSource parsing tests.

use std::io::Write;

use shotsplit::{FlagSource, FrameDecoder, ShotsplitError};

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp file");
    file
}

// ── Text form ──────────────────────────────────────────────────────

#[test]
fn parse_whitespace_tokens() {
    let source = FlagSource::parse("0 1\n1 0\t0").unwrap();
    assert_eq!(source.flags(), &[false, true, true, false, false]);
}

#[test]
fn parse_commas_and_words() {
    let source = FlagSource::parse("false, true,TRUE ,0").unwrap();
    assert_eq!(source.flags(), &[false, true, true, false]);
}

#[test]
fn parse_skips_comments_and_blank_lines() {
    let source = FlagSource::parse("# detector v2\n\n0 0\n  # fade\n1\n").unwrap();
    assert_eq!(source.flags(), &[false, false, true]);
}

#[test]
fn parse_empty_text() {
    let source = FlagSource::parse("").unwrap();
    assert_eq!(source.frame_count(), 0);
}

#[test]
fn parse_bad_token_reports_line() {
    match FlagSource::parse("0 1\n0 maybe") {
        Err(ShotsplitError::InvalidInput(message)) => {
            assert!(message.contains("'maybe'"));
            assert!(message.contains("line 2"));
        }
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

// ── JSON form ──────────────────────────────────────────────────────

#[test]
fn parse_json_booleans() {
    let source = FlagSource::parse("[false, true, false]").unwrap();
    assert_eq!(source.flags(), &[false, true, false]);
}

#[test]
fn parse_json_integers() {
    let source = FlagSource::parse("  [0, 1, 1, 0]").unwrap();
    assert_eq!(source.flags(), &[false, true, true, false]);
}

#[test]
fn parse_json_out_of_range_integer() {
    match FlagSource::parse("[0, 2]") {
        Err(ShotsplitError::InvalidInput(message)) => assert!(message.contains("position 1")),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn parse_json_wrong_type() {
    assert!(matches!(
        FlagSource::parse(r#"[true, "cut"]"#),
        Err(ShotsplitError::InvalidInput(_))
    ));
}

#[test]
fn parse_malformed_json() {
    assert!(matches!(
        FlagSource::parse("[0, 1"),
        Err(ShotsplitError::Json(_))
    ));
}

// ── Files & readers ────────────────────────────────────────────────

#[test]
fn from_path_text_file() {
    let file = write_temp("0 0 1\n0\n");
    let source = FlagSource::from_path(file.path()).unwrap();
    assert_eq!(source.frame_count(), 4);
}

#[test]
fn from_path_json_file() {
    let file = write_temp("[1, 0, 0]");
    let source = FlagSource::from_path(file.path()).unwrap();
    assert_eq!(source.flags(), &[true, false, false]);
}

#[test]
fn from_path_missing_file() {
    let directory = tempfile::tempdir().unwrap();
    let result = FlagSource::from_path(directory.path().join("missing.txt"));
    assert!(matches!(result, Err(ShotsplitError::IoError(_))));
}

#[test]
fn from_reader_bytes() {
    let source = FlagSource::from_reader(&b"1 0 1"[..]).unwrap();
    assert_eq!(source.flags(), &[true, false, true]);
}

// ── Decoding ───────────────────────────────────────────────────────

#[test]
fn decode_marks_frames() {
    let source = FlagSource::from(vec![false, true]);
    let frame = source.decode(1).unwrap();
    assert_eq!(frame.index, 1);
    assert!(frame.boundary);
}

#[test]
fn decode_out_of_range() {
    let source = FlagSource::new(vec![false]);
    let reason = source.decode(3).unwrap_err();
    assert!(reason.contains("out of range"));
}
