mod harness;

use bespon_core::{parse, ErrorKind, LoadOptions};
use harness::*;

#[test]
fn lexical_faults() {
    assert!(matches!(
        load_err("k = \"unterminated\n"),
        ErrorKind::InvalidLineBreak | ErrorKind::UnterminatedString(_)
    ));
    assert!(matches!(
        load_err("k = \"bad \\q escape\"\n"),
        ErrorKind::InvalidEscape(_)
    ));
    assert!(matches!(load_err("k = 1__2\n"), ErrorKind::BadNumber(_)));
    assert!(matches!(load_err("k = 0x1.8\n"), ErrorKind::BadNumber(_)));
    assert!(matches!(
        load_err("k = \u{0007}\n"),
        ErrorKind::DisallowedCodePoint(7)
    ));
    assert!(matches!(load_err("k = @\n"), ErrorKind::UnknownToken('@')));
}

#[test]
fn unterminated_string_reports_its_start() {
    let err = parse("k = 'open\n", &LoadOptions::default()).unwrap_err();
    // A single-quoted string may wrap, so the fault is the missing closing
    // quote at end of input, anchored at the opening quote.
    assert_eq!(err.pos.line, 1);
    assert_eq!(err.pos.col, 5);
}

#[test]
fn structural_faults() {
    assert!(matches!(
        load_err("d = {a = 1\n"),
        ErrorKind::UnbalancedDelimiter('{')
    ));
    assert!(matches!(
        load_err("l = [1,,2]\n"),
        ErrorKind::EmptyCollectionItem
    ));
    assert!(matches!(
        load_err("l = [1, 2\n"),
        ErrorKind::UnbalancedDelimiter('[')
    ));
    assert!(matches!(
        load_err("items =\n    *\n"),
        ErrorKind::EmptyCollectionItem
    ));
    assert!(matches!(load_err("|===\nk = 1\n"), ErrorKind::BadSection(_)));
    assert!(matches!(load_err("|===/\n"), ErrorKind::BadSection(_)));
    assert!(matches!(
        load_err("a = 1\n   b = 2\n"),
        ErrorKind::Indent(_)
    ));
}

#[test]
fn mixed_indentation_is_rejected() {
    assert!(matches!(
        load_err("d =\n  a = 1\n\t\tb = 2\n"),
        ErrorKind::MixedIndent
    ));
}

#[test]
fn misaligned_continuation_rejected() {
    // A deeper entry line under a scalar value is an indentation fault.
    assert!(matches!(
        load_err("a = b\n  c = d\n"),
        ErrorKind::Indent(_)
    ));
}

#[test]
fn tag_faults() {
    assert!(matches!(
        load_err("k = (frobnicate=1)> {}\n"),
        ErrorKind::UnknownTagKeyword(_) | ErrorKind::TagMismatch(_)
    ));
    assert!(matches!(
        load_err("k = (mystery)> {}\n"),
        ErrorKind::UnknownType(_)
    ));
    assert!(matches!(
        load_err("k = (list)> {a = 1}\n"),
        ErrorKind::IncompatibleType(..)
    ));
    assert!(matches!(
        load_err("k = (str)> (int)> 1\n"),
        ErrorKind::TagMismatch(_)
    ));
    assert!(matches!(
        load_err("k = (overwrite=maybe)> {}\n"),
        ErrorKind::TagMismatch(_)
    ));
}

#[test]
fn numeric_overflow() {
    assert!(matches!(
        load_err("k = 99999999999999999999\n"),
        ErrorKind::NumericOverflow
    ));
    assert!(matches!(
        load_err("k = 1e999\n"),
        ErrorKind::NumericOverflow
    ));
    let options = LoadOptions::default().with_float_overflow_to_inf(true);
    let doc = load_with("k = 1e999\n", &options);
    assert_eq!(
        doc.root().get("k").and_then(|v| v.as_float()),
        Some(f64::INFINITY)
    );
}

#[test]
fn errors_carry_position_and_snippet() {
    let err = parse("ok = 1\nbad = @\n", &LoadOptions::default()).unwrap_err();
    assert_eq!(err.pos.line, 2);
    assert_eq!(err.pos.col, 7);
    assert_eq!(err.snippet, "bad = @");
    let rendered = err.to_string();
    assert!(rendered.starts_with("2:7:"));
    assert!(rendered.contains("bad = @"));
}

#[test]
fn rational_with_zero_denominator() {
    assert!(matches!(load_err("k = 1/0\n"), ErrorKind::BadNumber(_)));
}

#[test]
fn blank_line_inside_wrapped_string() {
    assert!(matches!(
        load_err("k = \"one\n\n    two\"\n"),
        ErrorKind::InvalidLineBreak
    ));
}
