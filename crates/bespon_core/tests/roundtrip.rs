mod harness;

use bespon_core::{
    parse_roundtrip_with, path, ErrorKind, LoadOptions, PathSeg, RoundTripOptions, Value,
};
use harness::*;

#[test]
fn untouched_documents_dump_byte_identical() {
    assert_roundtrip_fidelity("k = 1\n");
    assert_roundtrip_fidelity("d = {a = 1, b = 2,}\n");
    assert_roundtrip_fidelity(
        "# header\n### doc ###\nkey.sub = 1   # trailing\na = {x = 1, y = [1, 2,],}\n",
    );
    assert_roundtrip_fidelity("|=== section.sub\na = 1\n|===/\nb = 2\n");
    assert_roundtrip_fidelity("text =\n    '''\n    block line\n      deeper\n    '''\n");
    assert_roundtrip_fidelity("list =\n    * 1\n    * wrapped words\n      over lines\n");
    assert_roundtrip_fidelity("t = (dict, overwrite=true)> {k = 1, k = 2}\n");
    assert_roundtrip_fidelity("crlf = 1\r\nnext = 2\r\n");
}

#[test]
fn rename_and_replace_with_style_preservation() {
    let source = "key.subkey.first = 123   # Comment\n\
                  key.subkey.second = 0b1101\n\
                  key.subkey.third = `literal \\string`\n";
    let mut ast = edit(source);
    ast.replace_key(&path(["key", "subkey"]), Value::Str("sk".into()))
        .unwrap();
    ast.replace_val(&path(["key", "sk", "second"]), Value::Int(7))
        .unwrap();
    ast.replace_val(
        &path(["key", "sk", "third"]),
        Value::Str(r"\another \literal".into()),
    )
    .unwrap();
    ast.replace_key(&path(["key", "sk", "third"]), Value::Str("fourth".into()))
        .unwrap();

    let expected = "key.sk.first = 123   # Comment\n\
                    key.sk.second = 0b111\n\
                    key.sk.fourth = `\\another \\literal`\n";
    assert_eq!(ast.dumps(), expected);
    assert!(ast.diagnostics().is_empty());
}

#[test]
fn numeric_bases_are_preserved() {
    let mut ast = edit("h = 0x10\no = 0o17\nb = 0b1\ng = 1_000_000\n");
    ast.replace_val(&path(["h"]), Value::Int(255)).unwrap();
    ast.replace_val(&path(["o"]), Value::Int(8)).unwrap();
    ast.replace_val(&path(["b"]), Value::Int(5)).unwrap();
    ast.replace_val(&path(["g"]), Value::Int(1234)).unwrap();
    assert_eq!(ast.dumps(), "h = 0xff\no = 0o10\nb = 0b101\ng = 1_234\n");
}

#[test]
fn hex_floats_stay_hex() {
    let mut ast = edit("x = 0x4.3p2\n");
    ast.replace_val(&path(["x"]), Value::Float(3.0)).unwrap();
    assert_eq!(ast.dumps(), "x = 0x1.8p1\n");
}

#[test]
fn quote_styles_are_preserved() {
    let mut ast = edit("a = \"old\"\nb = 'plain'\nc = word\n");
    ast.replace_val(&path(["a"]), Value::Str("new \"quoted\"".into()))
        .unwrap();
    ast.replace_val(&path(["b"]), Value::Str("still plain".into()))
        .unwrap();
    ast.replace_val(&path(["c"]), Value::Str("other".into()))
        .unwrap();
    assert_eq!(
        ast.dumps(),
        "a = \"new \\\"quoted\\\"\"\nb = 'still plain'\nc = other\n"
    );
    assert!(ast.diagnostics().is_empty());
}

#[test]
fn delimiter_runs_promote_when_needed() {
    let mut ast = edit("t = 'simple'\n");
    ast.replace_val(&path(["t"]), Value::Str("it's got quotes".into()))
        .unwrap();
    assert_eq!(ast.dumps(), "t = '''it's got quotes'''\n");
    assert!(ast.diagnostics().is_empty());
}

#[test]
fn impossible_styles_fall_back_with_a_diagnostic() {
    let mut ast = edit("t = `raw`\n");
    ast.replace_val(&path(["t"]), Value::Str("two\nlines".into()))
        .unwrap();
    assert_eq!(ast.dumps(), "t = \"two\\nlines\"\n");
    assert_eq!(ast.diagnostics().len(), 1);
    assert!(matches!(
        ast.diagnostics()[0].kind,
        ErrorKind::StyleFallback
    ));
}

#[test]
fn booleans_and_none_regenerate_canonically() {
    let mut ast = edit("a = true\nb = none\n");
    ast.replace_val(&path(["a"]), Value::Bool(false)).unwrap();
    ast.replace_val(&path(["b"]), Value::None).unwrap();
    assert_eq!(ast.dumps(), "a = false\nb = none\n");
}

#[test]
fn type_enforcement() {
    let mut ast = edit("n = 5\n");
    let err = ast
        .replace_val(&path(["n"]), Value::Str("five".into()))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ReplaceTypeMismatch(_)));

    let mut loose = parse_roundtrip_with(
        "n = 5\n",
        &LoadOptions::default(),
        RoundTripOptions {
            enforce_types: false,
        },
    )
    .unwrap();
    loose
        .replace_val(&path(["n"]), Value::Str("five".into()))
        .unwrap();
    assert_eq!(loose.dumps(), "n = five\n");
}

#[test]
fn rename_collisions_and_missing_paths() {
    let mut ast = edit("a = 1\nb = 2\n");
    let err = ast
        .replace_key(&path(["a"]), Value::Str("b".into()))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::KeyCollision(_)));

    let err = ast
        .replace_val(&path(["missing"]), Value::Int(1))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::PathNotFound));

    let err = ast
        .replace_val(&[PathSeg::Index(0)], Value::Int(1))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::PathNotFound));
}

#[test]
fn list_indices_address_items() {
    let mut ast = edit("items = [10, 0x20, 30]\n");
    let item_path = [PathSeg::Key("items".into()), PathSeg::Index(1)];
    ast.replace_val(&item_path, Value::Int(255)).unwrap();
    assert_eq!(ast.dumps(), "items = [10, 0xff, 30]\n");
}

#[test]
fn cursor_reads_comments() {
    let source = "### key doc ###\nk =  # after equals\n    \"value\"\nplain = 1  # note\n";
    let ast = edit(source);

    let k = ast.get(&path(["k"])).unwrap();
    assert_eq!(k.key_doc_comment(), Some("### key doc ###"));
    assert_eq!(k.key_trailing_comment(), Some("# after equals"));
    assert_eq!(k.value_str().as_deref(), Some("value"));

    let plain = ast.get(&path(["plain"])).unwrap();
    assert_eq!(plain.value_trailing_comment(), Some("# note"));
    assert_eq!(plain.key_doc_comment(), None);
}

#[test]
fn cursor_reads_collection_comment_anchors() {
    let source = "d = {  # start\n    a = 1\n}  # end\n";
    let ast = edit(source);
    let d = ast.get(&path(["d"])).unwrap();
    assert_eq!(d.value_start_trailing_comment(), Some("# start"));
    assert_eq!(d.value_end_trailing_comment(), Some("# end"));
}

#[test]
fn comment_slots_can_be_rewritten_but_not_created() {
    let source = "a = 1  # old note\nb = 2\n";
    let mut ast = edit(source);

    let mut cursor = ast.cursor_mut(path(["a"])).unwrap();
    cursor.set_value_trailing_comment("new note").unwrap();

    let mut cursor = ast.cursor_mut(path(["b"])).unwrap();
    let err = cursor.set_value_trailing_comment("added").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::PathNotFound));

    assert_eq!(ast.dumps(), "a = 1  # new note\nb = 2\n");
}

#[test]
fn repeated_replacement_keeps_original_style() {
    let mut ast = edit("n = 0b1101\n");
    ast.replace_val(&path(["n"]), Value::Int(7)).unwrap();
    ast.replace_val(&path(["n"]), Value::Int(2)).unwrap();
    assert_eq!(ast.dumps(), "n = 0b10\n");
}

#[test]
fn phrase_values_replace_as_a_unit() {
    let mut ast = edit("k = some words here  # kept\n");
    ast.replace_val(&path(["k"]), Value::Str("fewer words".into()))
        .unwrap();
    assert_eq!(ast.dumps(), "k = fewer words  # kept\n");
}

#[test]
fn keypath_rename_touches_every_occurrence() {
    let source = "a.b.x = 1\n|=== a.b\ny = 2\n|===/\n";
    let mut ast = edit(source);
    ast.replace_key(&path(["a", "b"]), Value::Str("c".into()))
        .unwrap();
    assert_eq!(ast.dumps(), "a.c.x = 1\n|=== a.c\ny = 2\n|===/\n");
}
