mod harness;

use bespon_core::{parse, parse_bytes, ErrorKind, LoadOptions, Value};
use harness::*;

#[test]
fn simple_load() {
    let doc = load("k = 1\n");
    let root = doc.root();
    assert_eq!(root.len(), 1);
    assert_int(root.get("k"), 1);
}

#[test]
fn scalar_kinds() {
    let doc = load(
        "s = \"text\"\nu = plain\nb = true\nn = none\nf = 1.5\ni = -12\nc = 4+3i\nr = 2/3\n",
    );
    let root = doc.root();
    assert_str(root.get("s"), "text");
    assert_str(root.get("u"), "plain");
    assert_eq!(root.get("b").and_then(|v| v.as_bool()), Some(true));
    assert!(root.get("n").is_some_and(|v| v.is_none()));
    assert_eq!(root.get("f").and_then(|v| v.as_float()), Some(1.5));
    assert_int(root.get("i"), -12);
    assert_eq!(root.get("c").and_then(|v| v.as_complex()), Some((4.0, 3.0)));
    assert_eq!(root.get("r").and_then(|v| v.as_rational()), Some((2, 3)));
}

#[test]
fn hex_float_and_special_floats() {
    let doc = load("x = 0x4.3p2\ny = -inf\nz = nan\n");
    let root = doc.root();
    assert_eq!(root.get("x").and_then(|v| v.as_float()), Some(16.75));
    assert_eq!(
        root.get("y").and_then(|v| v.as_float()),
        Some(f64::NEG_INFINITY)
    );
    assert!(root.get("z").and_then(|v| v.as_float()).unwrap().is_nan());
}

#[test]
fn nan_key_is_rejected() {
    assert!(matches!(load_err("nan = 1\n"), ErrorKind::BadNumber(_)));
}

#[test]
fn wrapped_unquoted_value() {
    let doc = load("k = some words here\n");
    assert_str(doc.root().get("k"), "some words here");

    let doc = load("k = first line\n    continued words\nnext = 1\n");
    assert_str(doc.root().get("k"), "first line continued words");
    assert_int(doc.root().get("next"), 1);
}

#[test]
fn indent_style_nesting() {
    let doc = load("outer =\n    inner = 1\n    other = two\nafter = 3\n");
    let root = doc.root();
    assert_int(root.get("outer").and_then(|v| v.get("inner")), 1);
    assert_str(root.get("outer").and_then(|v| v.get("other")), "two");
    assert_int(root.get("after"), 3);
}

#[test]
fn indent_style_lists() {
    let doc = load("items =\n    * 1\n    * 2\n    * three\n");
    let items = doc.root().get("items").unwrap();
    assert_eq!(items.len(), 3);
    assert_int(items.at(0), 1);
    assert_int(items.at(1), 2);
    assert_str(items.at(2), "three");
}

#[test]
fn root_list_document() {
    let doc = load("* 1\n* 2\n");
    let root = doc.root();
    assert_eq!(root.len(), 2);
    assert_int(root.at(0), 1);
}

#[test]
fn nested_bullet_lists() {
    let doc = load("* * 1\n  * 2\n* 3\n");
    let root = doc.root();
    assert_eq!(root.len(), 2);
    let inner = root.at(0).unwrap();
    assert_int(inner.at(0), 1);
    assert_int(inner.at(1), 2);
    assert_int(root.at(1), 3);
}

#[test]
fn inline_collections() {
    let doc = load("d = {a = 1, b = [2, 3],}\n");
    let d = doc.root().get("d").unwrap();
    assert_int(d.get("a"), 1);
    let b = d.get("b").unwrap();
    assert_int(b.at(0), 2);
    assert_int(b.at(1), 3);
}

#[test]
fn surface_forms_are_equivalent() {
    let keypath = load("a.b.c = v\n");
    let inline = load("a = {b = {c = v}}\n");
    let section = load("|=== a.b\nc = v\n|===/\n");
    assert_eq!(keypath.root(), inline.root());
    assert_eq!(keypath.root(), section.root());
}

#[test]
fn historical_section_markers() {
    let modern = load("|=== s\nk = 1\n|===/\n");
    let historical = load("=== s\nk = 1\n===/\n");
    assert_eq!(modern.root(), historical.root());
}

#[test]
fn sections_reenter_keypath_trees() {
    let doc = load("a.b.x = 1\n|=== a.b\ny = 2\n|===/\nz = 3\n");
    let root = doc.root();
    let ab = root.get("a").and_then(|v| v.get("b")).unwrap();
    assert_int(ab.get("x"), 1);
    assert_int(ab.get("y"), 2);
    assert_int(root.get("z"), 3);
}

#[test]
fn keypaths_merge_only_into_keypath_dicts() {
    let doc = load("a.b = 1\na.c = 2\n");
    let a = doc.root().get("a").unwrap();
    assert_int(a.get("b"), 1);
    assert_int(a.get("c"), 2);

    // An explicitly written dict does not accept keypath extension.
    assert!(matches!(
        load_err("a = {b = 1}\na.c = 2\n"),
        ErrorKind::DuplicateKey(_)
    ));
    // Re-assigning a keypath terminal is a duplicate.
    assert!(matches!(
        load_err("a.b = 1\na.b = 2\n"),
        ErrorKind::DuplicateKey(_)
    ));
}

#[test]
fn duplicate_keys() {
    assert!(matches!(
        load_err("k = 1\nk = 2\n"),
        ErrorKind::DuplicateKey(_)
    ));

    let doc = load("d = (dict, overwrite=true)> {a = 1, b = 2, a = 3}\n");
    let d = doc.root().get("d").unwrap();
    assert_int(d.get("a"), 3);
    // Iteration order follows the first occurrence.
    let keys: Vec<String> = d
        .entries()
        .map(|(k, _)| k.to_string())
        .collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn depth_bound_is_exact() {
    let options = LoadOptions::default().with_max_nesting_depth(3);
    assert!(parse("a = [[1]]\n", &options).is_ok());
    assert!(matches!(
        load_err_with("a = [[[1]]]\n", &options),
        ErrorKind::DepthExceeded(3)
    ));
}

#[test]
fn empty_documents_use_empty_default() {
    let doc = load("   \n# only a comment\n");
    assert!(doc.root().is_none());

    let options = LoadOptions::default().with_empty_default(Value::Dict(Default::default()));
    let doc = load_with("", &options);
    assert!(doc.root().as_dict().is_some());
}

#[test]
fn integers_option_loads_floats() {
    let options = LoadOptions::default().with_integers(false);
    let doc = load_with("k = 7\n", &options);
    assert_eq!(doc.root().get("k").and_then(|v| v.as_float()), Some(7.0));
}

#[test]
fn block_strings() {
    let doc = load("k =\n    '''\n    line one\n      indented\n    '''\n");
    assert_str(doc.root().get("k"), "line one\n  indented\n");

    let doc = load("k =\n    \"\"\"\n    escaped\\tline\n    \"\"\"//\n");
    assert_str(doc.root().get("k"), "escaped\tline");
}

#[test]
fn doc_comments_bind_to_entries() {
    let doc = load("### documented ###\nk = 1\n");
    assert_int(doc.root().get("k"), 1);

    assert!(matches!(
        load_err("### one ###\n### two ###\nk = 1\n"),
        ErrorKind::Unexpected(_)
    ));
}

#[test]
fn parse_bytes_detects_boms() {
    let options = LoadOptions::default();
    let utf8 = parse_bytes("k = 1\n".as_bytes(), &options).unwrap();
    assert_int(utf8.root().get("k"), 1);

    let mut utf16 = vec![0xFF, 0xFE];
    for unit in "k = 1\n".encode_utf16() {
        utf16.extend_from_slice(&unit.to_le_bytes());
    }
    let doc = parse_bytes(&utf16, &options).unwrap();
    assert_int(doc.root().get("k"), 1);
}

#[test]
fn value_ref_serializes_to_json() {
    let doc = load("a = 1\nb = [true, none, \"s\"]\n");
    let json = serde_json::to_value(doc.root()).unwrap();
    assert_eq!(json["a"], 1);
    assert_eq!(json["b"][0], true);
    assert_eq!(json["b"][1], serde_json::Value::Null);
    assert_eq!(json["b"][2], "s");
}

#[test]
fn extended_types_gate_tags() {
    assert!(matches!(
        load_err("s = (set)> [1, 2]\n"),
        ErrorKind::UnknownType(_)
    ));
    let options = LoadOptions::default().with_extended_types(true);
    let doc = load_with("s = (set)> [1, 2]\nb = (base16)> \"DEAD\"\n", &options);
    assert_eq!(
        doc.root().get("b").and_then(|v| v.as_bytes().map(<[u8]>::to_vec)),
        Some(vec![0xDE, 0xAD])
    );
}

#[test]
fn keyword_values_cannot_be_explicitly_typed() {
    assert!(matches!(
        load_err("k = (bool)> true\n"),
        ErrorKind::IncompatibleType(..)
    ));
}

#[test]
fn float_tag_widens_ints() {
    let doc = load("k = (float)> 3\n");
    assert_eq!(doc.root().get("k").and_then(|v| v.as_float()), Some(3.0));
}

#[test]
fn only_ascii_unquoted_controls_identifiers() {
    assert!(matches!(
        load_err("clé = 1\n"),
        ErrorKind::UnknownToken(_) | ErrorKind::DisallowedCodePoint(_)
    ));
    let options = LoadOptions::default().with_only_ascii_unquoted(false);
    let doc = load_with("clé = 1\n", &options);
    assert_int(doc.root().get("clé"), 1);
}
