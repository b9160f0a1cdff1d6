mod harness;

use bespon_core::{serialize, DumpOptions, ErrorKind, LoadOptions};
use harness::*;

fn dump(source: &str, options: &DumpOptions) -> String {
    serialize(&load(source), options).unwrap()
}

#[test]
fn indent_style_by_default() {
    let out = dump("a = 1\nb = two\nc = {d = 3}\n", &DumpOptions::default());
    assert_eq!(out, "a = 1\nb = two\nc =\n    d = 3\n");
}

#[test]
fn lists_use_item_markers() {
    let out = dump("items = [1, 2]\n", &DumpOptions::default());
    assert_eq!(out, "items =\n    * 1\n    * 2\n");

    let out = dump("* 1\n* 2\n", &DumpOptions::default());
    assert_eq!(out, "* 1\n* 2\n");
}

#[test]
fn inline_depth_switches_styles() {
    let options = DumpOptions::default().with_inline_depth(1);
    let out = dump("c = {d = 3, e = [1]}\n", &options);
    assert_eq!(out, "c = {d = 3, e = [1]}\n");
}

#[test]
fn trailing_commas_are_configurable() {
    let source = "d = {a = 1, b = 2,}\n";
    let with = DumpOptions::default()
        .with_inline_depth(1)
        .with_trailing_commas(true);
    assert_eq!(dump(source, &with), "d = {a = 1, b = 2,}\n");

    let without = DumpOptions::default().with_inline_depth(1);
    assert_eq!(dump(source, &without), "d = {a = 1, b = 2}\n");
}

#[test]
fn compact_inline_drops_spacing() {
    let options = DumpOptions::default()
        .with_inline_depth(1)
        .with_compact_inline(true);
    assert_eq!(dump("d = {a = 1, b = [2]}\n", &options), "d = {a=1,b=[2]}\n");
}

#[test]
fn strings_quote_only_when_needed() {
    let out = dump("a = plain words\nb = \"with \\\"quotes\\\"\"\n", &DumpOptions::default());
    assert_eq!(out, "a = plain words\nb = \"with \\\"quotes\\\"\"\n");
}

#[test]
fn hex_floats_option() {
    let options = DumpOptions::default().with_hex_floats(true);
    assert_eq!(dump("x = 16.75\n", &options), "x = 0x1.0cp4\n");
    assert_eq!(
        dump("x = 16.75\n", &DumpOptions::default()),
        "x = 16.75\n"
    );
}

#[test]
fn shared_nodes_emit_labels_and_aliases() {
    let source = "first = (dict, label=base)> {a = 1}\nsecond = $base\n";
    let out = dump(source, &DumpOptions::default());
    assert_eq!(out, "first = (label=base)> {a = 1}\nsecond = $base\n");
}

#[test]
fn cycles_fail_without_aliases() {
    let load_options = LoadOptions::default().with_circular_references(true);
    let doc = load_with("(dict, label=a)> {self = $a}\n", &load_options);

    let no_aliases = DumpOptions::default().with_aliases(false);
    let err = serialize(&doc, &no_aliases).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CircularReference(_)));

    let allowed = DumpOptions::default().with_circular_references(true);
    let out = serialize(&doc, &allowed).unwrap();
    assert_eq!(out, "(label=a)> {self = $a}\n");
}

#[test]
fn extended_flavors_round_through_tags() {
    let load_options = LoadOptions::default().with_extended_types(true);
    let doc = load_with("s = (set)> [1, 2]\n", &load_options);

    let mut options = DumpOptions::default();
    options.extended_types = true;
    let out = serialize(&doc, &options).unwrap();
    assert_eq!(out, "s = (set)> [1, 2]\n");

    let err = serialize(&doc, &DumpOptions::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownType(_)));

    let mut baseclass = DumpOptions::default();
    baseclass.baseclass = true;
    let out = serialize(&doc, &baseclass).unwrap();
    assert_eq!(out, "s = [1, 2]\n");
}

#[test]
fn bytes_emit_as_tagged_base64() {
    let load_options = LoadOptions::default().with_extended_types(true);
    let doc = load_with("b = (base64)> \"aGVsbG8=\"\n", &load_options);
    let mut options = DumpOptions::default();
    options.extended_types = true;
    let out = serialize(&doc, &options).unwrap();
    assert_eq!(out, "b = (base64)> \"aGVsbG8=\"\n");
}

#[test]
fn reparse_equivalence() {
    let source = "a = 1\nb = {c = [1, 2], d = text}\ne = -inf\n";
    let doc = load(source);
    let out = serialize(&doc, &DumpOptions::default()).unwrap();
    let reloaded = load(&out);
    assert_eq!(doc.root(), reloaded.root());
}
