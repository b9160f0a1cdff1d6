use bespon_core::{
    parse, parse_roundtrip, Document, ErrorKind, LoadOptions, RoundTripAst, ValueRef,
};

#[allow(unused)]
pub fn load(source: &str) -> Document {
    parse(source, &LoadOptions::default()).unwrap()
}

#[allow(unused)]
pub fn load_with(source: &str, options: &LoadOptions) -> Document {
    parse(source, options).unwrap()
}

#[allow(unused)]
pub fn load_err(source: &str) -> ErrorKind {
    parse(source, &LoadOptions::default()).unwrap_err().kind
}

#[allow(unused)]
pub fn load_err_with(source: &str, options: &LoadOptions) -> ErrorKind {
    parse(source, options).unwrap_err().kind
}

#[allow(unused)]
pub fn edit(source: &str) -> RoundTripAst {
    parse_roundtrip(source, &LoadOptions::default()).unwrap()
}

/// Assert that a loaded document round-trips byte-for-byte with no edits.
#[allow(unused)]
pub fn assert_roundtrip_fidelity(source: &str) {
    let ast = edit(source);
    assert_eq!(ast.dumps(), source, "dumps() must reproduce the source");
}

#[allow(unused)]
pub fn assert_int(value: Option<ValueRef<'_>>, expected: i64) {
    assert_eq!(value.and_then(|v| v.as_int()), Some(expected));
}

#[allow(unused)]
pub fn assert_str(value: Option<ValueRef<'_>>, expected: &str) {
    assert_eq!(value.and_then(|v| v.as_str()), Some(expected));
}
