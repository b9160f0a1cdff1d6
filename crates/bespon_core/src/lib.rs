//! Loader, resolver, and round-trip editor for the BespON configuration
//! language.
//!
//! A parse is a pure function of `(source, options)`: the scanner produces a
//! flat token stream covering every byte of the input, the layout-aware
//! parser reconciles the inline, indent, and section/keypath surface
//! syntaxes into one raw tree, and the resolver wires tags, labels, and
//! aliases into a [`Document`] value graph. [`parse_roundtrip`] keeps the
//! token stream instead, producing a [`RoundTripAst`] whose edits re-render
//! values in their original style and leave every untouched byte intact.

pub use error::{Error, ErrorKind, Position, Result};
pub use options::{CustomParser, DumpOptions, LoadOptions, RoundTripOptions, Shape, TypeRecord};
pub use roundtrip::{path, Cursor, CursorMut, PathSeg, RoundTripAst};
pub use serializer::{serialize, serialize_value};
pub use value::{Dict, DictFlavor, Document, Key, List, ListFlavor, NodeId, Value, ValueRef};

mod chars;
mod error;
mod escape;
mod lexer;
mod num;
mod options;
mod parser;
mod registry;
mod resolver;
mod roundtrip;
mod serializer;
mod source;
mod syntax;
mod token;
mod value;

use source::SourceText;

/// Parse a source string into a fully resolved value graph.
pub fn parse(source: &str, options: &LoadOptions) -> Result<Document> {
    parse_source(SourceText::new(source), options)
}

/// Parse raw bytes: UTF-8 by default, or UTF-8/16/32 selected by BOM.
pub fn parse_bytes(bytes: &[u8], options: &LoadOptions) -> Result<Document> {
    parse_source(SourceText::from_bytes(bytes)?, options)
}

fn parse_source(source: SourceText, options: &LoadOptions) -> Result<Document> {
    let tokens = lexer::lex(&source, options)?;
    let tree = parser::parse(&tokens, options)?;
    resolver::resolve(&tokens, &tree, options)
}

/// Parse a source string into a round-trip AST that preserves byte-accurate
/// layout across edits.
pub fn parse_roundtrip(source: &str, options: &LoadOptions) -> Result<RoundTripAst> {
    parse_roundtrip_with(source, options, RoundTripOptions::default())
}

pub fn parse_roundtrip_with(
    source: &str,
    options: &LoadOptions,
    rt_options: RoundTripOptions,
) -> Result<RoundTripAst> {
    let source = SourceText::new(source);
    let tokens = lexer::lex(&source, options)?;
    let tree = parser::parse(&tokens, options)?;
    // A document that does not resolve is not editable either; surface the
    // fault now rather than on the first edit.
    resolver::resolve(&tokens, &tree, options)?;
    Ok(RoundTripAst::new(tokens, tree, options.clone(), rt_options))
}
