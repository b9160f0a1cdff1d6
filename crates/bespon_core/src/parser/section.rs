//! The root dict: top-level entry lines, section headers, and keypaths.
//!
//! A section header `|=== a.b` (or the historical `=== a.b`) sets a key
//! prefix that is prepended to every following top-level entry until
//! `|===/` resets to root. A new header replaces the previous prefix.

use crate::error::{ErrorKind, Result};
use crate::syntax::SyntaxKind;
use crate::value::Key;

use super::{CollectionStyle, Parser, RawId};

pub(crate) fn parse_root_dict(p: &mut Parser<'_>) -> Result<RawId> {
    let root_col = p.col();
    let first_token = p.cursor;
    let root = p.new_dict(
        CollectionStyle::Indent { col: root_col },
        false,
        false,
        first_token,
    );
    let mut target = root;
    let mut prefix_len = 0usize;
    let mut section_open = false;
    let mut indent_unit: Option<String> = None;
    let mut last_token = p.cursor;

    loop {
        let key_doc = p.take_doc_comment()?;
        match p.kind() {
            SyntaxKind::EOF => {
                if key_doc.is_some() {
                    return Err(p.error_here(ErrorKind::Unexpected("doc comment")));
                }
                break;
            }
            SyntaxKind::SECTION_OPEN => {
                if key_doc.is_some() {
                    return Err(p.error_here(ErrorKind::Unexpected("doc comment")));
                }
                if !p.at_line_start() {
                    return Err(p.error_here(ErrorKind::BadSection(
                        "section header must start its line",
                    )));
                }
                p.bump();
                let segments = parse_header_path(p)?;
                target = root;
                for (step, (token, key)) in segments.iter().enumerate() {
                    p.check_depth(step + 2, *token)?;
                    target = p.descend_segment(target, *token, key)?;
                }
                prefix_len = segments.len();
                section_open = true;
                finish_section_line(p)?;
            }
            SyntaxKind::SECTION_CLOSE => {
                if key_doc.is_some() {
                    return Err(p.error_here(ErrorKind::Unexpected("doc comment")));
                }
                if !section_open {
                    return Err(p.error_here(ErrorKind::BadSection(
                        "section close without an open section",
                    )));
                }
                p.bump();
                target = root;
                prefix_len = 0;
                section_open = false;
                finish_section_line(p)?;
            }
            _ => {
                if !p.at_line_start() || p.col() != root_col {
                    return Err(p.error_here(ErrorKind::Indent("misaligned top-level key")));
                }
                p.check_indent_consistency(&mut indent_unit)?;
                if !p.looks_like_entry() {
                    return Err(p.error_here(ErrorKind::Unexpected(p.kind().describe())));
                }
                let (segments, value, key_trailing) =
                    p.parse_entry(Some(root_col), 1 + prefix_len)?;
                last_token = p.node(value).span.end;
                p.insert_path(target, &segments, value, key_doc, key_trailing, 1 + prefix_len)?;
                p.skip_blank();
            }
        }
    }

    let node = p.node_mut(root);
    node.span = first_token..last_token.max(first_token);
    Ok(root)
}

/// Parse the keypath of a section header.
fn parse_header_path(p: &mut Parser<'_>) -> Result<Vec<(usize, Key)>> {
    p.skip_inline_ws();
    if matches!(p.kind(), SyntaxKind::LINE_ENDING | SyntaxKind::EOF) {
        return Err(p.error_here(ErrorKind::BadSection("section header has no keypath")));
    }
    let mut segments = vec![p.parse_key_segment()?];
    while p.at(SyntaxKind::DOT) {
        p.bump();
        segments.push(p.parse_key_segment()?);
    }
    Ok(segments)
}

/// After a header or closer: only whitespace and a line comment may follow
/// on the line.
fn finish_section_line(p: &mut Parser<'_>) -> Result<()> {
    p.skip_inline_ws();
    if p.at(SyntaxKind::COMMENT) {
        p.bump();
    }
    if !matches!(p.kind(), SyntaxKind::LINE_ENDING | SyntaxKind::EOF) {
        return Err(p.error_here(ErrorKind::BadSection(
            "unexpected content after section header",
        )));
    }
    Ok(())
}
