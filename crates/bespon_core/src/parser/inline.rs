//! Inline (brace/bracket) collections.
//!
//! Newlines inside inline collections are free layout; items separate with
//! commas and a trailing comma is accepted. Keypaths are allowed as inline
//! dict keys.

use crate::error::{ErrorKind, Result};
use crate::syntax::SyntaxKind;

use super::{CollectionStyle, NodeComments, Parser, RawId, RawNode, RawShape};

pub(crate) fn parse_inline_dict(
    p: &mut Parser<'_>,
    depth: usize,
    overwrite: bool,
) -> Result<RawId> {
    p.check_depth(depth, p.cursor)?;
    let open = p.bump();
    let dict = p.new_dict(
        CollectionStyle::Inline {
            compact: false,
            trailing_comma: false,
        },
        false,
        overwrite,
        open,
    );
    let start_trailing = p.take_trailing_comment();
    let mut saw_comma = false;

    loop {
        let key_doc = p.take_doc_comment()?;
        match p.kind() {
            SyntaxKind::RBRACE => {
                if key_doc.is_some() {
                    return Err(p.error_here(ErrorKind::Unexpected("doc comment")));
                }
                break;
            }
            SyntaxKind::EOF => {
                return Err(p.error_at(open, ErrorKind::UnbalancedDelimiter('{')));
            }
            SyntaxKind::COMMA => {
                return Err(p.error_here(ErrorKind::EmptyCollectionItem));
            }
            _ => {}
        }
        if !p.looks_like_entry() {
            return Err(p.error_here(ErrorKind::Unexpected(p.kind().describe())));
        }
        let (segments, value, key_trailing) = p.parse_entry(None, depth)?;
        p.insert_path(dict, &segments, value, key_doc, key_trailing, depth)?;
        saw_comma = false;

        p.skip_trivia();
        match p.kind() {
            SyntaxKind::COMMA => {
                p.bump();
                let comment = p.take_trailing_comment();
                if comment.is_some() {
                    p.attach_value_trailing(value, comment);
                }
                saw_comma = true;
            }
            SyntaxKind::RBRACE => {}
            SyntaxKind::EOF => {
                return Err(p.error_at(open, ErrorKind::UnbalancedDelimiter('{')));
            }
            kind => return Err(p.error_here(ErrorKind::Unexpected(kind.describe()))),
        }
    }
    let close = p.bump();
    finish_inline(p, dict, open, close, saw_comma, start_trailing);
    Ok(dict)
}

pub(crate) fn parse_inline_list(p: &mut Parser<'_>, depth: usize) -> Result<RawId> {
    p.check_depth(depth, p.cursor)?;
    let open = p.bump();
    let start_trailing = p.take_trailing_comment();
    let mut items = Vec::new();
    let mut saw_comma = false;

    loop {
        p.skip_trivia();
        match p.kind() {
            SyntaxKind::RBRACKET => break,
            SyntaxKind::EOF => {
                return Err(p.error_at(open, ErrorKind::UnbalancedDelimiter('[')));
            }
            SyntaxKind::COMMA => {
                return Err(p.error_here(ErrorKind::EmptyCollectionItem));
            }
            _ => {}
        }
        let value = p.parse_value(None, depth + 1)?;
        let trailing = p.take_trailing_comment();
        p.attach_value_trailing(value, trailing);
        items.push(value);
        saw_comma = false;

        p.skip_trivia();
        match p.kind() {
            SyntaxKind::COMMA => {
                p.bump();
                let comment = p.take_trailing_comment();
                if comment.is_some() {
                    p.attach_value_trailing(value, comment);
                }
                saw_comma = true;
            }
            SyntaxKind::RBRACKET => {}
            SyntaxKind::EOF => {
                return Err(p.error_at(open, ErrorKind::UnbalancedDelimiter('[')));
            }
            kind => return Err(p.error_here(ErrorKind::Unexpected(kind.describe()))),
        }
    }
    let close = p.bump();
    let style = inline_style(p, open, close, saw_comma && !items.is_empty());
    let id = p.push_node(RawNode {
        shape: RawShape::List { items, style },
        tag: None,
        span: open..close + 1,
        comments: NodeComments {
            start_trailing,
            ..NodeComments::default()
        },
    });
    Ok(id)
}

fn finish_inline(
    p: &mut Parser<'_>,
    dict: RawId,
    open: usize,
    close: usize,
    saw_comma: bool,
    start_trailing: Option<usize>,
) {
    let has_entries = match &p.node(dict).shape {
        RawShape::Dict { entries, .. } => !entries.is_empty(),
        _ => false,
    };
    let style = inline_style(p, open, close, saw_comma && has_entries);
    let node = p.node_mut(dict);
    if let RawShape::Dict { style: slot, .. } = &mut node.shape {
        *slot = style;
    }
    node.span = open..close + 1;
    if node.comments.start_trailing.is_none() {
        node.comments.start_trailing = start_trailing;
    }
}

/// An inline collection is compact when no trivia appears anywhere between
/// its delimiters.
fn inline_style(
    p: &Parser<'_>,
    open: usize,
    close: usize,
    trailing_comma: bool,
) -> CollectionStyle {
    let compact = (open..close).all(|index| !p.tokens.kind(index).is_trivia());
    CollectionStyle::Inline {
        compact,
        trailing_comma,
    }
}
