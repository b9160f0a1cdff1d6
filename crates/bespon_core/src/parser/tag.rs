//! Tag parsing: `(type, keyword=value, ...)>` preceding a value.

use crate::chars;
use crate::error::{ErrorKind, Result};
use crate::syntax::SyntaxKind;
use crate::token::TokenFlags;

use super::Parser;

/// A parsed tag. Keyword values keep the token index they came from so the
/// resolver can report errors at the right place.
#[derive(Clone, Debug)]
pub(crate) struct RawTag {
    pub open: usize,
    pub close: usize,
    pub type_name: Option<(usize, Box<str>)>,
    pub label: Option<(usize, Box<str>)>,
    pub indent: Option<(usize, Box<str>)>,
    pub newline: Option<(usize, Box<str>)>,
    /// Label name the tagged dict inherits from, without the `$`.
    pub init: Option<(usize, Box<str>)>,
    pub overwrite: Option<bool>,
}

pub(crate) fn parse_tag(p: &mut Parser<'_>) -> Result<RawTag> {
    let open = p.bump();
    let mut tag = RawTag {
        open,
        close: open,
        type_name: None,
        label: None,
        indent: None,
        newline: None,
        init: None,
        overwrite: None,
    };

    loop {
        p.skip_trivia();
        match p.kind() {
            SyntaxKind::TAG_CLOSE => break,
            SyntaxKind::EOF => {
                return Err(p.error_at(open, ErrorKind::UnbalancedDelimiter('(')));
            }
            SyntaxKind::COMMA => {
                return Err(p.error_here(ErrorKind::TagMismatch("empty tag argument")));
            }
            SyntaxKind::UNQUOTED => parse_tag_item(p, &mut tag)?,
            kind => {
                return Err(p.error_here(ErrorKind::TagMismatch(kind.describe())));
            }
        }

        p.skip_trivia();
        match p.kind() {
            SyntaxKind::COMMA => {
                p.bump();
            }
            SyntaxKind::TAG_CLOSE => {}
            SyntaxKind::EOF => {
                return Err(p.error_at(open, ErrorKind::UnbalancedDelimiter('(')));
            }
            kind => return Err(p.error_here(ErrorKind::Unexpected(kind.describe()))),
        }
    }
    tag.close = p.bump();
    Ok(tag)
}

fn parse_tag_item(p: &mut Parser<'_>, tag: &mut RawTag) -> Result<()> {
    let name_token = p.bump();
    let name = p.tokens.raw(name_token).to_string();
    p.skip_inline_ws();

    if !p.at(SyntaxKind::EQUALS) {
        // Positional explicit type.
        if tag.type_name.is_some() {
            return Err(p.error_at(name_token, ErrorKind::TagMismatch("second explicit type")));
        }
        tag.type_name = Some((name_token, name.into()));
        return Ok(());
    }
    p.bump();
    p.skip_inline_ws();

    match name.as_str() {
        "type" => {
            if tag.type_name.is_some() {
                return Err(p.error_at(name_token, ErrorKind::TagMismatch("second explicit type")));
            }
            tag.type_name = Some(take_name_value(p)?);
        }
        "label" => {
            if tag.label.is_some() {
                return Err(p.error_at(name_token, ErrorKind::TagMismatch("second label")));
            }
            tag.label = Some(take_name_value(p)?);
        }
        "indent" => {
            if tag.indent.is_some() {
                return Err(p.error_at(name_token, ErrorKind::TagMismatch("second indent")));
            }
            let (token, text) = take_string_value(p)?;
            if !text.chars().all(chars::is_inline_whitespace) {
                return Err(p.error_at(
                    token,
                    ErrorKind::TagMismatch("indent must be spaces and tabs"),
                ));
            }
            tag.indent = Some((token, text));
        }
        "newline" => {
            if tag.newline.is_some() {
                return Err(p.error_at(name_token, ErrorKind::TagMismatch("second newline")));
            }
            let (token, text) = take_string_value(p)?;
            let valid = matches!(
                text.as_ref(),
                "" | "\n" | "\r" | "\r\n" | "\u{0085}" | "\u{2028}" | "\u{2029}"
            );
            if !valid {
                return Err(p.error_at(
                    token,
                    ErrorKind::TagMismatch("newline must be a line break sequence"),
                ));
            }
            tag.newline = Some((token, text));
        }
        "init" => {
            if tag.init.is_some() {
                return Err(p.error_at(name_token, ErrorKind::TagMismatch("second init")));
            }
            if !p.at(SyntaxKind::ALIAS) {
                return Err(p.error_here(ErrorKind::TagMismatch("init takes an alias")));
            }
            let token = p.bump();
            let name = &p.tokens.raw(token)[1..];
            tag.init = Some((token, name.into()));
        }
        "overwrite" => {
            if tag.overwrite.is_some() {
                return Err(p.error_at(name_token, ErrorKind::TagMismatch("second overwrite")));
            }
            tag.overwrite = Some(match p.kind() {
                SyntaxKind::TRUE_KW => {
                    p.bump();
                    true
                }
                SyntaxKind::FALSE_KW => {
                    p.bump();
                    false
                }
                _ => {
                    return Err(p.error_here(ErrorKind::TagMismatch("overwrite takes a boolean")));
                }
            });
        }
        _ => {
            return Err(p.error_at(name_token, ErrorKind::UnknownTagKeyword(name)));
        }
    }
    Ok(())
}

/// A bare word or single-line string used as a tag argument value.
fn take_name_value(p: &mut Parser<'_>) -> Result<(usize, Box<str>)> {
    match p.kind() {
        SyntaxKind::UNQUOTED => {
            let token = p.bump();
            Ok((token, p.tokens.raw(token).into()))
        }
        SyntaxKind::STRING => take_string_value(p),
        kind => Err(p.error_here(ErrorKind::TagMismatch(kind.describe()))),
    }
}

fn take_string_value(p: &mut Parser<'_>) -> Result<(usize, Box<str>)> {
    if !p.at(SyntaxKind::STRING) {
        return Err(p.error_here(ErrorKind::TagMismatch(p.kind().describe())));
    }
    if p.tokens.get(p.cursor).flags.contains(TokenFlags::MULTILINE) {
        return Err(p.error_here(ErrorKind::TagMismatch("multiline tag argument")));
    }
    let token = p.bump();
    Ok((token, p.tokens.value_text(token).into()))
}
