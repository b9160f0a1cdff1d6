//! Code point classification shared by the lexer and the serializer.

use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

/// Returns true for every character that terminates a line: LF, CR (and as
/// part of CRLF), NEL, LINE SEPARATOR, and PARAGRAPH SEPARATOR. CRLF is
/// recognized as a single break by the lexer, not here.
pub fn is_newline(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

/// Same-line whitespace. Only space and tab are significant for layout;
/// any other Unicode whitespace in layout position is a disallowed code point.
pub fn is_inline_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Code points that may never appear literally in a source: C0 controls other
/// than tab and the newline set, C1 controls other than NEL, and Unicode
/// noncharacters. (Surrogates cannot occur in a decoded `str`.)
pub fn is_disallowed(c: char) -> bool {
    if is_newline(c) || c == '\t' {
        return false;
    }
    let n = c as u32;
    match n {
        0x00..=0x1F | 0x7F => true,
        0x80..=0x9F => true,
        0xFDD0..=0xFDEF => true,
        _ => (n & 0xFFFE) == 0xFFFE,
    }
}

/// First character of an unquoted string or key. ASCII identifiers by
/// default; with `only_ascii_unquoted` disabled, any Unicode letter works.
pub fn is_unquoted_start(c: char, only_ascii: bool) -> bool {
    if c.is_ascii() {
        c.is_ascii_alphabetic() || c == '_'
    } else {
        !only_ascii && c.general_category_group() == GeneralCategoryGroup::Letter
    }
}

/// Continuation character of an unquoted string or key.
pub fn is_unquoted_continue(c: char, only_ascii: bool) -> bool {
    if c.is_ascii() {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    } else {
        !only_ascii
            && matches!(
                c.general_category_group(),
                GeneralCategoryGroup::Letter | GeneralCategoryGroup::Number
            )
    }
}

/// Returns true if `s` is a valid unquoted key on its own: an identifier with
/// no internal spaces and no leading/trailing dashes.
pub fn is_valid_unquoted_key(s: &str, only_ascii: bool) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !is_unquoted_start(first, only_ascii) {
        return false;
    }
    if !chars.all(|c| is_unquoted_continue(c, only_ascii)) {
        return false;
    }
    !s.ends_with('-')
}
