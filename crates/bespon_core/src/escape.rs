//! Backslash escape decoding and re-encoding for `"`-quoted strings.

use std::borrow::Cow;

use crate::chars;
use crate::error::ErrorKind;

/// A decode fault, reported as the byte offset of the backslash within the
/// scanned text plus the error kind. The caller maps the offset back onto a
/// source position.
pub(crate) type EscapeFault = (usize, ErrorKind);

fn invalid(raw: &str, start: usize, end: usize) -> EscapeFault {
    let end = end.min(raw.len());
    (start, ErrorKind::InvalidEscape(raw[start..end].to_string()))
}

/// Decode every backslash escape in `raw`. Borrow when no escapes occur.
///
/// Recognized forms: the short escapes `\\ \' \" \` \a \b \e \f \n \r \t \v`,
/// hex bytes `\xHH`, fixed-width `\uHHHH` and `\UHHHHHHHH`, braced `\u{...}`,
/// and a backslash immediately before a line break, which elides the break.
pub(crate) fn decode(raw: &str) -> Result<Cow<'_, str>, EscapeFault> {
    let Some(first) = raw.find('\\') else {
        return Ok(Cow::Borrowed(raw));
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..first]);
    let mut iter = raw[first..].char_indices().peekable();

    while let Some((rel, c)) = iter.next() {
        let at = first + rel;
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, esc)) = iter.next() else {
            return Err(invalid(raw, at, at + 1));
        };
        match esc {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '`' => out.push('`'),
            'a' => out.push('\u{0007}'),
            'b' => out.push('\u{0008}'),
            'e' => out.push('\u{001B}'),
            'f' => out.push('\u{000C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{000B}'),
            'x' => {
                let value = take_fixed_hex(&mut iter, 2).ok_or_else(|| invalid(raw, at, at + 4))?;
                push_scalar(&mut out, value).ok_or_else(|| invalid(raw, at, at + 4))?;
            }
            'u' => {
                if matches!(iter.peek(), Some((_, '{'))) {
                    iter.next();
                    let value =
                        take_braced_hex(&mut iter).ok_or_else(|| invalid(raw, at, at + 12))?;
                    push_scalar(&mut out, value).ok_or_else(|| invalid(raw, at, at + 12))?;
                } else {
                    let value =
                        take_fixed_hex(&mut iter, 4).ok_or_else(|| invalid(raw, at, at + 6))?;
                    push_scalar(&mut out, value).ok_or_else(|| invalid(raw, at, at + 6))?;
                }
            }
            'U' => {
                let value = take_fixed_hex(&mut iter, 8).ok_or_else(|| invalid(raw, at, at + 10))?;
                push_scalar(&mut out, value).ok_or_else(|| invalid(raw, at, at + 10))?;
            }
            c if chars::is_newline(c) => {
                // Line continuation: the break disappears from the value.
                if c == '\r' && matches!(iter.peek(), Some((_, '\n'))) {
                    iter.next();
                }
            }
            _ => return Err(invalid(raw, at, at + 1 + esc.len_utf8())),
        }
    }

    Ok(Cow::Owned(out))
}

fn take_fixed_hex(
    iter: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    count: usize,
) -> Option<u32> {
    let mut value: u32 = 0;
    for _ in 0..count {
        let (_, c) = iter.next()?;
        value = value.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
    }
    Some(value)
}

fn take_braced_hex(iter: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> Option<u32> {
    let mut value: u32 = 0;
    let mut digits = 0;
    loop {
        let (_, c) = iter.next()?;
        if c == '}' {
            return (digits > 0).then_some(value);
        }
        value = value.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
        digits += 1;
        if digits > 6 {
            return None;
        }
    }
}

fn push_scalar(out: &mut String, value: u32) -> Option<()> {
    out.push(char::from_u32(value)?);
    Some(())
}

/// Re-encode `value` for emission inside a `"`-delimited string. `delim_run`
/// is the delimiter length in use: for single-`"` strings the quote itself is
/// escaped; inside `"""` strings shorter quote runs are fine as-is.
/// `keep_newlines` leaves line breaks literal (block strings); otherwise
/// they are spelled `\n`.
pub(crate) fn encode(value: &str, delim_run: usize, keep_newlines: bool, only_ascii: bool) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_quotes = 0usize;
    for c in value.chars() {
        if c == '"' {
            pending_quotes += 1;
            continue;
        }
        flush_quotes(&mut out, pending_quotes, delim_run);
        pending_quotes = 0;
        match c {
            '\\' => out.push_str("\\\\"),
            '\u{0007}' => out.push_str("\\a"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{001B}' => out.push_str("\\e"),
            '\u{000C}' => out.push_str("\\f"),
            '\u{000B}' => out.push_str("\\v"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' if keep_newlines => out.push('\n'),
            '\n' => out.push_str("\\n"),
            c if chars::is_disallowed(c) || (only_ascii && !c.is_ascii()) => {
                let n = c as u32;
                if n < 0x80 {
                    out.push_str(&format!("\\x{:02x}", n));
                } else {
                    out.push_str(&format!("\\u{{{:x}}}", n));
                }
            }
            c => out.push(c),
        }
    }
    flush_quotes(&mut out, pending_quotes, delim_run);
    out
}

/// A run of quotes shorter than the delimiter is safe inside a multi-quote
/// delimiter; anything else must be escaped.
fn flush_quotes(out: &mut String, count: usize, delim_run: usize) {
    if count == 0 {
        return;
    }
    if delim_run >= 3 && count < delim_run {
        for _ in 0..count {
            out.push('"');
        }
    } else {
        for _ in 0..count {
            out.push_str("\\\"");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decoded(raw: &str) -> String {
        decode(raw).unwrap().into_owned()
    }

    #[test]
    fn passthrough_borrows() {
        assert!(matches!(decode("plain text").unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn short_escapes() {
        assert_eq!(decoded(r"a\tb\nc\\d\'e"), "a\tb\nc\\d'e");
        assert_eq!(decoded(r"\a\b\e\f\v"), "\u{7}\u{8}\u{1b}\u{c}\u{b}");
    }

    #[test]
    fn hex_and_unicode_escapes() {
        assert_eq!(decoded(r"\x41é\U0001F600"), "Aé😀");
        assert_eq!(decoded(r"\u{1F600}\u{e9}"), "😀é");
    }

    #[test]
    fn line_continuation_elides_break() {
        assert_eq!(decoded("one \\\ntwo"), "one two");
        assert_eq!(decoded("one \\\r\ntwo"), "one two");
    }

    #[test]
    fn invalid_escapes_report_offset() {
        let (offset, kind) = decode(r"ab\q").unwrap_err();
        assert_eq!(offset, 2);
        assert!(matches!(kind, ErrorKind::InvalidEscape(_)));

        assert!(decode(r"\u{}").is_err());
        assert!(decode(r"\xZZ").is_err());
        assert!(decode(r"\uD800").is_err());
    }

    #[test]
    fn encode_round_trips_specials() {
        let encoded = encode("tab\there \"q\" \\", 1, false, false);
        assert_eq!(encoded, r#"tab\there \"q\" \\"#);
        assert_eq!(decoded(&encoded), "tab\there \"q\" \\");
    }

    #[test]
    fn encode_preserves_short_quote_runs_in_multiline() {
        assert_eq!(encode("a \"b\" c", 3, true, false), "a \"b\" c");
        assert_eq!(encode("a \"\"\" c", 3, true, false), "a \\\"\\\"\\\" c");
    }

    #[test]
    fn encode_newline_handling() {
        assert_eq!(encode("a\nb", 1, false, false), r"a\nb");
        assert_eq!(encode("a\nb", 3, true, false), "a\nb");
    }

    #[test]
    fn encode_ascii_only_escapes_unicode() {
        assert_eq!(encode("café", 1, false, true), r"caf\u{e9}");
        assert_eq!(encode("café", 1, false, false), "café");
    }
}
