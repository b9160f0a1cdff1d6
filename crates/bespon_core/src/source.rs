//! Source text ownership and position bookkeeping.
//!
//! The decoded source is held in an [`ArcStr`] so tokens and round-trip nodes
//! can keep cheap substrings of it alive without lifetimes.

use arcstr::ArcStr;

use crate::chars;
use crate::error::{Error, ErrorKind, Position, Result};

#[derive(Clone, Debug)]
pub struct SourceText {
    text: ArcStr,
    /// Byte offset of the first character of every line, starting with 0 for
    /// line one. A CRLF pair counts as a single break.
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(text: &str) -> Self {
        Self::from_arc(ArcStr::from(text))
    }

    fn from_arc(text: ArcStr) -> Self {
        let mut line_starts = vec![0];
        let mut iter = text.char_indices().peekable();
        while let Some((offset, c)) = iter.next() {
            if !chars::is_newline(c) {
                continue;
            }
            if c == '\r' {
                if let Some((_, '\n')) = iter.peek() {
                    iter.next();
                }
            }
            line_starts.push(offset + break_len(&text[offset..]));
        }
        Self { text, line_starts }
    }

    /// Decode raw bytes into a source. UTF-8 is assumed when no BOM is
    /// present; UTF-8/16/32 BOMs select and strip their encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded = decode_bytes(bytes)?;
        Ok(Self::from_arc(ArcStr::from(decoded)))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Resolve a byte offset to a 1-based line/column position. Columns count
    /// characters, not bytes.
    pub fn position(&self, offset: usize) -> Position {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        let line_start = self.line_starts[line_index];
        let col = self.text[line_start..offset].chars().count() as u32 + 1;
        Position {
            line: line_index as u32 + 1,
            col,
            offset,
        }
    }

    /// The full text of the line containing `offset`, without its line break.
    pub fn line_at(&self, offset: usize) -> &str {
        let pos = self.position(offset);
        let start = self.line_starts[pos.line as usize - 1];
        let end = self
            .line_starts
            .get(pos.line as usize)
            .copied()
            .unwrap_or(self.text.len());
        self.text[start..end].trim_end_matches(chars::is_newline)
    }

    pub fn error(&self, kind: ErrorKind, offset: usize) -> Error {
        let pos = self.position(offset);
        Error::new(kind, pos, self.line_at(offset))
    }
}

fn break_len(rest: &str) -> usize {
    if rest.starts_with("\r\n") {
        2
    } else {
        rest.chars().next().map_or(0, char::len_utf8)
    }
}

fn decode_bytes(bytes: &[u8]) -> Result<String> {
    // Order matters: the UTF-32 LE BOM starts with the UTF-16 LE BOM bytes.
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        return decode_utf32(&bytes[4..], u32::from_le_bytes);
    }
    if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        return decode_utf32(&bytes[4..], u32::from_be_bytes);
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return decode_utf16(&bytes[2..], u16::from_le_bytes);
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return decode_utf16(&bytes[2..], u16::from_be_bytes);
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::unpositioned(ErrorKind::DisallowedCodePoint(0xFFFD)))
}

fn decode_utf16(bytes: &[u8], read: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::unpositioned(ErrorKind::DisallowedCodePoint(0xFFFD)));
    }
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| read([c[0], c[1]])).collect();
    String::from_utf16(&units)
        .map_err(|_| Error::unpositioned(ErrorKind::DisallowedCodePoint(0xFFFD)))
}

fn decode_utf32(bytes: &[u8], read: fn([u8; 4]) -> u32) -> Result<String> {
    if bytes.len() % 4 != 0 {
        return Err(Error::unpositioned(ErrorKind::DisallowedCodePoint(0xFFFD)));
    }
    bytes
        .chunks_exact(4)
        .map(|c| {
            let n = read([c[0], c[1], c[2], c[3]]);
            char::from_u32(n).ok_or(Error::unpositioned(ErrorKind::DisallowedCodePoint(n)))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        let source = SourceText::new("ab\ncd\r\nef");
        assert_eq!(source.position(0).line, 1);
        assert_eq!(source.position(0).col, 1);
        assert_eq!(source.position(4).line, 2);
        assert_eq!(source.position(4).col, 2);
        assert_eq!(source.position(7).line, 3);
        assert_eq!(source.position(7).col, 1);
    }

    #[test]
    fn unicode_breaks_count_as_lines() {
        let source = SourceText::new("a\u{2028}b\u{0085}c");
        assert_eq!(source.position(4).line, 2);
        assert_eq!(source.position(6).line, 3);
    }

    #[test]
    fn columns_count_characters() {
        let source = SourceText::new("é = 1");
        assert_eq!(source.position(3).col, 3);
    }

    #[test]
    fn line_at_strips_break() {
        let source = SourceText::new("first\nsecond\n");
        assert_eq!(source.line_at(8), "second");
    }

    #[test]
    fn bom_detection() {
        assert_eq!(
            SourceText::from_bytes(&[0xEF, 0xBB, 0xBF, b'k']).unwrap().as_str(),
            "k"
        );
        assert_eq!(
            SourceText::from_bytes(&[0xFF, 0xFE, b'k', 0x00]).unwrap().as_str(),
            "k"
        );
        assert_eq!(
            SourceText::from_bytes(&[0x00, 0x00, 0xFE, 0xFF, 0, 0, 0, b'k'])
                .unwrap()
                .as_str(),
            "k"
        );
        assert_eq!(SourceText::from_bytes(b"plain").unwrap().as_str(), "plain");
    }
}
