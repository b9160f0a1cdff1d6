//! The scanner: source text in, flat token stream out.
//!
//! The scanner is context-free at the character level but context-sensitive at
//! the token level: a multiline string or doc-comment delimiter opens a scope
//! in which the usual newline and indentation rules are suspended until the
//! matching closing delimiter. Those literals are emitted as single tokens
//! carrying both raw and decoded forms.

use std::borrow::Cow;

use crate::chars;
use crate::error::{Error, ErrorKind, Result};
use crate::escape;
use crate::options::LoadOptions;
use crate::source::SourceText;
use crate::syntax::SyntaxKind;
use crate::token::{
    Chomp, DelimProfile, NumBase, NumData, NumKind, QuoteKind, StrData, Token, TokenData,
    TokenFlags, TokenList,
};

pub(crate) fn lex(source: &SourceText, options: &LoadOptions) -> Result<TokenList> {
    if options.only_ascii_source {
        if let Some(offset) = source.as_str().bytes().position(|b| b >= 0x80) {
            let c = source.as_str()[offset..].chars().next().unwrap_or('\u{FFFD}');
            return Err(source.error(ErrorKind::DisallowedCodePoint(c as u32), offset));
        }
    }

    let mut lexer = Lexer {
        source,
        options,
        position: 0,
        line_start: 0,
        line_has_token: false,
        tokens: Vec::with_capacity(source.len() / 4 + 4),
    };
    while lexer.next_token()? {}
    Ok(TokenList::new(source.clone(), lexer.tokens))
}

struct Lexer<'a> {
    source: &'a SourceText,
    options: &'a LoadOptions,
    position: usize,
    /// Byte offset of the start of the line `position` is on.
    line_start: usize,
    /// Whether a non-blank token has already been emitted on this line.
    line_has_token: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn text(&self) -> &str {
        self.source.as_str()
    }

    fn rest(&self) -> &'a str {
        &self.source.as_str()[self.position..]
    }

    fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut iter = self.rest().chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.position += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.text().len()
    }

    fn error(&self, kind: ErrorKind, offset: usize) -> Error {
        self.source.error(kind, offset)
    }

    /// Count a run of `c` starting at the cursor and consume it.
    fn consume_run(&mut self, c: char) -> usize {
        let mut count = 0;
        while self.current() == Some(c) {
            self.advance();
            count += 1;
        }
        count
    }

    fn col_at(&self, offset: usize) -> u32 {
        self.text()[self.line_start..offset].chars().count() as u32
    }

    fn push(&mut self, kind: SyntaxKind, start: usize, data: TokenData) {
        let col = self.col_at(start);
        let raw = &self.text()[start..self.position];
        let mut flags = TokenFlags::empty();
        if !self.line_has_token && !kind.is_blank_trivia() {
            flags |= TokenFlags::AT_LINE_START;
        }
        if raw.contains(chars::is_newline) {
            flags |= TokenFlags::MULTILINE;
            // Re-anchor the line start to the last break inside the token.
            let tail_break = raw
                .char_indices()
                .filter(|(_, c)| chars::is_newline(*c))
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            self.line_start = start + tail_break;
        }
        if kind == SyntaxKind::LINE_ENDING {
            self.line_start = self.position;
            self.line_has_token = false;
        } else if kind != SyntaxKind::WHITESPACE {
            self.line_has_token = true;
        }
        let mut token = Token::new(kind, start..self.position, col, flags);
        token.data = data;
        self.tokens.push(token);
    }

    fn push_plain(&mut self, kind: SyntaxKind, start: usize) {
        self.push(kind, start, TokenData::None);
    }

    fn next_token(&mut self) -> Result<bool> {
        let start = self.position;
        let Some(c) = self.current() else {
            self.push_plain(SyntaxKind::EOF, start);
            return Ok(false);
        };

        match c {
            c if chars::is_newline(c) => {
                self.advance();
                if c == '\r' {
                    self.advance_if('\n');
                }
                // push() would anchor the line start inside the break.
                let end = self.position;
                self.line_start = start;
                let col = self.col_at(start);
                self.line_start = end;
                self.line_has_token = false;
                self.tokens
                    .push(Token::new(SyntaxKind::LINE_ENDING, start..end, col, TokenFlags::empty()));
            }
            ' ' | '\t' => {
                while matches!(self.current(), Some(' ') | Some('\t')) {
                    self.advance();
                }
                self.push_plain(SyntaxKind::WHITESPACE, start);
            }
            '#' | '%' => self.scan_comment(c)?,
            '=' => self.scan_equals(start)?,
            '|' => self.scan_piped_section(start)?,
            '{' => self.single(SyntaxKind::LBRACE),
            '}' => self.single(SyntaxKind::RBRACE),
            '[' => self.single(SyntaxKind::LBRACKET),
            ']' => self.single(SyntaxKind::RBRACKET),
            ',' => self.single(SyntaxKind::COMMA),
            '(' => self.single(SyntaxKind::TAG_OPEN),
            ')' => {
                self.advance();
                if !self.advance_if('>') {
                    return Err(self.error(ErrorKind::UnknownToken(')'), start));
                }
                self.push_plain(SyntaxKind::TAG_CLOSE, start);
            }
            '*' => self.single(SyntaxKind::LIST_BULLET),
            '.' => self.single(SyntaxKind::DOT),
            '$' => self.scan_alias(start)?,
            '\'' | '"' | '`' => self.scan_string(c)?,
            '+' | '-' => self.scan_number(start)?,
            c if c.is_ascii_digit() => self.scan_number(start)?,
            c if chars::is_unquoted_start(c, self.options.only_ascii_unquoted) => {
                self.scan_word(start)
            }
            c if chars::is_disallowed(c) => {
                return Err(self.error(ErrorKind::DisallowedCodePoint(c as u32), start));
            }
            c => return Err(self.error(ErrorKind::UnknownToken(c), start)),
        }
        Ok(true)
    }

    fn single(&mut self, kind: SyntaxKind) {
        let start = self.position;
        self.advance();
        self.push_plain(kind, start);
    }

    //#region Comments

    fn scan_comment(&mut self, marker: char) -> Result<()> {
        let start = self.position;
        let run = self.consume_run(marker);
        if run >= 3 {
            // Doc comment: delimited by a matching run, possibly multiline.
            self.consume_to_closing_run(marker, run, start, "doc comment")?;
            self.push_plain(SyntaxKind::DOC_COMMENT, start);
            return Ok(());
        }
        while let Some(c) = self.current() {
            if chars::is_newline(c) {
                break;
            }
            if chars::is_disallowed(c) {
                return Err(self.error(ErrorKind::DisallowedCodePoint(c as u32), self.position));
            }
            self.advance();
        }
        self.push_plain(SyntaxKind::COMMENT, start);
        Ok(())
    }

    /// Advance past the next maximal run of `marker` whose length is exactly
    /// `run`. Longer interior runs are content.
    fn consume_to_closing_run(
        &mut self,
        marker: char,
        run: usize,
        start: usize,
        what: &'static str,
    ) -> Result<()> {
        loop {
            let Some(c) = self.current() else {
                return Err(self.error(ErrorKind::UnterminatedString(what), start));
            };
            if chars::is_disallowed(c) {
                return Err(self.error(ErrorKind::DisallowedCodePoint(c as u32), self.position));
            }
            if c == marker {
                let found = self.consume_run(marker);
                if found == run {
                    return Ok(());
                }
            } else {
                self.advance();
            }
        }
    }

    //#endregion

    //#region Sections

    fn scan_equals(&mut self, start: usize) -> Result<()> {
        let run = self.consume_run('=');
        match run {
            1 => self.push_plain(SyntaxKind::EQUALS, start),
            2 => return Err(self.error(ErrorKind::UnknownToken('='), start)),
            _ => {
                if self.advance_if('/') {
                    self.push_plain(SyntaxKind::SECTION_CLOSE, start);
                } else {
                    self.push_plain(SyntaxKind::SECTION_OPEN, start);
                }
            }
        }
        Ok(())
    }

    fn scan_piped_section(&mut self, start: usize) -> Result<()> {
        self.advance();
        let run = self.consume_run('=');
        if run < 3 {
            return Err(self.error(ErrorKind::UnknownToken('|'), start));
        }
        if self.advance_if('/') {
            self.push_plain(SyntaxKind::SECTION_CLOSE, start);
        } else {
            self.push_plain(SyntaxKind::SECTION_OPEN, start);
        }
        Ok(())
    }

    //#endregion

    fn scan_alias(&mut self, start: usize) -> Result<()> {
        self.advance();
        let only_ascii = self.options.only_ascii_unquoted;
        let Some(c) = self.current() else {
            return Err(self.error(ErrorKind::UnknownToken('$'), start));
        };
        if !chars::is_unquoted_start(c, only_ascii) {
            return Err(self.error(ErrorKind::UnknownToken('$'), start));
        }
        while let Some(c) = self.current() {
            if !chars::is_unquoted_continue(c, only_ascii) {
                break;
            }
            self.advance();
        }
        self.push_plain(SyntaxKind::ALIAS, start);
        Ok(())
    }

    fn scan_word(&mut self, start: usize) {
        let only_ascii = self.options.only_ascii_unquoted;
        while let Some(c) = self.current() {
            if !chars::is_unquoted_continue(c, only_ascii) {
                break;
            }
            self.advance();
        }
        let (kind, data) = match &self.text()[start..self.position] {
            "true" => (SyntaxKind::TRUE_KW, TokenData::None),
            "false" => (SyntaxKind::FALSE_KW, TokenData::None),
            "none" => (SyntaxKind::NONE_KW, TokenData::None),
            "inf" | "nan" => (
                SyntaxKind::NUMBER,
                TokenData::Num(NumData {
                    kind: NumKind::Float,
                    base: NumBase::Dec,
                    grouped: false,
                }),
            ),
            _ => (SyntaxKind::UNQUOTED, TokenData::None),
        };
        self.push(kind, start, data);
    }

    //#region Numbers

    fn bad_number(&self, start: usize) -> Error {
        let end = self
            .rest()
            .char_indices()
            .find(|(_, c)| !chars::is_unquoted_continue(*c, true) && *c != '.')
            .map(|(i, _)| self.position + i)
            .unwrap_or(self.text().len());
        self.error(
            ErrorKind::BadNumber(self.text()[start..end].to_string()),
            start,
        )
    }

    /// Consume digits of `base` with `_` grouping. Underscores must sit
    /// between two digits. Returns (digit count, saw grouping).
    fn consume_digits(&mut self, base: NumBase, start: usize) -> Result<(usize, bool)> {
        let is_digit = |c: char| c.is_digit(base.radix());
        let mut count = 0;
        let mut grouped = false;
        let mut last_was_underscore = false;
        while let Some(c) = self.current() {
            if is_digit(c) {
                count += 1;
                last_was_underscore = false;
                self.advance();
            } else if c == '_' {
                if count == 0 || last_was_underscore {
                    return Err(self.bad_number(start));
                }
                grouped = true;
                last_was_underscore = true;
                self.advance();
            } else {
                break;
            }
        }
        if last_was_underscore {
            return Err(self.bad_number(start));
        }
        Ok((count, grouped))
    }

    fn scan_number(&mut self, start: usize) -> Result<()> {
        let data = self.scan_number_component(start, true)?;
        // A second signed component ending in `i` forms a full complex
        // literal; the first component keeps its own shape requirements.
        let data = if matches!(self.current(), Some('+') | Some('-'))
            && matches!(data.kind, NumKind::Int | NumKind::Float)
            && data.base == NumBase::Dec
            && self.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            let second = self.scan_number_component(start, false)?;
            if second.kind != NumKind::Complex {
                return Err(self.bad_number(start));
            }
            NumData {
                kind: NumKind::Complex,
                base: NumBase::Dec,
                grouped: data.grouped || second.grouped,
            }
        } else {
            data
        };

        // Numbers must end at a word boundary.
        if self
            .current()
            .is_some_and(|c| chars::is_unquoted_continue(c, true))
        {
            return Err(self.bad_number(start));
        }

        self.push(SyntaxKind::NUMBER, start, TokenData::Num(data));
        Ok(())
    }

    /// Scan one signed numeric component: int, float, `i`-suffixed complex
    /// part, or `p/q` rational. `allow_rational` is false for the second
    /// component of a complex literal.
    fn scan_number_component(&mut self, start: usize, allow_rational: bool) -> Result<NumData> {
        if matches!(self.current(), Some('+') | Some('-')) {
            self.advance();
        }

        // Signed inf/nan keywords.
        if self.current().is_some_and(|c| c.is_ascii_alphabetic()) {
            let word_start = self.position;
            while self
                .current()
                .is_some_and(|c| chars::is_unquoted_continue(c, true))
            {
                self.advance();
            }
            return match &self.text()[word_start..self.position] {
                "inf" | "nan" => Ok(NumData {
                    kind: NumKind::Float,
                    base: NumBase::Dec,
                    grouped: false,
                }),
                _ => Err(self.bad_number(start)),
            };
        }

        let base = if self.rest().starts_with("0x") {
            self.position += 2;
            NumBase::Hex
        } else if self.rest().starts_with("0o") {
            self.position += 2;
            NumBase::Oct
        } else if self.rest().starts_with("0b") {
            self.position += 2;
            NumBase::Bin
        } else {
            NumBase::Dec
        };

        let (digits, mut grouped) = self.consume_digits(base, start)?;
        if digits == 0 {
            return Err(self.bad_number(start));
        }

        let mut kind = NumKind::Int;

        // Fractional part: only when the dot is followed by a digit of the
        // base, so keypath dots after a number are left alone.
        if self.current() == Some('.')
            && self
                .peek_second()
                .is_some_and(|c| c.is_digit(base.radix()))
        {
            if matches!(base, NumBase::Oct | NumBase::Bin) {
                return Err(self.bad_number(start));
            }
            self.advance();
            let (_, frac_grouped) = self.consume_digits(base, start)?;
            grouped |= frac_grouped;
            kind = NumKind::Float;
        }

        // Exponent: `e` for decimal, `p` (with decimal digits) for hex.
        let exponent_marker = match base {
            NumBase::Dec => matches!(self.current(), Some('e') | Some('E')),
            NumBase::Hex => matches!(self.current(), Some('p') | Some('P')),
            _ => false,
        };
        if exponent_marker {
            self.advance();
            if matches!(self.current(), Some('+') | Some('-')) {
                self.advance();
            }
            let (exp_digits, _) = self.consume_digits(NumBase::Dec, start)?;
            if exp_digits == 0 {
                return Err(self.bad_number(start));
            }
            kind = NumKind::Float;
        } else if base == NumBase::Hex && kind == NumKind::Float {
            // A hex float requires its `p` exponent.
            return Err(self.bad_number(start));
        }

        if self.advance_if('i') {
            if base != NumBase::Dec {
                return Err(self.bad_number(start));
            }
            return Ok(NumData {
                kind: NumKind::Complex,
                base,
                grouped,
            });
        }

        if allow_rational
            && kind == NumKind::Int
            && base == NumBase::Dec
            && self.current() == Some('/')
            && self
                .peek_second()
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.advance();
            if matches!(self.current(), Some('+') | Some('-')) {
                self.advance();
            }
            let (den_digits, den_grouped) = self.consume_digits(NumBase::Dec, start)?;
            if den_digits == 0 {
                return Err(self.bad_number(start));
            }
            return Ok(NumData {
                kind: NumKind::Rational,
                base,
                grouped: grouped || den_grouped,
            });
        }

        Ok(NumData { kind, base, grouped })
    }

    //#endregion

    //#region Strings

    fn quote_kind(c: char) -> QuoteKind {
        match c {
            '\'' => QuoteKind::Single,
            '"' => QuoteKind::Double,
            _ => QuoteKind::Backtick,
        }
    }

    fn scan_string(&mut self, quote_char: char) -> Result<()> {
        let start = self.position;
        let quote = Self::quote_kind(quote_char);
        let run = self.consume_run(quote_char);

        if run == 2 {
            // Opening plus closing quote: the empty string.
            let data = StrData {
                decoded: "".into(),
                profile: DelimProfile {
                    quote,
                    run: 1,
                    chomp: Chomp::Default,
                },
            };
            self.push(SyntaxKind::STRING, start, TokenData::Str(Box::new(data)));
            return Ok(());
        }

        if run == 6 {
            // An opening run immediately followed by its closing run: the
            // empty multiline-capable string.
            let data = StrData {
                decoded: "".into(),
                profile: DelimProfile {
                    quote,
                    run: 3,
                    chomp: Chomp::Default,
                },
            };
            self.push(SyntaxKind::STRING, start, TokenData::Str(Box::new(data)));
            return Ok(());
        }

        if run == 1 {
            return self.scan_quoted(quote_char, quote, 1, start);
        }

        // A run of three or more opens either a block string (content starts
        // on the following line) or a wrapped string (content on this line).
        if self.current().is_some_and(chars::is_newline) {
            self.scan_block(quote_char, quote, run, start)
        } else {
            self.scan_quoted(quote_char, quote, run, start)
        }
    }

    /// Scan a single-line (possibly wrapped) string with a delimiter run of
    /// `run`. Wrap lines collapse to a single space in the decoded form.
    fn scan_quoted(
        &mut self,
        quote_char: char,
        quote: QuoteKind,
        run: usize,
        start: usize,
    ) -> Result<()> {
        let interior_start = self.position;
        let escapes = quote.has_escapes();
        let mut backslashes = 0usize;
        let interior_end;
        loop {
            let Some(c) = self.current() else {
                return Err(self.error(
                    ErrorKind::UnterminatedString(quote.describe()),
                    start,
                ));
            };
            if c == quote_char && (!escapes || backslashes % 2 == 0) {
                let run_start = self.position;
                let found = self.consume_run(quote_char);
                if found == run {
                    interior_end = run_start;
                    break;
                }
                if found > run {
                    return Err(self.error(ErrorKind::UnterminatedString(quote.describe()), start));
                }
                backslashes = 0;
                continue;
            }
            if c == '\\' {
                backslashes += 1;
            } else {
                backslashes = 0;
            }
            if chars::is_disallowed(c) {
                return Err(self.error(ErrorKind::DisallowedCodePoint(c as u32), self.position));
            }
            self.advance();
        }

        let interior = &self.text()[interior_start..interior_end];
        let decoded = decode_wrapped(interior, escapes)
            .map_err(|(offset, kind)| self.error(kind, interior_start + offset))?;
        let data = StrData {
            decoded: decoded.into(),
            profile: DelimProfile {
                quote,
                run: run.min(u8::MAX as usize) as u8,
                chomp: Chomp::Default,
            },
        };
        self.push(SyntaxKind::STRING, start, TokenData::Str(Box::new(data)));
        Ok(())
    }

    /// Scan a block string: opening delimiter at the end of its line, content
    /// lines, then the closing delimiter on its own line, whose column sets
    /// the indentation to strip.
    fn scan_block(
        &mut self,
        quote_char: char,
        quote: QuoteKind,
        run: usize,
        start: usize,
    ) -> Result<()> {
        // Consume the line break after the opening delimiter.
        if self.advance() == Some('\r') {
            self.advance_if('\n');
        }

        let chomp = loop {
            if self.is_eof() {
                return Err(self.error(ErrorKind::UnterminatedString(quote.describe()), start));
            }
            // A closing line is inline whitespace, the exact delimiter run,
            // then an optional chomp suffix; anything else is a content line.
            let mut closed = None;
            while self.current().is_some_and(chars::is_inline_whitespace) {
                self.advance();
            }
            if self.current() == Some(quote_char) && self.consume_run(quote_char) == run {
                let mut chomp = Chomp::Default;
                if self.advance_if('/') {
                    chomp = if self.advance_if('/') {
                        Chomp::Strip
                    } else {
                        Chomp::Keep
                    };
                }
                match self.current() {
                    None => closed = Some(chomp),
                    Some(c) if chars::is_newline(c) || chars::is_inline_whitespace(c) => {
                        closed = Some(chomp)
                    }
                    Some(_) => {}
                }
            }
            if let Some(chomp) = closed {
                break chomp;
            }
            // Not a closing line: consume the remainder of the line.
            loop {
                match self.current() {
                    None => break,
                    Some(c) if chars::is_newline(c) => {
                        if self.advance() == Some('\r') {
                            self.advance_if('\n');
                        }
                        break;
                    }
                    Some(c) if chars::is_disallowed(c) => {
                        return Err(
                            self.error(ErrorKind::DisallowedCodePoint(c as u32), self.position)
                        );
                    }
                    Some(_) => {
                        self.advance();
                    }
                }
            }
        };

        let raw = &self.text()[start..self.position];
        let decoded = decode_block(raw, quote, run, chomp, "\n", None)
            .map_err(|(offset, kind)| self.error(kind, start + offset))?;
        let data = StrData {
            decoded: decoded.into(),
            profile: DelimProfile {
                quote,
                run: run.min(u8::MAX as usize) as u8,
                chomp,
            },
        };
        self.push(SyntaxKind::STRING, start, TokenData::Str(Box::new(data)));
        Ok(())
    }

    //#endregion
}

/// Split `text` into lines at any of the six line breaks, yielding
/// (line content, byte offset of line start).
fn split_break_lines(text: &str) -> Vec<(&str, usize)> {
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut iter = text.char_indices().peekable();
    while let Some((offset, c)) = iter.next() {
        if !chars::is_newline(c) {
            continue;
        }
        lines.push((&text[line_start..offset], line_start));
        if c == '\r' {
            if let Some((_, '\n')) = iter.peek() {
                iter.next();
            }
        }
        line_start = offset
            + c.len_utf8()
            + if c == '\r' && text[offset + 1..].starts_with('\n') {
                1
            } else {
                0
            };
    }
    lines.push((&text[line_start..], line_start));
    lines
}

/// Decode the interior of a single-line or wrapped string: wrap lines join
/// with a single space, then escapes apply for `"` strings. A line consisting
/// only of whitespace is not permitted inside a wrapped value.
pub(crate) fn decode_wrapped(
    interior: &str,
    escapes: bool,
) -> std::result::Result<String, (usize, ErrorKind)> {
    let lines = split_break_lines(interior);
    let joined: String = if lines.len() == 1 {
        interior.to_string()
    } else {
        let mut out = String::with_capacity(interior.len());
        for (index, (line, offset)) in lines.iter().enumerate() {
            let first = index == 0;
            let last = index == lines.len() - 1;
            let piece = if first {
                line.trim_end_matches(chars::is_inline_whitespace)
            } else if last {
                line.trim_start_matches(chars::is_inline_whitespace)
            } else {
                line.trim_matches(chars::is_inline_whitespace)
            };
            if piece.is_empty() && !first && !last {
                return Err((*offset, ErrorKind::InvalidLineBreak));
            }
            if !first {
                // A trailing backslash in an escaped string is a line
                // continuation; leave it for the escape pass to elide.
                if !(escapes && out_ends_with_continuation(&out)) {
                    out.push(' ');
                } else {
                    out.push('\n');
                }
            }
            out.push_str(piece);
        }
        out
    };

    if escapes {
        escape::decode(&joined).map(Cow::into_owned)
    } else {
        Ok(joined)
    }
}

fn out_ends_with_continuation(text: &str) -> bool {
    let trailing = text.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

/// Decode a block string from its full raw text (delimiters included).
/// `newline` joins the content lines; `indent` optionally replaces the
/// stripped indentation on every content line. Used both by the scanner and
/// by the resolver when a tag overrides `indent`/`newline`.
pub(crate) fn decode_block(
    raw: &str,
    quote: QuoteKind,
    run: usize,
    chomp: Chomp,
    newline: &str,
    indent: Option<&str>,
) -> std::result::Result<String, (usize, ErrorKind)> {
    let lines = split_break_lines(raw);
    debug_assert!(lines.len() >= 2, "a block string spans at least two lines");
    let (closing_line, _) = lines[lines.len() - 1];
    let strip = closing_line
        .find(quote.char())
        .unwrap_or(closing_line.len());
    let strip_prefix = &closing_line[..strip];

    let content = &lines[1..lines.len() - 1];
    let mut out = String::with_capacity(raw.len());
    for (index, (line, offset)) in content.iter().enumerate() {
        let body = if line.chars().all(chars::is_inline_whitespace) {
            // Blank lines inside a block contribute an empty line no matter
            // how much whitespace they carry.
            ""
        } else if let Some(stripped) = line.strip_prefix(strip_prefix) {
            stripped
        } else {
            let kind = if line.starts_with(chars::is_inline_whitespace) {
                ErrorKind::MixedIndent
            } else {
                ErrorKind::Indent("block line is less indented than its closing delimiter")
            };
            return Err((*offset, kind));
        };
        if index > 0 {
            out.push_str(newline);
        }
        if let Some(indent) = indent {
            if !body.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(body);
    }
    if !content.is_empty() && chomp != Chomp::Strip {
        out.push_str(newline);
    }

    if quote.has_escapes() {
        escape::decode(&out)
            .map(Cow::into_owned)
            .map_err(|(_, kind)| (0, kind))
    } else {
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        let source = SourceText::new(input);
        let options = LoadOptions::default();
        lex(&source, &options)
            .unwrap()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lex_ok(input: &str) -> TokenList {
        let source = SourceText::new(input);
        lex(&source, &LoadOptions::default()).unwrap()
    }

    fn lex_err(input: &str) -> ErrorKind {
        let source = SourceText::new(input);
        lex(&source, &LoadOptions::default()).unwrap_err().kind
    }

    #[test]
    fn tokens_cover_every_byte() {
        let input = "key = [1, 0x2,]  # note\n";
        let list = lex_ok(input);
        let mut rebuilt = String::new();
        for index in 0..list.len() {
            rebuilt.push_str(list.raw(index));
        }
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn simple_line() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("k = 1\n"),
            vec![UNQUOTED, WHITESPACE, EQUALS, WHITESPACE, NUMBER, LINE_ENDING, EOF]
        );
    }

    #[test]
    fn keywords_and_words() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("true false none inf value"),
            vec![
                TRUE_KW, WHITESPACE, FALSE_KW, WHITESPACE, NONE_KW, WHITESPACE, NUMBER,
                WHITESPACE, UNQUOTED, EOF
            ]
        );
    }

    #[test]
    fn number_classification() {
        let list = lex_ok("0x1f 0o17 0b1101 1_000 4.5e3 0x4.3p2 3+4i 2/3 -inf");
        let numbers: Vec<NumData> = list
            .iter()
            .filter_map(|t| t.num_data())
            .collect();
        assert_eq!(numbers[0], NumData { kind: NumKind::Int, base: NumBase::Hex, grouped: false });
        assert_eq!(numbers[1].base, NumBase::Oct);
        assert_eq!(numbers[2].base, NumBase::Bin);
        assert_eq!(numbers[3], NumData { kind: NumKind::Int, base: NumBase::Dec, grouped: true });
        assert_eq!(numbers[4].kind, NumKind::Float);
        assert_eq!(numbers[5], NumData { kind: NumKind::Float, base: NumBase::Hex, grouped: false });
        assert_eq!(numbers[6].kind, NumKind::Complex);
        assert_eq!(numbers[7].kind, NumKind::Rational);
        assert_eq!(numbers[8].kind, NumKind::Float);
    }

    #[test]
    fn bad_numbers() {
        assert!(matches!(lex_err("1__0"), ErrorKind::BadNumber(_)));
        assert!(matches!(lex_err("1_"), ErrorKind::BadNumber(_)));
        assert!(matches!(lex_err("0x1.8"), ErrorKind::BadNumber(_)));
        assert!(matches!(lex_err("0b12"), ErrorKind::BadNumber(_)));
        assert!(matches!(lex_err("12abc"), ErrorKind::BadNumber(_)));
        assert!(matches!(lex_err("1e"), ErrorKind::BadNumber(_)));
    }

    #[test]
    fn quoted_strings_decode() {
        let list = lex_ok(r#"a = "x\ty" 'lit\n' `raw\q`"#);
        let strings: Vec<&str> = (0..list.len())
            .filter(|i| list.kind(*i) == SyntaxKind::STRING)
            .map(|i| list.value_text(i))
            .collect();
        assert_eq!(strings, vec!["x\ty", "lit\\n", "raw\\q"]);
    }

    #[test]
    fn wrapped_string_collapses_lines() {
        let list = lex_ok("k = \"one\n    two\"");
        let decoded = (0..list.len())
            .find(|i| list.kind(*i) == SyntaxKind::STRING)
            .map(|i| list.value_text(i).to_string())
            .unwrap();
        assert_eq!(decoded, "one two");
    }

    #[test]
    fn wrapped_string_rejects_blank_line() {
        assert!(matches!(
            lex_err("k = \"one\n\n    two\""),
            ErrorKind::InvalidLineBreak
        ));
    }

    #[test]
    fn block_string_strips_closing_indent() {
        let input = "k =\n  '''\n  line one\n    indented\n  '''\n";
        let list = lex_ok(input);
        let decoded = (0..list.len())
            .find(|i| list.kind(*i) == SyntaxKind::STRING)
            .map(|i| list.value_text(i).to_string())
            .unwrap();
        assert_eq!(decoded, "line one\n  indented\n");
    }

    #[test]
    fn block_string_chomp_strips_final_newline() {
        let input = "k =\n  '''\n  text\n  '''//\n";
        let list = lex_ok(input);
        let decoded = (0..list.len())
            .find(|i| list.kind(*i) == SyntaxKind::STRING)
            .map(|i| list.value_text(i).to_string())
            .unwrap();
        assert_eq!(decoded, "text");
    }

    #[test]
    fn block_string_requires_consistent_indent() {
        let input = "k =\n  '''\n text\n  '''\n";
        assert!(matches!(
            lex_err(input),
            ErrorKind::Indent(_) | ErrorKind::MixedIndent
        ));
    }

    #[test]
    fn internal_quote_runs_must_be_shorter_than_delimiter() {
        let list = lex_ok("k = '''a '' b'''");
        let decoded = (0..list.len())
            .find(|i| list.kind(*i) == SyntaxKind::STRING)
            .map(|i| list.value_text(i).to_string())
            .unwrap();
        assert_eq!(decoded, "a '' b");
        assert!(matches!(
            lex_err("k = '''a ''''' b'''"),
            ErrorKind::UnterminatedString(_)
        ));
    }

    #[test]
    fn doc_and_line_comments() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("### doc ###\nk = 1 # trailing\n"),
            vec![
                DOC_COMMENT, LINE_ENDING, UNQUOTED, WHITESPACE, EQUALS, WHITESPACE, NUMBER,
                WHITESPACE, COMMENT, LINE_ENDING, EOF
            ]
        );
    }

    #[test]
    fn section_tokens() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("|=== a.b\nk = 1\n|===/\n"),
            vec![
                SECTION_OPEN, WHITESPACE, UNQUOTED, DOT, UNQUOTED, LINE_ENDING, UNQUOTED,
                WHITESPACE, EQUALS, WHITESPACE, NUMBER, LINE_ENDING, SECTION_CLOSE, LINE_ENDING,
                EOF
            ]
        );
        assert_eq!(kinds("=== a\n===/\n")[0], SECTION_OPEN);
    }

    #[test]
    fn tag_and_alias_tokens() {
        use SyntaxKind::*;
        assert_eq!(
            kinds("(dict, label=x)> {a = $x}"),
            vec![
                TAG_OPEN, UNQUOTED, COMMA, WHITESPACE, UNQUOTED, EQUALS, UNQUOTED, TAG_CLOSE,
                WHITESPACE, LBRACE, UNQUOTED, WHITESPACE, EQUALS, WHITESPACE, ALIAS, RBRACE, EOF
            ]
        );
    }

    #[test]
    fn crlf_is_one_line_ending() {
        let list = lex_ok("a = 1\r\nb = 2\r\n");
        let endings: Vec<&str> = (0..list.len())
            .filter(|i| list.kind(*i) == SyntaxKind::LINE_ENDING)
            .map(|i| list.raw(i))
            .collect();
        assert_eq!(endings, vec!["\r\n", "\r\n"]);
    }

    #[test]
    fn disallowed_code_point_is_rejected() {
        assert!(matches!(
            lex_err("k = \u{0007}"),
            ErrorKind::DisallowedCodePoint(7)
        ));
    }

    #[test]
    fn only_ascii_source_rejects_unicode() {
        let source = SourceText::new("k = 'café'");
        let options = LoadOptions::default().with_only_ascii_source(true);
        assert!(matches!(
            lex(&source, &options).unwrap_err().kind,
            ErrorKind::DisallowedCodePoint(_)
        ));
    }

    #[test]
    fn columns_and_line_starts() {
        let list = lex_ok("a = 1\n  b = 2\n");
        let b_index = (0..list.len())
            .find(|i| list.raw(*i) == "b")
            .unwrap();
        let token = list.get(b_index);
        assert_eq!(token.col, 2);
        assert!(token.at_line_start());
    }
}
