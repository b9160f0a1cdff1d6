//! The layout-aware parser: token stream in, raw node tree out.
//!
//! The parser reconciles the three surface syntaxes (inline, indent, and
//! section/keypath style) into one raw tree. Nodes carry token indices, style
//! flags, and comment anchors; no value decoding happens here beyond key
//! classification. The resolver turns the raw tree into a value graph.

use crate::error::{Error, ErrorKind, Result};
use crate::num;
use crate::options::LoadOptions;
use crate::syntax::SyntaxKind;
use crate::token::{TokenFlags, TokenList};
use crate::value::{Key, Value};

pub(crate) use self::tag::RawTag;

mod inline;
mod section;
mod tag;

/// Stable index of a node in the raw tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RawId(pub(crate) u32);

impl RawId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Surface style of a collection, kept for round-trip and serializer use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CollectionStyle {
    Inline {
        /// No blank space anywhere between the delimiters and items.
        compact: bool,
        trailing_comma: bool,
    },
    Indent {
        col: u32,
    },
    /// Created by a section header or a keypath segment rather than written
    /// out as a collection.
    Section,
}

/// Comment anchors carried by a value node.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NodeComments {
    /// Doc comment bound to the value.
    pub doc: Option<usize>,
    /// Line comment trailing a scalar value on its line.
    pub trailing: Option<usize>,
    /// Line comment after the opening delimiter of a collection.
    pub start_trailing: Option<usize>,
    /// Line comment after the closing delimiter of a collection.
    pub end_trailing: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct RawKey {
    /// Token index of the first occurrence of this key.
    pub token: usize,
    /// Every token spelling this key as a segment: keypath occurrences,
    /// section header segments, and overwrites.
    pub occurrences: Vec<usize>,
    pub key: Key,
}

#[derive(Clone, Debug)]
pub(crate) struct RawEntry {
    pub key: RawKey,
    pub value: RawId,
    /// Doc comment bound to the key.
    pub key_doc: Option<usize>,
    /// Line comment between `=` and a value that starts on a later line.
    pub key_trailing: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) enum RawShape {
    /// A single scalar token.
    Scalar { token: usize },
    /// A wrapped unquoted value: word tokens joined by single spaces.
    Phrase { tokens: Vec<usize> },
    Alias { token: usize },
    Dict {
        entries: Vec<RawEntry>,
        style: CollectionStyle,
        keypath_created: bool,
        /// Later assignments replace earlier ones (from an `overwrite=true`
        /// tag on this dict).
        overwrite: bool,
    },
    List {
        items: Vec<RawId>,
        style: CollectionStyle,
    },
}

#[derive(Debug)]
pub(crate) struct RawNode {
    pub shape: RawShape,
    pub tag: Option<RawTag>,
    /// Token range covering the value, delimiters included, tag excluded.
    pub span: std::ops::Range<usize>,
    pub comments: NodeComments,
}

#[derive(Debug)]
pub(crate) struct RawTree {
    pub nodes: Vec<RawNode>,
    /// `None` for an all-trivia document.
    pub root: Option<RawId>,
}

impl RawTree {
    pub fn node(&self, id: RawId) -> &RawNode {
        &self.nodes[id.index()]
    }
}

pub(crate) fn parse(tokens: &TokenList, options: &LoadOptions) -> Result<RawTree> {
    let mut parser = Parser {
        tokens,
        options,
        cursor: 0,
        nodes: Vec::new(),
    };
    let root = parser.parse_document()?;
    Ok(RawTree {
        nodes: parser.nodes,
        root,
    })
}

pub(crate) struct Parser<'a> {
    pub(crate) tokens: &'a TokenList,
    pub(crate) options: &'a LoadOptions,
    pub(crate) cursor: usize,
    pub(crate) nodes: Vec<RawNode>,
}

impl<'a> Parser<'a> {
    //#region Token navigation

    pub(crate) fn kind(&self) -> SyntaxKind {
        self.tokens.kind(self.cursor)
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn bump(&mut self) -> usize {
        let index = self.cursor;
        if self.kind() != SyntaxKind::EOF {
            self.cursor += 1;
        }
        index
    }

    pub(crate) fn col(&self) -> u32 {
        self.tokens.get(self.cursor).col
    }

    pub(crate) fn at_line_start(&self) -> bool {
        self.tokens
            .get(self.cursor)
            .flags
            .contains(TokenFlags::AT_LINE_START)
    }

    pub(crate) fn error_here(&self, kind: ErrorKind) -> Error {
        self.error_at(self.cursor, kind)
    }

    pub(crate) fn error_at(&self, token: usize, kind: ErrorKind) -> Error {
        self.tokens
            .source()
            .error(kind, self.tokens.get(token).span.start)
    }

    /// Skip whitespace and line endings.
    pub(crate) fn skip_blank(&mut self) {
        while self.kind().is_blank_trivia() {
            self.bump();
        }
    }

    /// Skip whitespace, line endings, and line comments, leaving doc comments
    /// in place for the caller to bind.
    pub(crate) fn skip_trivia(&mut self) {
        while matches!(
            self.kind(),
            SyntaxKind::WHITESPACE | SyntaxKind::LINE_ENDING | SyntaxKind::COMMENT
        ) {
            self.bump();
        }
    }

    /// Take at most one doc comment from the trivia ahead of the cursor. A
    /// second doc comment bound to the same object is an error.
    pub(crate) fn take_doc_comment(&mut self) -> Result<Option<usize>> {
        self.skip_trivia();
        if !self.at(SyntaxKind::DOC_COMMENT) {
            return Ok(None);
        }
        let index = self.bump();
        self.skip_trivia();
        if self.at(SyntaxKind::DOC_COMMENT) {
            return Err(self.error_here(ErrorKind::Unexpected("second doc comment")));
        }
        Ok(Some(index))
    }

    /// Take a line comment from the same line as the token just consumed.
    pub(crate) fn take_trailing_comment(&mut self) -> Option<usize> {
        let mut probe = self.cursor;
        while self.tokens.kind(probe) == SyntaxKind::WHITESPACE {
            probe += 1;
        }
        if self.tokens.kind(probe) == SyntaxKind::COMMENT {
            self.cursor = probe + 1;
            Some(probe)
        } else {
            None
        }
    }

    /// Whether the upcoming tokens form a dict entry: a key-shaped token
    /// followed by `=` or `.` on the same line.
    pub(crate) fn looks_like_entry(&self) -> bool {
        if !self.kind().is_key_start() {
            return false;
        }
        let mut probe = self.cursor + 1;
        while self.tokens.kind(probe) == SyntaxKind::WHITESPACE {
            probe += 1;
        }
        matches!(self.tokens.kind(probe), SyntaxKind::EQUALS | SyntaxKind::DOT)
    }

    pub(crate) fn skip_inline_ws(&mut self) {
        while self.at(SyntaxKind::WHITESPACE) {
            self.bump();
        }
    }

    //#endregion

    //#region Raw tree construction

    pub(crate) fn push_node(&mut self, node: RawNode) -> RawId {
        let id = RawId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn node(&self, id: RawId) -> &RawNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: RawId) -> &mut RawNode {
        &mut self.nodes[id.index()]
    }

    /// Create an empty dict node to be filled by [`Parser::insert_path`].
    pub(crate) fn new_dict(
        &mut self,
        style: CollectionStyle,
        keypath_created: bool,
        overwrite: bool,
        first_token: usize,
    ) -> RawId {
        self.push_node(RawNode {
            shape: RawShape::Dict {
                entries: Vec::new(),
                style,
                keypath_created,
                overwrite,
            },
            tag: None,
            span: first_token..first_token,
            comments: NodeComments::default(),
        })
    }

    pub(crate) fn check_depth(&self, depth: usize, token: usize) -> Result<()> {
        if depth > self.options.max_nesting_depth {
            return Err(self.error_at(
                token,
                ErrorKind::DepthExceeded(self.options.max_nesting_depth),
            ));
        }
        Ok(())
    }

    fn dict_parts_mut(&mut self, id: RawId) -> (&mut Vec<RawEntry>, bool, bool) {
        match &mut self.nodes[id.index()].shape {
            RawShape::Dict {
                entries,
                keypath_created,
                overwrite,
                ..
            } => (entries, *keypath_created, *overwrite),
            _ => unreachable!("insert_path target is always a dict"),
        }
    }

    /// Walk one keypath segment below `current`, creating a keypath dict if
    /// the key is absent, or merging into an existing dict under the merge
    /// policy: an existing prefix dict accepts new segments only if it is
    /// keypath-created or carries an `overwrite=true` or `init=` tag.
    pub(crate) fn descend_segment(
        &mut self,
        current: RawId,
        token: usize,
        key: &Key,
    ) -> Result<RawId> {
        let (entries, _, _) = self.dict_parts_mut(current);
        let found = entries
            .iter_mut()
            .find(|entry| entry.key.key == *key)
            .map(|entry| {
                entry.key.occurrences.push(token);
                entry.value
            });
        match found {
            Some(target) => {
                let node = self.node(target);
                let mergeable = match &node.shape {
                    RawShape::Dict {
                        keypath_created,
                        overwrite,
                        ..
                    } => {
                        *keypath_created
                            || *overwrite
                            || node.tag.as_ref().is_some_and(|t| t.init.is_some())
                    }
                    _ => false,
                };
                if !mergeable {
                    return Err(self.error_at(token, ErrorKind::DuplicateKey(key.to_string())));
                }
                Ok(target)
            }
            None => {
                let child = self.new_dict(CollectionStyle::Section, true, false, token);
                let (entries, _, _) = self.dict_parts_mut(current);
                entries.push(RawEntry {
                    key: RawKey {
                        token,
                        occurrences: vec![token],
                        key: key.clone(),
                    },
                    value: child,
                    key_doc: None,
                    key_trailing: None,
                });
                Ok(child)
            }
        }
    }

    /// Insert a value at `segments` below `dict_id`, creating or merging
    /// keypath intermediates; an existing terminal is replaced only under
    /// `overwrite=true` on the owning dict.
    pub(crate) fn insert_path(
        &mut self,
        dict_id: RawId,
        segments: &[(usize, Key)],
        value: RawId,
        key_doc: Option<usize>,
        key_trailing: Option<usize>,
        depth: usize,
    ) -> Result<()> {
        debug_assert!(!segments.is_empty());
        let mut current = dict_id;
        for (step, (token, key)) in segments[..segments.len() - 1].iter().enumerate() {
            self.check_depth(depth + step + 1, *token)?;
            current = self.descend_segment(current, *token, key)?;
        }

        let (token, key) = &segments[segments.len() - 1];
        let (entries, _, overwrite) = self.dict_parts_mut(current);
        match entries.iter_mut().find(|entry| entry.key.key == *key) {
            None => {
                entries.push(RawEntry {
                    key: RawKey {
                        token: *token,
                        occurrences: vec![*token],
                        key: key.clone(),
                    },
                    value,
                    key_doc,
                    key_trailing,
                });
            }
            Some(existing) => {
                if !overwrite {
                    return Err(self.error_at(*token, ErrorKind::DuplicateKey(key.to_string())));
                }
                existing.key.occurrences.push(*token);
                existing.value = value;
                if existing.key_doc.is_none() {
                    existing.key_doc = key_doc;
                }
            }
        }
        Ok(())
    }

    //#endregion

    //#region Document

    fn parse_document(&mut self) -> Result<Option<RawId>> {
        self.skip_trivia();
        if self.at(SyntaxKind::EOF) {
            return Ok(None);
        }

        // Section headers and entry-shaped lines mean the document is a root
        // dict; a bullet means a root list; anything else is a single value.
        let root = if self.at(SyntaxKind::SECTION_OPEN)
            || self.at(SyntaxKind::SECTION_CLOSE)
            || self.looks_like_entry()
        {
            section::parse_root_dict(self)?
        } else if self.at(SyntaxKind::LIST_BULLET) {
            self.parse_indent_list(self.col(), 1)?
        } else {
            let value = self.parse_value(Some(self.col()), 1)?;
            let trailing = self.take_trailing_comment();
            self.attach_value_trailing(value, trailing);
            value
        };

        self.skip_trivia();
        if !self.at(SyntaxKind::EOF) {
            if self.at(SyntaxKind::DOC_COMMENT) {
                return Err(self.error_here(ErrorKind::Unexpected("doc comment")));
            }
            return Err(self.error_here(ErrorKind::Unexpected(self.kind().describe())));
        }
        Ok(Some(root))
    }

    //#endregion

    //#region Values

    /// Parse one value. `min_col` is the column the value's continuation
    /// lines must exceed (the key or bullet column); `None` inside inline
    /// collections, where layout is free.
    pub(crate) fn parse_value(&mut self, min_col: Option<u32>, depth: usize) -> Result<RawId> {
        let doc = self.take_doc_comment()?;
        let tag = if self.at(SyntaxKind::TAG_OPEN) {
            let tag = tag::parse_tag(self)?;
            self.skip_trivia();
            if self.at(SyntaxKind::TAG_OPEN) {
                return Err(
                    self.error_here(ErrorKind::TagMismatch("a value carries at most one tag"))
                );
            }
            Some(tag)
        } else {
            None
        };

        let overwrite = tag.as_ref().and_then(|t| t.overwrite).unwrap_or(false);
        let id = self.parse_untagged_value(min_col, depth, overwrite)?;
        let node = &mut self.nodes[id.index()];
        if node.comments.doc.is_none() {
            node.comments.doc = doc;
        }
        if let Some(tag) = tag {
            node.tag = Some(tag);
        }
        Ok(id)
    }

    fn parse_untagged_value(
        &mut self,
        min_col: Option<u32>,
        depth: usize,
        overwrite: bool,
    ) -> Result<RawId> {
        self.skip_trivia();
        match self.kind() {
            SyntaxKind::LBRACE => inline::parse_inline_dict(self, depth, overwrite),
            SyntaxKind::LBRACKET => inline::parse_inline_list(self, depth),
            SyntaxKind::LIST_BULLET if min_col.is_some() => {
                let col = self.col();
                self.parse_indent_list(col, depth)
            }
            SyntaxKind::ALIAS => {
                let token = self.bump();
                Ok(self.push_node(RawNode {
                    shape: RawShape::Alias { token },
                    tag: None,
                    span: token..token + 1,
                    comments: NodeComments::default(),
                }))
            }
            kind if kind.is_scalar() && min_col.is_some() && self.looks_like_entry() => {
                // A key line in value position opens a nested indent dict.
                let col = self.col();
                self.parse_indent_dict(col, depth, overwrite)
            }
            SyntaxKind::UNQUOTED => self.parse_phrase(min_col),
            SyntaxKind::STRING
            | SyntaxKind::NUMBER
            | SyntaxKind::TRUE_KW
            | SyntaxKind::FALSE_KW
            | SyntaxKind::NONE_KW => {
                let token = self.bump();
                Ok(self.push_node(RawNode {
                    shape: RawShape::Scalar { token },
                    tag: None,
                    span: token..token + 1,
                    comments: NodeComments::default(),
                }))
            }
            SyntaxKind::COMMA | SyntaxKind::RBRACE | SyntaxKind::RBRACKET => {
                Err(self.error_here(ErrorKind::EmptyCollectionItem))
            }
            SyntaxKind::EOF | SyntaxKind::SECTION_OPEN | SyntaxKind::SECTION_CLOSE => {
                Err(self.error_here(ErrorKind::Unexpected("end of value")))
            }
            kind => Err(self.error_here(ErrorKind::Unexpected(kind.describe()))),
        }
    }

    /// Parse a wrapped unquoted value: words on one line, optionally
    /// continued on following lines that are more indented than `min_col`
    /// and do not look like entries or list items.
    fn parse_phrase(&mut self, min_col: Option<u32>) -> Result<RawId> {
        let first = self.bump();
        let mut words = vec![first];
        loop {
            let mut probe = self.cursor;
            let mut crossed_lines = 0;
            while matches!(
                self.tokens.kind(probe),
                SyntaxKind::WHITESPACE | SyntaxKind::LINE_ENDING
            ) {
                if self.tokens.kind(probe) == SyntaxKind::LINE_ENDING {
                    crossed_lines += 1;
                }
                probe += 1;
            }
            let next = self.tokens.get(probe);
            let word_like = matches!(
                next.kind,
                SyntaxKind::UNQUOTED
                    | SyntaxKind::NUMBER
                    | SyntaxKind::TRUE_KW
                    | SyntaxKind::FALSE_KW
                    | SyntaxKind::NONE_KW
            );
            // A blank line always ends the value.
            if !word_like || crossed_lines > 1 {
                break;
            }
            if crossed_lines == 1 {
                if let Some(min) = min_col {
                    if next.col <= min {
                        break;
                    }
                }
            }
            let saved = self.cursor;
            self.cursor = probe;
            let next_is_structure = self.looks_like_entry()
                || (crossed_lines == 1 && self.at(SyntaxKind::LIST_BULLET));
            self.cursor = saved;
            if next_is_structure {
                break;
            }
            self.cursor = probe;
            words.push(self.bump());
        }
        let span = *words.first().unwrap()..words.last().unwrap() + 1;
        Ok(self.push_node(RawNode {
            shape: RawShape::Phrase { tokens: words },
            tag: None,
            span,
            comments: NodeComments::default(),
        }))
    }

    //#endregion

    //#region Indent collections

    /// Parse an indent-style dict whose keys sit at exactly `col`. The first
    /// key may open the dict mid-line (after a bullet); every later key must
    /// lead its line at the same column.
    pub(crate) fn parse_indent_dict(
        &mut self,
        col: u32,
        depth: usize,
        overwrite: bool,
    ) -> Result<RawId> {
        self.check_depth(depth, self.cursor)?;
        let first_token = self.cursor;
        let dict = self.new_dict(CollectionStyle::Indent { col }, false, overwrite, first_token);
        let mut indent_unit: Option<String> = None;
        let mut last_token = self.cursor;
        let mut first = true;

        loop {
            let key_doc = self.take_doc_comment()?;
            if matches!(
                self.kind(),
                SyntaxKind::EOF | SyntaxKind::SECTION_OPEN | SyntaxKind::SECTION_CLOSE
            ) || (!first && self.at_line_start() && self.col() < col)
            {
                // A doc comment taken just before a dedent belongs to the
                // enclosing frame; hand it back.
                if let Some(index) = key_doc {
                    self.cursor = index;
                }
                break;
            }
            if !first && (self.col() != col || !self.at_line_start()) {
                return Err(self.error_here(ErrorKind::Indent("misaligned dict key")));
            }
            if self.at_line_start() {
                self.check_indent_consistency(&mut indent_unit)?;
            }
            if !self.looks_like_entry() {
                return Err(self.error_here(ErrorKind::Unexpected(self.kind().describe())));
            }
            first = false;

            let (segments, value, key_trailing) = self.parse_entry(Some(col), depth)?;
            last_token = self.node(value).span.end;
            self.insert_path(dict, &segments, value, key_doc, key_trailing, depth)?;
            self.skip_blank();
        }

        let node = self.node_mut(dict);
        node.span = first_token..last_token.max(first_token);
        Ok(dict)
    }

    /// Parse one `key = value` (or `a.b.c = value`) line: the key segments,
    /// the `=`, and the value hanging off it. `col` is `None` inside inline
    /// collections.
    pub(crate) fn parse_entry(
        &mut self,
        col: Option<u32>,
        depth: usize,
    ) -> Result<(Vec<(usize, Key)>, RawId, Option<usize>)> {
        let mut segments = vec![self.parse_key_segment()?];
        while self.at(SyntaxKind::DOT) {
            self.bump();
            segments.push(self.parse_key_segment()?);
        }
        self.skip_inline_ws();
        if !self.at(SyntaxKind::EQUALS) {
            return Err(self.error_here(ErrorKind::Unexpected(self.kind().describe())));
        }
        self.bump();

        // A comment right after `=` binds to the key; the value then starts
        // on a later line.
        let key_trailing = self.take_trailing_comment();

        let value = self.parse_value(col, depth + segments.len())?;
        let value_trailing = self.take_trailing_comment();
        self.attach_value_trailing(value, value_trailing);
        Ok((segments, value, key_trailing))
    }

    /// Bind a comment found after a value to the right anchor: trailing for
    /// scalars, end-trailing for collections.
    pub(crate) fn attach_value_trailing(&mut self, value: RawId, comment: Option<usize>) {
        let node = &mut self.nodes[value.index()];
        let scalar = !matches!(node.shape, RawShape::Dict { .. } | RawShape::List { .. });
        if scalar {
            if node.comments.trailing.is_none() {
                node.comments.trailing = comment;
            }
        } else if node.comments.end_trailing.is_none() {
            node.comments.end_trailing = comment;
        }
    }

    /// Parse a single key segment token into a [`Key`].
    pub(crate) fn parse_key_segment(&mut self) -> Result<(usize, Key)> {
        self.skip_inline_ws();
        let token_index = self.cursor;
        let token = self.tokens.get(token_index);
        let key = match token.kind {
            SyntaxKind::UNQUOTED => Key::Str(self.tokens.raw(token_index).into()),
            SyntaxKind::STRING => {
                if token.flags.contains(TokenFlags::MULTILINE) {
                    return Err(self.error_here(ErrorKind::Unexpected("multiline string key")));
                }
                Key::Str(self.tokens.value_text(token_index).into())
            }
            SyntaxKind::TRUE_KW => Key::Bool(true),
            SyntaxKind::FALSE_KW => Key::Bool(false),
            SyntaxKind::NONE_KW => Key::None,
            SyntaxKind::NUMBER => {
                let data = token.num_data().expect("number token carries NumData");
                let raw = self.tokens.raw(token_index);
                let value = num::parse_number(raw, data, self.options)
                    .map_err(|kind| self.error_at(token_index, kind))?;
                match value {
                    Value::Int(n) => Key::Int(n),
                    Value::Float(x) if x.is_nan() => {
                        return Err(
                            self.error_at(token_index, ErrorKind::BadNumber("nan".to_string()))
                        );
                    }
                    Value::Float(x) => Key::float(x),
                    _ => {
                        return Err(
                            self.error_at(token_index, ErrorKind::BadNumber(raw.to_string()))
                        );
                    }
                }
            }
            kind => return Err(self.error_here(ErrorKind::Unexpected(kind.describe()))),
        };
        self.bump();
        Ok((token_index, key))
    }

    /// Reject indentation that mixes tabs and spaces differently from the
    /// first indented line of the collection.
    pub(crate) fn check_indent_consistency(&mut self, indent_unit: &mut Option<String>) -> Result<()> {
        let indent = self.leading_indent_text();
        match indent_unit {
            None => *indent_unit = Some(indent.to_string()),
            Some(expected) => {
                if indent != *expected {
                    return Err(self.error_here(ErrorKind::MixedIndent));
                }
            }
        }
        Ok(())
    }

    /// The whitespace text preceding the current (line-leading) token.
    fn leading_indent_text(&self) -> &'a str {
        if self.cursor == 0 {
            return "";
        }
        let prev = self.cursor - 1;
        if self.tokens.kind(prev) == SyntaxKind::WHITESPACE {
            self.tokens.raw(prev)
        } else {
            ""
        }
    }

    /// Parse an indent-style list whose bullets sit at exactly `col`.
    pub(crate) fn parse_indent_list(&mut self, col: u32, depth: usize) -> Result<RawId> {
        self.check_depth(depth, self.cursor)?;
        let first_token = self.cursor;
        let mut items = Vec::new();
        let mut indent_unit: Option<String> = None;
        let mut last_token = self.cursor;
        let mut first = true;

        loop {
            let item_doc = self.take_doc_comment()?;
            let at_bullet = self.at(SyntaxKind::LIST_BULLET)
                && (first || (self.at_line_start() && self.col() == col));
            if !at_bullet {
                if self.at(SyntaxKind::LIST_BULLET) && self.at_line_start() && self.col() > col {
                    return Err(self.error_here(ErrorKind::Indent("misaligned list item")));
                }
                if let Some(index) = item_doc {
                    self.cursor = index;
                }
                break;
            }
            if self.at_line_start() {
                self.check_indent_consistency(&mut indent_unit)?;
            }
            first = false;
            let bullet = self.bump();
            self.skip_inline_ws();
            if matches!(self.kind(), SyntaxKind::LINE_ENDING | SyntaxKind::EOF) {
                return Err(self.error_at(bullet, ErrorKind::EmptyCollectionItem));
            }

            let value = self.parse_value(Some(col), depth + 1)?;
            let value_trailing = self.take_trailing_comment();
            if self.nodes[value.index()].comments.doc.is_none() {
                self.nodes[value.index()].comments.doc = item_doc;
            }
            self.attach_value_trailing(value, value_trailing);
            last_token = self.node(value).span.end;
            items.push(value);
            self.skip_blank();
        }

        if items.is_empty() {
            return Err(self.error_here(ErrorKind::EmptyCollectionItem));
        }
        Ok(self.push_node(RawNode {
            shape: RawShape::List {
                items,
                style: CollectionStyle::Indent { col },
            },
            tag: None,
            span: first_token..last_token.max(first_token),
            comments: NodeComments::default(),
        }))
    }

    //#endregion
}
