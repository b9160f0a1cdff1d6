//! The round-trip AST: byte-faithful edits over the original token stream.
//!
//! The AST owns the full token stream plus the raw tree's structural links
//! into it. Edits never touch the stream itself; they queue re-rendered text
//! for a token range, and [`RoundTripAst::dumps`] walks the stream emitting
//! raw text with pending replacements substituted in place. Everything not
//! edited comes out byte-identical.

use rustc_hash::FxHashMap;

use crate::chars;
use crate::error::{Error, ErrorKind, Result};
use crate::options::{LoadOptions, RoundTripOptions};
use crate::parser::{CollectionStyle, RawId, RawShape, RawTree};
use crate::syntax::SyntaxKind;
use crate::token::{TokenFlags, TokenList};
use crate::value::{Key, Value};

pub(crate) mod render;

/// One hop of an edit path.
#[derive(Clone, Debug, PartialEq)]
pub enum PathSeg {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSeg {
    fn from(key: &str) -> Self {
        PathSeg::Key(key.to_string())
    }
}

impl From<usize> for PathSeg {
    fn from(index: usize) -> Self {
        PathSeg::Index(index)
    }
}

/// Build a path from `&["a", "b"]`-style slices.
pub fn path<const N: usize>(segs: [&str; N]) -> Vec<PathSeg> {
    segs.iter().map(|s| PathSeg::from(*s)).collect()
}

#[derive(Clone, Debug)]
struct Pending {
    end: usize,
    text: String,
}

pub struct RoundTripAst {
    tokens: TokenList,
    tree: RawTree,
    options: LoadOptions,
    rt_options: RoundTripOptions,
    /// First token index of a replaced range to its rendered text.
    replacements: FxHashMap<usize, Pending>,
    /// Style-fallback warnings accumulated by edits that could not keep the
    /// original style.
    diagnostics: Vec<Error>,
}

impl RoundTripAst {
    pub(crate) fn new(
        tokens: TokenList,
        tree: RawTree,
        options: LoadOptions,
        rt_options: RoundTripOptions,
    ) -> Self {
        Self {
            tokens,
            tree,
            options,
            rt_options,
            replacements: FxHashMap::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// Emit the document: every token's raw text in order, except ranges with
    /// a pending replacement, whose re-rendered form is substituted.
    pub fn dumps(&self) -> String {
        let mut out = String::with_capacity(self.tokens.source().len() + 16);
        let mut index = 0;
        while index < self.tokens.len() {
            match self.replacements.get(&index) {
                Some(pending) => {
                    out.push_str(&pending.text);
                    index = pending.end;
                }
                None => {
                    out.push_str(self.tokens.raw(index));
                    index += 1;
                }
            }
        }
        out
    }

    //#region Path navigation

    fn err_at_node(&self, node: RawId, kind: ErrorKind) -> Error {
        let token = self.tree.node(node).span.start.min(self.tokens.len() - 1);
        self.tokens
            .source()
            .error(kind, self.tokens.get(token).span.start)
    }

    fn root_id(&self) -> Result<RawId> {
        self.tree
            .root
            .ok_or_else(|| Error::unpositioned(ErrorKind::PathNotFound))
    }

    fn child(&self, node: RawId, seg: &PathSeg) -> Result<RawId> {
        match (&self.tree.node(node).shape, seg) {
            (RawShape::Dict { entries, .. }, PathSeg::Key(name)) => entries
                .iter()
                .find(|entry| entry.key.key.as_str() == Some(name))
                .map(|entry| entry.value)
                .ok_or_else(|| self.err_at_node(node, ErrorKind::PathNotFound)),
            (RawShape::List { items, .. }, PathSeg::Index(index)) => items
                .get(*index)
                .copied()
                .ok_or_else(|| self.err_at_node(node, ErrorKind::PathNotFound)),
            _ => Err(self.err_at_node(node, ErrorKind::PathNotFound)),
        }
    }

    fn locate(&self, path: &[PathSeg]) -> Result<RawId> {
        let mut node = self.root_id()?;
        for seg in path {
            node = self.child(node, seg)?;
        }
        Ok(node)
    }

    pub fn root(&self) -> Result<Cursor<'_>> {
        Ok(Cursor {
            ast: self,
            node: self.root_id()?,
            entry: None,
        })
    }

    pub fn get(&self, path: &[PathSeg]) -> Result<Cursor<'_>> {
        let mut cursor = self.root()?;
        for seg in path {
            cursor = cursor.descend(seg)?;
        }
        Ok(cursor)
    }

    //#endregion

    //#region replace_val

    /// Replace the scalar value at `path`, re-rendering it in the original
    /// token's style. Comments and surrounding whitespace are untouched.
    pub fn replace_val(&mut self, path: &[PathSeg], value: Value) -> Result<()> {
        let node = self.locate(path)?;
        let existing = self.scalar_category(node)?;
        let replacement = self.render_value(node, &value, existing)?;
        let span = self.tree.node(node).span.clone();
        self.replacements.insert(
            span.start,
            Pending {
                end: span.end,
                text: replacement,
            },
        );
        Ok(())
    }

    /// The broad scalar family of the node, for type-compatibility checks.
    fn scalar_category(&self, node: RawId) -> Result<&'static str> {
        let raw = self.tree.node(node);
        match &raw.shape {
            RawShape::Phrase { .. } => Ok("string"),
            RawShape::Scalar { token } => Ok(match self.tokens.kind(*token) {
                SyntaxKind::STRING | SyntaxKind::UNQUOTED => "string",
                SyntaxKind::NUMBER => "number",
                SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW => "bool",
                SyntaxKind::NONE_KW => "none",
                _ => "scalar",
            }),
            RawShape::Alias { .. } => Err(self.err_at_node(
                node,
                ErrorKind::ReplaceTypeMismatch("alias"),
            )),
            RawShape::Dict { .. } | RawShape::List { .. } => Err(self.err_at_node(
                node,
                ErrorKind::ReplaceTypeMismatch("collection"),
            )),
        }
    }

    fn value_category(value: &Value) -> Result<&'static str> {
        match value {
            Value::Str(_) => Ok("string"),
            Value::Int(_) | Value::Float(_) | Value::Complex(..) | Value::Rational(..) => {
                Ok("number")
            }
            Value::Bool(_) => Ok("bool"),
            Value::None => Ok("none"),
            Value::Bytes(_) | Value::Dict(_) | Value::List(_) => {
                Err(Error::unpositioned(ErrorKind::ReplaceTypeMismatch(
                    "only scalar replacements are supported",
                )))
            }
        }
    }

    fn render_value(&mut self, node: RawId, value: &Value, existing: &'static str) -> Result<String> {
        let new_category = Self::value_category(value)?;
        if self.rt_options.enforce_types && new_category != existing {
            return Err(self.err_at_node(node, ErrorKind::ReplaceTypeMismatch(existing)));
        }

        let token = match &self.tree.node(node).shape {
            RawShape::Scalar { token } => Some(*token),
            _ => None,
        };

        let text = match value {
            Value::Str(s) => {
                let (profile, block_indent) = match token {
                    Some(t) if self.tokens.kind(t) == SyntaxKind::STRING => {
                        let data = self.tokens.get(t).str_data().expect("string token");
                        (Some(data.profile), self.block_indent_of(t))
                    }
                    _ => (None, None),
                };
                let rendered = render::render_str(
                    s,
                    profile.as_ref(),
                    block_indent.as_deref(),
                    self.options.only_ascii_source,
                );
                if rendered.fallback {
                    let warning = self.err_at_node(node, ErrorKind::StyleFallback);
                    self.diagnostics.push(warning);
                }
                rendered.text
            }
            Value::Int(n) => {
                let (base, stride) = self.num_style(token);
                render::render_int(*n, base, stride)
            }
            Value::Float(x) => {
                let (base, _) = self.num_style(token);
                render::render_float(*x, base)
            }
            Value::Complex(re, im) => render::render_complex(*re, *im),
            Value::Rational(p, q) => {
                if *q == 0 {
                    return Err(self.err_at_node(
                        node,
                        ErrorKind::BadNumber(format!("{}/{}", p, q)),
                    ));
                }
                render::render_rational(*p, *q)
            }
            Value::Bool(b) => render::render_bool(*b),
            Value::None => "none".to_string(),
            Value::Bytes(_) | Value::Dict(_) | Value::List(_) => unreachable!(),
        };
        Ok(text)
    }

    /// The numeric style of the original token: its base and, when it used
    /// grouping, the grouping stride.
    fn num_style(&self, token: Option<usize>) -> (crate::token::NumBase, usize) {
        let Some(token) = token else {
            return (crate::token::NumBase::Dec, 0);
        };
        match self.tokens.get(token).num_data() {
            Some(data) => {
                let stride = if data.grouped {
                    render::grouping_stride(self.tokens.raw(token))
                } else {
                    0
                };
                (data.base, stride)
            }
            None => (crate::token::NumBase::Dec, 0),
        }
    }

    /// The closing-line indentation of a block string token.
    fn block_indent_of(&self, token: usize) -> Option<String> {
        let t = self.tokens.get(token);
        if !t.flags.contains(TokenFlags::MULTILINE) {
            return None;
        }
        let data = t.str_data()?;
        let raw = self.tokens.raw(token);
        let run = data.profile.run as usize;
        if run < 3 || !raw[run..].starts_with(chars::is_newline) {
            return None;
        }
        let tail_start = raw
            .char_indices()
            .filter(|(_, c)| chars::is_newline(*c))
            .last()
            .map(|(i, c)| i + c.len_utf8())?;
        let tail = &raw[tail_start..];
        let ws_end = tail
            .find(|c: char| !chars::is_inline_whitespace(c))
            .unwrap_or(tail.len());
        Some(tail[..ws_end].to_string())
    }

    //#endregion

    //#region replace_key

    /// Rename the key at `path` in its parent dict and at every keypath and
    /// section occurrence of that key segment in the document.
    pub fn replace_key(&mut self, path: &[PathSeg], new_key: Value) -> Result<()> {
        let Some((last, parent_path)) = path.split_last() else {
            return Err(Error::unpositioned(ErrorKind::PathNotFound));
        };
        let parent = self.locate(parent_path)?;
        let PathSeg::Key(name) = last else {
            return Err(self.err_at_node(parent, ErrorKind::PathNotFound));
        };

        let key = match &new_key {
            Value::Str(s) => Key::Str(s.clone()),
            Value::Int(n) => Key::Int(*n),
            Value::Bool(b) => Key::Bool(*b),
            Value::None => Key::None,
            Value::Float(x) if !x.is_nan() => Key::float(*x),
            other => {
                return Err(self.err_at_node(
                    parent,
                    ErrorKind::ReplaceTypeMismatch(other.kind_name()),
                ));
            }
        };

        let RawShape::Dict { entries, .. } = &self.tree.node(parent).shape else {
            return Err(self.err_at_node(parent, ErrorKind::PathNotFound));
        };
        let slot = entries
            .iter()
            .position(|entry| entry.key.key.as_str() == Some(name))
            .ok_or_else(|| self.err_at_node(parent, ErrorKind::PathNotFound))?;
        if entries
            .iter()
            .enumerate()
            .any(|(i, entry)| i != slot && entry.key.key == key)
        {
            return Err(self.err_at_node(parent, ErrorKind::KeyCollision(key.to_string())));
        }
        let occurrences = entries[slot].key.occurrences.clone();

        let mut rendered = Vec::with_capacity(occurrences.len());
        for token in &occurrences {
            rendered.push(self.render_key_token(*token, &key)?);
        }
        for (token, text) in occurrences.iter().zip(rendered) {
            self.replacements.insert(
                *token,
                Pending {
                    end: token + 1,
                    text,
                },
            );
        }

        // Future path lookups see the new name.
        match &mut self.tree.nodes[parent.index()].shape {
            RawShape::Dict { entries, .. } => entries[slot].key.key = key,
            _ => unreachable!(),
        }
        Ok(())
    }

    /// Render the new key in the style of one original occurrence token.
    fn render_key_token(&mut self, token: usize, key: &Key) -> Result<String> {
        let text = match (self.tokens.kind(token), key) {
            (SyntaxKind::UNQUOTED, Key::Str(s)) => {
                if chars::is_valid_unquoted_key(s, self.options.only_ascii_unquoted) {
                    s.to_string()
                } else {
                    let rendered =
                        render::render_str(s, None, None, self.options.only_ascii_source);
                    let warning = self
                        .tokens
                        .source()
                        .error(ErrorKind::StyleFallback, self.tokens.get(token).span.start);
                    self.diagnostics.push(warning);
                    rendered.text
                }
            }
            (SyntaxKind::STRING, Key::Str(s)) => {
                let data = self.tokens.get(token).str_data().expect("string token");
                let profile = data.profile;
                let rendered = render::render_str(
                    s,
                    Some(&profile),
                    None,
                    self.options.only_ascii_source,
                );
                if rendered.fallback {
                    let warning = self
                        .tokens
                        .source()
                        .error(ErrorKind::StyleFallback, self.tokens.get(token).span.start);
                    self.diagnostics.push(warning);
                }
                rendered.text
            }
            (_, Key::Str(s)) => {
                render::render_str(s, None, None, self.options.only_ascii_source).text
            }
            (_, Key::Int(n)) => {
                let (base, stride) = self.num_style(Some(token));
                render::render_int(*n, base, stride)
            }
            (_, Key::Float(bits)) => render::render_dec_float(f64::from_bits(*bits)),
            (_, Key::Bool(b)) => render::render_bool(*b),
            (_, Key::None) => "none".to_string(),
        };
        Ok(text)
    }

    //#endregion

    //#region Comments

    fn comment_text(&self, token: Option<usize>) -> Option<&str> {
        let token = token?;
        match self.replacements.get(&token) {
            Some(pending) => Some(&pending.text),
            None => Some(self.tokens.raw(token)),
        }
    }

    /// Replace the comment at an existing slot, keeping its marker style.
    /// Assigning to an empty slot is rejected; edits never insert new tokens.
    fn set_comment(&mut self, token: Option<usize>, text: &str) -> Result<()> {
        let Some(token) = token else {
            return Err(Error::unpositioned(ErrorKind::PathNotFound));
        };
        let raw = self.tokens.raw(token);
        let marker = raw.chars().next().expect("comments are never empty");
        let run = raw.chars().take_while(|c| *c == marker).count();
        let rendered = if self.tokens.kind(token) == SyntaxKind::DOC_COMMENT {
            let delim: String = std::iter::repeat(marker).take(run).collect();
            format!("{} {} {}", delim, text.trim(), delim)
        } else {
            let delim: String = std::iter::repeat(marker).take(run).collect();
            if text.is_empty() {
                delim
            } else {
                format!("{} {}", delim, text.trim())
            }
        };
        self.replacements.insert(
            token,
            Pending {
                end: token + 1,
                text: rendered,
            },
        );
        Ok(())
    }

    //#endregion
}

/// A read cursor over one node, with access to its key and bound comments.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    ast: &'a RoundTripAst,
    node: RawId,
    /// The parent dict and entry slot, when this node is a dict member.
    entry: Option<(RawId, usize)>,
}

impl<'a> Cursor<'a> {
    fn descend(&self, seg: &PathSeg) -> Result<Cursor<'a>> {
        let raw = self.ast.tree.node(self.node);
        match (&raw.shape, seg) {
            (RawShape::Dict { entries, .. }, PathSeg::Key(name)) => {
                let slot = entries
                    .iter()
                    .position(|entry| entry.key.key.as_str() == Some(name))
                    .ok_or_else(|| self.ast.err_at_node(self.node, ErrorKind::PathNotFound))?;
                Ok(Cursor {
                    ast: self.ast,
                    node: entries[slot].value,
                    entry: Some((self.node, slot)),
                })
            }
            (RawShape::List { items, .. }, PathSeg::Index(index)) => {
                let node = items
                    .get(*index)
                    .copied()
                    .ok_or_else(|| self.ast.err_at_node(self.node, ErrorKind::PathNotFound))?;
                Ok(Cursor {
                    ast: self.ast,
                    node,
                    entry: None,
                })
            }
            _ => Err(self.ast.err_at_node(self.node, ErrorKind::PathNotFound)),
        }
    }

    pub fn get(&self, key: &str) -> Result<Cursor<'a>> {
        self.descend(&PathSeg::Key(key.to_string()))
    }

    pub fn at(&self, index: usize) -> Result<Cursor<'a>> {
        self.descend(&PathSeg::Index(index))
    }

    pub fn key(&self) -> Option<&'a Key> {
        let (parent, slot) = self.entry?;
        match &self.ast.tree.node(parent).shape {
            RawShape::Dict { entries, .. } => Some(&entries[slot].key.key),
            _ => None,
        }
    }

    fn style(&self) -> Option<&'a CollectionStyle> {
        match &self.ast.tree.node(self.node).shape {
            RawShape::Dict { style, .. } => Some(style),
            RawShape::List { style, .. } => Some(style),
            _ => None,
        }
    }

    /// True when this collection was written inline (braces/brackets).
    pub fn is_inline(&self) -> bool {
        matches!(
            self.style(),
            Some(CollectionStyle::Inline { .. })
        )
    }

    /// True when this inline collection was written without any interior
    /// blank space.
    pub fn is_compact_inline(&self) -> bool {
        matches!(
            self.style(),
            Some(CollectionStyle::Inline { compact: true, .. })
        )
    }

    /// True when this inline collection carried a trailing comma.
    pub fn has_trailing_comma(&self) -> bool {
        matches!(
            self.style(),
            Some(CollectionStyle::Inline {
                trailing_comma: true,
                ..
            })
        )
    }

    /// The opening column of an indent-style collection.
    pub fn indent_col(&self) -> Option<u32> {
        match self.style() {
            Some(CollectionStyle::Indent { col }) => Some(*col),
            _ => None,
        }
    }

    /// The decoded scalar string value, when this node is string-shaped.
    pub fn value_str(&self) -> Option<String> {
        match &self.ast.tree.node(self.node).shape {
            RawShape::Scalar { token } => match self.ast.tokens.kind(*token) {
                SyntaxKind::STRING | SyntaxKind::UNQUOTED => {
                    Some(self.ast.tokens.value_text(*token).to_string())
                }
                _ => None,
            },
            RawShape::Phrase { tokens } => {
                let mut text = String::new();
                for (index, token) in tokens.iter().enumerate() {
                    if index > 0 {
                        text.push(' ');
                    }
                    text.push_str(self.ast.tokens.value_text(*token));
                }
                Some(text)
            }
            _ => None,
        }
    }

    fn entry_comments(&self) -> Option<(Option<usize>, Option<usize>)> {
        let (parent, slot) = self.entry?;
        match &self.ast.tree.node(parent).shape {
            RawShape::Dict { entries, .. } => {
                let entry = &entries[slot];
                Some((entry.key_doc, entry.key_trailing))
            }
            _ => None,
        }
    }

    pub fn key_doc_comment(&self) -> Option<&'a str> {
        let (key_doc, _) = self.entry_comments()?;
        self.ast.comment_text(key_doc)
    }

    pub fn key_trailing_comment(&self) -> Option<&'a str> {
        let (_, key_trailing) = self.entry_comments()?;
        self.ast.comment_text(key_trailing)
    }

    pub fn value_doc_comment(&self) -> Option<&'a str> {
        self.ast
            .comment_text(self.ast.tree.node(self.node).comments.doc)
    }

    pub fn value_trailing_comment(&self) -> Option<&'a str> {
        self.ast
            .comment_text(self.ast.tree.node(self.node).comments.trailing)
    }

    pub fn value_start_trailing_comment(&self) -> Option<&'a str> {
        self.ast
            .comment_text(self.ast.tree.node(self.node).comments.start_trailing)
    }

    pub fn value_end_trailing_comment(&self) -> Option<&'a str> {
        self.ast
            .comment_text(self.ast.tree.node(self.node).comments.end_trailing)
    }
}

/// A write cursor: the same addressing as [`Cursor`], with setters that queue
/// style-preserving replacements.
pub struct CursorMut<'a> {
    ast: &'a mut RoundTripAst,
    path: Vec<PathSeg>,
}

impl<'a> RoundTripAst {
    pub fn cursor_mut(&'a mut self, path: Vec<PathSeg>) -> Result<CursorMut<'a>> {
        self.locate(&path)?;
        Ok(CursorMut { ast: self, path })
    }
}

impl CursorMut<'_> {
    pub fn set_value(&mut self, value: Value) -> Result<()> {
        self.ast.replace_val(&self.path, value)
    }

    pub fn set_key(&mut self, key: Value) -> Result<()> {
        self.ast.replace_key(&self.path, key)
    }

    fn node_and_entry(&self) -> Result<(RawId, Option<(RawId, usize)>)> {
        let node = self.ast.locate(&self.path)?;
        let entry = match self.path.split_last() {
            Some((PathSeg::Key(name), parent_path)) => {
                let parent = self.ast.locate(parent_path)?;
                match &self.ast.tree.node(parent).shape {
                    RawShape::Dict { entries, .. } => entries
                        .iter()
                        .position(|entry| entry.key.key.as_str() == Some(name))
                        .map(|slot| (parent, slot)),
                    _ => None,
                }
            }
            _ => None,
        };
        Ok((node, entry))
    }

    pub fn set_key_doc_comment(&mut self, text: &str) -> Result<()> {
        let (_, entry) = self.node_and_entry()?;
        let token = entry.and_then(|(parent, slot)| {
            match &self.ast.tree.node(parent).shape {
                RawShape::Dict { entries, .. } => entries[slot].key_doc,
                _ => None,
            }
        });
        self.ast.set_comment(token, text)
    }

    pub fn set_key_trailing_comment(&mut self, text: &str) -> Result<()> {
        let (_, entry) = self.node_and_entry()?;
        let token = entry.and_then(|(parent, slot)| {
            match &self.ast.tree.node(parent).shape {
                RawShape::Dict { entries, .. } => entries[slot].key_trailing,
                _ => None,
            }
        });
        self.ast.set_comment(token, text)
    }

    pub fn set_value_doc_comment(&mut self, text: &str) -> Result<()> {
        let (node, _) = self.node_and_entry()?;
        let token = self.ast.tree.node(node).comments.doc;
        self.ast.set_comment(token, text)
    }

    pub fn set_value_trailing_comment(&mut self, text: &str) -> Result<()> {
        let (node, _) = self.node_and_entry()?;
        let token = self.ast.tree.node(node).comments.trailing;
        self.ast.set_comment(token, text)
    }

    pub fn set_value_start_trailing_comment(&mut self, text: &str) -> Result<()> {
        let (node, _) = self.node_and_entry()?;
        let token = self.ast.tree.node(node).comments.start_trailing;
        self.ast.set_comment(token, text)
    }

    pub fn set_value_end_trailing_comment(&mut self, text: &str) -> Result<()> {
        let (node, _) = self.node_and_entry()?;
        let token = self.ast.tree.node(node).comments.end_trailing;
        self.ast.set_comment(token, text)
    }
}
