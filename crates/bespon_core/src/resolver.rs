//! Tag and alias resolution: raw tree in, value graph out.
//!
//! A single synchronous walk lowers the raw tree into the document's value
//! arena. Every non-alias raw node owns an arena slot assigned up front, so
//! aliases (and forward references, when circular references are enabled)
//! simply share the slot of their label's node; cycles never create
//! ownership cycles.

use rustc_hash::FxHashMap;

use crate::error::{Error, ErrorKind, Result};
use crate::lexer;
use crate::num;
use crate::options::{LoadOptions, Shape};
use crate::parser::{RawId, RawShape, RawTag, RawTree};
use crate::registry::{self, Decoder, TypeRegistry};
use crate::syntax::SyntaxKind;
use crate::token::TokenList;
use crate::value::{Dict, Document, Key, List, NodeId, Value};

pub(crate) fn resolve(
    tokens: &TokenList,
    tree: &RawTree,
    options: &LoadOptions,
) -> Result<Document> {
    let registry = TypeRegistry::from_options(options);
    let mut resolver = Resolver {
        tokens,
        tree,
        options,
        registry,
        slots: vec![None; tree.nodes.len()],
        completed: vec![false; tree.nodes.len()],
        labels: FxHashMap::default(),
        nodes: Vec::new(),
    };

    let root = match tree.root {
        None => {
            // An all-trivia document yields the configured empty value.
            resolver.nodes.push(options.empty_default.clone());
            NodeId(0)
        }
        Some(root) => {
            resolver.assign_slots()?;
            resolver.resolve_node(root)?
        }
    };

    let mut labels = FxHashMap::default();
    for (name, raw) in &resolver.labels {
        let id = match resolver.slots[raw.index()] {
            Some(id) => id,
            // A label on an alias binds to the alias's target.
            None => match &tree.node(*raw).shape {
                RawShape::Alias { token } => resolver.alias_target(*token, 0)?.1,
                _ => unreachable!("slotless nodes are aliases"),
            },
        };
        labels.insert(name.clone(), id);
    }
    Ok(Document {
        nodes: resolver.nodes,
        root,
        labels,
        max_depth: options.max_nesting_depth,
    })
}

struct Resolver<'a> {
    tokens: &'a TokenList,
    tree: &'a RawTree,
    options: &'a LoadOptions,
    registry: TypeRegistry,
    /// Arena slot assigned to each non-alias raw node.
    slots: Vec<Option<NodeId>>,
    completed: Vec<bool>,
    /// Label name to the raw node carrying it.
    labels: FxHashMap<Box<str>, RawId>,
    nodes: Vec<Value>,
}

impl<'a> Resolver<'a> {
    fn error_at(&self, token: usize, kind: ErrorKind) -> Error {
        self.tokens
            .source()
            .error(kind, self.tokens.get(token).span.start)
    }

    /// Pre-pass: give every non-alias node an arena slot and collect labels,
    /// so aliases can point at slots before their targets resolve.
    fn assign_slots(&mut self) -> Result<()> {
        for (index, raw) in self.tree.nodes.iter().enumerate() {
            if !matches!(raw.shape, RawShape::Alias { .. }) {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(Value::None);
                self.slots[index] = Some(id);
            }
            if let Some(tag) = &raw.tag {
                if let Some((token, name)) = &tag.label {
                    if !self.options.aliases {
                        return Err(self.error_at(
                            *token,
                            ErrorKind::TagMismatch("labels require the aliases option"),
                        ));
                    }
                    if self.labels.insert(name.clone(), RawId(index as u32)).is_some() {
                        return Err(self.error_at(
                            *token,
                            ErrorKind::LabelRedefinition(name.to_string()),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Follow an alias to the arena slot it names. `guard` bounds chains of
    /// aliases labeled as other aliases.
    fn alias_target(&self, token: usize, guard: usize) -> Result<(RawId, NodeId)> {
        if guard > self.options.max_nesting_depth {
            let name = &self.tokens.raw(token)[1..];
            return Err(self.error_at(token, ErrorKind::CircularReference(name.to_string())));
        }
        if !self.options.aliases {
            return Err(self.error_at(token, ErrorKind::Unexpected("alias")));
        }
        let name = &self.tokens.raw(token)[1..];
        let raw = *self
            .labels
            .get(name)
            .ok_or_else(|| self.error_at(token, ErrorKind::UndefinedAlias(name.to_string())))?;
        match &self.tree.node(raw).shape {
            RawShape::Alias { token: inner } => self.alias_target(*inner, guard + 1),
            _ => {
                let id = self.slots[raw.index()].expect("non-alias nodes own a slot");
                Ok((raw, id))
            }
        }
    }

    fn resolve_node(&mut self, raw_id: RawId) -> Result<NodeId> {
        let raw = self.tree.node(raw_id);
        if let RawShape::Alias { token } = &raw.shape {
            if let Some(tag) = &raw.tag {
                if tag.type_name.is_some()
                    || tag.init.is_some()
                    || tag.indent.is_some()
                    || tag.newline.is_some()
                    || tag.overwrite.is_some()
                {
                    return Err(self.error_at(
                        tag.open,
                        ErrorKind::TagMismatch("an alias only carries a label"),
                    ));
                }
            }
            let (target_raw, target_id) = self.alias_target(*token, 0)?;
            if !self.completed[target_raw.index()] && !self.options.circular_references {
                let name = &self.tokens.raw(*token)[1..];
                return Err(
                    self.error_at(*token, ErrorKind::CircularReference(name.to_string()))
                );
            }
            return Ok(target_id);
        }

        let slot = self.slots[raw_id.index()].expect("non-alias nodes own a slot");
        let value = match &raw.shape {
            RawShape::Scalar { token } => self.resolve_scalar(*token, raw.tag.as_ref())?,
            RawShape::Phrase { tokens } => {
                let mut text = String::new();
                for (index, token) in tokens.iter().enumerate() {
                    if index > 0 {
                        text.push(' ');
                    }
                    text.push_str(self.tokens.value_text(*token));
                }
                self.apply_string_tag(Value::Str(text.into()), raw.tag.as_ref(), raw.span.start)?
            }
            RawShape::Dict { entries, .. } => {
                let mut dict = Dict::default();
                if let Some(tag) = &raw.tag {
                    dict.overwrite = tag.overwrite.unwrap_or(false);
                    if let Some((token, name)) = &tag.init {
                        self.apply_init(&mut dict, *token, name)?;
                    }
                }
                for entry in entries {
                    let child = self.resolve_node(entry.value)?;
                    let occupied = dict.entries.contains_key(&entry.key.key);
                    if occupied && !dict.overwrite {
                        return Err(self.error_at(
                            entry.key.token,
                            ErrorKind::DuplicateKey(entry.key.key.to_string()),
                        ));
                    }
                    dict.entries.insert(entry.key.key.clone(), child);
                }
                self.apply_collection_tag(Value::Dict(dict), raw.tag.as_ref())?
            }
            RawShape::List { items, .. } => {
                let mut list = List::default();
                for item in items {
                    let child = self.resolve_node(*item)?;
                    list.items.push(child);
                }
                self.apply_collection_tag(Value::List(list), raw.tag.as_ref())?
            }
            RawShape::Alias { .. } => unreachable!("aliases are handled above"),
        };

        self.nodes[slot.index()] = value;
        self.completed[raw_id.index()] = true;
        Ok(slot)
    }

    /// Shallow-copy the labeled dict's entries, in order, as the starting
    /// contents of an inheriting dict.
    fn apply_init(&mut self, dict: &mut Dict, token: usize, name: &str) -> Result<()> {
        if !self.options.aliases {
            return Err(self.error_at(token, ErrorKind::Unexpected("alias")));
        }
        let raw = *self
            .labels
            .get(name)
            .ok_or_else(|| self.error_at(token, ErrorKind::UndefinedAlias(name.to_string())))?;
        if !self.completed[raw.index()] {
            return Err(self.error_at(token, ErrorKind::CircularReference(name.to_string())));
        }
        let id = self.slots[raw.index()].expect("non-alias nodes own a slot");
        match &self.nodes[id.index()] {
            Value::Dict(base) => {
                dict.entries = base.entries.clone();
                Ok(())
            }
            other => Err(self.error_at(
                token,
                ErrorKind::IncompatibleType("init".to_string(), other.kind_name()),
            )),
        }
    }

    fn resolve_scalar(&self, token_index: usize, tag: Option<&RawTag>) -> Result<Value> {
        let token = self.tokens.get(token_index);
        match token.kind {
            SyntaxKind::STRING => {
                let value = self.decode_string(token_index, tag)?;
                self.apply_string_tag(value, tag, token_index)
            }
            SyntaxKind::UNQUOTED => {
                let value = Value::Str(self.tokens.raw(token_index).into());
                self.apply_string_tag(value, tag, token_index)
            }
            SyntaxKind::NUMBER => {
                let data = token.num_data().expect("number token carries NumData");
                let raw = self.tokens.raw(token_index);
                let value = num::parse_number(raw, data, self.options)
                    .map_err(|kind| self.error_at(token_index, kind))?;
                self.apply_number_tag(value, tag, token_index)
            }
            SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW | SyntaxKind::NONE_KW => {
                if let Some(tag) = tag {
                    if let Some((token, name)) = &tag.type_name {
                        // Explicit typing of `none`, `true`, and `false` is
                        // not permitted.
                        return Err(self.error_at(
                            *token,
                            ErrorKind::IncompatibleType(name.to_string(), "keyword"),
                        ));
                    }
                }
                Ok(match token.kind {
                    SyntaxKind::TRUE_KW => Value::Bool(true),
                    SyntaxKind::FALSE_KW => Value::Bool(false),
                    _ => Value::None,
                })
            }
            kind => unreachable!("scalar node over non-scalar token {:?}", kind),
        }
    }

    /// Decode a string token, re-running block decoding when the tag
    /// overrides the indent or newline conventions.
    fn decode_string(&self, token_index: usize, tag: Option<&RawTag>) -> Result<Value> {
        let token = self.tokens.get(token_index);
        let data = token.str_data().expect("string token carries StrData");
        let overrides = tag
            .filter(|t| t.indent.is_some() || t.newline.is_some());
        let Some(tag) = overrides else {
            return Ok(Value::Str(data.decoded.clone()));
        };

        let raw = self.tokens.raw(token_index);
        let is_block = data.profile.run >= 3
            && raw[data.profile.run as usize..]
                .chars()
                .next()
                .is_some_and(crate::chars::is_newline);
        if !is_block {
            let token = tag.indent.as_ref().or(tag.newline.as_ref()).expect("override present");
            return Err(self.error_at(
                token.0,
                ErrorKind::TagMismatch("indent and newline apply to block strings"),
            ));
        }
        let newline = tag.newline.as_ref().map(|(_, s)| s.as_ref()).unwrap_or("\n");
        let indent = tag.indent.as_ref().map(|(_, s)| s.as_ref());
        let decoded = lexer::decode_block(
            raw,
            data.profile.quote,
            data.profile.run as usize,
            data.profile.chomp,
            newline,
            indent,
        )
        .map_err(|(_, kind)| self.error_at(token_index, kind))?;
        Ok(Value::Str(decoded.into()))
    }

    /// Apply an explicit type tag to a string-shaped value.
    fn apply_string_tag(
        &self,
        value: Value,
        tag: Option<&RawTag>,
        at_token: usize,
    ) -> Result<Value> {
        let Some(tag) = tag else {
            return Ok(value);
        };
        let Some((name_token, name)) = &tag.type_name else {
            return Ok(value);
        };
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| self.error_at(*name_token, ErrorKind::UnknownType(name.to_string())))?;
        if !entry.compatible.contains(&Shape::Str) {
            return Err(self.error_at(
                *name_token,
                ErrorKind::IncompatibleType(name.to_string(), "string"),
            ));
        }
        let Value::Str(text) = &value else {
            unreachable!("string tags apply to string values");
        };
        let invalid = |message: String| {
            self.error_at(at_token, ErrorKind::InvalidTypePayload(name.to_string(), message))
        };
        match &entry.decoder {
            Decoder::Identity => Ok(value),
            Decoder::Bytes => {
                let bytes = registry::decode_bytes_str(text, entry.ascii_bytes)
                    .map_err(invalid)?;
                Ok(Value::Bytes(bytes))
            }
            Decoder::Base16 => Ok(Value::Bytes(
                registry::decode_base16(text).map_err(invalid)?,
            )),
            Decoder::Base64 => Ok(Value::Bytes(
                registry::decode_base64(text).map_err(invalid)?,
            )),
            Decoder::Custom(parser) => parser(text).map_err(invalid),
            Decoder::ToFloat | Decoder::DictFlavor(_) | Decoder::ListFlavor(_) => Err(self
                .error_at(
                    *name_token,
                    ErrorKind::IncompatibleType(name.to_string(), "string"),
                )),
        }
    }

    fn apply_number_tag(
        &self,
        value: Value,
        tag: Option<&RawTag>,
        at_token: usize,
    ) -> Result<Value> {
        let Some(tag) = tag else {
            return Ok(value);
        };
        let Some((name_token, name)) = &tag.type_name else {
            return Ok(value);
        };
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| self.error_at(*name_token, ErrorKind::UnknownType(name.to_string())))?;
        let shape = match &value {
            Value::Int(_) => Shape::Int,
            Value::Float(_) => Shape::Float,
            other => {
                return Err(self.error_at(
                    *name_token,
                    ErrorKind::IncompatibleType(name.to_string(), other.kind_name()),
                ));
            }
        };
        if !entry.compatible.contains(&shape) {
            return Err(self.error_at(
                *name_token,
                ErrorKind::IncompatibleType(name.to_string(), shape.describe()),
            ));
        }
        match &entry.decoder {
            Decoder::Identity => Ok(value),
            Decoder::ToFloat => Ok(match value {
                Value::Int(n) => Value::Float(n as f64),
                other => other,
            }),
            Decoder::Custom(parser) => {
                let raw = self.tokens.raw(at_token);
                parser(raw).map_err(|message| {
                    self.error_at(
                        at_token,
                        ErrorKind::InvalidTypePayload(name.to_string(), message),
                    )
                })
            }
            _ => Err(self.error_at(
                *name_token,
                ErrorKind::IncompatibleType(name.to_string(), shape.describe()),
            )),
        }
    }

    fn apply_collection_tag(&self, value: Value, tag: Option<&RawTag>) -> Result<Value> {
        let Some(tag) = tag else {
            return Ok(value);
        };
        if let Some((token, _)) = &tag.indent {
            return Err(self.error_at(
                *token,
                ErrorKind::TagMismatch("indent and newline apply to block strings"),
            ));
        }
        if let Some((token, _)) = &tag.newline {
            return Err(self.error_at(
                *token,
                ErrorKind::TagMismatch("indent and newline apply to block strings"),
            ));
        }
        let Some((name_token, name)) = &tag.type_name else {
            return Ok(value);
        };
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| self.error_at(*name_token, ErrorKind::UnknownType(name.to_string())))?;
        let shape = match &value {
            Value::Dict(_) => Shape::Dict,
            Value::List(_) => Shape::List,
            _ => unreachable!("collection tags apply to collections"),
        };
        if !entry.compatible.contains(&shape) {
            return Err(self.error_at(
                *name_token,
                ErrorKind::IncompatibleType(name.to_string(), shape.describe()),
            ));
        }
        match (&entry.decoder, value) {
            (Decoder::Identity, value) => Ok(value),
            (Decoder::DictFlavor(flavor), Value::Dict(mut dict)) => {
                dict.flavor = *flavor;
                Ok(Value::Dict(dict))
            }
            (Decoder::ListFlavor(flavor), Value::List(mut list)) => {
                list.flavor = *flavor;
                Ok(Value::List(list))
            }
            (_, _) => Err(self.error_at(
                *name_token,
                ErrorKind::IncompatibleType(name.to_string(), shape.describe()),
            )),
        }
    }
}
