//! Fresh serialization of a resolved document.
//!
//! Indentation style by default, switching to inline style below
//! `inline_depth`. Shared and cyclic nodes are emitted once with a label tag
//! and referenced by alias afterwards; cycle detection runs whether or not
//! aliases are enabled.

use rustc_hash::FxHashMap;

use crate::error::{Error, ErrorKind, Result};
use crate::escape;
use crate::options::DumpOptions;
use crate::roundtrip::render;
use crate::value::{Dict, DictFlavor, Document, Key, List, ListFlavor, NodeId, Value, ValueRef};

pub fn serialize(doc: &Document, options: &DumpOptions) -> Result<String> {
    serialize_value(doc.root(), options)
}

pub fn serialize_value(value: ValueRef<'_>, options: &DumpOptions) -> Result<String> {
    let mut serializer = Serializer {
        doc_labels: invert_labels(value),
        options,
        shared: FxHashMap::default(),
        emitted: FxHashMap::default(),
        scan_states: FxHashMap::default(),
        next_label: 1,
        out: String::new(),
    };
    serializer.scan(value, &mut Vec::new())?;
    serializer.emit(value, 0, true)?;
    if !serializer.out.ends_with('\n') {
        serializer.out.push('\n');
    }
    Ok(serializer.out)
}

fn invert_labels(value: ValueRef<'_>) -> FxHashMap<NodeId, Box<str>> {
    // Prefer the document's own label names when re-emitting shared nodes.
    value
        .doc_labels()
        .map(|(name, id)| (id, name.into()))
        .collect()
}

#[derive(Clone, Copy, PartialEq)]
enum ScanState {
    Visiting,
    Done,
}

struct Serializer<'a> {
    doc_labels: FxHashMap<NodeId, Box<str>>,
    options: &'a DumpOptions,
    /// Collections that need a label tag: shared or cyclic.
    shared: FxHashMap<NodeId, ()>,
    /// Labeled collections already written out, with their label name.
    emitted: FxHashMap<NodeId, Box<str>>,
    scan_states: FxHashMap<NodeId, ScanState>,
    next_label: u32,
    out: String,
}

impl<'a> Serializer<'a> {
    /// Classify the graph: a revisit of a completed node is a shared node,
    /// a revisit of an in-progress node is a cycle.
    fn scan(&mut self, value: ValueRef<'_>, stack: &mut Vec<NodeId>) -> Result<()> {
        if !value.value().is_collection() {
            return Ok(());
        }
        let id = value.id();
        match self.scan_states.get(&id) {
            Some(ScanState::Visiting) => {
                if !(self.options.aliases && self.options.circular_references) {
                    return Err(Error::unpositioned(ErrorKind::CircularReference(
                        self.label_for(id).to_string(),
                    )));
                }
                self.shared.insert(id, ());
                return Ok(());
            }
            Some(ScanState::Done) => {
                if self.options.aliases {
                    self.shared.insert(id, ());
                }
                return Ok(());
            }
            None => {}
        }
        if stack.len() >= self.options.max_nesting_depth {
            return Err(Error::unpositioned(ErrorKind::DepthExceeded(
                self.options.max_nesting_depth,
            )));
        }

        self.scan_states.insert(id, ScanState::Visiting);
        stack.push(id);
        for (_, child) in value.entries() {
            self.scan(child, stack)?;
        }
        for child in value.items() {
            self.scan(child, stack)?;
        }
        stack.pop();
        self.scan_states.insert(id, ScanState::Done);
        Ok(())
    }

    fn label_for(&mut self, id: NodeId) -> Box<str> {
        if let Some(name) = self.doc_labels.get(&id) {
            return name.clone();
        }
        let name: Box<str> = format!("node{}", self.next_label).into();
        self.next_label += 1;
        self.doc_labels.insert(id, name.clone());
        name
    }

    fn indent_str(&self, depth: usize) -> String {
        self.options.nesting_indent.repeat(depth)
    }

    fn use_inline(&self, depth: usize) -> bool {
        self.options.inline_depth > 0 && depth >= self.options.inline_depth
    }

    fn emit(&mut self, value: ValueRef<'_>, depth: usize, at_root: bool) -> Result<()> {
        if depth > self.options.max_nesting_depth {
            return Err(Error::unpositioned(ErrorKind::DepthExceeded(
                self.options.max_nesting_depth,
            )));
        }

        let id = value.id();
        let mut tag_args: Vec<String> = Vec::new();
        if value.value().is_collection() && self.shared.contains_key(&id) {
            if let Some(name) = self.emitted.get(&id).filter(|n| !n.is_empty()).cloned() {
                // Already written out once: reference it.
                self.out.push('$');
                self.out.push_str(&name);
                return Ok(());
            }
            let name = self.label_for(id);
            self.emitted.insert(id, name.clone());
            tag_args.push(format!("label={}", name));
        }

        match value.value() {
            Value::Dict(dict) => {
                if let Some(arg) = self.flavor_tag_dict(dict)? {
                    tag_args.insert(0, arg);
                }
                let tagged = !tag_args.is_empty();
                self.write_tag(&tag_args);
                // Tagged collections read best inline.
                if dict.is_empty() || tagged || self.use_inline(depth) {
                    self.emit_inline_dict(value, depth)?;
                } else {
                    self.emit_indent_dict(value, depth, at_root)?;
                }
            }
            Value::List(list) => {
                if let Some(arg) = self.flavor_tag_list(list)? {
                    tag_args.insert(0, arg);
                }
                let tagged = !tag_args.is_empty();
                self.write_tag(&tag_args);
                if list.is_empty() || tagged || self.use_inline(depth) {
                    self.emit_inline_list(value, depth)?;
                } else {
                    self.emit_indent_list(value, depth)?;
                }
            }
            scalar => {
                debug_assert!(tag_args.is_empty());
                let text = self.scalar_text(scalar)?;
                self.out.push_str(&text);
            }
        }
        Ok(())
    }

    fn write_tag(&mut self, args: &[String]) {
        if args.is_empty() {
            return;
        }
        self.out.push('(');
        self.out.push_str(&args.join(", "));
        self.out.push_str(")> ");
    }

    fn flavor_tag_dict(&self, dict: &Dict) -> Result<Option<String>> {
        match dict.flavor {
            DictFlavor::Dict => Ok(None),
            DictFlavor::Odict => {
                if self.options.extended_types {
                    Ok(Some("odict".to_string()))
                } else if self.options.baseclass {
                    Ok(None)
                } else {
                    Err(Error::unpositioned(ErrorKind::UnknownType("odict".into())))
                }
            }
        }
    }

    fn flavor_tag_list(&self, list: &List) -> Result<Option<String>> {
        let (name, available) = match list.flavor {
            ListFlavor::List => return Ok(None),
            ListFlavor::Set => ("set", self.options.extended_types),
            ListFlavor::Tuple => ("tuple", self.options.python_types),
        };
        if available {
            Ok(Some(name.to_string()))
        } else if self.options.baseclass {
            Ok(None)
        } else {
            Err(Error::unpositioned(ErrorKind::UnknownType(name.into())))
        }
    }

    fn emit_indent_dict(&mut self, value: ValueRef<'_>, depth: usize, at_root: bool) -> Result<()> {
        let indent = self.indent_str(depth);
        let mut first = true;
        for (key, child) in value.entries() {
            if !(first && at_root && self.out.is_empty()) && !self.out.ends_with('\n') {
                self.out.push('\n');
            }
            first = false;
            self.out.push_str(&indent);
            self.out.push_str(&self.key_text(key)?);
            self.out.push_str(" =");
            self.emit_entry_value(child, depth)?;
        }
        Ok(())
    }

    fn emit_entry_value(&mut self, child: ValueRef<'_>, depth: usize) -> Result<()> {
        let inline_child = !child.value().is_collection()
            || child.is_empty()
            || self.use_inline(depth + 1)
            || self.shared.contains_key(&child.id())
            || self.flavored(child);
        if inline_child {
            self.out.push(' ');
            self.emit(child, depth + 1, false)
        } else {
            self.out.push('\n');
            self.emit(child, depth + 1, false)
        }
    }

    fn flavored(&self, child: ValueRef<'_>) -> bool {
        match child.value() {
            Value::Dict(d) => d.flavor != DictFlavor::Dict,
            Value::List(l) => l.flavor != ListFlavor::List,
            _ => false,
        }
    }

    fn emit_indent_list(&mut self, value: ValueRef<'_>, depth: usize) -> Result<()> {
        let marker_indent = if depth == 0 && self.options.flush_start_list_item {
            String::new()
        } else {
            self.indent_str(depth)
        };
        for child in value.items() {
            if !self.out.is_empty() && !self.out.ends_with('\n') {
                self.out.push('\n');
            }
            self.out.push_str(&marker_indent);
            self.out.push_str(&self.options.start_list_item);
            self.emit(child, depth + 1, false)?;
        }
        Ok(())
    }

    fn emit_inline_dict(&mut self, value: ValueRef<'_>, depth: usize) -> Result<()> {
        let compact = self.options.compact_inline;
        self.out.push('{');
        let mut first = true;
        let count = value.len();
        for (key, child) in value.entries() {
            if !first {
                self.out.push(',');
                if !compact {
                    self.out.push(' ');
                }
            }
            first = false;
            self.out.push_str(&self.key_text(key)?);
            self.out.push_str(if compact { "=" } else { " = " });
            self.emit(child, depth + 1, false)?;
        }
        if self.options.trailing_commas && count > 0 {
            self.out.push(',');
        }
        self.out.push('}');
        Ok(())
    }

    fn emit_inline_list(&mut self, value: ValueRef<'_>, depth: usize) -> Result<()> {
        let compact = self.options.compact_inline;
        self.out.push('[');
        let mut first = true;
        let count = value.len();
        for child in value.items() {
            if !first {
                self.out.push(',');
                if !compact {
                    self.out.push(' ');
                }
            }
            first = false;
            self.emit(child, depth + 1, false)?;
        }
        if self.options.trailing_commas && count > 0 {
            self.out.push(',');
        }
        self.out.push(']');
        Ok(())
    }

    fn key_text(&self, key: &Key) -> Result<String> {
        Ok(match key {
            Key::Str(s) => {
                if render::fits_unquoted(s, self.options.only_ascii_unquoted)
                    && !s.contains(' ')
                    && !(self.options.only_ascii_source && !s.is_ascii())
                {
                    s.to_string()
                } else {
                    self.quoted(s)
                }
            }
            Key::Int(n) => format!("{}", n),
            Key::Float(bits) => render::render_dec_float(f64::from_bits(*bits)),
            Key::Bool(b) => render::render_bool(*b),
            Key::None => "none".to_string(),
        })
    }

    fn quoted(&self, text: &str) -> String {
        format!(
            "\"{}\"",
            escape::encode(text, 1, false, self.options.only_ascii_source)
        )
    }

    fn scalar_text(&self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::None => "none".to_string(),
            Value::Bool(b) => render::render_bool(*b),
            Value::Int(n) => {
                if self.options.integers {
                    format!("{}", n)
                } else {
                    render::render_dec_float(*n as f64)
                }
            }
            Value::Float(x) => {
                if self.options.hex_floats && x.is_finite() {
                    render::render_hex_float(*x)
                } else {
                    render::render_dec_float(*x)
                }
            }
            Value::Str(s) => {
                if render::fits_unquoted(s, self.options.only_ascii_unquoted)
                    && !(self.options.only_ascii_source && !s.is_ascii())
                {
                    s.to_string()
                } else {
                    self.quoted(s)
                }
            }
            Value::Complex(re, im) => render::render_complex(*re, *im),
            Value::Rational(p, q) => render::render_rational(*p, *q),
            Value::Bytes(bytes) => {
                if self.options.extended_types {
                    format!("(base64)> \"{}\"", crate::registry::encode_base64(bytes))
                } else if self.options.baseclass {
                    let text: String = bytes.iter().map(|b| *b as char).collect();
                    self.quoted(&text)
                } else {
                    return Err(Error::unpositioned(ErrorKind::UnknownType("bytes".into())));
                }
            }
            Value::Dict(_) | Value::List(_) => unreachable!("collections are emitted above"),
        })
    }
}
