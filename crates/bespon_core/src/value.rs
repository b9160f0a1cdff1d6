//! The resolved data model.
//!
//! Values live in an arena owned by [`Document`] and reference each other by
//! [`NodeId`]. Aliases share ids, which lets a document contain reference
//! cycles without ownership cycles; traversals carry a depth budget instead.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Stable index of a value in its document's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A dict key. Finite floats are permitted as keys (stored by bit pattern,
/// with negative zero normalized); `nan` is rejected by the parser before a
/// key is ever built.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Str(Box<str>),
    Int(i64),
    Float(u64),
    Bool(bool),
    None,
}

impl Key {
    pub fn float(value: f64) -> Self {
        let normalized = if value == 0.0 { 0.0 } else { value };
        Key::Float(normalized.to_bits())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.into())
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(n) => write!(f, "{}", n),
            Key::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Key::Bool(b) => write!(f, "{}", b),
            Key::None => f.write_str("none"),
        }
    }
}

/// Collection flavor selected by an explicit tag. The base shape (dict or
/// list) is what the surface syntax produced; the flavor records the declared
/// refinement so serialization can reproduce it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DictFlavor {
    #[default]
    Dict,
    /// `odict` is spelled explicitly; iteration order is insertion order
    /// either way.
    Odict,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFlavor {
    #[default]
    List,
    Set,
    Tuple,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dict {
    pub(crate) entries: IndexMap<Key, NodeId>,
    pub flavor: DictFlavor,
    /// Later assignments replace earlier ones instead of erroring.
    pub overwrite: bool,
}

impl Dict {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct List {
    pub(crate) items: Vec<NodeId>,
    pub flavor: ListFlavor,
}

impl List {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Box<str>),
    Complex(f64, f64),
    Rational(i64, i64),
    Bytes(Vec<u8>),
    Dict(Dict),
    List(List),
}

impl Value {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Complex(..) => "complex",
            Value::Rational(..) => "rational",
            Value::Bytes(_) => "bytes",
            Value::Dict(_) => "dict",
            Value::List(_) => "list",
        }
    }

    pub const fn is_collection(&self) -> bool {
        matches!(self, Value::Dict(_) | Value::List(_))
    }
}

/// A fully resolved document: the value arena, the root node, and the label
/// table produced by tag resolution.
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) nodes: Vec<Value>,
    pub(crate) root: NodeId,
    pub(crate) labels: rustc_hash::FxHashMap<Box<str>, NodeId>,
    /// Depth budget used for cycle-bounded traversal, mirrored from the load
    /// options the document was parsed with.
    pub(crate) max_depth: usize,
}

impl Document {
    pub fn root(&self) -> ValueRef<'_> {
        ValueRef {
            doc: self,
            id: self.root,
        }
    }

    pub fn get(&self, id: NodeId) -> ValueRef<'_> {
        ValueRef { doc: self, id }
    }

    pub fn label(&self, name: &str) -> Option<ValueRef<'_>> {
        self.labels.get(name).map(|id| self.get(*id))
    }

    pub(crate) fn value(&self, id: NodeId) -> &Value {
        &self.nodes[id.index()]
    }
}

/// A cursor into a document's value arena: a document reference plus a node
/// id, with typed accessors and cycle-bounded structural equality.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> ValueRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value(&self) -> &'a Value {
        self.doc.value(self.id)
    }

    pub fn kind_name(&self) -> &'static str {
        self.value().kind_name()
    }

    pub fn is_none(&self) -> bool {
        matches!(self.value(), Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value() {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value() {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self.value() {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<(f64, f64)> {
        match self.value() {
            Value::Complex(re, im) => Some((*re, *im)),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<(i64, i64)> {
        match self.value() {
            Value::Rational(p, q) => Some((*p, *q)),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self.value() {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&'a Dict> {
        match self.value() {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&'a List> {
        match self.value() {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Dict member lookup by string key.
    pub fn get(&self, key: &str) -> Option<ValueRef<'a>> {
        let dict = self.as_dict()?;
        let id = dict.get(&Key::Str(key.into()))?;
        Some(self.doc.get(id))
    }

    /// List item lookup by index.
    pub fn at(&self, index: usize) -> Option<ValueRef<'a>> {
        let list = self.as_list()?;
        let id = *list.items.get(index)?;
        Some(self.doc.get(id))
    }

    pub fn len(&self) -> usize {
        match self.value() {
            Value::Dict(d) => d.len(),
            Value::List(l) => l.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'a Key, ValueRef<'a>)> + '_ {
        let doc = self.doc;
        self.as_dict()
            .into_iter()
            .flat_map(|d| d.entries.iter())
            .map(move |(k, id)| (k, doc.get(*id)))
    }

    pub fn items(&self) -> impl Iterator<Item = ValueRef<'a>> + '_ {
        let doc = self.doc;
        self.as_list()
            .into_iter()
            .flat_map(|l| l.items.iter())
            .map(move |id| doc.get(*id))
    }

    /// The document's label table, for re-emission of labeled nodes.
    pub(crate) fn doc_labels(&self) -> impl Iterator<Item = (&'a str, NodeId)> + '_ {
        self.doc.labels.iter().map(|(name, id)| (&**name, *id))
    }

    fn structural_eq(&self, other: &ValueRef<'_>, depth: usize) -> bool {
        if depth == 0 {
            // Both sides ran out of budget together; treat the remaining
            // (necessarily cyclic) tails as equal.
            return true;
        }
        match (self.value(), other.value()) {
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.entries.iter().zip(b.entries.iter()).all(|((ka, va), (kb, vb))| {
                        ka == kb
                            && self
                                .doc
                                .get(*va)
                                .structural_eq(&other.doc.get(*vb), depth - 1)
                    })
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len()
                    && a.items.iter().zip(b.items.iter()).all(|(ia, ib)| {
                        self.doc
                            .get(*ia)
                            .structural_eq(&other.doc.get(*ib), depth - 1)
                    })
            }
            (a, b) => a == b,
        }
    }
}

impl PartialEq for ValueRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        let depth = self.doc.max_depth.max(other.doc.max_depth);
        self.structural_eq(other, depth)
    }
}

impl std::fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}

struct SerializeWithDepth<'a> {
    node: ValueRef<'a>,
    depth: usize,
}

impl Serialize for SerializeWithDepth<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;
        if self.depth == 0 {
            return Err(S::Error::custom("nesting depth exceeded while serializing"));
        }
        match self.node.value() {
            Value::None => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Complex(re, im) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(re)?;
                seq.serialize_element(im)?;
                seq.end()
            }
            Value::Rational(p, q) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(p)?;
                seq.serialize_element(q)?;
                seq.end()
            }
            Value::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Value::Dict(_) => {
                let mut map = serializer.serialize_map(Some(self.node.len()))?;
                for (key, value) in self.node.entries() {
                    map.serialize_entry(
                        &key.to_string(),
                        &SerializeWithDepth {
                            node: value,
                            depth: self.depth - 1,
                        },
                    )?;
                }
                map.end()
            }
            Value::List(_) => {
                let mut seq = serializer.serialize_seq(Some(self.node.len()))?;
                for item in self.node.items() {
                    seq.serialize_element(&SerializeWithDepth {
                        node: item,
                        depth: self.depth - 1,
                    })?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for ValueRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SerializeWithDepth {
            node: *self,
            depth: self.doc.max_depth,
        }
        .serialize(serializer)
    }
}
