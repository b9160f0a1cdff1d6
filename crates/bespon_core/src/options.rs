//! Immutable configuration records threaded through every component.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::value::Value;

/// The implicit shape of a raw value, used to check whether an explicit type
/// tag is compatible with what the surface syntax produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Str,
    Int,
    Float,
    Bool,
    None,
    Dict,
    List,
}

impl Shape {
    pub const fn describe(&self) -> &'static str {
        match self {
            Shape::Str => "string",
            Shape::Int => "integer",
            Shape::Float => "float",
            Shape::Bool => "boolean",
            Shape::None => "none",
            Shape::Dict => "dict",
            Shape::List => "list",
        }
    }
}

/// A replacement decode step for a registered type name. Receives the decoded
/// string form of the value; a returned `Err` message is reported as a tag
/// mismatch at the value's position.
pub type CustomParser = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// A caller-registered type record, mirroring the registry's built-in entries.
#[derive(Clone)]
pub struct TypeRecord {
    pub name: Box<str>,
    pub compatible_implicit_types: Vec<Shape>,
    pub parser: Option<CustomParser>,
    /// Restrict string payloads to ASCII before invoking the parser.
    pub ascii_bytes: bool,
    /// Kept for registry introspection; the core itself never mutates values
    /// after resolution.
    pub mutable: bool,
}

impl std::fmt::Debug for TypeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRecord")
            .field("name", &self.name)
            .field("compatible_implicit_types", &self.compatible_implicit_types)
            .field("ascii_bytes", &self.ascii_bytes)
            .field("mutable", &self.mutable)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct LoadOptions {
    pub aliases: bool,
    pub circular_references: bool,
    pub custom_parsers: FxHashMap<Box<str>, CustomParser>,
    pub custom_types: Vec<TypeRecord>,
    pub extended_types: bool,
    pub float_overflow_to_inf: bool,
    pub integers: bool,
    pub max_nesting_depth: usize,
    pub only_ascii_source: bool,
    pub only_ascii_unquoted: bool,
    pub python_types: bool,
    /// The value an all-trivia document resolves to.
    pub empty_default: Value,
}

impl std::fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOptions")
            .field("aliases", &self.aliases)
            .field("circular_references", &self.circular_references)
            .field(
                "custom_parsers",
                &self.custom_parsers.keys().collect::<Vec<_>>(),
            )
            .field("custom_types", &self.custom_types)
            .field("extended_types", &self.extended_types)
            .field("float_overflow_to_inf", &self.float_overflow_to_inf)
            .field("integers", &self.integers)
            .field("max_nesting_depth", &self.max_nesting_depth)
            .field("only_ascii_source", &self.only_ascii_source)
            .field("only_ascii_unquoted", &self.only_ascii_unquoted)
            .field("python_types", &self.python_types)
            .field("empty_default", &self.empty_default)
            .finish()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            aliases: true,
            circular_references: false,
            custom_parsers: FxHashMap::default(),
            custom_types: Vec::new(),
            extended_types: false,
            float_overflow_to_inf: false,
            integers: true,
            max_nesting_depth: 100,
            only_ascii_source: false,
            only_ascii_unquoted: true,
            python_types: false,
            empty_default: Value::None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(mut self, enabled: bool) -> Self {
        self.aliases = enabled;
        self
    }

    pub fn with_circular_references(mut self, enabled: bool) -> Self {
        self.circular_references = enabled;
        self
    }

    pub fn with_extended_types(mut self, enabled: bool) -> Self {
        self.extended_types = enabled;
        self
    }

    pub fn with_float_overflow_to_inf(mut self, enabled: bool) -> Self {
        self.float_overflow_to_inf = enabled;
        self
    }

    pub fn with_integers(mut self, enabled: bool) -> Self {
        self.integers = enabled;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_only_ascii_source(mut self, enabled: bool) -> Self {
        self.only_ascii_source = enabled;
        self
    }

    pub fn with_only_ascii_unquoted(mut self, enabled: bool) -> Self {
        self.only_ascii_unquoted = enabled;
        self
    }

    pub fn with_python_types(mut self, enabled: bool) -> Self {
        self.python_types = enabled;
        self
    }

    pub fn with_empty_default(mut self, value: Value) -> Self {
        self.empty_default = value;
        self
    }

    pub fn with_custom_type(mut self, record: TypeRecord) -> Self {
        self.custom_types.push(record);
        self
    }

    pub fn with_custom_parser(mut self, name: &str, parser: CustomParser) -> Self {
        self.custom_parsers.insert(name.into(), parser);
        self
    }
}

#[derive(Clone, Debug)]
pub struct DumpOptions {
    pub aliases: bool,
    /// Encode unregistered flavors as their base shape instead of erroring.
    pub baseclass: bool,
    pub circular_references: bool,
    pub compact_inline: bool,
    pub extended_types: bool,
    pub hex_floats: bool,
    /// Depth at which emission switches from indent style to inline style.
    /// Zero means indent style all the way down.
    pub inline_depth: usize,
    pub integers: bool,
    pub max_nesting_depth: usize,
    pub nesting_indent: Box<str>,
    pub only_ascii_source: bool,
    pub only_ascii_unquoted: bool,
    pub python_types: bool,
    pub trailing_commas: bool,
    /// Marker emitted before nested list items.
    pub start_list_item: Box<str>,
    /// Drop the leading indent of list-item markers at the document root.
    pub flush_start_list_item: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            aliases: true,
            baseclass: false,
            circular_references: false,
            compact_inline: false,
            extended_types: false,
            hex_floats: false,
            inline_depth: 0,
            integers: true,
            max_nesting_depth: 100,
            nesting_indent: "    ".into(),
            only_ascii_source: false,
            only_ascii_unquoted: true,
            python_types: false,
            trailing_commas: false,
            start_list_item: "* ".into(),
            flush_start_list_item: true,
        }
    }
}

impl DumpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(mut self, enabled: bool) -> Self {
        self.aliases = enabled;
        self
    }

    pub fn with_circular_references(mut self, enabled: bool) -> Self {
        self.circular_references = enabled;
        self
    }

    pub fn with_compact_inline(mut self, enabled: bool) -> Self {
        self.compact_inline = enabled;
        self
    }

    pub fn with_hex_floats(mut self, enabled: bool) -> Self {
        self.hex_floats = enabled;
        self
    }

    pub fn with_inline_depth(mut self, depth: usize) -> Self {
        self.inline_depth = depth;
        self
    }

    pub fn with_nesting_indent(mut self, indent: &str) -> Self {
        self.nesting_indent = indent.into();
        self
    }

    pub fn with_trailing_commas(mut self, enabled: bool) -> Self {
        self.trailing_commas = enabled;
        self
    }
}

/// Options for round-trip editing.
#[derive(Clone, Copy, Debug)]
pub struct RoundTripOptions {
    /// Require replacements to keep the original scalar type. With this off,
    /// a replacement of a different type still re-renders in the closest
    /// possible style.
    pub enforce_types: bool,
}

impl Default for RoundTripOptions {
    fn default() -> Self {
        Self {
            enforce_types: true,
        }
    }
}
