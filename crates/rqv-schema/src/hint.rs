//! # Type Hints
//!
//! Read-only view over a serialized constraint document, used by the
//! request assembler to find the declared type and format of a field before
//! coercing its raw string value. `$ref` pointers of the form
//! `#/definitions/<name>` are followed; nothing else is resolved.

use rqv_core::{coerce_value, ParamType};
use serde_json::Value;

/// Upper bound on chained `$ref` hops, so a cycle cannot loop forever.
const MAX_REF_HOPS: usize = 16;

/// A node of a constraint document, with the document root for `$ref`s.
#[derive(Debug, Clone, Copy)]
pub struct Hint<'a> {
    root: &'a Value,
    node: &'a Value,
}

impl<'a> Hint<'a> {
    /// Hint for the whole document.
    pub fn root(document: &'a Value) -> Self {
        Self {
            root: document,
            node: document,
        }
    }

    fn at(self, node: &'a Value) -> Self {
        Self {
            root: self.root,
            node,
        }
    }

    /// Follow `$ref` pointers until a concrete schema is reached.
    fn resolved(self) -> Self {
        let mut current = self;
        for _ in 0..MAX_REF_HOPS {
            let Some(target) = current
                .node
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| current.root.get("definitions")?.get(name))
            else {
                break;
            };
            current = current.at(target);
        }
        current
    }

    /// Hint for a named property of an object schema.
    pub fn property(self, name: &str) -> Option<Self> {
        let this = self.resolved();
        this.node
            .get("properties")
            .and_then(|p| p.get(name))
            .map(|node| this.at(node))
    }

    /// Hint for the elements of an array schema.
    pub fn items(self) -> Option<Self> {
        let this = self.resolved();
        this.node.get("items").map(|node| this.at(node))
    }

    /// Declared type, ignoring a `null` variant.
    pub fn declared_type(self) -> Option<ParamType> {
        let node = self.resolved().node;
        match node.get("type")? {
            Value::String(t) => t.parse().ok(),
            Value::Array(types) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .and_then(|t| t.parse().ok()),
            _ => None,
        }
    }

    /// Declared format.
    pub fn format(self) -> Option<&'a str> {
        self.resolved().node.get("format").and_then(Value::as_str)
    }

    /// Declared parameter location (`"in"`), if any.
    pub fn location(self) -> Option<&'a str> {
        self.node.get("in").and_then(Value::as_str)
    }

    /// Names of the top-level properties read from `location`.
    pub fn properties_in(self, location: &str) -> Vec<&'a str> {
        self.resolved()
            .node
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .filter(|(_, p)| p.get("in").and_then(Value::as_str) == Some(location))
                    .map(|(name, _)| name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the node declares an array.
    pub fn is_array(self) -> bool {
        self.declared_type() == Some(ParamType::Array)
    }

    /// Coerce a raw string by this node's declared type and format.
    pub fn coerce(self, raw: &str) -> Value {
        coerce_value(raw, self.declared_type(), self.format())
    }
}

/// Coerce with an optional hint; no hint means pass-through.
pub fn coerce_with(hint: Option<Hint<'_>>, raw: &str) -> Value {
    match hint {
        Some(h) => h.coerce(raw),
        None => Value::String(raw.to_string()),
    }
}
