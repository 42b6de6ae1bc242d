//! # Error Map
//!
//! Flattens violations into the `details` object of a validation-error
//! response: one entry per field, keyed by a dotted path relative to the
//! request document, with the body's own `body.` prefix removed.
//!
//! | Violation                               | Key                 |
//! |-----------------------------------------|---------------------|
//! | type mismatch at `int_param`            | `int_param`         |
//! | min length at `body.items.0`            | `items.0`           |
//! | `foo` required at `body.nested`         | `nested.foo`        |
//! | `foo` required at the body root         | `foo`               |
//!
//! When two violations share a key the later one wins.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::validate::Violation;

const BODY: &str = "body";

/// Field → message map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<String, String>);

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from violations in evaluator order.
    pub fn from_violations<'a>(violations: impl IntoIterator<Item = &'a Violation>) -> Self {
        let mut map = Self::new();
        for v in violations {
            map.insert(field_key(v), v.description.clone());
        }
        map
    }

    /// Insert or overwrite.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

fn strip_body(locator: &str) -> &str {
    locator
        .strip_prefix(BODY)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(locator)
}

/// The map key a violation is reported under.
pub fn field_key(v: &Violation) -> String {
    match &v.property {
        Some(property) => {
            let parent = if v.locator == BODY {
                ""
            } else {
                strip_body(&v.locator)
            };
            if parent.is_empty() {
                property.clone()
            } else {
                format!("{parent}.{property}")
            }
        }
        None if v.locator.is_empty() => "(root)".to_string(),
        None => strip_body(&v.locator).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violation(locator: &str, property: Option<&str>, description: &str) -> Violation {
        Violation {
            locator: locator.into(),
            property: property.map(Into::into),
            description: description.into(),
        }
    }

    #[test]
    fn keys_strip_the_body_prefix() {
        assert_eq!(field_key(&violation("body.items.0", None, "")), "items.0");
        assert_eq!(field_key(&violation("int_param", None, "")), "int_param");
        assert_eq!(field_key(&violation("body", None, "")), "body");
        assert_eq!(field_key(&violation("bodyweight", None, "")), "bodyweight");
        assert_eq!(field_key(&violation("", None, "")), "(root)");
    }

    #[test]
    fn property_violations_join_their_parent() {
        assert_eq!(field_key(&violation("body.nested", Some("foo"), "")), "nested.foo");
        assert_eq!(field_key(&violation("body", Some("foo"), "")), "foo");
        assert_eq!(field_key(&violation("", Some("upfile"), "")), "upfile");
        assert_eq!(field_key(&violation("meta", Some("x"), "")), "meta.x");
    }

    #[test]
    fn later_violation_overwrites_earlier() {
        let map = ErrorMap::from_violations(&[
            violation("body.a", None, "first"),
            violation("body.b", None, "other"),
            violation("body.a", None, "second"),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some("second"));
    }

    #[test]
    fn serializes_as_plain_object() {
        let map = ErrorMap::from_violations(&[violation("n", None, "bad")]);
        assert_eq!(serde_json::to_value(&map).unwrap(), json!({"n": "bad"}));
    }
}
