//! # Data Models
//!
//! Named object types referenced from body schemas as
//! `#/definitions/<name>`. Each [`Model`] lists its fields with the same
//! constraint vocabulary as endpoint parameters, plus references to other
//! models and raw-message passthrough fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parameter::{Constraints, ParamType};

fn allow() -> bool {
    true
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A named object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Field names that must be present.
    #[serde(default)]
    pub required: Vec<String>,
    /// Whether fields not listed in `properties` are accepted.
    #[serde(default = "allow")]
    pub additional_properties: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, ModelField>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            required: Vec::new(),
            additional_properties: true,
            properties: BTreeMap::new(),
        }
    }
}

impl Model {
    /// An empty model that accepts unknown fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an optional field.
    pub fn field(mut self, name: impl Into<String>, field: ModelField) -> Self {
        self.properties.insert(name.into(), field);
        self
    }

    /// Add a field and mark it required.
    pub fn required_field(mut self, name: impl Into<String>, field: ModelField) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.insert(name, field);
        self
    }

    /// Reject fields not listed in `properties`.
    pub fn deny_unknown(mut self) -> Self {
        self.additional_properties = false;
        self
    }
}

/// One field of a [`Model`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelField {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<ParamType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(flatten)]
    pub constraints: Constraints,
    /// Another model, by name or as `#/definitions/<name>`.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Element schema for `array` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ModelField>>,
    /// Arbitrary JSON accepted without checking.
    #[serde(default, skip_serializing_if = "is_false")]
    pub raw_message: bool,
}

impl ModelField {
    /// A field of the given type.
    pub fn of(field_type: ParamType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    /// A field holding another model.
    pub fn reference(model: impl Into<String>) -> Self {
        Self {
            reference: Some(model.into()),
            ..Self::default()
        }
    }

    /// An array field with the given element schema.
    pub fn array(items: ModelField) -> Self {
        Self {
            field_type: Some(ParamType::Array),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// A field that accepts any JSON value.
    pub fn raw_message() -> Self {
        Self {
            raw_message: true,
            ..Self::default()
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Name of the referenced model, with any `#/definitions/` prefix removed.
    pub fn reference_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(|r| r.strip_prefix("#/definitions/").unwrap_or(r))
    }
}
