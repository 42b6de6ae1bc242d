//! # Endpoint Parameters
//!
//! A [`Parameter`] describes one named input of an endpoint: where it is
//! read from, its declared type and format, and the constraints a valid
//! value must satisfy. The body parameter carries a full embedded schema
//! instead of scalar constraints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::CoreError;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    /// A `{placeholder}` segment of the path template.
    Path,
    /// A query-string key.
    Query,
    /// A form or multipart field.
    #[serde(alias = "form")]
    FormData,
    /// The request body.
    Body,
    /// A request header.
    Header,
}

/// Declared primitive type of a parameter or model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// An uploaded file. Validated as an opaque string.
    File,
}

impl ParamType {
    /// Schema vocabulary name (`"integer"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::File => "file",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ParamType::String),
            "integer" => Ok(ParamType::Integer),
            "number" => Ok(ParamType::Number),
            "boolean" => Ok(ParamType::Boolean),
            "array" => Ok(ParamType::Array),
            "object" => Ok(ParamType::Object),
            "file" => Ok(ParamType::File),
            other => Err(CoreError::UnknownType(other.to_string())),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Value constraints shared by parameters, array items and model fields.
///
/// Exclusive bounds are flags on the inclusive bound, as authored; the
/// synthesizer turns them into `exclusiveMinimum`/`exclusiveMaximum`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    /// Allowed values.
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Regular expression a string value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub exclusive_minimum: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub exclusive_maximum: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique_items: bool,
}

impl Constraints {
    /// An empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict values to the given set.
    pub fn enum_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn min_length(mut self, n: u64) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: u64) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn minimum(mut self, n: impl Into<Number>) -> Self {
        self.minimum = Some(n.into());
        self
    }

    pub fn maximum(mut self, n: impl Into<Number>) -> Self {
        self.maximum = Some(n.into());
        self
    }

    /// Make the minimum bound exclusive.
    pub fn exclusive_minimum(mut self) -> Self {
        self.exclusive_minimum = true;
        self
    }

    /// Make the maximum bound exclusive.
    pub fn exclusive_maximum(mut self) -> Self {
        self.exclusive_maximum = true;
        self
    }

    pub fn min_items(mut self, n: u64) -> Self {
        self.min_items = Some(n);
        self
    }

    pub fn max_items(mut self, n: u64) -> Self {
        self.max_items = Some(n);
        self
    }

    pub fn unique_items(mut self) -> Self {
        self.unique_items = true;
        self
    }
}

/// Element schema of an array parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ParamType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(flatten)]
    pub constraints: Constraints,
    /// Element schema when the elements are themselves arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ItemSpec>>,
}

impl ItemSpec {
    /// Elements of the given type.
    pub fn of(item_type: ParamType) -> Self {
        Self {
            item_type: Some(item_type),
            ..Self::default()
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// One declared input of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: Location,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<ParamType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(flatten)]
    pub constraints: Constraints,
    /// Element schema for `array` parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemSpec>,
    /// Full embedded schema, used instead of the scalar fields (body case).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl Parameter {
    /// A parameter with no constraints.
    pub fn new(name: impl Into<String>, location: Location, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            location,
            param_type: Some(param_type),
            format: None,
            required: false,
            nullable: false,
            constraints: Constraints::default(),
            items: None,
            schema: None,
        }
    }

    /// A path parameter. Path parameters are always required.
    pub fn path(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::new(name, Location::Path, param_type).required(true)
    }

    /// An optional query parameter.
    pub fn query(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::new(name, Location::Query, param_type)
    }

    /// An optional form or multipart field.
    pub fn form(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::new(name, Location::FormData, param_type)
    }

    /// The body parameter, named `body`, carrying an embedded schema.
    pub fn body(schema: Value) -> Self {
        Self {
            name: "body".to_string(),
            location: Location::Body,
            param_type: None,
            format: None,
            required: false,
            nullable: false,
            constraints: Constraints::default(),
            items: None,
            schema: Some(schema),
        }
    }

    /// The body parameter referencing a named data model.
    pub fn body_ref(model: &str) -> Self {
        Self::body(serde_json::json!({ "$ref": format!("#/definitions/{model}") }))
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn items(mut self, items: ItemSpec) -> Self {
        self.items = Some(items);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_type_round_trips_through_str() {
        for t in [
            ParamType::String,
            ParamType::Integer,
            ParamType::Number,
            ParamType::Boolean,
            ParamType::Array,
            ParamType::Object,
            ParamType::File,
        ] {
            assert_eq!(t.as_str().parse::<ParamType>().unwrap(), t);
        }
        let err = "uuid".parse::<ParamType>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownType(ref t) if t == "uuid"));
        assert_eq!(err.to_string(), "unknown parameter type: uuid");
    }

    #[test]
    fn form_location_accepts_alias() {
        let loc: Location = serde_json::from_value(json!("form")).unwrap();
        assert_eq!(loc, Location::FormData);
        let loc: Location = serde_json::from_value(json!("formData")).unwrap();
        assert_eq!(loc, Location::FormData);
    }

    #[test]
    fn parameter_deserializes_flattened_constraints() {
        let p: Parameter = serde_json::from_value(json!({
            "name": "tags",
            "in": "query",
            "type": "array",
            "minItems": 1,
            "uniqueItems": true,
            "items": {"type": "string", "enum": ["a", "b"], "maxLength": 3}
        }))
        .unwrap();
        assert_eq!(p.constraints.min_items, Some(1));
        assert!(p.constraints.unique_items);
        let items = p.items.unwrap();
        assert_eq!(items.item_type, Some(ParamType::String));
        assert_eq!(items.constraints.enum_values, vec![json!("a"), json!("b")]);
        assert_eq!(items.constraints.max_length, Some(3));
    }

    #[test]
    fn path_parameters_are_required() {
        assert!(Parameter::path("id", ParamType::Integer).required);
        assert!(!Parameter::query("id", ParamType::Integer).required);
    }

    #[test]
    fn body_ref_points_into_definitions() {
        let p = Parameter::body_ref("Pet");
        assert_eq!(p.name, "body");
        assert_eq!(p.schema, Some(json!({"$ref": "#/definitions/Pet"})));
    }
}
