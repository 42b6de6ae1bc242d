//! # Schema Synthesis
//!
//! Compiles endpoint metadata into a constraint document the evaluator can
//! check an assembled request document against.
//!
//! ## Document Shape
//!
//! ```json
//! {
//!   "title": "GET /pets/{petId}",
//!   "type": "object",
//!   "properties": {
//!     "petId": { "name": "petId", "in": "path", "type": "integer" },
//!     "body":  { "$ref": "#/definitions/Pet" }
//!   },
//!   "required": ["petId"],
//!   "definitions": { "Pet": { "type": "object", ... } }
//! }
//! ```
//!
//! Parameters with an embedded schema (the body) are stored verbatim. Every
//! other parameter becomes a [`PropertyRecord`]. Parameter records carry a
//! scalar `type` unless nullable; definition records always carry a list so
//! the `null` variant can be appended.

use std::collections::BTreeMap;
use std::sync::Arc;

use rqv_core::{
    Api, Constraints, Endpoint, ItemSpec, Location, Model, ModelField, ParamType, Parameter,
};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

/// Name the `x-type` tag carries on raw-message fields.
pub const RAW_MESSAGE: &str = "raw_message";

/// Declared `type` keyword of a property record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpec {
    /// `"integer"`
    Scalar(ParamType),
    /// `["integer"]`
    Listed(ParamType),
    /// `["integer", "null"]`
    Nullable(ParamType),
}

impl TypeSpec {
    /// The declared non-null type.
    pub fn base(&self) -> ParamType {
        match self {
            TypeSpec::Scalar(t) | TypeSpec::Listed(t) | TypeSpec::Nullable(t) => *t,
        }
    }
}

/// Schema vocabulary name for a declared type. Files validate as strings.
fn schema_type(t: ParamType) -> &'static str {
    match t {
        ParamType::File => "string",
        other => other.as_str(),
    }
}

impl Serialize for TypeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypeSpec::Scalar(t) => serializer.serialize_str(schema_type(*t)),
            TypeSpec::Listed(t) => [schema_type(*t)].serialize(serializer),
            TypeSpec::Nullable(t) => [schema_type(*t), "null"].serialize(serializer),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Constraint record for one parameter, array element or model field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Where the parameter is read from. Ignored by the evaluator.
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_spec: Option<TypeSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "is_false")]
    pub unique_items: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertyRecord>>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "x-type", skip_serializing_if = "Option::is_none")]
    pub x_type: Option<&'static str>,
}

impl PropertyRecord {
    fn constrained(mut self, c: &Constraints) -> Self {
        self.enum_values = c.enum_values.clone();
        if self.nullable && !self.enum_values.is_empty() && !self.enum_values.contains(&Value::Null)
        {
            self.enum_values.push(Value::Null);
        }
        self.pattern = c.pattern.clone();
        self.min_length = c.min_length;
        self.max_length = c.max_length;
        if c.exclusive_minimum {
            self.exclusive_minimum = c.minimum.clone();
        } else {
            self.minimum = c.minimum.clone();
        }
        if c.exclusive_maximum {
            self.exclusive_maximum = c.maximum.clone();
        } else {
            self.maximum = c.maximum.clone();
        }
        self.min_items = c.min_items;
        self.max_items = c.max_items;
        self.unique_items = c.unique_items;
        self
    }

    fn from_parameter(p: &Parameter) -> Self {
        PropertyRecord {
            name: Some(p.name.clone()),
            location: Some(p.location),
            type_spec: p.param_type.map(|t| {
                if p.nullable {
                    TypeSpec::Nullable(t)
                } else {
                    TypeSpec::Scalar(t)
                }
            }),
            format: p.format.clone(),
            nullable: p.nullable,
            items: p.items.as_ref().map(|i| Box::new(Self::from_item(i))),
            ..Self::default()
        }
        .constrained(&p.constraints)
    }

    fn from_item(item: &ItemSpec) -> Self {
        PropertyRecord {
            type_spec: item.item_type.map(TypeSpec::Scalar),
            format: item.format.clone(),
            items: item.items.as_deref().map(|i| Box::new(Self::from_item(i))),
            ..Self::default()
        }
        .constrained(&item.constraints)
    }

    fn from_model_field(field: &ModelField) -> Self {
        if field.raw_message {
            return PropertyRecord {
                x_type: Some(RAW_MESSAGE),
                ..Self::default()
            };
        }
        if let Some(name) = field.reference_name() {
            return PropertyRecord {
                reference: Some(format!("#/definitions/{name}")),
                ..Self::default()
            };
        }
        PropertyRecord {
            type_spec: field.field_type.map(|t| {
                if field.nullable {
                    TypeSpec::Nullable(t)
                } else {
                    TypeSpec::Listed(t)
                }
            }),
            format: field.format.clone(),
            nullable: field.nullable,
            items: field
                .items
                .as_deref()
                .map(|i| Box::new(Self::from_model_field(i))),
            ..Self::default()
        }
        .constrained(&field.constraints)
    }
}

/// A property of a constraint document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertySchema {
    /// Synthesized from a parameter's declared type and constraints.
    Parameter(PropertyRecord),
    /// A parameter's embedded schema, stored verbatim.
    Embedded(Value),
}

/// One entry of the definitions table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionRecord {
    #[serde(rename = "type")]
    pub object_type: &'static str,
    pub required: Vec<String>,
    pub additional_properties: bool,
    pub properties: BTreeMap<String, PropertyRecord>,
}

/// Named data models, keyed by model name.
pub type DefinitionsTable = BTreeMap<String, DefinitionRecord>;

/// The schema an endpoint's assembled request document must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDocument {
    pub title: String,
    #[serde(rename = "type")]
    pub object_type: &'static str,
    pub properties: BTreeMap<String, PropertySchema>,
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
    pub definitions: Arc<DefinitionsTable>,
}

impl ConstraintDocument {
    /// Attach the shared definitions table.
    pub fn with_definitions(mut self, definitions: Arc<DefinitionsTable>) -> Self {
        self.definitions = definitions;
        self
    }

    /// Set the top-level `additionalProperties` keyword.
    pub fn with_additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = Some(allowed);
        self
    }

    /// Serialize into a JSON value for compilation or display.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Build the constraint document for one endpoint.
///
/// The result carries an empty definitions table; see
/// [`ConstraintDocument::with_definitions`].
pub fn synthesize(endpoint: &Endpoint) -> ConstraintDocument {
    let mut document = ConstraintDocument {
        title: format!("{} {}", endpoint.method, endpoint.path),
        object_type: "object",
        properties: BTreeMap::new(),
        required: Vec::new(),
        additional_properties: None,
        definitions: Arc::default(),
    };

    for p in &endpoint.parameters {
        // `required` must hold unique names.
        if p.required && !document.required.contains(&p.name) {
            document.required.push(p.name.clone());
        }
        let property = match &p.schema {
            Some(schema) => PropertySchema::Embedded(schema.clone()),
            None => PropertySchema::Parameter(PropertyRecord::from_parameter(p)),
        };
        // Duplicate names: the later declaration wins.
        document.properties.insert(p.name.clone(), property);
    }

    document
}

fn synthesize_model(model: &Model) -> DefinitionRecord {
    DefinitionRecord {
        object_type: "object",
        required: model.required.clone(),
        additional_properties: model.additional_properties,
        properties: model
            .properties
            .iter()
            .map(|(name, field)| (name.clone(), PropertyRecord::from_model_field(field)))
            .collect(),
    }
}

/// Build the definitions table shared by every endpoint of `api`.
pub fn synthesize_definitions(api: &Api) -> DefinitionsTable {
    api.definitions
        .iter()
        .map(|(name, model)| (name.clone(), synthesize_model(model)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rqv_core::{Method, Parameter};
    use serde_json::json;

    fn endpoint(params: Vec<Parameter>) -> Endpoint {
        Endpoint::new(Method::Post, "/items/{id}").parameters(params)
    }

    #[test]
    fn no_parameters_yield_empty_document() {
        let doc = synthesize(&endpoint(vec![]));
        assert_eq!(doc.title, "POST /items/{id}");
        assert!(doc.required.is_empty());
        assert!(doc.properties.is_empty());
        assert_eq!(
            doc.to_value().unwrap(),
            json!({
                "title": "POST /items/{id}",
                "type": "object",
                "properties": {},
                "required": [],
                "definitions": {}
            })
        );
    }

    #[test]
    fn required_parameters_are_listed() {
        let doc = synthesize(&endpoint(vec![
            Parameter::path("id", ParamType::Integer),
            Parameter::query("q", ParamType::String),
            Parameter::query("limit", ParamType::Integer).required(true),
        ]));
        assert_eq!(doc.required, vec!["id".to_string(), "limit".to_string()]);
        assert_eq!(doc.properties.len(), 3);
    }

    #[test]
    fn parameter_record_renders_constraints() {
        let doc = synthesize(&endpoint(vec![Parameter::query("n", ParamType::Integer)
            .format("int64")
            .with(
                Constraints::new()
                    .minimum(5)
                    .exclusive_minimum()
                    .maximum(10)
                    .enum_values([5, 6, 7]),
            )]));
        let v = doc.to_value().unwrap();
        assert_eq!(
            v["properties"]["n"],
            json!({
                "name": "n",
                "in": "query",
                "type": "integer",
                "format": "int64",
                "enum": [5, 6, 7],
                "exclusiveMinimum": 5,
                "maximum": 10
            })
        );
    }

    #[test]
    fn nullable_parameter_type_is_a_pair() {
        let doc = synthesize(&endpoint(vec![Parameter::query("s", ParamType::String)
            .nullable()
            .with(Constraints::new().enum_values(["a", "b"]))]));
        let v = doc.to_value().unwrap();
        assert_eq!(v["properties"]["s"]["type"], json!(["string", "null"]));
        assert_eq!(v["properties"]["s"]["nullable"], json!(true));
        assert_eq!(v["properties"]["s"]["enum"], json!(["a", "b", null]));
    }

    #[test]
    fn file_parameters_validate_as_strings() {
        let doc = synthesize(&endpoint(vec![
            Parameter::form("upfile", ParamType::File).required(true)
        ]));
        let v = doc.to_value().unwrap();
        assert_eq!(v["properties"]["upfile"]["type"], json!("string"));
    }

    #[test]
    fn array_items_are_nested() {
        let doc = synthesize(&endpoint(vec![Parameter::query("ids", ParamType::Array)
            .items(ItemSpec::of(ParamType::String).format("uuid"))
            .with(Constraints::new().max_items(3).unique_items())]));
        let v = doc.to_value().unwrap();
        assert_eq!(
            v["properties"]["ids"],
            json!({
                "name": "ids",
                "in": "query",
                "type": "array",
                "maxItems": 3,
                "uniqueItems": true,
                "items": {"type": "string", "format": "uuid"}
            })
        );
    }

    #[test]
    fn embedded_schema_is_stored_verbatim() {
        let schema = json!({"$ref": "#/definitions/Pet", "x-extra": [1, 2]});
        let doc = synthesize(&endpoint(vec![Parameter::body(schema.clone()).required(true)]));
        assert_eq!(doc.properties["body"], PropertySchema::Embedded(schema));
        assert_eq!(doc.required, vec!["body".to_string()]);
    }

    #[test]
    fn duplicate_parameter_names_last_write_wins() {
        let doc = synthesize(&endpoint(vec![
            Parameter::query("dup", ParamType::Integer),
            Parameter::query("dup", ParamType::String).format("uuid"),
        ]));
        assert_eq!(doc.properties.len(), 1);
        match &doc.properties["dup"] {
            PropertySchema::Parameter(r) => {
                assert_eq!(r.type_spec, Some(TypeSpec::Scalar(ParamType::String)));
                assert_eq!(r.format.as_deref(), Some("uuid"));
            }
            other => panic!("unexpected property: {other:?}"),
        }
    }

    #[test]
    fn duplicate_required_parameter_is_listed_once() {
        let doc = synthesize(&endpoint(vec![
            Parameter::query("q", ParamType::Integer).required(true),
            Parameter::query("q", ParamType::Integer).required(true),
        ]));
        assert_eq!(doc.required, vec!["q".to_string()]);

        let compiled = crate::CompiledSchema::compile(rqv_core::HandlerId::new("dup"), doc);
        assert!(compiled.is_compiled());
    }

    #[test]
    fn synthesis_is_idempotent() {
        let e = endpoint(vec![
            Parameter::path("id", ParamType::Integer),
            Parameter::body_ref("Pet"),
        ]);
        assert_eq!(synthesize(&e), synthesize(&e));
        assert_eq!(
            synthesize(&e).to_value().unwrap(),
            synthesize(&e).to_value().unwrap()
        );
    }

    #[test]
    fn definitions_carry_listed_types() {
        let api = Api::new().definition(
            "payload",
            Model::new()
                .required_field("name", ModelField::of(ParamType::String))
                .field("age", ModelField::of(ParamType::Integer).nullable())
                .field("nested", ModelField::reference("nested"))
                .field(
                    "tags",
                    ModelField::array(
                        ModelField::of(ParamType::String)
                            .with(Constraints::new().min_length(5)),
                    ),
                )
                .field("extra", ModelField::raw_message())
                .deny_unknown(),
        );
        let table = synthesize_definitions(&api);
        let v = serde_json::to_value(&table).unwrap();
        let payload = &v["payload"];
        assert_eq!(payload["type"], json!("object"));
        assert_eq!(payload["required"], json!(["name"]));
        assert_eq!(payload["additionalProperties"], json!(false));
        assert_eq!(payload["properties"]["name"], json!({"type": ["string"]}));
        assert_eq!(
            payload["properties"]["age"],
            json!({"type": ["integer", "null"], "nullable": true})
        );
        assert_eq!(
            payload["properties"]["nested"],
            json!({"$ref": "#/definitions/nested"})
        );
        assert_eq!(
            payload["properties"]["tags"],
            json!({"type": ["array"], "items": {"type": ["string"], "minLength": 5}})
        );
        assert_eq!(payload["properties"]["extra"], json!({"x-type": "raw_message"}));
    }

    #[test]
    fn definitions_are_shared_not_copied() {
        let api = Api::new().definition("Pet", Model::new());
        let table = Arc::new(synthesize_definitions(&api));
        let a = synthesize(&endpoint(vec![])).with_definitions(Arc::clone(&table));
        let b = synthesize(&endpoint(vec![])).with_definitions(Arc::clone(&table));
        assert!(Arc::ptr_eq(&a.definitions, &b.definitions));
    }
}
