//! # Validation Invoker
//!
//! Runs a compiled constraint document over an assembled request document
//! and translates each `jsonschema` error into a [`Violation`]: a dotted
//! locator, an optional explicit property name, and a description rendered
//! through a [`Locale`].
//!
//! Errors that mean the evaluator itself could not decide (unresolvable
//! `$ref`, regex backtracking limits, a document that never compiled) are
//! returned as [`EvaluatorError`] instead.

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::ValidationError;
use serde_json::{json, Value};

use crate::cache::CompiledSchema;
use crate::error::EvaluatorError;
use crate::locale::{number_text, render, Locale};

/// One constraint the request document failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path to the failing value, e.g. `body.items.0`. Empty at the
    /// document root.
    pub locator: String,
    /// Field the violation names explicitly (missing required field,
    /// disallowed additional property). The locator then points at its
    /// parent object.
    pub property: Option<String>,
    /// Rendered message.
    pub description: String,
}

/// Result of checking one request document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    /// Violations in evaluator order.
    Invalid(Vec<Violation>),
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Outcome::Valid => &[],
            Outcome::Invalid(v) => v,
        }
    }
}

/// Check `document` against `schema`.
pub fn validate(
    schema: &CompiledSchema,
    document: &Value,
    locale: &dyn Locale,
) -> Result<Outcome, EvaluatorError> {
    let validator = schema.validator()?;

    let mut violations = Vec::new();
    for error in validator.iter_errors(document) {
        translate(error, locale, &mut violations)?;
    }

    if violations.is_empty() {
        Ok(Outcome::Valid)
    } else {
        Ok(Outcome::Invalid(violations))
    }
}

/// Convert a JSON pointer (`/body/items/0`) into a dotted locator.
pub fn locator_from_pointer(pointer: &str) -> String {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

fn translate(
    error: ValidationError<'_>,
    locale: &dyn Locale,
    out: &mut Vec<Violation>,
) -> Result<(), EvaluatorError> {
    let fallback = error.to_string();
    let locator = locator_from_pointer(&error.instance_path.to_string());
    let instance: &Value = &error.instance;

    let description = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map_or_else(|| property.to_string(), str::to_string);
            out.push(Violation {
                locator,
                description: render(locale.required(), &[("property", &name)]),
                property: Some(name),
            });
            return Ok(());
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            for name in unexpected {
                out.push(Violation {
                    locator: locator.clone(),
                    property: Some(name.clone()),
                    description: locale.additional_property_not_allowed().to_string(),
                });
            }
            return Ok(());
        }
        ValidationErrorKind::Referencing { .. } => return Err(EvaluatorError::Reference(fallback)),
        ValidationErrorKind::BacktrackLimitExceeded { .. } => {
            return Err(EvaluatorError::Regex(fallback))
        }

        ValidationErrorKind::Type { kind } => {
            let expected = match kind {
                TypeKind::Single(t) => t.to_string(),
                TypeKind::Multiple(types) => types
                    .into_iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join("/"),
            };
            render(
                locale.invalid_type(),
                &[("expected", &expected), ("given", json_type(instance))],
            )
        }
        ValidationErrorKind::Enum { options } => {
            let allowed = match options {
                Value::Array(values) => values
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                other => other.to_string(),
            };
            render(locale.enumeration(), &[("allowed", &allowed)])
        }
        ValidationErrorKind::Constant { expected_value } => {
            render(locale.constant(), &[("allowed", &expected_value.to_string())])
        }
        ValidationErrorKind::Format { format } => {
            render(locale.does_not_match_format(), &[("format", format)])
        }
        ValidationErrorKind::Pattern { pattern } => {
            render(locale.does_not_match_pattern(), &[("pattern", pattern)])
        }
        ValidationErrorKind::MinLength { limit } => {
            render(locale.string_gte(), &[("min", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::MaxLength { limit } => {
            render(locale.string_lte(), &[("max", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::MinItems { limit } => {
            render(locale.min_items(), &[("min", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::MaxItems { limit } => {
            render(locale.max_items(), &[("max", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::MinProperties { limit } => {
            render(locale.min_properties(), &[("min", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::MaxProperties { limit } => {
            render(locale.max_properties(), &[("max", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::Minimum { limit } => {
            render(locale.number_gte(), &[("min", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::Maximum { limit } => {
            render(locale.number_lte(), &[("max", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::ExclusiveMinimum { limit } => {
            render(locale.number_gt(), &[("min", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::ExclusiveMaximum { limit } => {
            render(locale.number_lt(), &[("max", &number_text(&json!(limit)))])
        }
        ValidationErrorKind::MultipleOf { multiple_of } => render(
            locale.multiple_of(),
            &[("multiple", &number_text(&json!(multiple_of)))],
        ),
        ValidationErrorKind::UniqueItems { .. } => {
            let (i, j) = first_duplicate(instance).unwrap_or((0, 0));
            render(
                locale.unique(),
                &[("type", "array"), ("i", &i.to_string()), ("j", &j.to_string())],
            )
        }
        ValidationErrorKind::FalseSchema { .. } => locale.false_schema().to_string(),
        ValidationErrorKind::AnyOf { .. } => locale.any_of().to_string(),
        ValidationErrorKind::OneOfNotValid { .. } | ValidationErrorKind::OneOfMultipleValid { .. } => {
            locale.one_of().to_string()
        }
        ValidationErrorKind::Not { .. } => locale.not().to_string(),
        ValidationErrorKind::Contains { .. } => locale.contains().to_string(),
        ValidationErrorKind::AdditionalItems { .. } => locale.no_additional_items().to_string(),
        _ => render(locale.internal(), &[("error", &fallback)]),
    };

    out.push(Violation {
        locator,
        property: None,
        description,
    });
    Ok(())
}

/// Schema type name of a JSON value, distinguishing integers.
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Indices of the first pair of equal array elements.
fn first_duplicate(value: &Value) -> Option<(usize, usize)> {
    let items = value.as_array()?;
    items.iter().enumerate().find_map(|(i, a)| {
        items[i + 1..]
            .iter()
            .position(|b| a == b)
            .map(|offset| (i, i + 1 + offset))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::DefaultLocale;
    use crate::synth::synthesize;
    use rqv_core::{Constraints, Endpoint, HandlerId, ItemSpec, Method, ParamType, Parameter};

    fn compiled(params: Vec<Parameter>) -> CompiledSchema {
        let endpoint = Endpoint::new(Method::Get, "/t").parameters(params);
        CompiledSchema::compile(HandlerId::new("t"), synthesize(&endpoint))
    }

    fn messages(schema: &CompiledSchema, doc: Value) -> Vec<Violation> {
        match validate(schema, &doc, &DefaultLocale).unwrap() {
            Outcome::Valid => Vec::new(),
            Outcome::Invalid(v) => v,
        }
    }

    #[test]
    fn pointer_becomes_dotted_locator() {
        assert_eq!(locator_from_pointer(""), "");
        assert_eq!(locator_from_pointer("/body/items/0"), "body.items.0");
        assert_eq!(locator_from_pointer("/a~1b/c~0d"), "a/b.c~d");
    }

    #[test]
    fn valid_document_passes() {
        let schema = compiled(vec![Parameter::query("n", ParamType::Integer).required(true)]);
        assert!(validate(&schema, &json!({"n": 10}), &DefaultLocale)
            .unwrap()
            .is_valid());
    }

    #[test]
    fn type_mismatch_names_both_types() {
        let schema = compiled(vec![Parameter::query("n", ParamType::Integer)]);
        let v = messages(&schema, json!({"n": "abc"}));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].locator, "n");
        assert_eq!(v[0].description, "Invalid type. Expected: integer, given: string");
    }

    #[test]
    fn missing_required_names_the_property() {
        let schema = compiled(vec![Parameter::query("foo", ParamType::String).required(true)]);
        let v = messages(&schema, json!({}));
        assert_eq!(
            v,
            vec![Violation {
                locator: String::new(),
                property: Some("foo".into()),
                description: "foo is required".into(),
            }]
        );
    }

    #[test]
    fn format_violation_is_reported() {
        let schema = compiled(vec![Parameter::path("id", ParamType::String).format("uuid")]);
        let v = messages(&schema, json!({"id": "not-a-uuid"}));
        assert_eq!(v[0].description, "Field does not match format 'uuid'");
        assert!(messages(&schema, json!({"id": "550e8400-e29b-41d4-a716-446655440000"})).is_empty());
    }

    #[test]
    fn enum_lists_allowed_values() {
        let schema = compiled(vec![Parameter::query("s", ParamType::String)
            .with(Constraints::new().enum_values(["Foo", "Bar"]))]);
        let v = messages(&schema, json!({"s": "test"}));
        assert_eq!(v[0].description, r#"Must be one of the following: "Foo", "Bar""#);
    }

    #[test]
    fn bounds_render_their_limits() {
        let schema = compiled(vec![
            Parameter::query("lo", ParamType::Integer).with(Constraints::new().minimum(5)),
            Parameter::query("hi", ParamType::Integer).with(Constraints::new().maximum(1)),
            Parameter::query("xlo", ParamType::Integer)
                .with(Constraints::new().minimum(5).exclusive_minimum()),
            Parameter::query("xhi", ParamType::Integer)
                .with(Constraints::new().maximum(1).exclusive_maximum()),
            Parameter::query("short", ParamType::String).with(Constraints::new().min_length(5)),
            Parameter::query("long", ParamType::String).with(Constraints::new().max_length(7)),
        ]);
        let v = messages(
            &schema,
            json!({"lo": 4, "hi": 2, "xlo": 5, "xhi": 1, "short": "abc", "long": "abcdefgh"}),
        );
        let find = |loc: &str| {
            v.iter()
                .find(|x| x.locator == loc)
                .map(|x| x.description.clone())
                .unwrap()
        };
        assert_eq!(find("lo"), "Must be greater than or equal to 5");
        assert_eq!(find("hi"), "Must be less than or equal to 1");
        assert_eq!(find("xlo"), "Must be greater than 5");
        assert_eq!(find("xhi"), "Must be less than 1");
        assert_eq!(find("short"), "String length must be greater than or equal to 5");
        assert_eq!(find("long"), "String length must be less than or equal to 7");
    }

    #[test]
    fn array_constraints_are_reported_per_item() {
        let schema = compiled(vec![
            Parameter::query("few", ParamType::Array).with(Constraints::new().min_items(2)),
            Parameter::query("many", ParamType::Array).with(Constraints::new().max_items(3)),
            Parameter::query("uniq", ParamType::Array).with(Constraints::new().unique_items()),
            Parameter::query("items", ParamType::Array)
                .items(ItemSpec::of(ParamType::String).with(Constraints::new().min_length(5))),
        ]);
        let v = messages(
            &schema,
            json!({"few": [1], "many": [1, 2, 3, 4], "uniq": [1, 1], "items": ["1234"]}),
        );
        let find = |loc: &str| {
            v.iter()
                .find(|x| x.locator == loc)
                .map(|x| x.description.clone())
                .unwrap()
        };
        assert_eq!(find("few"), "Array must have at least 2 items");
        assert_eq!(find("many"), "Array must have at most 3 items");
        assert_eq!(find("uniq"), "array items[0,1] must be unique");
        assert_eq!(find("items.0"), "String length must be greater than or equal to 5");
    }

    #[test]
    fn pattern_and_additional_properties() {
        let schema = compiled(vec![Parameter::body(json!({
            "type": "object",
            "properties": {"code": {"type": "string", "pattern": "^test$"}},
            "additionalProperties": false
        }))]);
        let v = messages(&schema, json!({"body": {"code": "nope", "stray": 1}}));
        let pattern = v.iter().find(|x| x.locator == "body.code").unwrap();
        assert_eq!(pattern.description, "Does not match pattern '^test$'");
        let stray = v.iter().find(|x| x.property.as_deref() == Some("stray")).unwrap();
        assert_eq!(stray.locator, "body");
        assert_eq!(stray.description, "Is not allowed as an additional property");
    }

    #[test]
    fn untranslated_kind_uses_internal_template() {
        let schema = compiled(vec![Parameter::body(json!({
            "type": "object",
            "unevaluatedProperties": false
        }))]);
        let v = messages(&schema, json!({"body": {"stray": 1}}));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].locator, "body");
        assert!(
            v[0].description
                .starts_with("Internal Error Unevaluated properties are not allowed"),
            "got: {}",
            v[0].description
        );
    }

    #[test]
    fn uncompiled_schema_is_an_evaluator_error() {
        let schema = compiled(vec![Parameter::body(json!({"type": 12}))]);
        let err = validate(&schema, &json!({"body": {}}), &DefaultLocale).unwrap_err();
        assert!(matches!(err, EvaluatorError::Compile(_)), "got: {err:?}");
    }

    #[test]
    fn first_duplicate_finds_earliest_pair() {
        assert_eq!(first_duplicate(&json!([1, 2, 3, 2, 1])), Some((0, 4)));
        assert_eq!(first_duplicate(&json!([1, 2, 3])), None);
    }
}
