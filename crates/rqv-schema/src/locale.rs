//! # Message Locale
//!
//! Templates used to render validation errors. Each violation kind has one
//! template with `{name}` placeholders; a [`Locale`] implementation may
//! override any subset of them. [`DefaultLocale`] supplies the English set.

use std::fmt;

use serde_json::Value;

/// Message templates, one per violation kind.
///
/// Placeholders are filled by [`render`]. Every method has an English
/// default, so an implementation only overrides what it needs.
pub trait Locale: Send + Sync + fmt::Debug {
    fn false_schema(&self) -> &str {
        "False always fails validation"
    }
    /// `{property}`
    fn required(&self) -> &str {
        "{property} is required"
    }
    /// `{expected}`, `{given}`
    fn invalid_type(&self) -> &str {
        "Invalid type. Expected: {expected}, given: {given}"
    }
    fn any_of(&self) -> &str {
        "Must validate at least one schema (anyOf)"
    }
    fn one_of(&self) -> &str {
        "Must validate one and only one schema (oneOf)"
    }
    fn not(&self) -> &str {
        "Must not validate the schema (not)"
    }
    /// `{error}`
    fn internal(&self) -> &str {
        "Internal Error {error}"
    }
    /// `{allowed}`
    fn constant(&self) -> &str {
        "Does not match: {allowed}"
    }
    /// `{allowed}`
    fn enumeration(&self) -> &str {
        "Must be one of the following: {allowed}"
    }
    fn no_additional_items(&self) -> &str {
        "No additional items allowed on array"
    }
    /// `{min}`
    fn min_items(&self) -> &str {
        "Array must have at least {min} items"
    }
    /// `{max}`
    fn max_items(&self) -> &str {
        "Array must have at most {max} items"
    }
    /// `{type}`, `{i}`, `{j}`
    fn unique(&self) -> &str {
        "{type} items[{i},{j}] must be unique"
    }
    fn contains(&self) -> &str {
        "At least one of the items must match"
    }
    /// `{min}`
    fn min_properties(&self) -> &str {
        "Must have at least {min} properties"
    }
    /// `{max}`
    fn max_properties(&self) -> &str {
        "Must have at most {max} properties"
    }
    fn additional_property_not_allowed(&self) -> &str {
        "Is not allowed as an additional property"
    }
    /// `{min}`
    fn string_gte(&self) -> &str {
        "String length must be greater than or equal to {min}"
    }
    /// `{max}`
    fn string_lte(&self) -> &str {
        "String length must be less than or equal to {max}"
    }
    /// `{pattern}`
    fn does_not_match_pattern(&self) -> &str {
        "Does not match pattern '{pattern}'"
    }
    /// `{format}`
    fn does_not_match_format(&self) -> &str {
        "Field does not match format '{format}'"
    }
    /// `{multiple}`
    fn multiple_of(&self) -> &str {
        "Must be a multiple of {multiple}"
    }
    /// `{min}`
    fn number_gte(&self) -> &str {
        "Must be greater than or equal to {min}"
    }
    /// `{min}`
    fn number_gt(&self) -> &str {
        "Must be greater than {min}"
    }
    /// `{max}`
    fn number_lte(&self) -> &str {
        "Must be less than or equal to {max}"
    }
    /// `{max}`
    fn number_lt(&self) -> &str {
        "Must be less than {max}"
    }
}

/// The English message set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLocale;

impl Locale for DefaultLocale {}

/// Substitute `{name}` placeholders in `template`.
///
/// Unknown placeholders are left as written.
pub fn render(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match args.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Render a JSON number for a message: `5`, not `5.0`.
pub fn number_text(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
