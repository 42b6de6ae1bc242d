//! # Type Coercion
//!
//! Converts raw request strings (path segments, query values, form fields)
//! into natively typed values, given the declared type and format of the
//! parameter they belong to.
//!
//! Coercion is total: a value that does not parse as its declared type is
//! passed through as the original string, so the schema evaluator reports
//! the mismatch (`Invalid type. Expected: integer, given: string`) instead
//! of the request failing here.
//!
//! | Declared type | Format   | Parsed as            |
//! |---------------|----------|----------------------|
//! | `integer`     | `int64`  | `i64`                |
//! | `integer`     | other    | `i32`                |
//! | `number`      | `double` | `f64`                |
//! | `number`      | other    | `f32`, widened       |
//! | `string`      | `byte`   | base64 → bytes       |
//! | `boolean`     | any      | `true` / `false`     |
//! | anything else | any      | unchanged string     |

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Number, Value};

use crate::parameter::ParamType;

/// A raw string after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Integer(i64),
    /// Always finite.
    Float(f64),
    Boolean(bool),
    /// Decoded `format: byte` payload.
    Bytes(Vec<u8>),
    /// Pass-through: no type declared, or the value did not parse.
    Text(String),
}

impl From<Coerced> for Value {
    fn from(c: Coerced) -> Self {
        match c {
            Coerced::Integer(n) => Value::from(n),
            Coerced::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            Coerced::Boolean(b) => Value::Bool(b),
            Coerced::Bytes(bytes) => Value::String(STANDARD.encode(bytes)),
            Coerced::Text(s) => Value::String(s),
        }
    }
}

/// Coerce `raw` according to its declared type and format.
pub fn coerce(raw: &str, declared_type: Option<ParamType>, format: Option<&str>) -> Coerced {
    let parsed = match declared_type {
        Some(ParamType::Integer) => parse_integer(raw, format),
        Some(ParamType::Number) => parse_number(raw, format),
        Some(ParamType::Boolean) => raw.parse::<bool>().ok().map(Coerced::Boolean),
        Some(ParamType::String) if format == Some("byte") => {
            STANDARD.decode(raw).ok().map(Coerced::Bytes)
        }
        _ => None,
    };
    parsed.unwrap_or_else(|| Coerced::Text(raw.to_string()))
}

/// Shorthand for `coerce(..).into()`.
pub fn coerce_value(raw: &str, declared_type: Option<ParamType>, format: Option<&str>) -> Value {
    coerce(raw, declared_type, format).into()
}

fn parse_integer(raw: &str, format: Option<&str>) -> Option<Coerced> {
    if format == Some("int64") {
        raw.parse::<i64>().ok().map(Coerced::Integer)
    } else {
        raw.parse::<i32>().ok().map(|n| Coerced::Integer(i64::from(n)))
    }
}

fn parse_number(raw: &str, format: Option<&str>) -> Option<Coerced> {
    let value = if format == Some("double") {
        raw.parse::<f64>().ok()?
    } else {
        // Widen through the shortest decimal form so `0.1` stays `0.1`.
        let narrow = raw.parse::<f32>().ok()?;
        narrow.to_string().parse::<f64>().unwrap_or(f64::from(narrow))
    };
    value.is_finite().then_some(Coerced::Float(value))
}
