//! # Document Assembly
//!
//! Builds the request document an endpoint's constraint document is checked
//! against. Every request source lands in one JSON object:
//!
//! - path parameters, query keys and declared headers at the top level,
//!   coerced by their declared type and format;
//! - multipart text fields at the top level, uncoerced; uploaded files as
//!   the sentinel string `"file"`, their contents skipped;
//! - a url-encoded form as a nested object under `body`, coerced by the
//!   body model's field types;
//! - any other non-empty body parsed as JSON under `body`.
//!
//! Values that fail to coerce stay strings so the evaluator can report
//! the type mismatch.

use std::io;

use axum::body::Bytes;
use axum::http::{header, HeaderMap};
use futures_util::stream::BoxStream;
use rqv_schema::hint::coerce_with;
use rqv_schema::{CompiledSchema, Hint};
use serde_json::{Map, Value};

use crate::config::ValidatorConfig;
use crate::error::BodyError;
use crate::spool::Spool;

/// Document key the request body is placed under.
pub const BODY_KEY: &str = "body";

/// Placeholder value for an uploaded file.
pub const FILE_SENTINEL: &str = "file";

/// The request sources assembly reads, detached from the HTTP request.
#[derive(Debug, Default)]
pub struct RawRequest {
    /// Matched path parameters, in template order.
    pub path_params: Vec<(String, String)>,
    /// Raw query string, without the `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// The buffered body. Multipart bodies may be spilled to disk.
    pub body: Spool,
}

/// Assemble the request document for `schema`.
pub async fn assemble(
    schema: &CompiledSchema,
    request: &RawRequest,
    config: &ValidatorConfig,
) -> Result<Map<String, Value>, BodyError> {
    let hints = schema.hints();
    let mut document = Map::new();

    for (name, raw) in &request.path_params {
        document.insert(name.clone(), values_for(hints.property(name), std::slice::from_ref(raw)));
    }

    for (name, values) in query_pairs(request.query.as_deref())? {
        document.insert(name.clone(), values_for(hints.property(&name), &values));
    }

    for name in hints.properties_in("header") {
        let values: Vec<String> = request
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        if !values.is_empty() {
            document.insert(name.to_string(), values_for(hints.property(name), &values));
        }
    }

    if request.body.is_empty() {
        return Ok(document);
    }

    let content_type = content_type(&request.headers);
    let mime = content_type.parse::<mime::Mime>().ok();
    let essence = mime.as_ref().map(|m| m.essence_str());

    match essence {
        Some(MULTIPART) => {
            let stream = request.body.stream().await?;
            read_multipart(content_type, stream, config, &mut document).await?;
        }
        Some("application/x-www-form-urlencoded") => {
            let bytes = request.body.to_bytes(config.body_limit).await?;
            let form = form_document(&bytes, hints.property(BODY_KEY))?;
            document.insert(BODY_KEY.to_string(), Value::Object(form));
        }
        _ => {
            let bytes = request.body.to_bytes(config.body_limit).await?;
            let body: Value =
                serde_json::from_slice(&bytes).map_err(|_| BodyError::InvalidJson)?;
            document.insert(BODY_KEY.to_string(), body);
        }
    }

    Ok(document)
}

const MULTIPART: &str = "multipart/form-data";

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Whether the request carries a multipart body.
pub fn is_multipart(headers: &HeaderMap) -> bool {
    content_type(headers)
        .parse::<mime::Mime>()
        .is_ok_and(|m| m.essence_str() == MULTIPART)
}

/// Query pairs grouped by key, in first-seen order.
fn query_pairs(query: Option<&str>) -> Result<Vec<(String, Vec<String>)>, BodyError> {
    let Some(query) = query else {
        return Ok(Vec::new());
    };
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(query).map_err(|_| BodyError::Unreadable)?;

    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in pairs {
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => grouped.push((key, vec![value])),
        }
    }
    Ok(grouped)
}

/// Coerce the raw value(s) of one field.
///
/// A repeated key becomes an array. A single value for a declared array is
/// split on commas. Array elements are coerced by the item type.
fn values_for(hint: Option<Hint<'_>>, values: &[String]) -> Value {
    let declared_array = hint.is_some_and(|h| h.is_array());
    let element = if declared_array {
        hint.and_then(|h| h.items())
    } else {
        hint
    };

    match values {
        [single] if declared_array => Value::Array(
            single
                .split(',')
                .map(|part| coerce_with(element, part.trim()))
                .collect(),
        ),
        [single] => coerce_with(hint, single),
        many => Value::Array(many.iter().map(|v| coerce_with(element, v)).collect()),
    }
}

/// Read multipart fields into `document`.
///
/// Text values count against the memory ceiling; file parts are skipped.
async fn read_multipart(
    content_type: &str,
    stream: BoxStream<'static, io::Result<Bytes>>,
    config: &ValidatorConfig,
    document: &mut Map<String, Value>,
) -> Result<(), BodyError> {
    let boundary = multer::parse_boundary(content_type).map_err(|_| BodyError::Unreadable)?;
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut buffered = 0usize;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| BodyError::Unreadable)?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() {
            insert_repeated(document, name, Value::String(FILE_SENTINEL.to_string()));
            continue;
        }

        let mut text = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|_| BodyError::Unreadable)? {
            buffered += chunk.len();
            if buffered > config.multipart_memory_limit {
                tracing::debug!(
                    limit = config.multipart_memory_limit,
                    "multipart text exceeds memory ceiling"
                );
                return Err(BodyError::Unreadable);
            }
            text.extend_from_slice(&chunk);
        }
        let text = String::from_utf8(text).map_err(|_| BodyError::Unreadable)?;
        insert_repeated(document, name, Value::String(text));
    }
    Ok(())
}

/// Insert a value, turning a repeated key into an array.
fn insert_repeated(target: &mut Map<String, Value>, key: String, value: Value) {
    match target.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            target.insert(key, value);
        }
    }
}

/// Parse a url-encoded body into a nested object.
fn form_document(body: &[u8], hint: Option<Hint<'_>>) -> Result<Map<String, Value>, BodyError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(body).map_err(|_| BodyError::Unreadable)?;
    let mut form = Map::new();
    for (key, value) in &pairs {
        insert_form_value(&mut form, &key_path(key), value, hint);
    }
    Ok(form)
}

/// Split `a[b][c]` into `["a", "b", "c"]`. `a[]` yields a trailing empty
/// segment, meaning "append".
fn key_path(key: &str) -> Vec<&str> {
    match key.find('[') {
        Some(open) if open > 0 && key.ends_with(']') => {
            let mut path = vec![&key[..open]];
            path.extend(key[open + 1..key.len() - 1].split("]["));
            path
        }
        _ => vec![key],
    }
}

fn insert_form_value(
    target: &mut Map<String, Value>,
    path: &[&str],
    raw: &str,
    hint: Option<Hint<'_>>,
) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    let field = hint.and_then(|h| h.property(head));

    let append = rest == [""];
    if rest.is_empty() || append {
        let declared_array = field.is_some_and(|h| h.is_array());
        let element = if declared_array {
            field.and_then(|h| h.items())
        } else {
            field
        };
        let value = coerce_with(element, raw);
        if target.contains_key(*head) || !(append || declared_array) {
            insert_repeated(target, head.to_string(), value);
        } else {
            target.insert(head.to_string(), Value::Array(vec![value]));
        }
        return;
    }

    let child = target
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(map) = child {
        insert_form_value(map, rest, raw, field);
    }
}
