//! # Schema Cache
//!
//! Compiled constraint documents, keyed by handler identity. Built once,
//! synchronously, before the server starts taking requests; read-only
//! afterwards, so it is shared across request tasks behind an `Arc` with no
//! locking.
//!
//! ## Build Rules
//!
//! - Endpoints with no handler bound are skipped.
//! - Two endpoints bound to the same handler: the later one wins.
//! - A document that fails to compile is still cached. Every request to
//!   that endpoint then answers with the evaluator failure.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jsonschema::Validator;
use rqv_core::{Api, HandlerId, Method};
use serde::Deserialize;
use serde_json::Value;

use crate::error::EvaluatorError;
use crate::hint::Hint;
use crate::locale::{DefaultLocale, Locale};
use crate::synth::{synthesize, synthesize_definitions, ConstraintDocument};
use crate::validate::{validate, Outcome};

/// Knobs applied to every synthesized document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    /// Emit `additionalProperties: false` so undeclared request fields fail.
    pub reject_unknown_fields: bool,
}

/// A constraint document with its compiled evaluator.
pub struct CompiledSchema {
    handler: HandlerId,
    document: ConstraintDocument,
    raw: Value,
    validator: Result<Validator, EvaluatorError>,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("handler", &self.handler)
            .field("title", &self.document.title)
            .field("compiled", &self.validator.is_ok())
            .finish()
    }
}

impl CompiledSchema {
    /// Serialize and compile `document` for `handler`.
    pub fn compile(handler: HandlerId, document: ConstraintDocument) -> Self {
        let (raw, validator) = match document.to_value() {
            Ok(raw) => {
                let validator = build_validator(&raw);
                (raw, validator)
            }
            Err(e) => (Value::Null, Err(EvaluatorError::Serialize(e.to_string()))),
        };
        Self {
            handler,
            document,
            raw,
            validator,
        }
    }

    pub fn handler(&self) -> &HandlerId {
        &self.handler
    }

    pub fn document(&self) -> &ConstraintDocument {
        &self.document
    }

    /// The document as compiled.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Type hints for the assembler.
    pub fn hints(&self) -> Hint<'_> {
        Hint::root(&self.raw)
    }

    /// The compiled evaluator, or the error that prevented compiling it.
    pub fn validator(&self) -> Result<&Validator, EvaluatorError> {
        self.validator.as_ref().map_err(Clone::clone)
    }

    /// Whether compilation succeeded.
    pub fn is_compiled(&self) -> bool {
        self.validator.is_ok()
    }
}

fn build_validator(raw: &Value) -> Result<Validator, EvaluatorError> {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.should_validate_formats(true);
    opts.build(raw).map_err(|e| EvaluatorError::Compile(e.to_string()))
}

/// Handler-keyed store of compiled constraint documents.
#[derive(Debug)]
pub struct SchemaCache {
    entries: HashMap<HandlerId, Arc<CompiledSchema>>,
    routes: HashMap<(Method, String), HandlerId>,
    locale: Arc<dyn Locale>,
}

impl SchemaCache {
    /// Synthesize and compile every endpoint of `api` that has a handler.
    pub fn build(api: &Api, options: &SynthesisOptions, locale: Arc<dyn Locale>) -> Self {
        let definitions = Arc::new(synthesize_definitions(api));
        let mut entries: HashMap<HandlerId, Arc<CompiledSchema>> = HashMap::new();
        let mut routes = HashMap::new();

        for endpoint in &api.endpoints {
            let Some(handler) = endpoint.handler.clone() else {
                continue;
            };

            let mut document = synthesize(endpoint).with_definitions(Arc::clone(&definitions));
            if options.reject_unknown_fields {
                document = document.with_additional_properties(false);
            }
            let compiled = CompiledSchema::compile(handler.clone(), document);
            if let Err(e) = &compiled.validator {
                tracing::warn!(
                    handler = %handler,
                    endpoint = %compiled.document.title,
                    error = %e,
                    "constraint document failed to compile; requests will be rejected"
                );
            }

            routes.insert((endpoint.method, endpoint.path.clone()), handler.clone());
            if let Some(previous) = entries.insert(handler.clone(), Arc::new(compiled)) {
                tracing::warn!(
                    handler = %handler,
                    replaced = %previous.document.title,
                    endpoint = %endpoint.method,
                    path = %endpoint.path,
                    "duplicate handler identity; later endpoint overwrites earlier"
                );
            }
        }

        tracing::info!(count = entries.len(), "schema cache built");
        Self {
            entries,
            routes,
            locale,
        }
    }

    /// Build with default options and the English locale.
    pub fn from_api(api: &Api) -> Self {
        Self::build(api, &SynthesisOptions::default(), Arc::new(DefaultLocale))
    }

    /// Look up by handler identity.
    pub fn get(&self, handler: &HandlerId) -> Option<&Arc<CompiledSchema>> {
        self.entries.get(handler)
    }

    /// Handler bound to a method and path template.
    pub fn handler_for(&self, method: Method, path: &str) -> Option<&HandlerId> {
        self.routes.get(&(method, path.to_string()))
    }

    /// Look up by method and path template.
    pub fn resolve(&self, method: Method, path: &str) -> Option<&Arc<CompiledSchema>> {
        self.handler_for(method, path).and_then(|h| self.get(h))
    }

    /// Validate `document` against `schema` using this cache's locale.
    pub fn validate(&self, schema: &CompiledSchema, document: &Value) -> Result<Outcome, EvaluatorError> {
        validate(schema, document, self.locale.as_ref())
    }

    pub fn locale(&self) -> &dyn Locale {
        self.locale.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handler identities present, sorted.
    pub fn handlers(&self) -> Vec<&HandlerId> {
        let mut handlers: Vec<&HandlerId> = self.entries.keys().collect();
        handlers.sort();
        handlers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rqv_core::{Endpoint, ParamType, Parameter};
    use serde_json::json;

    fn api() -> Api {
        Api::new()
            .endpoint(
                Endpoint::new(Method::Get, "/a/{id}")
                    .handler("get_a")
                    .parameter(Parameter::path("id", ParamType::Integer)),
            )
            .endpoint(Endpoint::new(Method::Get, "/unbound"))
    }

    #[test]
    fn endpoints_without_handler_are_skipped() {
        let cache = SchemaCache::from_api(&api());
        assert_eq!(cache.len(), 1);
        assert!(cache.resolve(Method::Get, "/unbound").is_none());
        let schema = cache.resolve(Method::Get, "/a/{id}").unwrap();
        assert_eq!(schema.handler().as_str(), "get_a");
        assert!(schema.is_compiled());
    }

    #[test]
    fn duplicate_handler_identity_last_write_wins() {
        let api = Api::new()
            .endpoint(Endpoint::new(Method::Get, "/first").handler("shared"))
            .endpoint(Endpoint::new(Method::Post, "/second").handler("shared"));
        let cache = SchemaCache::from_api(&api);
        assert_eq!(cache.len(), 1);
        let schema = cache.get(&HandlerId::new("shared")).unwrap();
        assert_eq!(schema.document().title, "POST /second");
        // The earlier route still resolves, to the surviving entry.
        assert_eq!(
            cache.resolve(Method::Get, "/first").unwrap().document().title,
            "POST /second"
        );
    }

    #[test]
    fn compile_failure_is_cached() {
        let api = Api::new().endpoint(
            Endpoint::new(Method::Post, "/broken")
                .handler("broken")
                .parameter(Parameter::body(json!({"$ref": "#/definitions/Missing"}))),
        );
        let cache = SchemaCache::from_api(&api);
        let schema = cache.get(&HandlerId::new("broken")).unwrap();
        assert!(cache.validate(schema, &json!({"body": {}})).is_err());
    }

    #[test]
    fn reject_unknown_fields_closes_the_document() {
        let options = SynthesisOptions {
            reject_unknown_fields: true,
        };
        let cache = SchemaCache::build(&api(), &options, Arc::new(DefaultLocale));
        let schema = cache.resolve(Method::Get, "/a/{id}").unwrap();
        assert_eq!(schema.raw()["additionalProperties"], json!(false));
        let outcome = cache.validate(schema, &json!({"id": 1, "extra": 2})).unwrap();
        assert!(!outcome.is_valid());
    }

    #[test]
    fn hints_read_the_compiled_document() {
        let cache = SchemaCache::from_api(&api());
        let schema = cache.resolve(Method::Get, "/a/{id}").unwrap();
        let id = schema.hints().property("id").unwrap();
        assert_eq!(id.declared_type(), Some(ParamType::Integer));
    }
}
