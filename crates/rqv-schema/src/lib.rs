//! # rqv-schema: Constraint Documents & Validation
//!
//! Turns an [`rqv_core::Api`] into per-endpoint constraint documents,
//! compiles them once, and translates evaluator output into a flat
//! field → message map.
//!
//! ## Synthesis (`synth`)
//!
//! [`synthesize()`] builds one [`ConstraintDocument`] per endpoint: an
//! `object` schema whose properties are the endpoint's parameters and whose
//! `required` list names the required ones. [`synthesize_definitions()`]
//! builds the shared definitions table from the API's data models.
//!
//! ## Cache (`cache`)
//!
//! [`SchemaCache::build`] synthesizes and compiles every endpoint that has a
//! handler bound, keyed by [`rqv_core::HandlerId`]. The cache is built
//! once during setup and only read afterwards.
//!
//! ## Validation (`validate`, `report`, `locale`)
//!
//! [`validate()`] runs the compiled `jsonschema` validator (Draft 2020-12,
//! format assertions on) and renders each error through a [`Locale`].
//! [`ErrorMap::from_violations`] keys the results by field.
//!
//! ## Crate Policy
//!
//! - Depends only on `rqv-core` internally.
//! - The constraint matching itself is delegated to `jsonschema`; this crate
//!   only produces documents and consumes results.
//! - No HTTP types. Request assembly lives in `rqv-api`.

pub mod cache;
pub mod error;
pub mod hint;
pub mod locale;
pub mod report;
pub mod synth;
pub mod validate;

pub use cache::{CompiledSchema, SchemaCache, SynthesisOptions};
pub use error::EvaluatorError;
pub use hint::Hint;
pub use locale::{DefaultLocale, Locale};
pub use report::ErrorMap;
pub use synth::{
    synthesize, synthesize_definitions, ConstraintDocument, DefinitionRecord, DefinitionsTable,
    PropertyRecord, PropertySchema, TypeSpec,
};
pub use validate::{validate, Outcome, Violation};
