//! # Evaluator Errors
//!
//! Failures of the schema evaluator itself, as opposed to a document that
//! violates its schema. These surface as HTTP 500 at request time.

use thiserror::Error;

/// The schema evaluator could not produce a verdict.
///
/// Messages are captured as strings so a compile failure can be cached
/// with its schema and reported on every request to that endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluatorError {
    /// The synthesized constraint document did not compile.
    #[error("{0}")]
    Compile(String),

    /// A `$ref` in the document could not be resolved.
    #[error("{0}")]
    Reference(String),

    /// A `pattern` exceeded the regex engine's backtracking limit.
    #[error("{0}")]
    Regex(String),

    /// The constraint document could not be serialized.
    #[error("constraint document could not be serialized: {0}")]
    Serialize(String),
}
