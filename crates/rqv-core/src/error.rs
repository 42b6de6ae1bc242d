//! # Error Types
//!
//! Errors raised while loading an API description. Request-time failures
//! live in `rqv-schema` and `rqv-api`; nothing in this crate fails while a
//! request is being handled.

use thiserror::Error;

/// Top-level error type for the core crate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The description file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The description is not valid JSON or does not match the model.
    #[error("invalid JSON API description: {0}")]
    Json(#[from] serde_json::Error),

    /// The description is not valid YAML or does not match the model.
    #[error("invalid YAML API description: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An endpoint is structurally unusable.
    #[error("invalid endpoint {method} {path}: {reason}")]
    InvalidEndpoint {
        /// HTTP method of the offending endpoint.
        method: String,
        /// Path template of the offending endpoint.
        path: String,
        /// Why the endpoint was rejected.
        reason: String,
    },

    /// An HTTP method name that is not one of the nine standard methods.
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// A type name outside the seven parameter types.
    #[error("unknown parameter type: {0}")]
    UnknownType(String),
}
