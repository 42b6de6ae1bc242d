//! # rqv-api: Axum Request Validation
//!
//! Validates incoming requests against the constraint document of the
//! endpoint they matched, before the handler runs.
//!
//! ## Request Flow
//!
//! 1. Resolve the matched route template and method to a handler id.
//!    Unregistered routes pass through untouched.
//! 2. Buffer the body ([`Spool`]; multipart bodies past the memory ceiling
//!    spill to a temporary file) and assemble path, query, header, form,
//!    multipart and JSON sources into one document ([`assemble`]).
//! 3. Evaluate the document against the handler's compiled schema.
//! 4. Reject with a field → message map, or replay the buffered body to
//!    the handler.
//!
//! ## Usage
//!
//! ```ignore
//! let api = rqv_core::Api::from_path("api.yaml")?;
//! let validator = RequestValidator::new(&api, ValidatorConfig::from_env()?);
//! let app = validator.install(Router::new().route("/users/{id}", get(show)));
//! ```
//!
//! ## Crate Policy
//!
//! - Constraint documents are compiled once, when the validator is built.
//! - All rejections map to structured JSON responses via [`Rejection`].

pub mod assemble;
pub mod config;
pub mod error;
pub mod middleware;
pub mod spool;

pub use assemble::{assemble, RawRequest};
pub use config::{ConfigError, ValidatorConfig};
pub use error::{BodyError, ErrorBody, Rejection};
pub use middleware::validate::{validation_middleware, RequestValidator};
pub use spool::Spool;
