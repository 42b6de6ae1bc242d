//! # rqv-core: Foundational Types for Request Validation
//!
//! This crate is the leaf of the rqv dependency DAG. It defines the API
//! description model that every other crate reads, plus the pure
//! string-to-value coercion used when request sources are assembled into a
//! typed document.
//!
//! ## Key Design Principles
//!
//! 1. **Read-only API model.** [`Api`], [`Endpoint`], [`Parameter`] and
//!    [`Model`] are authored once (in code via the builder methods, or in a
//!    YAML/JSON description file) and are never mutated by the validator.
//!
//! 2. **Explicit handler identity.** Every endpoint that should be validated
//!    carries a caller-supplied [`HandlerId`]. Nothing is derived from the
//!    bound callback at runtime, so two distinct handlers can never collide
//!    by accident.
//!
//! 3. **Coercion never fails.** [`coerce()`] degrades to the raw string when
//!    a value does not parse as its declared type. Type mismatches are left
//!    for the schema evaluator to report.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rqv-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod api;
pub mod coerce;
pub mod error;
pub mod model;
pub mod parameter;

// Re-export primary types for ergonomic imports.
pub use api::{Api, Endpoint, HandlerId, Method};
pub use coerce::{coerce, coerce_value, Coerced};
pub use error::CoreError;
pub use model::{Model, ModelField};
pub use parameter::{Constraints, ItemSpec, Location, ParamType, Parameter};
