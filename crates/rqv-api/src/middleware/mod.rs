//! # Middleware Modules
//!
//! Tower middleware layers for validated services.

pub mod tracing_layer;
pub mod validate;
