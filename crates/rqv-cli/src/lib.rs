//! # rqv-cli: CLI Tool for rqv
//!
//! Provides the `rqv` command-line interface for inspecting and exercising
//! the constraint documents synthesized from an API description, without
//! running a server.
//!
//! ## Subcommands
//!
//! - `rqv schema`: Print constraint documents as pretty JSON.
//! - `rqv check`: Validate a request document against one handler.
//!
//! ```bash
//! rqv schema api.yaml --handler get_pet
//! rqv check api.yaml --handler post_pet --document request.json
//! ```

pub mod check;
pub mod schema;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rqv_core::Api;
use rqv_schema::{DefaultLocale, SchemaCache, SynthesisOptions};

/// Load an API description file. Structural errors (such as a path
/// parameter missing from its template) are reported here.
pub fn load_api(path: &Path) -> Result<Api> {
    let api = Api::from_path(path)
        .with_context(|| format!("failed to load API description {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        endpoints = api.endpoints.len(),
        definitions = api.definitions.len(),
        "loaded API description"
    );
    Ok(api)
}

/// Synthesize and compile every handler-bound endpoint of `api`.
pub fn build_cache(api: &Api, reject_unknown_fields: bool) -> SchemaCache {
    let options = SynthesisOptions {
        reject_unknown_fields,
    };
    SchemaCache::build(api, &options, Arc::new(DefaultLocale))
}
