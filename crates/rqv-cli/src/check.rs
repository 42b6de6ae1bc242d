//! # Check Subcommand
//!
//! Validates a request document (the JSON object the middleware would
//! assemble) against one handler's constraint document and prints either
//! `valid` or the field → message error map.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use rqv_core::HandlerId;
use rqv_schema::{ErrorMap, Outcome};
use serde_json::Value;

/// Arguments for the `rqv check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// API description file (YAML or JSON).
    #[arg(value_name = "API")]
    pub api: PathBuf,

    /// Handler whose constraint document to check against.
    #[arg(long)]
    pub handler: String,

    /// Request document (JSON).
    #[arg(long)]
    pub document: PathBuf,

    /// Synthesize with `additionalProperties: false`.
    #[arg(long)]
    pub reject_unknown_fields: bool,
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 when the document is valid, 1 on violations.
pub fn run_check(args: &CheckArgs, out: &mut impl Write) -> Result<u8> {
    let api = crate::load_api(&args.api)?;
    let cache = crate::build_cache(&api, args.reject_unknown_fields);

    let Some(schema) = cache.get(&HandlerId::new(&args.handler)) else {
        bail!("no endpoint is bound to handler '{}'", args.handler);
    };

    let raw = std::fs::read_to_string(&args.document)
        .with_context(|| format!("failed to read {}", args.document.display()))?;
    let document: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.document.display()))?;

    match cache
        .validate(schema, &document)
        .with_context(|| format!("swagger document for handler '{}'", args.handler))?
    {
        Outcome::Valid => {
            writeln!(out, "valid")?;
            Ok(0)
        }
        Outcome::Invalid(violations) => {
            let map = ErrorMap::from_violations(&violations);
            writeln!(out, "{}", serde_json::to_string_pretty(&map)?)?;
            Ok(1)
        }
    }
}
