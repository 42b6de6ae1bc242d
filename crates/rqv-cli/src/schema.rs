//! # Schema Subcommand
//!
//! Prints the constraint document synthesized for one handler, or a
//! handler-keyed object of all of them.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use rqv_core::HandlerId;
use serde_json::{Map, Value};

/// Arguments for the `rqv schema` subcommand.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// API description file (YAML or JSON).
    #[arg(value_name = "API")]
    pub api: PathBuf,

    /// Print only this handler's document.
    #[arg(long)]
    pub handler: Option<String>,

    /// Synthesize with `additionalProperties: false`.
    #[arg(long)]
    pub reject_unknown_fields: bool,
}

/// Execute the schema subcommand, writing JSON to `out`.
pub fn run_schema(args: &SchemaArgs, out: &mut impl Write) -> Result<u8> {
    let api = crate::load_api(&args.api)?;
    let cache = crate::build_cache(&api, args.reject_unknown_fields);

    let rendered = match &args.handler {
        Some(handler) => {
            let Some(schema) = cache.get(&HandlerId::new(handler)) else {
                bail!("no endpoint is bound to handler '{handler}'");
            };
            schema.raw().clone()
        }
        None => {
            let mut all = Map::new();
            for handler in cache.handlers() {
                if let Some(schema) = cache.get(handler) {
                    all.insert(handler.to_string(), schema.raw().clone());
                }
            }
            Value::Object(all)
        }
    };

    writeln!(out, "{}", serde_json::to_string_pretty(&rendered)?)?;
    Ok(0)
}
