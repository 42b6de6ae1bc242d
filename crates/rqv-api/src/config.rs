//! Request-validator configuration.
//!
//! Defaults suit most services. Override via environment variables or
//! explicit construction.

use rqv_schema::SynthesisOptions;
use serde::{Deserialize, Serialize};

/// In-memory ceiling for multipart text values (1 MiB).
pub const DEFAULT_MULTIPART_MEMORY_LIMIT: usize = 1024 * 1024;

/// Largest body buffered for assembly and replay (16 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Configuration for [`RequestValidator`](crate::RequestValidator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Bytes of a multipart body kept in memory; the rest spills to a
    /// temporary file. Also the ceiling on multipart text values, past
    /// which the request is rejected as unreadable. File contents never
    /// count against it.
    pub multipart_memory_limit: usize,
    /// Bytes of a JSON or url-encoded body buffered. Larger bodies are
    /// rejected as unreadable. Multipart bodies are not bound by it.
    pub body_limit: usize,
    /// Reject request fields no parameter declares.
    pub reject_unknown_fields: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            multipart_memory_limit: DEFAULT_MULTIPART_MEMORY_LIMIT,
            body_limit: DEFAULT_BODY_LIMIT,
            reject_unknown_fields: false,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `RQV_BODY_LIMIT` (default: 16 MiB)
    /// - `RQV_MULTIPART_MEMORY_LIMIT` (default: 1 MiB)
    /// - `RQV_REJECT_UNKNOWN_FIELDS` (default: `false`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            body_limit: parse_var(&lookup, "RQV_BODY_LIMIT", defaults.body_limit)?,
            multipart_memory_limit: parse_var(
                &lookup,
                "RQV_MULTIPART_MEMORY_LIMIT",
                defaults.multipart_memory_limit,
            )?,
            reject_unknown_fields: parse_var(
                &lookup,
                "RQV_REJECT_UNKNOWN_FIELDS",
                defaults.reject_unknown_fields,
            )?,
        })
    }

    /// Options handed to schema synthesis.
    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            reject_unknown_fields: self.reject_unknown_fields,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(var.to_string(), raw, e.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?} ({2})")]
    InvalidValue(String, String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = ValidatorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ValidatorConfig::default());
        assert_eq!(cfg.multipart_memory_limit, 1024 * 1024);
    }

    #[test]
    fn variables_override_defaults() {
        let cfg = ValidatorConfig::from_lookup(lookup(&[
            ("RQV_BODY_LIMIT", "2048"),
            ("RQV_REJECT_UNKNOWN_FIELDS", "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.body_limit, 2048);
        assert!(cfg.reject_unknown_fields);
        assert!(cfg.synthesis_options().reject_unknown_fields);
    }

    #[test]
    fn invalid_value_is_rejected() {
        let err = ValidatorConfig::from_lookup(lookup(&[("RQV_BODY_LIMIT", "lots")])).unwrap_err();
        assert!(err.to_string().contains("RQV_BODY_LIMIT"), "got: {err}");
    }

    #[test]
    fn deserializes_partial_documents() {
        let cfg: ValidatorConfig = serde_json::from_str(r#"{"body_limit": 10}"#).unwrap();
        assert_eq!(cfg.body_limit, 10);
        assert_eq!(cfg.multipart_memory_limit, DEFAULT_MULTIPART_MEMORY_LIMIT);
    }
}
