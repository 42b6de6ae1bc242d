//! # API Description Model
//!
//! The read-only description of an HTTP API: a list of endpoints, each with
//! its method, path template, ordered parameters and bound handler identity,
//! plus a table of named data models referenced by body schemas.
//!
//! ## Authoring
//!
//! An [`Api`] can be built in code:
//!
//! ```
//! use rqv_core::{Api, Endpoint, Method, Parameter, ParamType};
//!
//! let api = Api::new().endpoint(
//!     Endpoint::new(Method::Get, "/pets/{petId}")
//!         .handler("get_pet")
//!         .parameter(Parameter::path("petId", ParamType::Integer)),
//! );
//! assert_eq!(api.endpoints.len(), 1);
//! ```
//!
//! or loaded from a YAML/JSON description file with [`Api::from_path`]:
//!
//! ```yaml
//! endpoints:
//!   - method: GET
//!     path: /pets/{petId}
//!     handler: get_pet
//!     parameters:
//!       - { name: petId, in: path, type: integer, required: true }
//! definitions:
//!   Pet:
//!     required: [name]
//!     properties:
//!       name: { type: string }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::Model;
use crate::parameter::{Location, Parameter};

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
    Connect,
}

impl Method {
    /// All methods, in the order endpoints are walked on a path.
    pub const ALL: [Method; 9] = [
        Method::Delete,
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Head,
        Method::Options,
        Method::Trace,
        Method::Connect,
    ];

    /// Upper-case wire name (`"GET"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = CoreError;

    /// Parse a method name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownMethod(s.to_string()))
    }
}

impl TryFrom<String> for Method {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

/// Explicit, caller-supplied identity of the handler bound to an endpoint.
///
/// Used as the schema cache key. Cloning is cheap (shared string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(Arc<str>);

impl HandlerId {
    /// Create a handler identity from any string-like token.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for HandlerId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// One operation of the API: a method on a path template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// HTTP method.
    pub method: Method,
    /// Path template with `{name}` placeholders, e.g. `/pets/{petId}`.
    pub path: String,
    /// Handler bound to this endpoint. Endpoints without one are not validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<HandlerId>,
    /// Ordered parameters, including the body parameter if any.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Endpoint {
    /// Create an endpoint with no parameters and no handler bound.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            handler: None,
            parameters: Vec::new(),
        }
    }

    /// Bind a handler identity.
    pub fn handler(mut self, id: impl Into<HandlerId>) -> Self {
        self.handler = Some(id.into());
        self
    }

    /// Append a parameter.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Append several parameters in order.
    pub fn parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Names of the `{placeholders}` in the path template, in order.
    pub fn path_placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.path.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    names.push(&after[..end]);
                    rest = &after[end + 1..];
                }
                None => break,
            }
        }
        names
    }

    /// Check that the endpoint is structurally usable.
    ///
    /// The path must be absolute and every `path` parameter must name a
    /// placeholder of the template.
    pub fn check(&self) -> Result<(), CoreError> {
        let invalid = |reason: String| CoreError::InvalidEndpoint {
            method: self.method.to_string(),
            path: self.path.clone(),
            reason,
        };

        if !self.path.starts_with('/') {
            return Err(invalid("path template must start with '/'".to_string()));
        }

        let placeholders = self.path_placeholders();
        for p in self.parameters.iter().filter(|p| p.location == Location::Path) {
            if !placeholders.contains(&p.name.as_str()) {
                return Err(invalid(format!(
                    "path parameter '{}' does not appear in the path template",
                    p.name
                )));
            }
        }
        Ok(())
    }
}

/// A complete API description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Api {
    /// Every declared endpoint.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Named data models referenced by body schemas as `#/definitions/<name>`.
    #[serde(default)]
    pub definitions: BTreeMap<String, Model>,
}

impl Api {
    /// Create an empty API description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an endpoint.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Register a named data model.
    pub fn definition(mut self, name: impl Into<String>, model: Model) -> Self {
        self.definitions.insert(name.into(), model);
        self
    }

    /// Parse a YAML description and check every endpoint.
    pub fn from_yaml_str(source: &str) -> Result<Self, CoreError> {
        let api: Api = serde_yaml::from_str(source)?;
        api.check()?;
        Ok(api)
    }

    /// Parse a JSON description and check every endpoint.
    pub fn from_json_str(source: &str) -> Result<Self, CoreError> {
        let api: Api = serde_json::from_str(source)?;
        api.check()?;
        Ok(api)
    }

    /// Load a description file. `.yaml`/`.yml` files are parsed as YAML,
    /// anything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Check every endpoint, stopping at the first structural error.
    pub fn check(&self) -> Result<(), CoreError> {
        self.endpoints.iter().try_for_each(Endpoint::check)
    }

    /// Look up the endpoint for a method and path template.
    pub fn find(&self, method: Method, path: &str) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|e| e.method == method && e.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParamType;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("PoSt".parse::<Method>().unwrap(), Method::Post);
        assert!(matches!(
            "FETCH".parse::<Method>(),
            Err(CoreError::UnknownMethod(_))
        ));
    }

    #[test]
    fn method_serializes_upper_case() {
        let json = serde_json::to_string(&Method::Patch).unwrap();
        assert_eq!(json, "\"PATCH\"");
    }

    #[test]
    fn handler_id_equality_is_by_value() {
        assert_eq!(HandlerId::new("get_pet"), HandlerId::from("get_pet".to_string()));
        assert_ne!(HandlerId::new("get_pet"), HandlerId::new("post_pet"));
    }

    #[test]
    fn placeholders_are_extracted_in_order() {
        let e = Endpoint::new(Method::Get, "/a/{first}/b/{second}");
        assert_eq!(e.path_placeholders(), vec!["first", "second"]);
    }

    #[test]
    fn check_rejects_undeclared_path_parameter() {
        let e = Endpoint::new(Method::Get, "/pets")
            .parameter(Parameter::path("petId", ParamType::Integer));
        let err = e.check().unwrap_err();
        assert!(err.to_string().contains("petId"), "got: {err}");
    }

    #[test]
    fn check_rejects_relative_path() {
        let e = Endpoint::new(Method::Get, "pets");
        assert!(matches!(e.check(), Err(CoreError::InvalidEndpoint { .. })));
    }

    #[test]
    fn yaml_description_loads() {
        let yaml = r#"
endpoints:
  - method: get
    path: /pets/{petId}
    handler: get_pet
    parameters:
      - { name: petId, in: path, type: integer, required: true }
      - { name: limit, in: query, type: integer, format: int64 }
definitions:
  Pet:
    required: [name]
    properties:
      name: { type: string, minLength: 1 }
"#;
        let api = Api::from_yaml_str(yaml).unwrap();
        let endpoint = api.find(Method::Get, "/pets/{petId}").unwrap();
        assert_eq!(endpoint.handler.as_ref().unwrap().as_str(), "get_pet");
        assert_eq!(endpoint.parameters.len(), 2);
        assert_eq!(api.definitions["Pet"].required, vec!["name".to_string()]);
    }

    #[test]
    fn json_description_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.json");
        std::fs::write(
            &path,
            r#"{"endpoints": [{"method": "POST", "path": "/pets", "handler": "post_pet"}]}"#,
        )
        .unwrap();
        let api = Api::from_path(&path).unwrap();
        assert_eq!(api.endpoints[0].method, Method::Post);
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let err = Api::from_yaml_str("endpoints: [ {method: BREW, path: /pot} ]").unwrap_err();
        assert!(matches!(err, CoreError::Yaml(_)), "got: {err}");
    }
}
