//! # Rejection Responses
//!
//! Why a request was stopped before reaching its handler, and the JSON
//! body sent back.
//!
//! | Rejection        | Status | Body                                                   |
//! |------------------|--------|--------------------------------------------------------|
//! | schema violation | 400    | `{"message": "Validation error", "details": {...}}`    |
//! | malformed body   | 400    | `{"message": "Validation error", "details": {"body": ..}}` |
//! | malformed path   | 400    | `{"message": "Validation error", "details": {"path": ..}}` |
//! | evaluator failure| 500    | `{"message": "swagger document <error>"}`              |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rqv_schema::{ErrorMap, EvaluatorError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The request body could not be turned into a document.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyError {
    /// The body could not be read: transport error, size limit, or a
    /// malformed multipart stream.
    #[error("Failed to read request body")]
    Unreadable,

    /// The body is not valid JSON.
    #[error("Invalid JSON format")]
    InvalidJson,
}

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    /// Field → message map, present for 400 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Why the validator stopped a request.
#[derive(Error, Debug)]
pub enum Rejection {
    /// The assembled document violates the endpoint's constraint document.
    #[error("Validation error")]
    Invalid(ErrorMap),

    /// The body could not be read or parsed.
    #[error("{0}")]
    MalformedBody(#[from] BodyError),

    /// A path parameter is not valid percent-encoded UTF-8.
    #[error("Invalid path parameters")]
    MalformedPath,

    /// The evaluator failed; the request could not be checked.
    #[error("swagger document {0}")]
    Evaluator(#[from] EvaluatorError),
}

impl Rejection {
    fn status(&self) -> StatusCode {
        match self {
            Self::Invalid(_) | Self::MalformedBody(_) | Self::MalformedPath => {
                StatusCode::BAD_REQUEST
            }
            Self::Evaluator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The JSON body sent to the client.
    pub fn body(&self) -> ErrorBody {
        match self {
            Self::Invalid(map) => ErrorBody {
                message: "Validation error".to_string(),
                details: serde_json::to_value(map).ok(),
            },
            Self::MalformedBody(e) => ErrorBody {
                message: "Validation error".to_string(),
                details: Some(serde_json::json!({ "body": e.to_string() })),
            },
            Self::MalformedPath => ErrorBody {
                message: "Validation error".to_string(),
                details: Some(serde_json::json!({ "path": self.to_string() })),
            },
            Self::Evaluator(_) => ErrorBody {
                message: self.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match &self {
            Self::Evaluator(_) => tracing::error!(error = %self, "schema evaluator failed"),
            Self::MalformedBody(e) => tracing::debug!(error = %e, "malformed request body"),
            Self::MalformedPath => tracing::debug!("malformed path parameters"),
            Self::Invalid(map) => tracing::debug!(fields = map.len(), "request failed validation"),
        }
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invalid_renders_details() {
        let mut map = ErrorMap::new();
        map.insert("n", "bad");
        let rejection = Rejection::Invalid(map);
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(rejection.body()).unwrap(),
            json!({"message": "Validation error", "details": {"n": "bad"}})
        );
    }

    #[test]
    fn malformed_body_is_keyed_under_body() {
        let rejection = Rejection::from(BodyError::InvalidJson);
        assert_eq!(
            serde_json::to_value(rejection.body()).unwrap(),
            json!({"message": "Validation error", "details": {"body": "Invalid JSON format"}})
        );
    }

    #[test]
    fn malformed_path_is_keyed_under_path() {
        let rejection = Rejection::MalformedPath;
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(rejection.body()).unwrap(),
            json!({"message": "Validation error", "details": {"path": "Invalid path parameters"}})
        );
    }

    #[test]
    fn evaluator_failure_is_a_server_error() {
        let rejection = Rejection::from(EvaluatorError::Compile("bad ref".into()));
        assert_eq!(rejection.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            serde_json::to_value(rejection.body()).unwrap(),
            json!({"message": "swagger document bad ref"})
        );
    }
}
