//! # Request Validation Middleware
//!
//! Checks each request against the compiled constraint document of the
//! endpoint it matched. The validator is shared through a request
//! extension, the same way the other middleware in this crate receive
//! their state.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequestParts, MatchedPath, RawPathParams, Request};
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Router};
use rqv_core::{Api, Method};
use rqv_schema::{DefaultLocale, ErrorMap, Locale, Outcome, SchemaCache};
use serde_json::Value;

use crate::assemble::{assemble, is_multipart, RawRequest};
use crate::config::ValidatorConfig;
use crate::error::{BodyError, Rejection};
use crate::spool::Spool;
use super::tracing_layer;

#[derive(Debug)]
struct Inner {
    cache: SchemaCache,
    config: ValidatorConfig,
}

/// Shared request validator. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    inner: Arc<Inner>,
}

impl RequestValidator {
    /// Compile every handler-bound endpoint of `api` with English messages.
    pub fn new(api: &Api, config: ValidatorConfig) -> Self {
        Self::with_locale(api, config, Arc::new(DefaultLocale))
    }

    /// Compile every handler-bound endpoint of `api`, rendering messages
    /// through `locale`.
    pub fn with_locale(api: &Api, config: ValidatorConfig, locale: Arc<dyn Locale>) -> Self {
        let cache = SchemaCache::build(api, &config.synthesis_options(), locale);
        Self {
            inner: Arc::new(Inner { cache, config }),
        }
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.inner.cache
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.inner.config
    }

    /// Layer the validation middleware onto `router`.
    pub fn install<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(from_fn(validation_middleware))
            .layer(Extension(self))
    }

    /// [`install`](Self::install), then wrap the result in the request
    /// trace layer.
    pub fn install_traced<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.install(router).layer(tracing_layer::layer())
    }

    /// Validate `request`, returning it with its body restored.
    ///
    /// Requests whose route has no registered handler pass through.
    /// Multipart bodies are spooled (spilling past the multipart memory
    /// ceiling) rather than held against `body_limit`.
    pub async fn check(&self, request: Request) -> Result<Request, Rejection> {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string());
        let method = Method::from_str(request.method().as_str()).ok();

        let schema = match (method, route.as_deref()) {
            (Some(method), Some(route)) => self.inner.cache.resolve(method, route),
            _ => None,
        };
        let Some(schema) = schema else {
            tracing::debug!(
                method = %request.method(),
                route = route.as_deref().unwrap_or("<unmatched>"),
                "no handler registered; skipping validation"
            );
            return Ok(request);
        };
        let schema = Arc::clone(schema);

        let (mut parts, body) = request.into_parts();
        let path_params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(params) => params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            // The route has no placeholders.
            Err(RawPathParamsRejection::MissingPathParams(_)) => Vec::new(),
            Err(e) => {
                tracing::debug!(error = %e, "path parameters could not be decoded");
                return Err(Rejection::MalformedPath);
            }
        };

        let config = &self.inner.config;
        let body = if is_multipart(&parts.headers) {
            Spool::from_body(body, config.multipart_memory_limit).await?
        } else {
            let bytes = axum::body::to_bytes(body, config.body_limit)
                .await
                .map_err(|_| BodyError::Unreadable)?;
            Spool::from(bytes)
        };

        let raw = RawRequest {
            path_params,
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            body,
        };
        let document = assemble(&schema, &raw, config).await?;

        match self.inner.cache.validate(&schema, &Value::Object(document))? {
            Outcome::Valid => {
                let body = raw.body.into_body().await?;
                Ok(Request::from_parts(parts, body))
            }
            Outcome::Invalid(violations) => {
                tracing::debug!(
                    handler = %schema.handler(),
                    violations = violations.len(),
                    "request rejected"
                );
                Err(Rejection::Invalid(ErrorMap::from_violations(&violations)))
            }
        }
    }
}

/// Middleware that validates requests against their endpoint's schema.
///
/// Expects a [`RequestValidator`] extension; without one, requests pass
/// through unchecked.
pub async fn validation_middleware(request: Request, next: Next) -> Response {
    let validator = request.extensions().get::<RequestValidator>().cloned();

    let Some(validator) = validator else {
        return next.run(request).await;
    };

    match validator.check(request).await {
        Ok(request) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}
