//! # Request/Response Tracing
//!
//! An `INFO` span per request, with status and latency in microseconds on
//! the response. Validation rejections are answered inside this span, so
//! a 400 from the validator is logged alongside handler responses.
//!
//! Not part of [`RequestValidator::install`](crate::RequestValidator::install):
//! hosts that already trace their router keep their own layer.
//! [`RequestValidator::install_traced`](crate::RequestValidator::install_traced)
//! adds both.

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

/// Trace layer type installed around validated routers.
pub type RequestTrace = TraceLayer<SharedClassifier<ServerErrorsAsFailures>>;

/// Build the trace layer. Install it outside the validation layer.
pub fn layer() -> RequestTrace {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Micros),
        )
}
