//! Request logging middleware

use axum::body::Body;
use axum::http::{Request, Response};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Span};

/// HTTP trace layer: one span per request, completion logged with status and latency
pub fn http_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> Span + Clone,
    (),
    impl Fn(&Response<Body>, Duration, &Span) + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        })
        .on_request(())
        .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
            let status = response.status();
            if status.is_server_error() {
                warn!(status = status.as_u16(), latency_ms = latency.as_millis() as u64, "Request failed");
            } else {
                info!(status = status.as_u16(), latency_ms = latency.as_millis() as u64, "Request completed");
            }
        })
}
