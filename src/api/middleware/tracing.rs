//! HTTP request/response tracing middleware.

use std::time::Duration;

use axum::http::Response;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, OnResponse, TraceLayer};
use tracing::{Level, Span};

/// Logs each response at a level derived from its status class:
/// `ERROR` for 5xx, `WARN` for 4xx and `INFO` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassOnResponse;

impl<B> OnResponse<B> for StatusClassOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        let status = response.status().as_u16();
        let latency_ms = latency.as_millis() as u64;

        if response.status().is_server_error() {
            tracing::error!(status, latency_ms, "Server error");
        } else if response.status().is_client_error() {
            tracing::warn!(status, latency_ms, "Client error");
        } else {
            tracing::info!(status, latency_ms, "Finished processing request");
        }
    }
}

/// Creates a tracing middleware for HTTP requests.
///
/// Every request gets an `INFO` span carrying method, URI and version; the
/// response is logged through [`StatusClassOnResponse`].
///
/// ```text
/// INFO request{method=POST uri=/v1/url/create version=HTTP/1.1}: Finished processing request status=201 latency_ms=3
/// WARN request{method=GET uri=/v1/user/token version=HTTP/1.1}: Client error status=401 latency_ms=250
/// ```
pub fn layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    DefaultMakeSpan,
    DefaultOnRequest,
    StatusClassOnResponse,
> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(StatusClassOnResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_on_response_accepts_every_status_class() {
        for status in [StatusCode::OK, StatusCode::NOT_FOUND, StatusCode::BAD_GATEWAY] {
            let response = Response::builder().status(status).body(()).unwrap();
            StatusClassOnResponse.on_response(&response, Duration::from_millis(5), &Span::none());
        }
    }
}
