use std::time::Duration;

use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use opentelemetry::KeyValue;
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::Span;

use super::metrics::{HTTP_REQUEST_DURATION, HTTP_REQUESTS_TOTAL};

/// Opens one server span per request, named after the matched route
/// template so `/api/cases` requests share a span name.
#[derive(Clone, Copy, Default)]
pub struct HttpMakeSpan;

impl<B> MakeSpan<B> for HttpMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method().as_str();
        let route = route_of(request);

        tracing::info_span!(
            "HTTP request",
            otel.name = %format!("{method} {route}"),
            otel.kind = "server",
            http.request.method = %method,
            http.route = %route,
            url.path = %request.uri().path(),
            user_agent.original = request
                .headers()
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            http.response.status_code = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
        )
    }
}

/// Records status on the request span and feeds the HTTP instruments.
#[derive(Clone, Copy, Default)]
pub struct HttpOnResponse;

impl<B> OnResponse<B> for HttpOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status().as_u16();
        span.record("http.response.status_code", i64::from(status));
        span.record("otel.status_code", if status >= 500 { "ERROR" } else { "OK" });

        let latency_ms = latency.as_secs_f64() * 1000.0;
        let attributes = status_attributes(status);
        HTTP_REQUESTS_TOTAL.add(1, &attributes);
        HTTP_REQUEST_DURATION.record(latency_ms, &attributes);

        tracing::info!(
            http.response.status_code = status,
            latency_ms,
            "finished processing request"
        );
    }
}

fn route_of<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

fn status_attributes(status: u16) -> [KeyValue; 2] {
    [
        KeyValue::new("http.response.status_code", i64::from(status)),
        KeyValue::new("http.status_class", format!("{}xx", status / 100)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_status_attributes() {
        let attrs = status_attributes(404);
        assert_eq!(attrs[0].value.as_str(), "404");
        assert_eq!(attrs[1].value.as_str(), "4xx");
    }

    #[test]
    fn test_route_falls_back_to_path() {
        let request = Request::get("/api/cases?draft=1").body(Body::empty()).unwrap();
        assert_eq!(route_of(&request), "/api/cases");
    }
}
