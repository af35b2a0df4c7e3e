use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Tags each request with an id, runs it inside a span carrying that id, echoes the id
/// back in `x-request-id`, and logs 4xx/5xx responses with their attached error chain.
pub async fn trace_requests(request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!("request", request_id = %request_id, method = %method, path = %path);
    let start = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let elapsed_ms = start.elapsed().as_millis();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (source, chain) = response
        .extensions_mut()
        .remove::<ErrorReport>()
        .map(|report| (report.source, report.messages))
        .unwrap_or(("unknown", Vec::new()));
    let detail = chain.first().map(String::as_str).unwrap_or("no diagnostic available");

    let _entered = span.enter();
    if status.is_server_error() {
        error!(
            target = "roster::http::response",
            status = status.as_u16(),
            elapsed_ms,
            source,
            detail,
            chain = ?chain,
            "Request failed"
        );
    } else {
        warn!(
            target = "roster::http::response",
            status = status.as_u16(),
            elapsed_ms,
            source,
            detail,
            chain = ?chain,
            "Client request error"
        );
    }

    response
}
