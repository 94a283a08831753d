use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::{auth::Viewer, error::ErrorReport};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const SERVER_TIMING_HEADER: &str = "server-timing";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Tags the request with an id, reusing a well-formed incoming
/// `x-request-id`, and echoes it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map(str::to_string);
    let request_id = incoming.unwrap_or_else(|| Uuid::new_v4().to_string());
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

pub async fn server_timing(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("total;dur={elapsed:.3}")) {
        response.headers_mut().insert(SERVER_TIMING_HEADER, value);
    }
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let viewer = request
        .extensions()
        .get::<Viewer>()
        .copied()
        .unwrap_or_default();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    if status.is_success() || status.is_redirection() || status.is_informational() {
        return response;
    }

    let elapsed_ms = start.elapsed().as_millis();
    let (source, messages) = response
        .extensions_mut()
        .remove::<ErrorReport>()
        .map(|report| (report.source, report.messages))
        .unwrap_or(("unreported", Vec::new()));

    if status.is_server_error() {
        error!(
            target = "inkpad::http::response",
            status = status.as_u16(),
            %method,
            path,
            elapsed_ms,
            source,
            chain = ?messages,
            request_id,
            viewer_uid = ?viewer.uid,
            admin = viewer.admin,
            "Request failed"
        );
    } else {
        warn!(
            target = "inkpad::http::response",
            status = status.as_u16(),
            %method,
            path,
            elapsed_ms,
            source,
            chain = ?messages,
            request_id,
            viewer_uid = ?viewer.uid,
            admin = viewer.admin,
            "Request rejected"
        );
    }

    response
}
