//! Per-request rate limiting, security headers and access logging.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};

use super::client_ip::client_ip;
use super::error::ApiError;
use super::AppState;

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

/// Admit or reject the request, then decorate and log admitted responses.
pub async fn guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(req.headers(), peer);
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    if state.rate_limiting_enabled && !state.limiter.allow(&client) {
        warn!(
            client = %client,
            method = %method,
            path = %path,
            "Request rejected by rate limiter"
        );
        return rejection(&state);
    }

    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    info!(
        client = %client,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency = ?start.elapsed(),
        "Request handled"
    );

    response
}

fn rejection(state: &AppState) -> Response {
    let retry_after = state.limiter.config().window.as_secs().max(1);
    let mut response = ApiError::too_many_requests().into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
