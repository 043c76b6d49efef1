//! HTTP front end: routes, rate-limit middleware and the server.

mod calc;
mod client_ip;
mod error;
mod form;
mod handlers;
mod middleware;
mod server;

pub use client_ip::{client_ip, UNKNOWN_CLIENT};
pub use error::{ApiError, ErrorResponse};
pub use form::{sanitize, validate, FormData, FormResponse, ValidationError};
pub use handlers::{HealthResponse, HELLO_MESSAGE, SERVICE_NAME};
pub use server::HttpServer;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;

use crate::ratelimit::RateLimiter;

/// State shared by every handler and the middleware.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    /// When false, requests bypass the limiter entirely
    pub rate_limiting_enabled: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(limiter: Arc<RateLimiter>, rate_limiting_enabled: bool) -> Self {
        Self {
            limiter,
            rate_limiting_enabled,
            started_at: Instant::now(),
        }
    }
}

/// Build the application router with the rate-limit layer around every route,
/// the not-found fallback included.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/hello", get(handlers::hello).fallback(handlers::get_only))
        .route("/health", get(handlers::health).fallback(handlers::get_only))
        .route("/form", post(form::submit).fallback(handlers::post_only))
        .route("/multiply", get(calc::multiply).fallback(handlers::get_only))
        .route("/divide", get(calc::divide).fallback(handlers::get_only))
        .route("/factorial", get(calc::factorial).fallback(handlers::get_only))
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::guard,
        ))
        .with_state(state)
}
