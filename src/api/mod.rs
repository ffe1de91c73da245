//! HTTP surface: handlers and the router that wires them up.

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

pub mod handlers {
    pub use crate::handlers::*;
}

/// Contact form payloads are small; anything larger is refused.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Builds the application router with CORS, tracing and body limits.
pub fn router(state: Arc<crate::handlers::AppState>) -> Router {
    // The website posts cross-origin from the browser
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/contact", post(handlers::submit_contact))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
