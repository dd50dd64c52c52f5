//! HTTP surface using Axum.
//!
//! Thin coordination scaffolding around the pipeline: the webhook endpoint,
//! the JSON recipient admin API, and a health check.

pub mod handlers;
mod routes;

pub use handlers::BridgeState;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::defaults::MAX_BODY_BYTES;

/// Same-origin-only CORS; the service has no browser frontend.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Create the complete application router.
pub fn create_app(state: BridgeState) -> Router {
    Router::new()
        .merge(routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(build_cors_layer())
}
