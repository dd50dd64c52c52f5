//! Route definitions.
//!
//! - `POST /uplink` — ChirpStack webhook
//! - `GET /recipients`, `POST /recipients/add|remove` — admin (token-guarded)
//! - `POST /test/whatsapp` — manual transport check
//! - `GET /health`

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, BridgeState};

/// All application routes.
pub fn api_routes(state: BridgeState) -> Router {
    Router::new()
        .route("/uplink", post(handlers::handle_uplink))
        .route("/recipients", get(handlers::list_recipients))
        .route("/recipients/add", post(handlers::add_recipient))
        .route("/recipients/remove", post(handlers::remove_recipient))
        .route("/test/whatsapp", post(handlers::send_test_message))
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
