//! HTTP request handlers.
//!
//! The uplink webhook reads its body as raw bytes so a non-JSON payload
//! maps to the documented `{ok:false, error}` shape instead of an axum
//! extractor rejection. Admin endpoints use plain JSON extractors.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::defaults::RAW_LOG_MAX_CHARS;
use crate::config::BridgeConfig;
use crate::pipeline::UplinkProcessor;
use crate::recipients::{RecipientRegistry, RegistryError};
use crate::transport::MessageTransport;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct BridgeState {
    pub processor: Arc<UplinkProcessor>,
    pub registry: Arc<RecipientRegistry>,
    pub transport: Option<Arc<dyn MessageTransport>>,
    pub whatsapp_from: Option<String>,
    pub webhook_secret: Option<String>,
    pub admin_token: Option<String>,
}

impl BridgeState {
    pub fn new(config: &BridgeConfig, transport: Option<Arc<dyn MessageTransport>>) -> Self {
        let registry = Arc::new(RecipientRegistry::new(config.initial_recipients.clone()));
        let processor = Arc::new(UplinkProcessor::new(
            Arc::clone(&registry),
            transport.clone(),
            config.whatsapp_from.clone(),
            config.signature_enabled,
        ));
        Self {
            processor,
            registry,
            transport,
            whatsapp_from: config.whatsapp_from.clone(),
            webhook_secret: config.webhook_secret.clone(),
            admin_token: config.admin_token.clone(),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Enforce the admin token when one is configured. Accepts the token via
/// the `x-admin-token` header or a `token` query parameter.
fn require_admin(
    state: &BridgeState,
    headers: &HeaderMap,
    params: &HashMap<String, String>,
) -> Result<(), Response> {
    let Some(expected) = &state.admin_token else {
        return Ok(());
    };
    let got = header_str(headers, "x-admin-token").or_else(|| params.get("token").map(String::as_str));
    if got == Some(expected.as_str()) {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "Unauthorized").into_response())
    }
}

// ============================================================================
// Uplink webhook
// ============================================================================

/// `POST /uplink` — the network server webhook.
pub async fn handle_uplink(
    State(state): State<BridgeState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = &state.webhook_secret {
        let got = header_str(&headers, "x-secret").unwrap_or("");
        if got != secret {
            warn!("webhook rejected: invalid x-secret");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "ok": false, "error": "unauthorized" })),
            )
                .into_response();
        }
    }

    // Transport-level event label (up, join, ack...). Informational only.
    let event_tag = params
        .get("event")
        .cloned()
        .or_else(|| header_str(&headers, "x-event").map(ToString::to_string))
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "up".to_string());

    let parsed: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "webhook body is not valid JSON");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": format!("malformed payload: {e}") })),
            )
                .into_response();
        }
    };

    if tracing::enabled!(tracing::Level::DEBUG) {
        let raw: String = parsed.to_string().chars().take(RAW_LOG_MAX_CHARS).collect();
        debug!(raw = %raw, "raw uplink");
    }

    let ack = state.processor.process(&parsed, &event_tag).await;
    Json(ack.into_value()).into_response()
}

// ============================================================================
// Recipient administration
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecipientRequest {
    pub to: String,
}

/// `GET /recipients` — effective recipient list with fixed markers.
pub async fn list_recipients(
    State(state): State<BridgeState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers, &params) {
        return resp;
    }

    let recipients: Vec<Value> = state
        .registry
        .effective()
        .into_iter()
        .map(|addr| {
            json!({
                "address": addr,
                "fixed": RecipientRegistry::is_fixed(&addr),
            })
        })
        .collect();

    Json(json!({ "recipients": recipients })).into_response()
}

/// `POST /recipients/add`
pub async fn add_recipient(
    State(state): State<BridgeState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<RecipientRequest>,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers, &params) {
        return resp;
    }

    match state.registry.add(&req.to) {
        Ok(addr) => {
            info!(address = %addr, "recipient added");
            Json(json!({ "ok": true, "address": addr })).into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// `POST /recipients/remove`
pub async fn remove_recipient(
    State(state): State<BridgeState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<RecipientRequest>,
) -> Response {
    if let Err(resp) = require_admin(&state, &headers, &params) {
        return resp;
    }

    match state.registry.remove(&req.to) {
        Ok(()) => {
            info!(address = %req.to, "recipient removed");
            Json(json!({ "ok": true })).into_response()
        }
        Err(e) => {
            let status = match e {
                RegistryError::NotFound => StatusCode::NOT_FOUND,
                RegistryError::Protected | RegistryError::InvalidAddress => {
                    StatusCode::BAD_REQUEST
                }
            };
            (status, Json(json!({ "ok": false, "error": e.to_string() }))).into_response()
        }
    }
}

// ============================================================================
// Test send + health
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct TestSendRequest {
    pub to: Option<String>,
    pub body: Option<String>,
}

/// `POST /test/whatsapp` — manual end-to-end transport check.
pub async fn send_test_message(State(state): State<BridgeState>, body: Bytes) -> Response {
    let req: TestSendRequest = serde_json::from_slice(&body).unwrap_or_default();

    let Some(transport) = &state.transport else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "ok": false,
                "error": "Twilio no está configurado (TWILIO_SID/TWILIO_TOKEN)"
            })),
        )
            .into_response();
    };

    let to = req
        .to
        .or_else(|| state.registry.effective().into_iter().next())
        .unwrap_or_default();
    if !to.starts_with("whatsapp:") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Falta 'to' (formato whatsapp:+57...)" })),
        )
            .into_response();
    }
    let Some(from) = &state.whatsapp_from else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Falta WHATSAPP_FROM" })),
        )
            .into_response();
    };

    let text = req.body.unwrap_or_else(|| "Mensaje de prueba ✅".to_string());
    match transport.send(from, &to, &text).await {
        Ok(sid) => {
            info!(to = %to, sid = %sid, "test message sent");
            Json(json!({ "ok": true, "sid": sid })).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// `GET /health`
pub async fn health_check() -> &'static str {
    "ok"
}
