//! Uplink webhook regression tests.
//!
//! In-process tests that build the Axum app via `create_app()` and drive the
//! full pipeline with `tower::ServiceExt::oneshot()`, using a recording mock
//! transport. No binary spawn, no network port.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use demito_bridge::api::{create_app, BridgeState};
use demito_bridge::config::BridgeConfig;
use demito_bridge::transport::{MessageTransport, TransportError};

/// Records every send; optionally fails for selected recipients.
struct MockTransport {
    sent: Mutex<Vec<(String, String)>>,
    fail_on: Vec<String>,
}

impl MockTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail_on: Vec::new(),
        })
    }

    fn failing_on(to: &str) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail_on: vec![to.to_string()],
        })
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(&self, _from: &str, to: &str, body: &str) -> Result<String, TransportError> {
        if self.fail_on.iter().any(|f| f == to) {
            return Err(TransportError::Api {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                message: "downstream unavailable".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), body.to_string()));
        Ok(format!("SM{}", sent.len()))
    }
}

fn test_config() -> BridgeConfig {
    BridgeConfig {
        whatsapp_from: Some("whatsapp:+14155238886".to_string()),
        initial_recipients: vec!["3001112233".to_string()],
        ..BridgeConfig::default()
    }
}

fn app_with(config: BridgeConfig, transport: Arc<MockTransport>) -> Router {
    create_app(BridgeState::new(
        &config,
        Some(transport as Arc<dyn MessageTransport>),
    ))
}

fn uplink_request(body: &Value) -> Request<Body> {
    Request::post("/uplink")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn wall_remove_uplink() -> Value {
    json!({
        "deviceInfo": { "devEui": "ffffff100004f749", "deviceName": "boton-1" },
        "fCnt": 10,
        "object": { "event": "wall_remove", "battery_mv": 3700 },
        "rxInfo": [
            { "gatewayId": "gw-1", "snr": 7.5,
              "location": { "latitude": 4.6, "longitude": -74.08 } }
        ]
    })
}

#[tokio::test]
async fn test_wall_remove_end_to_end() {
    let transport = MockTransport::new();
    let app = app_with(test_config(), transport.clone());

    let resp = app.oneshot(uplink_request(&wall_remove_uplink())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["ok"], true);
    let sent = v["sent"].as_array().unwrap();
    assert_eq!(sent.len(), 2);
    for outcome in sent {
        assert_eq!(outcome["ok"], true);
        assert!(outcome["sid"].as_str().unwrap().starts_with("SM"));
    }
    // Deterministic (sorted) recipient order: dynamic number sorts first.
    assert_eq!(sent[0]["to"], "whatsapp:+573001112233");
    assert_eq!(sent[1]["to"], "whatsapp:+573134991467");

    let messages = transport.sent.lock().unwrap();
    assert!(messages[0].1.contains("Casa Triángulo"));
    assert!(messages[0].1.contains("Batería: 3.70 V"));
    assert!(messages[0].1.contains("https://maps.google.com/?q=4.6,-74.08"));
}

#[tokio::test]
async fn test_partial_send_failure_is_reported_per_recipient() {
    let transport = MockTransport::failing_on("whatsapp:+573001112233");
    let app = app_with(test_config(), transport.clone());

    let resp = app.oneshot(uplink_request(&wall_remove_uplink())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    let sent = v["sent"].as_array().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["ok"], false);
    assert!(sent[0]["error"].as_str().unwrap().contains("downstream unavailable"));
    assert_eq!(sent[1]["ok"], true);
}

#[tokio::test]
async fn test_alive_is_acknowledged_without_sending() {
    let transport = MockTransport::new();
    let app = app_with(test_config(), transport.clone());

    let body = json!({
        "deviceInfo": { "devEui": "ffffff100004f737" },
        "object": { "event": "alive" }
    });
    let resp = app.oneshot(uplink_request(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["ok"], true);
    assert_eq!(v["skipped"], "alive");
    assert_eq!(transport.sent_count(), 0);
}

#[tokio::test]
async fn test_duplicate_panic_suppressed_across_requests() {
    let transport = MockTransport::new();
    let state = BridgeState::new(
        &test_config(),
        Some(transport.clone() as Arc<dyn MessageTransport>),
    );

    let body = json!({
        "deviceInfo": { "devEui": "aa01" },
        "fCnt": 5,
        "object": { "event": "panic" }
    });

    let resp = create_app(state.clone())
        .oneshot(uplink_request(&body))
        .await
        .unwrap();
    let v = json_body(resp).await;
    assert!(v.get("sent").is_some());

    // Same frame count again — radio-layer retransmission.
    let resp = create_app(state)
        .oneshot(uplink_request(&body))
        .await
        .unwrap();
    let v = json_body(resp).await;
    assert_eq!(v["skipped"], "panic dedup");
    assert_eq!(transport.sent_count(), 2); // two recipients, one alert
}

#[tokio::test]
async fn test_secret_mismatch_is_unauthorized() {
    let config = BridgeConfig {
        webhook_secret: Some("hook-secret".to_string()),
        ..test_config()
    };
    let transport = MockTransport::new();
    let app = app_with(config, transport.clone());

    let req = Request::post("/uplink")
        .header("content-type", "application/json")
        .header("x-secret", "wrong")
        .body(Body::from(wall_remove_uplink().to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let v = json_body(resp).await;
    assert_eq!(v["ok"], false);
    assert_eq!(v["error"], "unauthorized");
    assert_eq!(transport.sent_count(), 0);
}

#[tokio::test]
async fn test_correct_secret_is_accepted() {
    let config = BridgeConfig {
        webhook_secret: Some("hook-secret".to_string()),
        ..test_config()
    };
    let app = app_with(config, MockTransport::new());

    let req = Request::post("/uplink")
        .header("content-type", "application/json")
        .header("x-secret", "hook-secret")
        .body(Body::from(wall_remove_uplink().to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let app = app_with(test_config(), MockTransport::new());

    let req = Request::post("/uplink")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let v = json_body(resp).await;
    assert_eq!(v["ok"], false);
    assert!(v["error"].as_str().unwrap().contains("malformed payload"));
}

#[tokio::test]
async fn test_recipient_admin_flow() {
    let state = BridgeState::new(&test_config(), None);

    // Add an invalid address.
    let resp = create_app(state.clone())
        .oneshot(
            Request::post("/recipients/add")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "to": "abc" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Removing the fixed recipient is always rejected.
    let resp = create_app(state.clone())
        .oneshot(
            Request::post("/recipients/remove")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "to": "whatsapp:+573134991467" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Removing an absent address is distinct from success.
    let resp = create_app(state.clone())
        .oneshot(
            Request::post("/recipients/remove")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "to": "+573009998877" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Add then list.
    let resp = create_app(state.clone())
        .oneshot(
            Request::post("/recipients/add")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "to": "3009998877" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert_eq!(v["address"], "whatsapp:+573009998877");

    let resp = create_app(state)
        .oneshot(Request::get("/recipients").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v = json_body(resp).await;
    let listed = v["recipients"].as_array().unwrap();
    assert!(listed.iter().any(|r| {
        r["address"] == "whatsapp:+573134991467" && r["fixed"] == true
    }));
    assert!(listed.iter().any(|r| {
        r["address"] == "whatsapp:+573009998877" && r["fixed"] == false
    }));
}

#[tokio::test]
async fn test_transport_unconfigured_warns_softly() {
    let app = create_app(BridgeState::new(&test_config(), None));

    let resp = app.oneshot(uplink_request(&wall_remove_uplink())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["ok"], true);
    assert_eq!(v["warn"], "twilio not configured");
}
