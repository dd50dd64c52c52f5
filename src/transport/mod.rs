//! Outbound messaging transport.
//!
//! The pipeline only depends on the [`MessageTransport`] capability:
//! `send(from, to, body) → message sid`, which may fail per call. The
//! production implementation talks to the Twilio Messages REST API; tests
//! inject mocks.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::defaults::TRANSPORT_TIMEOUT_SECS;

/// Per-call transport failures. Recorded in the delivery outcome for the
/// affected recipient; never aborts sibling sends.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Twilio returned status {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
}

/// The send capability. One call per recipient.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Send `body` from `from` to `to`; returns the provider's message id.
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<String, TransportError>;
}

/// Twilio Messages REST client.
pub struct TwilioTransport {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
}

/// Successful create-message response (fields we use).
#[derive(Debug, Deserialize)]
struct MessageCreated {
    sid: String,
}

/// Twilio error body shape.
#[derive(Debug, Deserialize)]
struct TwilioApiError {
    message: Option<String>,
}

impl TwilioTransport {
    pub fn new(account_sid: &str, auth_token: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TRANSPORT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        )
    }
}

#[async_trait]
impl MessageTransport for TwilioTransport {
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<String, TransportError> {
        let params = [("From", from), ("To", to), ("Body", body)];

        let resp = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<TwilioApiError>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(TransportError::Api { status, message });
        }

        let created: MessageCreated = resp.json().await?;
        Ok(created.sid)
    }
}
