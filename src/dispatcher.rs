//! Alert fan-out.
//!
//! Sends the rendered message to every effective recipient. A failure for
//! one recipient never aborts delivery to the rest; each attempt produces
//! its own outcome, in the same order as the input recipient list. Only
//! total misconfiguration (no transport, no sender address, nobody to send
//! to) short-circuits before any attempt — and even that is a soft warning,
//! because the uplink itself was valid.

use tracing::{info, warn};

use crate::transport::MessageTransport;
use crate::types::DeliveryOutcome;

/// Warning reason when the transport cannot be used at all.
const NOT_CONFIGURED: &str = "twilio not configured";

/// Result of one fan-out attempt.
#[derive(Debug)]
pub enum DispatchReport {
    /// No send was attempted; credentials, sender, or recipients missing.
    NotConfigured { warn: String },
    /// One outcome per recipient, mirroring input order.
    Sent(Vec<DeliveryOutcome>),
}

/// Deliver `body` to every recipient, isolating per-recipient failures.
pub async fn deliver(
    transport: Option<&dyn MessageTransport>,
    from: Option<&str>,
    recipients: &[String],
    body: &str,
) -> DispatchReport {
    let (Some(transport), Some(from)) = (transport, from) else {
        warn!("not dispatching: Twilio credentials or sender address missing");
        return DispatchReport::NotConfigured {
            warn: NOT_CONFIGURED.to_string(),
        };
    };
    if recipients.is_empty() {
        warn!("not dispatching: recipient list is empty");
        return DispatchReport::NotConfigured {
            warn: NOT_CONFIGURED.to_string(),
        };
    }

    let mut outcomes = Vec::with_capacity(recipients.len());
    for to in recipients {
        match transport.send(from, to, body).await {
            Ok(sid) => {
                info!(to = %to, sid = %sid, "WhatsApp sent");
                outcomes.push(DeliveryOutcome::sent(to, sid));
            }
            Err(e) => {
                warn!(to = %to, error = %e, "WhatsApp send failed");
                outcomes.push(DeliveryOutcome::failed(to, e.to_string()));
            }
        }
    }

    DispatchReport::Sent(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Transport that fails for selected recipients and records every call.
    struct FlakyTransport {
        fail_on: Vec<String>,
        calls: Mutex<Vec<String>>,
        counter: AtomicUsize,
    }

    impl FlakyTransport {
        fn new(fail_on: &[&str]) -> Self {
            Self {
                fail_on: fail_on.iter().map(ToString::to_string).collect(),
                calls: Mutex::new(Vec::new()),
                counter: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MessageTransport for FlakyTransport {
        async fn send(&self, _from: &str, to: &str, _body: &str) -> Result<String, TransportError> {
            self.calls.lock().unwrap().push(to.to_string());
            if self.fail_on.iter().any(|f| f == to) {
                return Err(TransportError::Api {
                    status: reqwest::StatusCode::BAD_REQUEST,
                    message: "unreachable".to_string(),
                });
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("SM{n}"))
        }
    }

    fn recipients(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("whatsapp:+5730000000{i:02}")).collect()
    }

    #[tokio::test]
    async fn test_middle_failure_does_not_abort_siblings() {
        let list = recipients(3);
        let transport = FlakyTransport::new(&[list[1].as_str()]);

        let report = deliver(Some(&transport), Some("whatsapp:+10000000000"), &list, "hola").await;

        let DispatchReport::Sent(outcomes) = report else {
            panic!("expected Sent report");
        };
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].ok);
        assert!(!outcomes[1].ok);
        assert!(outcomes[1].error.as_deref().unwrap().contains("unreachable"));
        assert!(outcomes[2].ok);

        // All three recipients were attempted, in order.
        let calls = transport.calls.lock().unwrap();
        assert_eq!(*calls, list);
    }

    #[tokio::test]
    async fn test_outcome_order_mirrors_input_order() {
        let list = recipients(3);
        let transport = FlakyTransport::new(&[]);

        let report = deliver(Some(&transport), Some("whatsapp:+10000000000"), &list, "hola").await;

        let DispatchReport::Sent(outcomes) = report else {
            panic!("expected Sent report");
        };
        let order: Vec<&str> = outcomes.iter().map(|o| o.to.as_str()).collect();
        assert_eq!(order, list.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_missing_transport_short_circuits() {
        let report = deliver(None, Some("whatsapp:+10000000000"), &recipients(2), "hola").await;
        assert!(matches!(report, DispatchReport::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_missing_sender_short_circuits() {
        let transport = FlakyTransport::new(&[]);
        let report = deliver(Some(&transport), None, &recipients(2), "hola").await;
        assert!(matches!(report, DispatchReport::NotConfigured { .. }));
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_recipient_list_short_circuits() {
        let transport = FlakyTransport::new(&[]);
        let report = deliver(Some(&transport), Some("whatsapp:+10000000000"), &[], "hola").await;
        assert!(matches!(report, DispatchReport::NotConfigured { .. }));
        assert!(transport.calls.lock().unwrap().is_empty());
    }
}
