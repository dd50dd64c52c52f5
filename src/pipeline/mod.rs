//! The uplink event processing pipeline.
//!
//! Stage order: normalize → classify → dedup (panic only) → policy gate →
//! format + recipient resolution → dispatch. Every stage is a pure function
//! of its inputs except the deduplicator and the recipient registry, which
//! hold the only mutable state in the core.

pub mod classifier;
pub mod dedup;
pub mod formatter;
pub mod normalizer;
pub mod policy;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::dispatcher::{self, DispatchReport};
use crate::houses;
use crate::recipients::RecipientRegistry;
use crate::transport::MessageTransport;
use crate::types::{EventKind, UplinkAck};

pub use dedup::PanicDeduplicator;

/// Skip reason when the payload carried nothing classifiable.
const SKIP_NO_EVENT: &str = "no_event";

/// Skip reason for suppressed duplicate panics.
const SKIP_PANIC_DEDUP: &str = "panic dedup";

/// Runs the full pipeline for each inbound uplink.
///
/// One instance lives for the process lifetime; concurrent requests share
/// it. The dedup table and the registry are safe for concurrent access.
pub struct UplinkProcessor {
    dedup: PanicDeduplicator,
    registry: Arc<RecipientRegistry>,
    transport: Option<Arc<dyn MessageTransport>>,
    whatsapp_from: Option<String>,
    signature_enabled: bool,
}

impl UplinkProcessor {
    pub fn new(
        registry: Arc<RecipientRegistry>,
        transport: Option<Arc<dyn MessageTransport>>,
        whatsapp_from: Option<String>,
        signature_enabled: bool,
    ) -> Self {
        Self {
            dedup: PanicDeduplicator::default(),
            registry,
            transport,
            whatsapp_from,
            signature_enabled,
        }
    }

    /// Process one parsed uplink body into an acknowledgment.
    ///
    /// Never fails: every classifiable or unclassifiable payload yields a
    /// successful ack, with skips and misconfiguration reported as reasons.
    pub async fn process(&self, body: &Value, event_tag: &str) -> UplinkAck {
        let event = normalizer::normalize(body, event_tag);

        let Some(kind) = classifier::classify(event.decoded.as_ref()) else {
            debug!(dev_eui = %event.dev_eui, "uplink carried no recognizable event");
            return UplinkAck::skipped(SKIP_NO_EVENT);
        };

        if kind == EventKind::Panic && !self.dedup.allow(&event.dev_eui, event.f_cnt) {
            info!(
                dev_eui = %event.dev_eui,
                f_cnt = ?event.f_cnt,
                "duplicate panic suppressed"
            );
            return UplinkAck::skipped(SKIP_PANIC_DEDUP);
        }

        info!(
            tag = %event.raw_event_tag,
            dev = %event.dev_name,
            dev_eui = %event.dev_eui,
            f_cnt = ?event.f_cnt,
            kind = %kind,
            "uplink classified"
        );

        if !policy::should_notify(&kind) {
            return UplinkAck::skipped(kind.as_str());
        }

        let house = houses::house_name(&event.dev_eui, &event.dev_name);
        let location = formatter::best_location(&event.rx_info);
        let text = formatter::render(
            &event,
            &kind,
            &house,
            location,
            formatter::bogota_now(),
            self.signature_enabled,
        );

        let recipients = self.registry.effective();
        let report = dispatcher::deliver(
            self.transport.as_deref(),
            self.whatsapp_from.as_deref(),
            &recipients,
            &text,
        )
        .await;

        match report {
            DispatchReport::NotConfigured { warn } => UplinkAck::NotConfigured { warn },
            DispatchReport::Sent(outcomes) => UplinkAck::Sent { outcomes },
        }
    }
}
