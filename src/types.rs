//! Core data types shared across the uplink pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One inbound uplink notification, normalized from whatever payload shape
/// the network server sent.
///
/// Every field is optional at the wire level; the normalizer fills in the
/// documented fallbacks so downstream stages never deal with absence beyond
/// `Option`.
#[derive(Debug, Clone, Default)]
pub struct DeviceEvent {
    /// Globally unique device identifier, lower-cased for matching.
    pub dev_eui: String,
    /// Display name; falls back to `dev_eui` when the server sent none.
    pub dev_name: String,
    /// Per-device uplink frame counter. `None` is meaningful (not zero):
    /// the dedup stage treats absent counters differently from real ones.
    pub f_cnt: Option<i64>,
    /// Codec-decoded payload fields, if any.
    pub decoded: Option<Map<String, Value>>,
    /// Gateway reception records in server order.
    pub rx_info: Vec<RxInfo>,
    /// Transport-level event label (`up`, `join`, ...). Informational only.
    pub raw_event_tag: String,
}

/// Metadata from one gateway that received the uplink.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RxInfo {
    #[serde(default)]
    pub gateway_id: Option<String>,
    #[serde(default)]
    pub rssi: Option<i64>,
    #[serde(default)]
    pub snr: Option<f64>,
    #[serde(default)]
    pub location: Option<GatewayLocation>,
}

/// Gateway coordinates as reported by the network server.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GatewayLocation {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl GatewayLocation {
    /// Both coordinates present, usable for a map link.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Semantic classification of a decoded uplink.
///
/// `Other` carries the verbatim label from the codec so unknown event types
/// still render with their raw name instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Panic,
    WallRemove,
    WallRestore,
    LowBattery,
    Alive,
    Other(String),
}

impl EventKind {
    /// Map a codec event label to its kind. Unrecognized labels pass
    /// through as [`EventKind::Other`], never an error.
    pub fn from_label(label: &str) -> Self {
        match label {
            "panic" => Self::Panic,
            "wall_remove" => Self::WallRemove,
            "wall_restore" => Self::WallRestore,
            "low_battery" => Self::LowBattery,
            "alive" => Self::Alive,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Panic => "panic",
            Self::WallRemove => "wall_remove",
            Self::WallRestore => "wall_restore",
            Self::LowBattery => "low_battery",
            Self::Alive => "alive",
            Self::Other(label) => label,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one send attempt to one recipient.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub to: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn sent(to: impl Into<String>, sid: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            ok: true,
            sid: Some(sid.into()),
            error: None,
        }
    }

    pub fn failed(to: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            ok: false,
            sid: None,
            error: Some(error.into()),
        }
    }
}

/// Structured acknowledgment for a processed uplink.
///
/// Always a success from the sender's point of view — skipped and
/// not-configured outcomes are intentional, not errors.
#[derive(Debug, Clone)]
pub enum UplinkAck {
    /// No alert dispatched; `reason` says why (`no_event`, `alive`,
    /// `panic dedup`, ...).
    Skipped { reason: String },
    /// Transport misconfigured or recipient list empty. Soft warning.
    NotConfigured { warn: String },
    /// Alert dispatched; one outcome per recipient, in recipient order.
    Sent { outcomes: Vec<DeliveryOutcome> },
}

impl UplinkAck {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// The JSON body returned to the webhook caller.
    pub fn into_value(self) -> Value {
        match self {
            Self::Skipped { reason } => serde_json::json!({ "ok": true, "skipped": reason }),
            Self::NotConfigured { warn } => serde_json::json!({ "ok": true, "warn": warn }),
            Self::Sent { outcomes } => serde_json::json!({ "ok": true, "sent": outcomes }),
        }
    }
}
