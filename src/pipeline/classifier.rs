//! Event classification.
//!
//! The device firmware shipped three incompatible payload encodings over
//! time; resolution is an ordered chain so new codecs are additive and the
//! old ones keep working:
//!
//! 1. TLV codec: explicit `event` label, used verbatim.
//! 2. Legacy codec: boolean `panic` flag.
//! 3. Raw codec: single-byte `flags` field, LSB = panic.
//!
//! Anything else is unclassified — the pipeline still acknowledges the
//! uplink, it just has nothing to alert on.

use serde_json::{Map, Value};

use crate::types::EventKind;

/// Bit in the raw `flags` byte signalling a panic press.
const FLAG_PANIC: u64 = 0x01;

/// Classify a decoded payload object. Pure and idempotent.
pub fn classify(decoded: Option<&Map<String, Value>>) -> Option<EventKind> {
    let obj = decoded?;

    if let Some(label) = obj.get("event").and_then(Value::as_str) {
        return Some(EventKind::from_label(label));
    }

    if obj.get("panic").and_then(Value::as_bool) == Some(true) {
        return Some(EventKind::Panic);
    }

    if let Some(flags) = obj.get("flags").and_then(Value::as_u64) {
        if flags & FLAG_PANIC != 0 {
            return Some(EventKind::Panic);
        }
    }

    None
}
