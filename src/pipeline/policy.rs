//! Notification policy.
//!
//! Fixed table: tamper and panic events wake humans up, housekeeping
//! events (keep-alives, low battery) do not. Non-notified events are still
//! acknowledged to the network server with a skip reason.

use crate::types::EventKind;

/// Does this event kind warrant a WhatsApp alert?
pub fn should_notify(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Panic | EventKind::WallRemove | EventKind::WallRestore
    )
}
