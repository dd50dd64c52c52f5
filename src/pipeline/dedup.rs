//! Panic deduplication.
//!
//! A physical panic press retransmits the same uplink several times at the
//! radio layer; forwarding each copy would spam every recipient. Per
//! device, a panic is suppressed when a previously accepted one has the
//! same frame count (regardless of elapsed time — inherited behavior,
//! device resets reusing counters are considered out of scope) or landed
//! inside the dedup window.
//!
//! Applies only to panic-classified events; everything else bypasses this
//! stage.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::defaults::{MISSING_FRAME_COUNT, PANIC_DEDUP_WINDOW_MS};

/// Last accepted panic for one device.
#[derive(Debug, Clone, Copy)]
struct PanicDedupEntry {
    at_ms: i64,
    f_cnt: i64,
}

/// Per-device panic suppression state.
///
/// Entries are never deleted; the table is bounded by device cardinality,
/// which is tiny for this deployment.
#[derive(Debug)]
pub struct PanicDeduplicator {
    window_ms: i64,
    last: DashMap<String, PanicDedupEntry>,
}

impl Default for PanicDeduplicator {
    fn default() -> Self {
        Self::new(PANIC_DEDUP_WINDOW_MS)
    }
}

impl PanicDeduplicator {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms,
            last: DashMap::new(),
        }
    }

    /// Should this panic be forwarded? Records the acceptance when yes.
    pub fn allow(&self, dev_eui: &str, f_cnt: Option<i64>) -> bool {
        self.allow_at(dev_eui, f_cnt, Utc::now().timestamp_millis())
    }

    /// [`Self::allow`] with an explicit clock, for tests.
    ///
    /// The entry API keeps check-and-record atomic per device key, so
    /// concurrent uplinks for the same device cannot both pass.
    pub fn allow_at(&self, dev_eui: &str, f_cnt: Option<i64>, now_ms: i64) -> bool {
        match self.last.entry(dev_eui.to_string()) {
            Entry::Occupied(mut occupied) => {
                let prev = *occupied.get();
                // An absent incoming frame count never matches on equality;
                // only the time window can suppress it.
                let same_frame = f_cnt.is_some_and(|f| f == prev.f_cnt);
                if same_frame || now_ms - prev.at_ms < self.window_ms {
                    return false;
                }
                occupied.insert(PanicDedupEntry {
                    at_ms: now_ms,
                    f_cnt: f_cnt.unwrap_or(MISSING_FRAME_COUNT),
                });
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(PanicDedupEntry {
                    at_ms: now_ms,
                    f_cnt: f_cnt.unwrap_or(MISSING_FRAME_COUNT),
                });
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_first_panic_always_accepted() {
        let dedup = PanicDeduplicator::default();
        assert!(dedup.allow_at("dev-a", Some(5), T0));
    }

    #[test]
    fn test_same_frame_count_rejected_at_any_gap() {
        let dedup = PanicDeduplicator::default();
        assert!(dedup.allow_at("dev-a", Some(5), T0));
        // Inside the window.
        assert!(!dedup.allow_at("dev-a", Some(5), T0 + 1_000));
        // Far outside the window — equal frame count still suppresses.
        assert!(!dedup.allow_at("dev-a", Some(5), T0 + 600_000));
    }

    #[test]
    fn test_changed_frame_count_inside_window_rejected_only_by_time() {
        let dedup = PanicDeduplicator::default();
        assert!(dedup.allow_at("dev-a", Some(5), T0));
        // 9 s later with a new frame count: still inside the 30 s window.
        assert!(!dedup.allow_at("dev-a", Some(6), T0 + 9_000));
    }

    #[test]
    fn test_changed_frame_count_outside_window_accepted() {
        let dedup = PanicDeduplicator::default();
        assert!(dedup.allow_at("dev-a", Some(5), T0));
        assert!(dedup.allow_at("dev-a", Some(6), T0 + 31_000));
    }

    #[test]
    fn test_unchanged_frame_count_at_29s_rejected() {
        let dedup = PanicDeduplicator::default();
        assert!(dedup.allow_at("dev-a", Some(5), T0));
        assert!(!dedup.allow_at("dev-a", Some(5), T0 + 29_000));
    }

    #[test]
    fn test_missing_frame_counts_dedup_on_time_only() {
        let dedup = PanicDeduplicator::default();
        assert!(dedup.allow_at("dev-a", None, T0));
        // Inside the window: duplicate.
        assert!(!dedup.allow_at("dev-a", None, T0 + 10_000));
        // Outside the window: the stored sentinel does not match an absent
        // incoming counter, so it goes through.
        assert!(dedup.allow_at("dev-a", None, T0 + 31_000));
    }

    #[test]
    fn test_devices_are_independent() {
        let dedup = PanicDeduplicator::default();
        assert!(dedup.allow_at("dev-a", Some(5), T0));
        assert!(dedup.allow_at("dev-b", Some(5), T0 + 1));
    }
}
