//! WhatsApp recipient registry.
//!
//! Two disjoint sets: a compiled-in fixed set that can never be removed,
//! and a dynamic set managed at runtime through the admin endpoints.
//! Addresses are normalized into the canonical `whatsapp:+<E.164>` form
//! before entering the registry.

use dashmap::DashSet;
use std::collections::BTreeSet;
use tracing::warn;

use crate::config::defaults::{
    DEFAULT_COUNTRY_CODE, LOCAL_MOBILE_PREFIX, LOCAL_NUMBER_LEN, PREFIXED_NUMBER_MIN_LEN,
};

/// Channel prefix marking a canonical WhatsApp address.
const CHANNEL_PREFIX: &str = "whatsapp:";

/// Always-on recipients, compiled in. Immutable for the process lifetime.
pub const FIXED_RECIPIENTS: &[&str] = &["whatsapp:+573134991467"];

/// Registry operation failures, surfaced to the admin caller only — the
/// uplink path never sees these.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The input could not be normalized into a WhatsApp address.
    #[error("número no válido")]
    InvalidAddress,
    /// The address is in the fixed set and cannot be removed.
    #[error("no se puede quitar el número fijo")]
    Protected,
    /// The address is not currently in the dynamic set.
    #[error("el número no está en la lista")]
    NotFound,
}

/// Live set of destination addresses.
#[derive(Debug, Default)]
pub struct RecipientRegistry {
    dynamic: DashSet<String>,
}

impl RecipientRegistry {
    /// Build a registry seeded with the configured initial recipients.
    /// Seeds that fail normalization are logged and skipped.
    pub fn new(seed: impl IntoIterator<Item = String>) -> Self {
        let registry = Self {
            dynamic: DashSet::new(),
        };
        for raw in seed {
            match normalize_whatsapp(&raw) {
                Some(addr) => {
                    registry.dynamic.insert(addr);
                }
                None => warn!(raw = %raw, "skipping invalid configured recipient"),
            }
        }
        registry
    }

    /// Normalize and add an address to the dynamic set. Returns the
    /// canonical form. Adding an already-present address is idempotent.
    pub fn add(&self, raw: &str) -> Result<String, RegistryError> {
        let addr = normalize_whatsapp(raw).ok_or(RegistryError::InvalidAddress)?;
        self.dynamic.insert(addr.clone());
        Ok(addr)
    }

    /// Remove an address from the dynamic set. Fixed addresses are always
    /// rejected, even when they also appear dynamically.
    pub fn remove(&self, raw: &str) -> Result<(), RegistryError> {
        // Accept an already-canonical address verbatim, otherwise normalize.
        let addr = if raw.starts_with(CHANNEL_PREFIX) {
            raw.to_string()
        } else {
            normalize_whatsapp(raw).ok_or(RegistryError::InvalidAddress)?
        };

        if Self::is_fixed(&addr) {
            return Err(RegistryError::Protected);
        }
        if self.dynamic.remove(&addr).is_none() {
            return Err(RegistryError::NotFound);
        }
        Ok(())
    }

    /// Is this canonical address in the compiled-in fixed set?
    pub fn is_fixed(addr: &str) -> bool {
        FIXED_RECIPIENTS.contains(&addr)
    }

    /// Effective recipient set: fixed ∪ dynamic, deduplicated, sorted for
    /// deterministic dispatch order.
    pub fn effective(&self) -> Vec<String> {
        let mut all: BTreeSet<String> =
            FIXED_RECIPIENTS.iter().map(ToString::to_string).collect();
        for addr in self.dynamic.iter() {
            all.insert(addr.key().clone());
        }
        all.into_iter().collect()
    }
}

/// Normalize a loosely-formatted input into `whatsapp:+<E.164>`.
///
/// Accepted shapes:
/// - already-canonical `whatsapp:+...` (prefix case-insensitive)
/// - bare `+<countrycode><number>`
/// - 10-digit national mobile number (leading `3`, assumes +57)
/// - `57`-prefixed number without `+`, at least 12 digits
///
/// Anything else is rejected.
pub fn normalize_whatsapp(input: &str) -> Option<String> {
    let mut s = input.trim().to_string();
    if s.to_lowercase().starts_with(CHANNEL_PREFIX) {
        s = s[CHANNEL_PREFIX.len()..].to_string();
    }
    s.retain(|c| c.is_ascii_digit() || c == '+');

    if !s.starts_with('+') {
        if s.starts_with(DEFAULT_COUNTRY_CODE) && s.len() >= PREFIXED_NUMBER_MIN_LEN {
            s.insert(0, '+');
        } else if s.len() == LOCAL_NUMBER_LEN && s.starts_with(LOCAL_MOBILE_PREFIX) {
            s = format!("+{DEFAULT_COUNTRY_CODE}{s}");
        } else {
            return None;
        }
    }

    Some(format!("{CHANNEL_PREFIX}{s}"))
}
