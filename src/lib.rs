//! demito-bridge: LoRaWAN uplink → WhatsApp alert bridge
//!
//! Receives ChirpStack uplink webhooks for the Demito panic-button devices,
//! classifies them, suppresses duplicate panic transmissions, and fans the
//! alert out to a set of WhatsApp recipients via Twilio.
//!
//! ## Architecture
//!
//! - **Pipeline**: normalize → classify → dedup (panic only) → policy →
//!   format → dispatch
//! - **Registry**: fixed + dynamic WhatsApp recipients with address
//!   normalization
//! - **Transport**: the outbound send capability, injectable for tests

pub mod api;
pub mod config;
pub mod dispatcher;
pub mod houses;
pub mod pipeline;
pub mod recipients;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use types::{DeliveryOutcome, DeviceEvent, EventKind, GatewayLocation, RxInfo, UplinkAck};

// Re-export pipeline stages
pub use pipeline::UplinkProcessor;

// Re-export registry and transport seams
pub use recipients::{RecipientRegistry, RegistryError};
pub use transport::{MessageTransport, TransportError, TwilioTransport};
