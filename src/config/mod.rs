//! Bridge configuration.
//!
//! All settings come from the environment, matching how the service is
//! deployed (container with injected secrets). Absent Twilio credentials
//! are not an error: the pipeline still acknowledges uplinks and reports
//! deliveries as not configured.

pub mod defaults;

/// Read an env var, treating empty strings as absent.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Application configuration.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    /// HTTP server bind address.
    pub server_addr: String,
    /// Twilio account SID (`TWILIO_SID`).
    pub twilio_sid: Option<String>,
    /// Twilio auth token (`TWILIO_TOKEN`).
    pub twilio_token: Option<String>,
    /// Sender address, e.g. `whatsapp:+14155238886` (`WHATSAPP_FROM`).
    pub whatsapp_from: Option<String>,
    /// Initial dynamic recipients, comma-separated (`WHATSAPP_TO`).
    pub initial_recipients: Vec<String>,
    /// Shared secret required in the `x-secret` webhook header
    /// (`WEBHOOK_SECRET`). Unset disables the check.
    pub webhook_secret: Option<String>,
    /// Token guarding the recipient admin endpoints (`ADMIN_TOKEN`).
    /// Unset leaves them open (development setups).
    pub admin_token: Option<String>,
    /// Append the brand signature block to rendered alerts.
    pub signature_enabled: bool,
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        let server_addr = env_opt("PORT").map_or_else(
            || defaults::DEFAULT_SERVER_ADDR.to_string(),
            |port| format!("0.0.0.0:{port}"),
        );

        let initial_recipients = env_opt("WHATSAPP_TO")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            server_addr,
            twilio_sid: env_opt("TWILIO_SID"),
            twilio_token: env_opt("TWILIO_TOKEN"),
            whatsapp_from: env_opt("WHATSAPP_FROM"),
            initial_recipients,
            webhook_secret: env_opt("WEBHOOK_SECRET"),
            admin_token: env_opt("ADMIN_TOKEN"),
            signature_enabled: true,
        }
    }
}
