//! demito-bridge — LoRaWAN uplink → WhatsApp alert bridge
//!
//! # Usage
//!
//! ```bash
//! TWILIO_SID=AC... TWILIO_TOKEN=... WHATSAPP_FROM="whatsapp:+14155238886" \
//!     demito-bridge --addr 0.0.0.0:8080
//! ```
//!
//! # Environment Variables
//!
//! - `TWILIO_SID` / `TWILIO_TOKEN`: transport credentials (optional — the
//!   service acknowledges uplinks either way)
//! - `WHATSAPP_FROM`: sender address, e.g. `whatsapp:+14155238886`
//! - `WHATSAPP_TO`: comma-separated initial recipients
//! - `WEBHOOK_SECRET`: shared secret required in the `x-secret` header
//! - `ADMIN_TOKEN`: token guarding the recipient admin endpoints
//! - `PORT`: listen port (default 8080)
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use demito_bridge::api::{create_app, BridgeState};
use demito_bridge::config::BridgeConfig;
use demito_bridge::transport::{MessageTransport, TwilioTransport};

#[derive(Parser, Debug)]
#[command(name = "demito-bridge")]
#[command(about = "LoRaWAN uplink to WhatsApp alert bridge")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080", or PORT env)
    #[arg(short, long)]
    addr: Option<String>,
}

fn build_transport(config: &BridgeConfig) -> Option<Arc<dyn MessageTransport>> {
    match (&config.twilio_sid, &config.twilio_token) {
        (Some(sid), Some(token)) => {
            info!("Twilio transport configured");
            Some(Arc::new(TwilioTransport::new(sid, token)))
        }
        _ => {
            info!("Twilio transport not configured (TWILIO_SID/TWILIO_TOKEN unset)");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = BridgeConfig::from_env();
    let server_addr = args.addr.unwrap_or_else(|| config.server_addr.clone());

    info!("demito-bridge starting");
    if config.webhook_secret.is_none() {
        info!("WEBHOOK_SECRET unset — webhook accepts unauthenticated posts");
    }

    let transport = build_transport(&config);
    let state = BridgeState::new(&config, transport);
    info!(
        recipients = state.registry.effective().len(),
        "recipient registry initialized"
    );

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {server_addr}"))?;
    info!("listening on {server_addr}");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received Ctrl+C, shutting down");
        shutdown_token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel_token.cancelled().await })
        .await
        .context("HTTP server error")?;

    info!("demito-bridge shutdown complete");
    Ok(())
}
