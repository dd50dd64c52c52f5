//! Human-readable alert rendering.
//!
//! Produces the WhatsApp message body: a fixed order of lines, each one
//! omitted when its source value is absent. Pure — the receive timestamp
//! is passed in so tests can pin it.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;

use crate::config::defaults::BOGOTA_UTC_OFFSET_SECS;
use crate::types::{DeviceEvent, EventKind, RxInfo};

/// Brand signature appended below a blank separator line. Decoration only;
/// toggleable via config.
const BRAND_SIGNATURE: &str = "— DukeVilla Demito\n\
Desarrollado por DukeVilla LLC — 2025\n\
https://www.duke-villa.com | sales@duke-villa.com";

/// Current time in Bogotá. Alerts always render in the deployment's
/// civil time zone regardless of server locale.
pub fn bogota_now() -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(BOGOTA_UTC_OFFSET_SECS)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
    Utc::now().with_timezone(&offset)
}

/// Title and category label for each event kind.
fn title_and_category(kind: &EventKind) -> (String, String) {
    match kind {
        EventKind::Panic => (
            "🚨 *Alerta de Pánico*".to_string(),
            "Botón de Pánico".to_string(),
        ),
        EventKind::WallRemove => (
            "⚠️ *Alerta: Desmonte de Pared*".to_string(),
            "Desmonte de Pared".to_string(),
        ),
        EventKind::WallRestore => (
            "✅ *Restaurado en la Pared*".to_string(),
            "Restaurado".to_string(),
        ),
        EventKind::LowBattery => ("🔋 *Batería baja*".to_string(), "Batería baja".to_string()),
        EventKind::Alive | EventKind::Other(_) => {
            ("ℹ️ Evento".to_string(), kind.as_str().to_string())
        }
    }
}

/// Pick the gateway location for the map link.
///
/// Among records carrying an SNR figure, the one with the highest SNR wins
/// (ties go to the first seen). When no record carries an SNR, fall back to
/// the first record that has usable coordinates.
pub fn best_location(rx_info: &[RxInfo]) -> Option<(f64, f64)> {
    let mut best: Option<&RxInfo> = None;
    for info in rx_info {
        let Some(snr) = info.snr else { continue };
        match best.and_then(|b| b.snr) {
            Some(current) if snr <= current => {}
            _ => best = Some(info),
        }
    }

    if let Some(info) = best {
        return info.location.as_ref().and_then(|l| l.coords());
    }
    rx_info
        .iter()
        .find_map(|info| info.location.as_ref().and_then(|l| l.coords()))
}

/// Render the alert body for one event.
pub fn render(
    event: &DeviceEvent,
    kind: &EventKind,
    house: &str,
    location: Option<(f64, f64)>,
    at: DateTime<FixedOffset>,
    with_signature: bool,
) -> String {
    let (title, category) = title_and_category(kind);

    let battery_mv = event
        .decoded
        .as_ref()
        .and_then(|obj| obj.get("battery_mv"))
        .and_then(Value::as_f64);

    let mut lines = vec![
        title,
        format!("Lugar: *{house}*"),
        format!("Tipo: {category}"),
        format!("Dispositivo: *{}* ({})", event.dev_name, event.dev_eui),
    ];
    if let Some(f_cnt) = event.f_cnt {
        lines.push(format!("Frame: {f_cnt}"));
    }
    if let Some(mv) = battery_mv {
        lines.push(format!("Batería: {:.2} V", mv / 1000.0));
    }
    if let Some((lat, lon)) = location {
        lines.push(format!(
            "Ubicación aprox.: https://maps.google.com/?q={lat},{lon}"
        ));
    }
    lines.push(format!("Hora: {} (Bogotá)", at.format("%d/%m/%Y, %H:%M:%S")));

    if with_signature {
        lines.push(String::new());
        lines.push(BRAND_SIGNATURE.to_string());
    }

    lines.join("\n")
}
