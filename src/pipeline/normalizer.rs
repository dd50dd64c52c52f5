//! Payload normalization.
//!
//! ChirpStack's uplink JSON has changed shape across versions, and the
//! device firmware shipped at least three incompatible codecs. This stage
//! flattens all of them into one [`DeviceEvent`] using ordered field
//! fallbacks. It never fails: a body that parsed as JSON always yields an
//! event, with documented defaults for anything missing.
//!
//! Fallback chains (first present wins):
//!
//! | field     | sources                                              |
//! |-----------|------------------------------------------------------|
//! | dev_eui   | `deviceInfo.devEui`, `deviceInfo.devEUI`             |
//! | dev_name  | `deviceInfo.deviceName`, `deviceInfo.name`, dev_eui  |
//! | f_cnt     | `fCnt`, `fCntUp`, `uplinkMetaData.fCnt`              |
//! | decoded   | `object`, `decoded`, base64 `data` (length only)     |
//! | rx_info   | `rxInfo`                                             |

use base64::Engine;
use serde_json::{Map, Value};

use crate::types::{DeviceEvent, RxInfo};

/// DevEUI used when the payload identifies no device at all.
const UNKNOWN_DEV_EUI: &str = "UNKNOWN";

/// First string found at any of the given JSON pointer paths.
fn first_str<'a>(body: &'a Value, paths: &[&str]) -> Option<&'a str> {
    paths
        .iter()
        .find_map(|p| body.pointer(p).and_then(Value::as_str))
}

/// First integer found at any of the given JSON pointer paths.
fn first_int(body: &Value, paths: &[&str]) -> Option<i64> {
    paths
        .iter()
        .find_map(|p| body.pointer(p).and_then(Value::as_i64))
}

/// Decoded payload object, with the base64 fallback for codec-less uplinks.
///
/// When the server did not run a codec but forwarded the raw bytes, expose
/// at least their length so downstream logs show something useful. A bad
/// base64 string is not an error — the event simply has no decoded object.
fn extract_decoded(body: &Value) -> Option<Map<String, Value>> {
    if let Some(obj) = body
        .get("object")
        .or_else(|| body.get("decoded"))
        .and_then(Value::as_object)
    {
        return Some(obj.clone());
    }

    let data = body.get("data").and_then(Value::as_str)?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(data).ok()?;
    let mut obj = Map::new();
    obj.insert("raw_len".to_string(), Value::from(bytes.len()));
    Some(obj)
}

/// Gateway reception records in server order; malformed entries are skipped.
fn extract_rx_info(body: &Value) -> Vec<RxInfo> {
    body.get("rxInfo")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Normalize a parsed uplink body into a [`DeviceEvent`].
pub fn normalize(body: &Value, raw_event_tag: &str) -> DeviceEvent {
    let dev_eui = first_str(body, &["/deviceInfo/devEui", "/deviceInfo/devEUI"])
        .unwrap_or(UNKNOWN_DEV_EUI)
        .to_lowercase();

    let dev_name = first_str(body, &["/deviceInfo/deviceName", "/deviceInfo/name"])
        .map_or_else(|| dev_eui.clone(), ToString::to_string);

    let f_cnt = first_int(body, &["/fCnt", "/fCntUp", "/uplinkMetaData/fCnt"]);

    DeviceEvent {
        dev_eui,
        dev_name,
        f_cnt,
        decoded: extract_decoded(body),
        rx_info: extract_rx_info(body),
        raw_event_tag: raw_event_tag.to_string(),
    }
}
