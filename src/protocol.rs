use serde::Deserialize;

use crate::{
    error::{DeviceError, DeviceResult},
    types::{AlertKind, Band, DeviceSample},
};

/// Endpoint returning the current glucose sample
pub const GLUCOSE_PATH: &str = "/glucosa";

/// Endpoint simulating a hyperglycemia event on the device
pub const ALERT_HIGH_PATH: &str = "/alerta/alta";

/// Endpoint simulating a hypoglycemia event on the device
pub const ALERT_LOW_PATH: &str = "/alerta/baja";

/// Endpoint showing a reminder message on the companion display
pub const REMINDER_PATH: &str = "/recordatorio";

/// Device status word for the hyperglycemic range
pub const RAW_STATUS_HIGH: &str = "alta";

/// Device status word for the hypoglycemic range
pub const RAW_STATUS_LOW: &str = "baja";

/// Reply body of `GET /glucosa`
///
/// The firmware reports the bare sample; classification happens client-side.
#[derive(Debug, Deserialize)]
struct GlucoseReply {
    glucosa: i32,
}

/// Reply body of `GET /alerta/alta` and `GET /alerta/baja`
///
/// The alert endpoints echo the device's own status word alongside the value.
#[derive(Debug, Deserialize)]
struct AlertReply {
    glucosa: i32,
    estado: String,
}

/// Select the alert endpoint for a severity
#[must_use]
pub const fn alert_path(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::High => ALERT_HIGH_PATH,
        AlertKind::Low => ALERT_LOW_PATH,
    }
}

/// Decode a `/glucosa` reply body
///
/// # Errors
///
/// Returns [`DeviceError::MalformedResponse`] if the body is not JSON or the
/// `glucosa` field is missing or not an integer.
pub fn parse_glucose_body(body: &str) -> DeviceResult<DeviceSample> {
    let reply: GlucoseReply = serde_json::from_str(body)
        .map_err(|e| DeviceError::MalformedResponse(e.to_string()))?;

    Ok(DeviceSample {
        value: reply.glucosa,
        raw_status: None,
    })
}

/// Decode an `/alerta/alta` or `/alerta/baja` reply body
///
/// # Errors
///
/// Returns [`DeviceError::MalformedResponse`] if the body is not JSON or the
/// `glucosa`/`estado` fields are missing or mistyped.
pub fn parse_alert_body(body: &str) -> DeviceResult<DeviceSample> {
    let reply: AlertReply = serde_json::from_str(body)
        .map_err(|e| DeviceError::MalformedResponse(e.to_string()))?;

    Ok(DeviceSample {
        value: reply.glucosa,
        raw_status: Some(reply.estado),
    })
}

/// Band the device's own status word claims, if it is a known word
///
/// Used only to log disagreements with the local classifier; the returned
/// band never labels a reading.
#[must_use]
pub fn raw_status_band(raw_status: &str) -> Option<Band> {
    if raw_status.eq_ignore_ascii_case(RAW_STATUS_HIGH) {
        Some(Band::High)
    } else if raw_status.eq_ignore_ascii_case(RAW_STATUS_LOW) {
        Some(Band::Low)
    } else if raw_status.eq_ignore_ascii_case("normal") {
        Some(Band::Normal)
    } else {
        None
    }
}

/// Text the companion display shows for a reminder: `"<title> - <time>"`
#[must_use]
pub fn reminder_message(title: &str, time_of_day: &str) -> String {
    format!("{title} - {time_of_day}")
}

/// Query string for the reminder endpoint, with the message URL-encoded
#[must_use]
pub fn reminder_query(title: &str, time_of_day: &str) -> String {
    format!(
        "msg={}",
        urlencoding::encode(&reminder_message(title, time_of_day))
    )
}
