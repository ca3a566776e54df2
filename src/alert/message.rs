//! Alert text and links

use super::GeoPoint;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const SOS_HEADLINE: &str = "🚨 EMERGENCY SOS ALERT 🚨";

/// Google Maps link for a location
pub fn maps_link(point: &GeoPoint) -> String {
    format!(
        "https://maps.google.com/?q={},{}",
        point.latitude, point.longitude
    )
}

/// Altitude worth printing. A zero altitude is what browsers report when the
/// fix has no vertical component, so it is treated as unknown.
fn known_altitude(point: &GeoPoint) -> Option<f64> {
    point.altitude.filter(|a| *a != 0.0 && a.is_finite())
}

/// Body of the SOS alert sent to emergency contacts
pub fn compose_sos_message(location: Option<&GeoPoint>) -> String {
    let mut message = format!("{}\n\nI need immediate help!\n", SOS_HEADLINE);

    match location {
        Some(point) => {
            message.push_str(&format!(
                "Location: {:.6}, {:.6}",
                point.latitude, point.longitude
            ));
            if let Some(altitude) = known_altitude(point) {
                message.push_str(&format!(", Alt: {:.1}m", altitude));
            }
            message.push_str(&format!("\n\nGoogle Maps: {}", maps_link(point)));
        }
        None => message.push_str("Location unavailable"),
    }

    message
}

/// Location-only message for "share my location" without raising an SOS
pub fn compose_location_message(point: &GeoPoint, at: DateTime<Utc>) -> String {
    let mut message = format!(
        "📍 MY CURRENT LOCATION\n\nTime: {}\n\nCoordinates:\nLatitude: {:.6}\nLongitude: {:.6}",
        at.format("%Y-%m-%d %H:%M:%S UTC"),
        point.latitude,
        point.longitude
    );
    if let Some(altitude) = known_altitude(point) {
        message.push_str(&format!("\nAltitude: {:.1}m", altitude));
    }
    message.push_str(&format!(
        "\n\n🗺️ Google Maps:\n{}\n\n⚠️ Please check on me if I don't respond.",
        maps_link(point)
    ));
    message
}

/// `sms:` deep link that opens the messaging app with `body` prefilled
pub fn sms_link(phone: &str, body: &str) -> String {
    format!(
        "sms:{}?body={}",
        phone.trim(),
        utf8_percent_encode(body, URI_COMPONENT)
    )
}
