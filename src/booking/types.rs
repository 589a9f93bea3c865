//! Booking service data model
//!
//! Mirrors the JSON the service exchanges. Nothing is validated client-side:
//! the service is the only authority on what a valid booking is.

use serde::{Deserialize, Serialize};

/// A reservation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub firstname: String,
    pub lastname: String,
    pub totalprice: i64,
    pub depositpaid: bool,
    pub bookingdates: BookingDates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additionalneeds: Option<String>,
}

/// Check-in/check-out pair
///
/// Kept as strings: the service stores whatever it is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDates {
    pub checkin: String,
    pub checkout: String,
}

impl BookingDates {
    pub fn new(checkin: impl Into<String>, checkout: impl Into<String>) -> Self {
        Self {
            checkin: checkin.into(),
            checkout: checkout.into(),
        }
    }
}

/// Partial update body for PATCH
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totalprice: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depositpaid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookingdates: Option<BookingDates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additionalneeds: Option<String>,
}

/// Identifier assigned by the service on creation
pub type BookingId = u64;

/// Response of `POST /booking`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedBooking {
    pub bookingid: BookingId,
    pub booking: BookingRecord,
}

/// Entry of `GET /booking`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BookingRef {
    pub bookingid: BookingId,
}

/// Opaque credential for mutating calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Response of `POST /auth`
///
/// A rejected login still answers 200, with `reason` instead of `token`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthReply {
    pub token: Option<String>,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_omits_missing_needs() {
        let record = BookingRecord {
            firstname: "Minimal".to_string(),
            lastname: "Test".to_string(),
            totalprice: 100,
            depositpaid: true,
            bookingdates: BookingDates::new("2024-05-01", "2024-05-02"),
            additionalneeds: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("additionalneeds").is_none());
        assert_eq!(value["bookingdates"]["checkout"], "2024-05-02");
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = BookingPatch {
            totalprice: Some(300),
            additionalneeds: Some("Dinner only".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"totalprice": 300, "additionalneeds": "Dinner only"})
        );
    }

    #[test]
    fn test_created_booking_parses_service_reply() {
        let reply = json!({
            "bookingid": 42,
            "booking": {
                "firstname": "Jasir",
                "lastname": "Buric",
                "totalprice": 166,
                "depositpaid": true,
                "bookingdates": {"checkin": "2025-05-01", "checkout": "2025-05-10"},
                "additionalneeds": "Breakfast"
            }
        });
        let created: CreatedBooking = serde_json::from_value(reply).unwrap();
        assert_eq!(created.bookingid, 42);
        assert_eq!(created.booking.additionalneeds.as_deref(), Some("Breakfast"));
    }
}
