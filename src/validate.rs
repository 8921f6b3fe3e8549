//! Schema validation for ingestion payloads.
//!
//! One shared, table-driven field schema covers both record kinds (sensor
//! readings and accident events share their field set); the entity kind only
//! selects which fields are mandatory. Validation is pure, fail-fast, and
//! checks fields in declared order, so repeated calls on the same payload
//! always report the same first violation.

use std::fmt;

use chrono::DateTime;
use serde_json::Value;

// ---

/// Which record kind a payload claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Sensor,
    Accident,
}

impl EntityKind {
    /// Whether `field` must be present for this record kind.
    fn requires(self, field: &str) -> bool {
        // ---
        // Both kinds currently share one mandatory set; the kind parameter is
        // the extension point for diverging them.
        match self {
            EntityKind::Sensor | EntityKind::Accident => matches!(
                field,
                "device_id" | "timestamp" | "alcohol" | "vibration" | "distance" | "seatbelt" | "impact"
            ),
        }
    }
}

/// Declared type of a payload field.
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    /// Any JSON number.
    Number,
    /// JSON number, rejected when negative.
    NonNegNumber,
    Bool,
    Text,
    /// Epoch number or RFC 3339 string.
    Timestamp,
    /// Array whose every element is a number; anything else rejects the
    /// whole payload — no partial ingestion.
    NumberArray,
}

/// Full field schema, in validation (and reporting) order.
const FIELDS: &[(&str, FieldKind)] = &[
    ("device_id", FieldKind::Text),
    ("timestamp", FieldKind::Timestamp),
    ("alcohol", FieldKind::NonNegNumber),
    ("vibration", FieldKind::NonNegNumber),
    ("distance", FieldKind::NonNegNumber),
    ("seatbelt", FieldKind::Bool),
    ("impact", FieldKind::NonNegNumber),
    ("pulse", FieldKind::Number),
    ("current_pulse", FieldKind::Number),
    ("pulse_threshold_min", FieldKind::Number),
    ("pulse_threshold_max", FieldKind::Number),
    ("pulse_history", FieldKind::NumberArray),
    ("distance_history", FieldKind::NumberArray),
    ("alcohol_history", FieldKind::NumberArray),
    ("impact_history", FieldKind::NumberArray),
    ("vibration_history", FieldKind::NumberArray),
    ("lat", FieldKind::Number),
    ("lng", FieldKind::Number),
    ("lcd_display", FieldKind::Text),
];

/// First schema violation found in a payload.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for ValidationError {
    // ---
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid field '{}': {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

// ---

/// Validate a raw ingestion payload against the field schema.
///
/// Pure: no side effects, no mutation of the payload. Returns the first
/// violation in declared field order. Optional fields pass when absent but
/// must match their declared type when present; `null` is a type violation,
/// not an absence.
pub fn validate(kind: EntityKind, payload: &Value) -> Result<(), ValidationError> {
    // ---
    let Some(object) = payload.as_object() else {
        return Err(ValidationError {
            field: "payload",
            reason: "expected a JSON object",
        });
    };

    for &(name, field_kind) in FIELDS {
        match object.get(name) {
            None => {
                if kind.requires(name) {
                    return Err(ValidationError {
                        field: name,
                        reason: "required field is missing",
                    });
                }
            }
            Some(value) => check_kind(name, field_kind, value)?,
        }
    }

    Ok(())
}

fn check_kind(name: &'static str, kind: FieldKind, value: &Value) -> Result<(), ValidationError> {
    // ---
    let ok = match kind {
        FieldKind::Number => value.as_f64().is_some(),
        FieldKind::NonNegNumber => match value.as_f64() {
            Some(n) => n >= 0.0,
            None => false,
        },
        FieldKind::Bool => value.is_boolean(),
        FieldKind::Text => value.is_string(),
        FieldKind::Timestamp => match value {
            Value::Number(_) => true,
            Value::String(s) => DateTime::parse_from_rfc3339(s).is_ok(),
            _ => false,
        },
        FieldKind::NumberArray => match value.as_array() {
            Some(items) => items.iter().all(|item| item.as_f64().is_some()),
            None => false,
        },
    };

    if ok {
        Ok(())
    } else {
        Err(ValidationError {
            field: name,
            reason: reason_for(kind),
        })
    }
}

fn reason_for(kind: FieldKind) -> &'static str {
    // ---
    match kind {
        FieldKind::Number => "expected a number",
        FieldKind::NonNegNumber => "expected a non-negative number",
        FieldKind::Bool => "expected a boolean",
        FieldKind::Text => "expected a string",
        FieldKind::Timestamp => "expected an epoch number or RFC 3339 string",
        FieldKind::NumberArray => "expected an array of numbers",
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn minimal_payload() -> Value {
        // ---
        json!({
            "device_id": "esp32-01",
            "timestamp": "2025-04-23T20:10:00Z",
            "alcohol": 0.02,
            "vibration": 0.9,
            "distance": 22.5,
            "seatbelt": true,
            "impact": 1.1
        })
    }

    #[test]
    fn accepts_minimal_sensor_payload() {
        // ---
        assert!(validate(EntityKind::Sensor, &minimal_payload()).is_ok());
        assert!(validate(EntityKind::Accident, &minimal_payload()).is_ok());
    }

    #[test]
    fn accepts_epoch_timestamp() {
        // ---
        let mut payload = minimal_payload();
        payload["timestamp"] = json!(1745438400);
        assert!(validate(EntityKind::Sensor, &payload).is_ok());
    }

    #[test]
    fn accepts_full_payload_with_histories_and_location() {
        // ---
        let mut payload = minimal_payload();
        payload["pulse"] = json!(78.0);
        payload["pulse_threshold_min"] = json!(50.0);
        payload["pulse_threshold_max"] = json!(120.0);
        payload["pulse_history"] = json!([70.0, 72, 78.5]);
        payload["distance_history"] = json!([30.0, 25.0, 22.5]);
        payload["lat"] = json!(5.6545);
        payload["lng"] = json!(-0.1869);
        payload["lcd_display"] = json!("Speed: 40km/h");
        assert!(validate(EntityKind::Sensor, &payload).is_ok());
    }

    #[test]
    fn rejects_each_missing_required_field() {
        // ---
        for field in ["device_id", "timestamp", "alcohol", "vibration", "distance", "seatbelt", "impact"] {
            let mut payload = minimal_payload();
            payload.as_object_mut().unwrap().remove(field);
            let err = validate(EntityKind::Sensor, &payload).unwrap_err();
            assert_eq!(err.field, field, "expected {field} to be reported missing");
            assert_eq!(err.reason, "required field is missing");
        }
    }

    #[test]
    fn rejects_wrong_typed_required_field() {
        // ---
        let mut payload = minimal_payload();
        payload["seatbelt"] = json!("yes");
        let err = validate(EntityKind::Sensor, &payload).unwrap_err();
        assert_eq!(err.field, "seatbelt");
    }

    #[test]
    fn rejects_negative_alcohol() {
        // ---
        let mut payload = minimal_payload();
        payload["alcohol"] = json!(-0.1);
        let err = validate(EntityKind::Sensor, &payload).unwrap_err();
        assert_eq!(err.field, "alcohol");
    }

    #[test]
    fn rejects_null_as_optional_field_value() {
        // ---
        let mut payload = minimal_payload();
        payload["lat"] = Value::Null;
        let err = validate(EntityKind::Sensor, &payload).unwrap_err();
        assert_eq!(err.field, "lat");
    }

    #[test]
    fn rejects_history_with_non_numeric_element() {
        // ---
        let mut payload = minimal_payload();
        payload["distance_history"] = json!(["a", 1, 2]);
        let err = validate(EntityKind::Sensor, &payload).unwrap_err();
        assert_eq!(err.field, "distance_history");
        assert_eq!(err.reason, "expected an array of numbers");
    }

    #[test]
    fn rejects_non_array_history() {
        // ---
        let mut payload = minimal_payload();
        payload["pulse_history"] = json!(72.0);
        let err = validate(EntityKind::Sensor, &payload).unwrap_err();
        assert_eq!(err.field, "pulse_history");
    }

    #[test]
    fn rejects_non_object_payload() {
        // ---
        let err = validate(EntityKind::Sensor, &json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.field, "payload");
    }

    #[test]
    fn reports_first_violation_deterministically() {
        // ---
        // Two violations present; declared order says alcohol wins both times.
        let mut payload = minimal_payload();
        payload["alcohol"] = json!("drunk");
        payload["impact"] = json!(false);

        let first = validate(EntityKind::Sensor, &payload).unwrap_err();
        let second = validate(EntityKind::Sensor, &payload).unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first.field, "alcohol");
    }

    #[test]
    fn rejects_unparseable_timestamp_string() {
        // ---
        let mut payload = minimal_payload();
        payload["timestamp"] = json!("yesterday at noon");
        let err = validate(EntityKind::Sensor, &payload).unwrap_err();
        assert_eq!(err.field, "timestamp");
    }
}
