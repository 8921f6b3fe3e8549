//! Data models for the SafeDrive telemetry pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Telemetry payload as submitted by a device (sensor reading or accident
/// event — the two share one field set).
///
/// The client-supplied `timestamp` is accepted in either epoch or ISO form
/// but is used only for correlation logging; the pipeline stamps the server
/// clock on every accepted record. Deserialized only after the payload has
/// passed `validate`, so the typed fields here can assume schema conformance.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReading {
    // ---
    pub device_id: String,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    pub alcohol: f64,
    pub vibration: f64,
    pub distance: f64,
    pub seatbelt: bool,
    pub impact: f64,
    #[serde(default, alias = "current_pulse")]
    pub pulse: Option<f64>,
    #[serde(default)]
    pub pulse_threshold_min: Option<f64>,
    #[serde(default)]
    pub pulse_threshold_max: Option<f64>,
    #[serde(default)]
    pub pulse_history: Option<Vec<f64>>,
    #[serde(default)]
    pub distance_history: Option<Vec<f64>>,
    #[serde(default)]
    pub alcohol_history: Option<Vec<f64>>,
    #[serde(default)]
    pub impact_history: Option<Vec<f64>>,
    #[serde(default)]
    pub vibration_history: Option<Vec<f64>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub lcd_display: Option<String>,
}

/// Stored sensor reading, as served by the read endpoints.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SensorReading {
    // ---
    pub id: i32,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub alcohol: f64,
    pub vibration: f64,
    pub distance: f64,
    pub seatbelt: bool,
    pub impact: f64,
    pub pulse: Option<f64>,
    pub pulse_threshold_min: Option<f64>,
    pub pulse_threshold_max: Option<f64>,
    pub pulse_history: Option<Vec<f64>>,
    pub distance_history: Option<Vec<f64>>,
    pub alcohol_history: Option<Vec<f64>>,
    pub impact_history: Option<Vec<f64>>,
    pub vibration_history: Option<Vec<f64>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub lcd_display: Option<String>,
}

/// Stored accident event. Identical field set to [`SensorReading`] except the
/// identifier, which is server-generated (UUID v4) at acceptance time.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AccidentEvent {
    // ---
    pub id: String,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub alcohol: f64,
    pub vibration: f64,
    pub distance: f64,
    pub seatbelt: bool,
    pub impact: f64,
    pub pulse: Option<f64>,
    pub pulse_threshold_min: Option<f64>,
    pub pulse_threshold_max: Option<f64>,
    pub pulse_history: Option<Vec<f64>>,
    pub distance_history: Option<Vec<f64>>,
    pub alcohol_history: Option<Vec<f64>>,
    pub impact_history: Option<Vec<f64>>,
    pub vibration_history: Option<Vec<f64>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub lcd_display: Option<String>,
}

/// One located accident for the dashboard map.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MapPoint {
    // ---
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate statistics over all stored records.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Stats {
    // ---
    pub total_accidents: i64,
    pub max_alcohol: f64,
    pub avg_alcohol: f64,
    pub max_impact: f64,
    pub seatbelt_violations: i64,
    pub total_sensor_points: i64,
}

/// Risk assessment produced per query; never stored or cached.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    // ---
    pub risk_score: u32,
    pub accidents_count: i64,
    pub sensor_events_count: i64,
    pub weather_condition: String,
}
