//! Threshold alerter: fixed critical thresholds plus fire-and-forget
//! emergency notification.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::NewReading;
use crate::notify::Notifier;

// ---

/// Alcohol level above which a reading triggers an emergency alert.
pub const CRITICAL_ALCOHOL_LEVEL: f64 = 0.6;

/// Impact force above which a reading triggers an emergency alert.
pub const CRITICAL_IMPACT_LEVEL: f64 = 2.0;

/// Subject line used for every emergency notification.
pub const ALERT_SUBJECT: &str = "SafeDrive Emergency Alert";

/// Pure alert decision. Strictly-greater comparison: a reading exactly at a
/// threshold does not alert.
pub fn should_alert(reading: &NewReading) -> bool {
    // ---
    reading.alcohol > CRITICAL_ALCOHOL_LEVEL || reading.impact > CRITICAL_IMPACT_LEVEL
}

/// Notification body for a critical reading.
pub fn alert_body(reading: &NewReading, timestamp: DateTime<Utc>) -> String {
    // ---
    format!(
        "Critical sensor data detected:\nAlcohol Level: {}\nImpact: {}\nTimestamp: {}",
        reading.alcohol,
        reading.impact,
        timestamp.to_rfc3339()
    )
}

/// Dispatch an emergency notification for an already-persisted reading.
///
/// Fire-and-forget: the send runs on a detached task, so the ingestion
/// response is never held pending delivery. A dispatch failure is logged and
/// otherwise swallowed; there is no retry.
pub fn dispatch(
    notifier: Arc<dyn Notifier>,
    to: String,
    reading: &NewReading,
    timestamp: DateTime<Utc>,
) {
    // ---
    tracing::warn!(
        "Emergency alert triggered: device={} alcohol={} impact={}",
        reading.device_id,
        reading.alcohol,
        reading.impact
    );

    let body = alert_body(reading, timestamp);
    tokio::spawn(async move {
        if let Err(e) = notifier.send(&to, ALERT_SUBJECT, &body).await {
            tracing::error!("Error sending emergency alert email: {}", e);
        }
    });
}
