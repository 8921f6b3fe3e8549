//! Risk scoring: spatial-temporal density of historical records blended with
//! the current weather signal into a bounded heuristic score.
//!
//! The historical counts are the primary signal: a store failure aborts the
//! assessment. The weather branch is secondary and degradable: an
//! unavailable provider yields an "Unknown" condition with no severity
//! bonus, never an error.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::RiskAssessment;
use crate::store::{self, QueryWindow};
use crate::weather::WeatherProvider;

// ---

/// Score contribution per accident event in the window.
pub const ACCIDENT_WEIGHT: i64 = 10;

/// Score contribution per sensor reading in the window.
pub const SENSOR_EVENT_WEIGHT: i64 = 2;

/// Flat bonus applied when current weather is severe.
pub const SEVERE_WEATHER_BONUS: i64 = 20;

/// Upper bound of the reported score.
pub const MAX_RISK_SCORE: i64 = 100;

/// Lookback horizon of the historical window.
pub const WINDOW_DAYS: i64 = 7;

/// Half-width of the bounding box around the query point, in degrees.
pub const WINDOW_HALF_WIDTH_DEG: f64 = 0.1;

/// Reported condition when the weather provider is unavailable.
pub const UNKNOWN_CONDITION: &str = "Unknown";

// ---

/// Assess risk at a location and time given as raw request parameters.
///
/// Fails with `InvalidInput` when lat/lng are not finite numbers or the
/// timestamp is unparseable, and with `Storage` when a historical count
/// query fails. The count queries and the weather lookup run concurrently;
/// the assessment is assembled once all three signals are in.
pub async fn score(
    pool: &PgPool,
    provider: &dyn WeatherProvider,
    lat_raw: &str,
    lng_raw: &str,
    timestamp_raw: &str,
) -> Result<RiskAssessment, ApiError> {
    // ---
    let lat = parse_coordinate(lat_raw)
        .ok_or_else(|| ApiError::InvalidInput("Invalid lat parameter".to_string()))?;
    let lng = parse_coordinate(lng_raw)
        .ok_or_else(|| ApiError::InvalidInput("Invalid lng parameter".to_string()))?;
    let timestamp = parse_timestamp(timestamp_raw)
        .ok_or_else(|| ApiError::InvalidInput("Invalid timestamp parameter".to_string()))?;

    let window = query_window(lat, lng, timestamp);

    let (accidents, sensors, weather) = tokio::join!(
        store::count_accidents_in(pool, &window),
        store::count_sensors_in(pool, &window),
        provider.current(lat, lng, timestamp),
    );
    let accidents_count = accidents?;
    let sensor_events_count = sensors?;

    let (weather_condition, severe) = match weather {
        Some(snapshot) => (snapshot.condition_text, snapshot.is_severe),
        None => (UNKNOWN_CONDITION.to_string(), false),
    };

    Ok(RiskAssessment {
        risk_score: compose_score(accidents_count, sensor_events_count, severe),
        accidents_count,
        sensor_events_count,
        weather_condition,
    })
}

/// Weighted, clamped score combination.
pub fn compose_score(accidents: i64, sensors: i64, severe_weather: bool) -> u32 {
    // ---
    let raw = accidents * ACCIDENT_WEIGHT
        + sensors * SENSOR_EVENT_WEIGHT
        + if severe_weather { SEVERE_WEATHER_BONUS } else { 0 };

    raw.clamp(0, MAX_RISK_SCORE) as u32
}

/// The historical query window: last [`WINDOW_DAYS`] days ending at
/// `timestamp`, inside a ±[`WINDOW_HALF_WIDTH_DEG`] bounding box.
pub fn query_window(lat: f64, lng: f64, timestamp: DateTime<Utc>) -> QueryWindow {
    // ---
    QueryWindow {
        lat_min: lat - WINDOW_HALF_WIDTH_DEG,
        lat_max: lat + WINDOW_HALF_WIDTH_DEG,
        lng_min: lng - WINDOW_HALF_WIDTH_DEG,
        lng_max: lng + WINDOW_HALF_WIDTH_DEG,
        start: timestamp - Duration::days(WINDOW_DAYS),
        end: timestamp,
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    // ---
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Accepts RFC 3339 strings and epoch numbers (seconds, or milliseconds for
/// values past the year ~33658 in seconds).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let epoch: i64 = raw.parse().ok()?;
    if epoch.abs() >= 1_000_000_000_000 {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn documented_scenario_scores_seventy() {
        // ---
        // 3 accidents, 10 sensor events, severe weather: 30 + 20 + 20.
        assert_eq!(compose_score(3, 10, true), 70);
    }

    #[test]
    fn empty_window_without_weather_scores_zero() {
        // ---
        assert_eq!(compose_score(0, 0, false), 0);
    }

    #[test]
    fn score_is_clamped_to_one_hundred() {
        // ---
        assert_eq!(compose_score(50, 0, false), 100);
        assert_eq!(compose_score(8, 0, true), 100);
        assert_eq!(compose_score(1_000_000, 1_000_000, true), 100);
    }

    #[test]
    fn score_stays_in_bounds_across_inputs() {
        // ---
        for accidents in [0, 1, 7, 100, 10_000] {
            for sensors in [0, 1, 42, 100_000] {
                for severe in [false, true] {
                    let score = compose_score(accidents, sensors, severe);
                    assert!(score <= 100, "score {score} out of bounds");
                }
            }
        }
    }

    #[test]
    fn severe_weather_adds_flat_bonus() {
        // ---
        assert_eq!(compose_score(1, 1, false), 12);
        assert_eq!(compose_score(1, 1, true), 32);
    }

    #[test]
    fn window_spans_seven_days_and_fixed_box() {
        // ---
        let end = Utc.with_ymd_and_hms(2025, 4, 23, 12, 0, 0).unwrap();
        let window = query_window(5.6545, -0.1869, end);

        assert_eq!(window.end, end);
        assert_eq!(window.start, end - Duration::days(7));
        assert!((window.lat_min - 5.5545).abs() < 1e-9);
        assert!((window.lat_max - 5.7545).abs() < 1e-9);
        assert!((window.lng_min - -0.2869).abs() < 1e-9);
        assert!((window.lng_max - -0.0869).abs() < 1e-9);
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        // ---
        let parsed = parse_timestamp("2025-04-23T20:10:00+01:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 4, 23, 19, 10, 0).unwrap());
    }

    #[test]
    fn parses_epoch_seconds_and_milliseconds() {
        // ---
        let expected = Utc.with_ymd_and_hms(2025, 4, 23, 20, 0, 0).unwrap();
        assert_eq!(parse_timestamp("1745438400").unwrap(), expected);
        assert_eq!(parse_timestamp("1745438400000").unwrap(), expected);
    }

    #[test]
    fn rejects_unparseable_timestamp_and_non_finite_coordinates() {
        // ---
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_coordinate("NaN").is_none());
        assert!(parse_coordinate("inf").is_none());
        assert!(parse_coordinate("").is_none());
        assert_eq!(parse_coordinate(" 5.6545 "), Some(5.6545));
    }
}
