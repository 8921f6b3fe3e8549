//! Record store: all SQL against the `sensor_data` and `accident_events`
//! tables lives here. Both tables are append-only; rows are never mutated or
//! deleted by this service.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{AccidentEvent, MapPoint, NewReading, SensorReading, Stats};

// ---

/// Spatial-temporal window for historical count queries. A fixed bounding
/// box in degrees, not a geodesic radius; distorts at high latitude, which
/// matches the documented approximation.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryWindow {
    // ---
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// ---

/// Insert an accepted sensor reading; the store assigns the row identity.
pub async fn insert_sensor(
    pool: &PgPool,
    reading: &NewReading,
    timestamp: DateTime<Utc>,
) -> Result<i32, sqlx::Error> {
    // ---
    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO sensor_data (
            device_id, timestamp, alcohol, vibration, distance, seatbelt, impact,
            pulse, pulse_threshold_min, pulse_threshold_max,
            pulse_history, distance_history, alcohol_history, impact_history, vibration_history,
            lat, lng, lcd_display
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING id
        "#,
    )
    .bind(&reading.device_id)
    .bind(timestamp)
    .bind(reading.alcohol)
    .bind(reading.vibration)
    .bind(reading.distance)
    .bind(reading.seatbelt)
    .bind(reading.impact)
    .bind(reading.pulse)
    .bind(reading.pulse_threshold_min)
    .bind(reading.pulse_threshold_max)
    .bind(&reading.pulse_history)
    .bind(&reading.distance_history)
    .bind(&reading.alcohol_history)
    .bind(&reading.impact_history)
    .bind(&reading.vibration_history)
    .bind(reading.lat)
    .bind(reading.lng)
    .bind(&reading.lcd_display)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Insert an accepted accident event under a server-generated identifier.
pub async fn insert_accident(
    pool: &PgPool,
    id: &str,
    reading: &NewReading,
    timestamp: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO accident_events (
            id, device_id, timestamp, alcohol, vibration, distance, seatbelt, impact,
            pulse, pulse_threshold_min, pulse_threshold_max,
            pulse_history, distance_history, alcohol_history, impact_history, vibration_history,
            lat, lng, lcd_display
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        "#,
    )
    .bind(id)
    .bind(&reading.device_id)
    .bind(timestamp)
    .bind(reading.alcohol)
    .bind(reading.vibration)
    .bind(reading.distance)
    .bind(reading.seatbelt)
    .bind(reading.impact)
    .bind(reading.pulse)
    .bind(reading.pulse_threshold_min)
    .bind(reading.pulse_threshold_max)
    .bind(&reading.pulse_history)
    .bind(&reading.distance_history)
    .bind(&reading.alcohol_history)
    .bind(&reading.impact_history)
    .bind(&reading.vibration_history)
    .bind(reading.lat)
    .bind(reading.lng)
    .bind(&reading.lcd_display)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recently ingested sensor reading, if any.
pub async fn latest_sensor(pool: &PgPool) -> Result<Option<SensorReading>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, SensorReading>(
        "SELECT * FROM sensor_data ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
}

/// Sensor readings newest-first, capped at `limit` rows.
pub async fn sensor_history(pool: &PgPool, limit: i64) -> Result<Vec<SensorReading>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, SensorReading>(
        "SELECT * FROM sensor_data ORDER BY timestamp DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Most recent sensor reading that carries a position.
pub async fn latest_position(pool: &PgPool) -> Result<Option<(f64, f64)>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, (f64, f64)>(
        r#"
        SELECT lat, lng FROM sensor_data
        WHERE lat IS NOT NULL AND lng IS NOT NULL
        ORDER BY id DESC LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

/// All accident events, newest-first.
pub async fn all_accidents(pool: &PgPool) -> Result<Vec<AccidentEvent>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, AccidentEvent>(
        "SELECT * FROM accident_events ORDER BY timestamp DESC",
    )
    .fetch_all(pool)
    .await
}

/// One accident event by its server-assigned identifier.
pub async fn accident_by_id(pool: &PgPool, id: &str) -> Result<Option<AccidentEvent>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, AccidentEvent>("SELECT * FROM accident_events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Located accidents for the dashboard map.
pub async fn accident_map_points(pool: &PgPool) -> Result<Vec<MapPoint>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, MapPoint>(
        r#"
        SELECT id, lat, lng, timestamp FROM accident_events
        WHERE lat IS NOT NULL AND lng IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Aggregate statistics over both tables, computed in one round trip.
pub async fn stats(pool: &PgPool) -> Result<Stats, sqlx::Error> {
    // ---
    sqlx::query_as::<_, Stats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM accident_events)                              AS total_accidents,
            (SELECT COALESCE(MAX(alcohol), 0) FROM accident_events)             AS max_alcohol,
            (SELECT COALESCE(AVG(alcohol), 0) FROM accident_events)             AS avg_alcohol,
            (SELECT COALESCE(MAX(impact), 0) FROM accident_events)              AS max_impact,
            (SELECT COUNT(*) FROM accident_events WHERE seatbelt = FALSE)       AS seatbelt_violations,
            (SELECT COUNT(*) FROM sensor_data)                                  AS total_sensor_points
        "#,
    )
    .fetch_one(pool)
    .await
}

/// Count accident events inside a spatial-temporal window (bounds inclusive).
pub async fn count_accidents_in(pool: &PgPool, window: &QueryWindow) -> Result<i64, sqlx::Error> {
    // ---
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM accident_events
        WHERE lat BETWEEN $1 AND $2
          AND lng BETWEEN $3 AND $4
          AND timestamp BETWEEN $5 AND $6
        "#,
    )
    .bind(window.lat_min)
    .bind(window.lat_max)
    .bind(window.lng_min)
    .bind(window.lng_max)
    .bind(window.start)
    .bind(window.end)
    .fetch_one(pool)
    .await
}

/// Count sensor readings inside a spatial-temporal window (bounds inclusive).
pub async fn count_sensors_in(pool: &PgPool, window: &QueryWindow) -> Result<i64, sqlx::Error> {
    // ---
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM sensor_data
        WHERE lat BETWEEN $1 AND $2
          AND lng BETWEEN $3 AND $4
          AND timestamp BETWEEN $5 AND $6
        "#,
    )
    .bind(window.lat_min)
    .bind(window.lat_max)
    .bind(window.lng_min)
    .bind(window.lng_max)
    .bind(window.start)
    .bind(window.end)
    .fetch_one(pool)
    .await
}
