//! Database schema management for `safedrive-backend`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `sensor_data` table for ingested telemetry and the
/// `accident_events` table for flagged incidents. Safe to call on every
/// startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Append-only telemetry, identity assigned by the store
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_data (
            id                  SERIAL PRIMARY KEY,
            device_id           TEXT        NOT NULL,
            timestamp           TIMESTAMPTZ NOT NULL,
            alcohol             DOUBLE PRECISION NOT NULL,
            vibration           DOUBLE PRECISION NOT NULL,
            distance            DOUBLE PRECISION NOT NULL,
            seatbelt            BOOLEAN     NOT NULL,
            impact              DOUBLE PRECISION NOT NULL,
            pulse               DOUBLE PRECISION,
            pulse_threshold_min DOUBLE PRECISION,
            pulse_threshold_max DOUBLE PRECISION,
            pulse_history       DOUBLE PRECISION[],
            distance_history    DOUBLE PRECISION[],
            alcohol_history     DOUBLE PRECISION[],
            impact_history      DOUBLE PRECISION[],
            vibration_history   DOUBLE PRECISION[],
            lat                 DOUBLE PRECISION,
            lng                 DOUBLE PRECISION,
            lcd_display         TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Append-only incidents, identity assigned by the ingestion pipeline
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accident_events (
            id                  TEXT PRIMARY KEY,
            device_id           TEXT        NOT NULL,
            timestamp           TIMESTAMPTZ NOT NULL,
            alcohol             DOUBLE PRECISION NOT NULL,
            vibration           DOUBLE PRECISION NOT NULL,
            distance            DOUBLE PRECISION NOT NULL,
            seatbelt            BOOLEAN     NOT NULL,
            impact              DOUBLE PRECISION NOT NULL,
            pulse               DOUBLE PRECISION,
            pulse_threshold_min DOUBLE PRECISION,
            pulse_threshold_max DOUBLE PRECISION,
            pulse_history       DOUBLE PRECISION[],
            distance_history    DOUBLE PRECISION[],
            alcohol_history     DOUBLE PRECISION[],
            impact_history      DOUBLE PRECISION[],
            vibration_history   DOUBLE PRECISION[],
            lat                 DOUBLE PRECISION,
            lng                 DOUBLE PRECISION,
            lcd_display         TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Indexes for the history endpoint and the risk-window count queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_data_timestamp
            ON sensor_data (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_data_lat_lng
            ON sensor_data (lat, lng);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_accident_events_timestamp
            ON accident_events (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_accident_events_lat_lng
            ON accident_events (lat, lng);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
