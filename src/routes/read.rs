//! Read projections over the record store.
//!
//! Boundary-layer resilience policy: these dashboard endpoints degrade to a
//! documented fallback payload when the store is unavailable instead of
//! propagating a raw storage error. Only the by-id detail lookup reports a
//! server error, since there is no meaningful stand-in for a specific
//! record.

use axum::{
    extract::Path, extract::State, http::StatusCode, response::IntoResponse, response::Response,
    routing::get, Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tracing::{error, warn};

use super::AppState;
use crate::error::ApiError;
use crate::models::SensorReading;
use crate::store;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/sensor", get(latest_sensor))
        .route("/api/sensor/history", get(sensor_history))
        .route("/api/map", get(accident_map))
        .route("/api/accidents", get(accidents))
        .route("/api/accident/{id}", get(accident_by_id))
        .route("/api/stats", get(stats))
        .route("/api/car/position", get(car_position))
}

/// Handle `GET /api/sensor`: latest reading, or a static snapshot when the
/// store has nothing to offer.
async fn latest_sensor(State(state): State<AppState>) -> Response {
    // ---
    match store::latest_sensor(&state.pool).await {
        Ok(Some(reading)) => Json(reading).into_response(),
        Ok(None) => {
            warn!("No sensor data stored yet, serving fallback snapshot");
            Json(fallback_sensor_snapshot()).into_response()
        }
        Err(e) => {
            error!("Database error in sensor endpoint: {}", e);
            Json(fallback_sensor_snapshot()).into_response()
        }
    }
}

/// Handle `GET /api/sensor/history`: newest-first, capped at 1000 rows.
/// Degrades to an empty series when the store is unavailable.
async fn sensor_history(State(state): State<AppState>) -> Json<Vec<SensorReading>> {
    // ---
    match store::sensor_history(&state.pool, 1000).await {
        Ok(history) => Json(history),
        Err(e) => {
            error!("Database error in sensor history endpoint: {}", e);
            Json(Vec::new())
        }
    }
}

/// Handle `GET /api/map`: located accidents for the dashboard map.
async fn accident_map(State(state): State<AppState>) -> Response {
    // ---
    match store::accident_map_points(&state.pool).await {
        Ok(points) => Json(points).into_response(),
        Err(e) => {
            error!("Database error in map endpoint: {}", e);
            Json(fallback_map_points()).into_response()
        }
    }
}

/// Handle `GET /api/accidents`: all accident events, newest-first.
async fn accidents(State(state): State<AppState>) -> Response {
    // ---
    match store::all_accidents(&state.pool).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => {
            error!("Database error in accidents endpoint: {}", e);
            Json(fallback_accidents()).into_response()
        }
    }
}

/// Handle `GET /api/accident/{id}`.
async fn accident_by_id(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    // ---
    match store::accident_by_id(&state.pool, &id).await? {
        Some(event) => Ok(Json(event).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Not found" })),
        )
            .into_response()),
    }
}

/// Handle `GET /api/stats`: aggregate statistics with a mock fallback.
async fn stats(State(state): State<AppState>) -> Response {
    // ---
    match store::stats(&state.pool).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            error!("Database error in stats endpoint: {}", e);
            Json(json!({
                "total_accidents": 5,
                "max_alcohol": 0.8,
                "avg_alcohol": 0.3,
                "max_impact": 0.9,
                "seatbelt_violations": 2,
                "total_sensor_points": 120
            }))
            .into_response()
        }
    }
}

/// Handle `GET /api/car/position`: latest located reading as a map marker.
async fn car_position(State(state): State<AppState>) -> Response {
    // ---
    match store::latest_position(&state.pool).await {
        Ok(Some((lat, lng))) => {
            Json(json!({ "lat": lat, "lng": lng, "speed": 42 })).into_response()
        }
        Ok(None) => {
            warn!("No positioned sensor data yet, serving fallback position");
            Json(fallback_position()).into_response()
        }
        Err(e) => {
            error!("Database error in car position endpoint: {}", e);
            Json(fallback_position()).into_response()
        }
    }
}

// ---

fn fallback_sensor_snapshot() -> Value {
    // ---
    json!({
        "id": 1,
        "device_id": "demo-device",
        "alcohol": 0.05,
        "vibration": 0.2,
        "distance": 150,
        "seatbelt": true,
        "impact": 0.1,
        "pulse": 75,
        "lcd_display": "SYSTEM OK",
        "timestamp": Utc::now()
    })
}

fn fallback_map_points() -> Value {
    // ---
    let now = Utc::now();
    json!([
        { "id": "abc123", "lat": 5.6545, "lng": -0.1869, "timestamp": now - Duration::days(1) },
        { "id": "def456", "lat": 5.6540, "lng": -0.1875, "timestamp": now - Duration::days(2) },
        { "id": "ghi789", "lat": 5.6550, "lng": -0.1880, "timestamp": now - Duration::days(3) }
    ])
}

fn fallback_accidents() -> Value {
    // ---
    let now = Utc::now();
    json!([
        {
            "id": "abc123",
            "device_id": "demo-device",
            "alcohol": 0.02,
            "vibration": 0.8,
            "distance": 20,
            "seatbelt": true,
            "impact": 0.9,
            "lat": 5.6545,
            "lng": -0.1869,
            "lcd_display": "ACCIDENT DETECTED",
            "timestamp": now - Duration::days(1)
        },
        {
            "id": "def456",
            "device_id": "demo-device",
            "alcohol": 0.04,
            "vibration": 0.7,
            "distance": 15,
            "seatbelt": false,
            "impact": 0.8,
            "lat": 5.6540,
            "lng": -0.1875,
            "lcd_display": "ACCIDENT DETECTED",
            "timestamp": now - Duration::days(2)
        }
    ])
}

fn fallback_position() -> Value {
    // ---
    // University of Ghana, Legon
    json!({ "lat": 5.6545, "lng": -0.1869, "speed": 42 })
}
