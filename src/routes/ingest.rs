//! Ingestion endpoints: sensor readings, accident events, and the manual
//! emergency-alert trigger.
//!
//! Each accepted record walks the same pipeline: credential check →
//! validation → server timestamp → persistence → threshold alerting. A
//! rejected payload is terminal (nothing persisted, nothing alerted), a
//! persistence failure surfaces as a server error before alerting, and an
//! alert-dispatch failure never affects the response once the record is
//! stored.

use axum::{
    extract::Query, extract::State, http::HeaderMap, routing::post, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::AppState;
use crate::error::ApiError;
use crate::models::NewReading;
use crate::validate::{validate, EntityKind};
use crate::{alert, store, Config};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/sensor", post(post_sensor))
        .route("/api/accident", post(post_accident))
        .route("/api/emergency-alert", post(post_emergency_alert))
}

/// Shared-secret credential, accepted via header or query parameter.
#[derive(Debug, Deserialize)]
struct AuthQuery {
    api_key: Option<String>,
}

fn check_api_key(config: &Config, headers: &HeaderMap, auth: &AuthQuery) -> Result<(), ApiError> {
    // ---
    let provided = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or(auth.api_key.as_deref());

    match provided {
        Some(key) if key == config.api_key => Ok(()),
        _ => Err(ApiError::Auth),
    }
}

/// Parse and validate a raw request body into an accepted reading.
///
/// The body is parsed by hand rather than through the `Json` extractor so
/// that malformed JSON gets the same structured `{error}` rejection as a
/// schema violation.
fn accept_payload(kind: EntityKind, body: &str) -> Result<NewReading, ApiError> {
    // ---
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Validation(format!("Invalid JSON body: {e}")))?;

    validate(kind, &payload).map_err(|e| ApiError::Validation(e.to_string()))?;

    // Validation guarantees the shape, so a deserialization failure here is a
    // schema/model mismatch and still reads as a client error.
    serde_json::from_value(payload)
        .map_err(|e| ApiError::Validation(format!("Invalid payload: {e}")))
}

// ---

/// Handle `POST /api/sensor`: live telemetry ingestion.
async fn post_sensor(
    State(state): State<AppState>,
    Query(auth): Query<AuthQuery>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    // ---
    check_api_key(&state.config, &headers, &auth)?;

    let reading = accept_payload(EntityKind::Sensor, &body)?;

    // Server clock wins; a client timestamp is correlation-only.
    let accepted_at = Utc::now();
    if let Some(client_ts) = &reading.timestamp {
        debug!(
            "POST /api/sensor - device {} client timestamp {}",
            reading.device_id, client_ts
        );
    }

    let id = store::insert_sensor(&state.pool, &reading, accepted_at).await?;
    info!("POST /api/sensor - Stored reading {} from {}", id, reading.device_id);

    // Alert evaluation only runs once persistence has succeeded, and its
    // outcome never changes the response.
    if alert::should_alert(&reading) {
        alert::dispatch(
            state.notifier.clone(),
            state.config.emergency_contact.clone(),
            &reading,
            accepted_at,
        );
    }

    Ok(Json(json!({ "status": "ok", "id": id })))
}

/// Handle `POST /api/accident`: flagged incident ingestion.
async fn post_accident(
    State(state): State<AppState>,
    Query(auth): Query<AuthQuery>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    // ---
    check_api_key(&state.config, &headers, &auth)?;

    let reading = accept_payload(EntityKind::Accident, &body)?;

    let accepted_at = Utc::now();
    let id = Uuid::new_v4().to_string();

    store::insert_accident(&state.pool, &id, &reading, accepted_at).await?;
    info!("POST /api/accident - Stored event {} from {}", id, reading.device_id);

    Ok(Json(json!({ "status": "ok", "id": id })))
}

/// Body of a manual emergency-alert request.
#[derive(Debug, Deserialize)]
struct EmergencyAlertRequest {
    email: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Handle `POST /api/emergency-alert`: send a location email on demand.
///
/// Unlike threshold alerting this dispatch is awaited, since delivery is the
/// whole point of the request.
async fn post_emergency_alert(
    State(state): State<AppState>,
    Json(request): Json<EmergencyAlertRequest>,
) -> Result<Json<Value>, ApiError> {
    // ---
    let (Some(email), Some(latitude), Some(longitude)) =
        (request.email, request.latitude, request.longitude)
    else {
        return Err(ApiError::Validation(
            "Missing email or location data".to_string(),
        ));
    };

    let body = format!(
        "An emergency alert has been triggered.\nLocation: https://www.google.com/maps?q={},{}\nPlease respond immediately.",
        latitude, longitude
    );

    state
        .notifier
        .send(&email, alert::ALERT_SUBJECT, &body)
        .await
        .map_err(ApiError::Notification)?;

    Ok(Json(json!({ "status": "ok", "message": "Emergency alert email sent" })))
}
