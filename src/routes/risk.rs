//! Risk-scoring endpoint.

use axum::{extract::Query, extract::State, routing::get, Json, Router};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::error::ApiError;
use crate::models::RiskAssessment;
use crate::risk;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/risk", get(handler))
}

/// Raw query parameters; parsed and range-checked by the aggregator so that
/// a malformed value yields a structured 400 instead of an extractor
/// rejection.
#[derive(Debug, Deserialize)]
struct RiskQuery {
    lat: Option<String>,
    lng: Option<String>,
    timestamp: Option<String>,
}

/// Handle `GET /api/risk?lat=..&lng=..&timestamp=..`.
async fn handler(
    Query(params): Query<RiskQuery>,
    State(state): State<AppState>,
) -> Result<Json<RiskAssessment>, ApiError> {
    // ---
    let (Some(lat), Some(lng), Some(timestamp)) = (params.lat, params.lng, params.timestamp)
    else {
        return Err(ApiError::InvalidInput(
            "Missing lat, lng or timestamp parameter".to_string(),
        ));
    };

    let assessment = risk::score(&state.pool, state.weather.as_ref(), &lat, &lng, &timestamp).await?;

    info!(
        "GET /api/risk - score {} ({} accidents, {} sensor events, {})",
        assessment.risk_score,
        assessment.accidents_count,
        assessment.sensor_events_count,
        assessment.weather_condition
    );

    Ok(Json(assessment))
}
