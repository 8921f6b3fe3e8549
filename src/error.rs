//! Error taxonomy for the HTTP boundary.
//!
//! Only the error classes that surface to a client live here. Two classes
//! from the service's failure model are deliberately absent because they are
//! absorbed at their seams and never become responses:
//! - weather-provider failures collapse to `None` inside `weather` and the
//!   risk aggregator proceeds with a degraded "Unknown" condition;
//! - notification-dispatch failures are logged by `alert` and never reach
//!   any caller.
//!
//! No error path retries; every failure is single-attempt and final.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;

// ---

/// Client- and infrastructure-caused failures, mapped to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Payload failed schema validation. 400, never persisted.
    Validation(String),
    /// Missing or wrong shared-secret credential. 401.
    Auth,
    /// Malformed risk-query parameters (non-finite lat/lng, bad timestamp). 400.
    InvalidInput(String),
    /// Store failure on a write or non-degradable read path. 500.
    Storage(sqlx::Error),
    /// Explicit notification request failed to dispatch. 500.
    Notification(anyhow::Error),
}

impl IntoResponse for ApiError {
    // ---
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::Auth => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized: Invalid API Key".to_string(),
            ),
            ApiError::InvalidInput(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::Storage(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            ApiError::Notification(e) => {
                tracing::error!("Failed to send notification: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to send email".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    // ---
    fn from(e: sqlx::Error) -> Self {
        ApiError::Storage(e)
    }
}
