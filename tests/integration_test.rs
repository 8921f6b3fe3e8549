//! Live-server integration tests.
//!
//! These run against an already-started backend (`BASE_URL`, default
//! `http://localhost:4000`) with `SAFEDRIVE_API_KEY` matching the server's
//! configured secret.

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

// ---

fn base_url() -> String {
    // ---
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:4000".into())
}

fn api_key() -> String {
    // ---
    std::env::var("SAFEDRIVE_API_KEY").unwrap_or_else(|_| "safedrive_secret_key".into())
}

fn sample_reading() -> Value {
    // ---
    json!({
        "device_id": "it-device-01",
        "timestamp": "2025-04-23T20:10:00Z",
        "alcohol": 0.02,
        "vibration": 0.9,
        "distance": 22.5,
        "seatbelt": true,
        "impact": 1.1,
        "pulse": 78.0,
        "pulse_history": [70.0, 72.0, 78.0],
        "lat": 5.6545,
        "lng": -0.1869,
        "lcd_display": "Speed: 40km/h"
    })
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    // ---
    let body: Value = Client::new()
        .get(format!("{}/api/health", base_url()))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    assert!(body["time"].is_string(), "health should carry a timestamp");
    Ok(())
}

#[tokio::test]
async fn ingestion_requires_api_key() -> Result<()> {
    // ---
    let response = Client::new()
        .post(format!("{}/api/sensor", base_url()))
        .json(&sample_reading())
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert!(body["error"].as_str().unwrap_or_default().contains("API Key"));
    Ok(())
}

#[tokio::test]
async fn invalid_payload_is_rejected_and_not_persisted() -> Result<()> {
    // ---
    let client = Client::new();
    let mut payload = sample_reading();
    payload["device_id"] = json!("it-reject-01");
    payload["distance_history"] = json!(["a", 1, 2]);

    let response = client
        .post(format!("{}/api/sensor", base_url()))
        .header("x-api-key", api_key())
        .json(&payload)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await?;
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("distance_history"),
        "rejection should name the offending field"
    );

    // The rejected reading must not show up in the history projection.
    let history: Vec<Value> = client
        .get(format!("{}/api/sensor/history", base_url()))
        .send()
        .await?
        .json()
        .await?;
    assert!(
        history
            .iter()
            .all(|r| r["device_id"] != "it-reject-01"),
        "rejected payload was persisted"
    );
    Ok(())
}

#[tokio::test]
async fn accepted_reading_returns_ok_with_id() -> Result<()> {
    // ---
    let response = Client::new()
        .post(format!("{}/api/sensor", base_url()))
        .header("x-api-key", api_key())
        .json(&sample_reading())
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "ok");
    assert!(body["id"].is_number(), "sensor id is store-assigned");
    Ok(())
}

#[tokio::test]
async fn critical_reading_still_acknowledged_when_mail_fails() -> Result<()> {
    // ---
    // Over the alcohol threshold; with no mail relay configured the dispatch
    // fails internally, but the ingestion contract is unaffected.
    let mut payload = sample_reading();
    payload["alcohol"] = json!(0.9);

    let response = Client::new()
        .post(format!("{}/api/sensor", base_url()))
        .header("x-api-key", api_key())
        .json(&payload)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn accident_gets_server_generated_id() -> Result<()> {
    // ---
    let response = Client::new()
        .post(format!("{}/api/accident?api_key={}", base_url(), api_key()))
        .json(&sample_reading())
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "ok");

    let id = body["id"].as_str().expect("accident id is a string");
    assert!(!id.is_empty());

    // The stored event is retrievable under that id.
    let event: Value = Client::new()
        .get(format!("{}/api/accident/{}", base_url(), id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(event["id"], *id);
    Ok(())
}

#[tokio::test]
async fn unknown_accident_id_is_not_found() -> Result<()> {
    // ---
    let response = Client::new()
        .get(format!("{}/api/accident/no-such-id", base_url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn risk_query_requires_all_parameters() -> Result<()> {
    // ---
    let response = Client::new()
        .get(format!("{}/api/risk?lat=5.6545&lng=-0.1869", base_url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = Client::new()
        .get(format!(
            "{}/api/risk?lat=abc&lng=-0.1869&timestamp=2025-04-23T20:10:00Z",
            base_url()
        ))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn risk_assessment_is_bounded_and_repeatable() -> Result<()> {
    // ---
    let url = format!(
        "{}/api/risk?lat=5.6545&lng=-0.1869&timestamp=2025-04-23T20:10:00Z",
        base_url()
    );
    let client = Client::new();

    let first: Value = client.get(&url).send().await?.json().await?;
    let score = first["riskScore"].as_u64().expect("riskScore present");
    assert!(score <= 100, "riskScore {score} out of bounds");
    assert!(first["accidentsCount"].as_i64().unwrap_or(-1) >= 0);
    assert!(first["sensorEventsCount"].as_i64().unwrap_or(-1) >= 0);
    assert!(first["weatherCondition"].is_string());

    // Identical query against an unchanged store: identical assessment.
    let second: Value = client.get(&url).send().await?.json().await?;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn stats_projection_has_expected_shape() -> Result<()> {
    // ---
    let stats: Value = Client::new()
        .get(format!("{}/api/stats", base_url()))
        .send()
        .await?
        .json()
        .await?;

    for field in [
        "total_accidents",
        "max_alcohol",
        "avg_alcohol",
        "max_impact",
        "seatbelt_violations",
        "total_sensor_points",
    ] {
        assert!(stats[field].is_number(), "stats missing {field}");
    }
    Ok(())
}
