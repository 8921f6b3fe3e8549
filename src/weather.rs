//! Weather adapter: external provider lookup plus shape normalization.
//!
//! The risk aggregator only needs a human-readable condition text and a
//! severity flag, so this module reduces whatever the configured provider
//! returns to that pair. Every provider failure mode — unreachable endpoint,
//! non-JSON body, a response with no discernible condition — collapses to
//! `None`, letting callers proceed with degraded information.

use chrono::{DateTime, Utc};
use serde_json::Value;

// ---

/// Condition substrings that mark weather as severe (case-insensitive).
const SEVERE_MARKERS: &[&str] = &["rain", "storm", "snow"];

/// Normalized view of one provider response. Ephemeral: recomputed per risk
/// query, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherSnapshot {
    // ---
    pub condition_text: String,
    pub is_severe: bool,
}

impl WeatherSnapshot {
    pub fn from_condition(condition_text: String) -> Self {
        // ---
        let is_severe = is_severe_condition(&condition_text);
        WeatherSnapshot {
            condition_text,
            is_severe,
        }
    }
}

/// `true` iff the condition text contains rain, storm, or snow.
pub fn is_severe_condition(text: &str) -> bool {
    // ---
    let lowered = text.to_lowercase();
    SEVERE_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Abstraction over the external weather lookup.
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions near a point, or `None` when the provider is
    /// unavailable or its response is unusable.
    async fn current(&self, lat: f64, lng: f64, timestamp: DateTime<Utc>) -> Option<WeatherSnapshot>;
}

/// [`WeatherProvider`] backed by an HTTP weather API.
///
/// Unconfigured deployments (no `WEATHER_API_URL`) get a provider that is
/// permanently unavailable; the risk aggregator then always scores with an
/// "Unknown" condition.
pub struct HttpWeatherProvider {
    // ---
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpWeatherProvider {
    pub fn new(base_url: Option<String>) -> Self {
        // ---
        HttpWeatherProvider {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl WeatherProvider for HttpWeatherProvider {
    // ---
    async fn current(&self, lat: f64, lng: f64, timestamp: DateTime<Utc>) -> Option<WeatherSnapshot> {
        // ---
        let base_url = self.base_url.as_deref()?;
        let url = format!(
            "{}?lat={}&lng={}&timestamp={}",
            base_url,
            lat,
            lng,
            timestamp.to_rfc3339()
        );

        tracing::debug!("Fetching weather data from: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Weather provider unreachable: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Weather provider returned status {}", response.status());
            return None;
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Weather provider returned malformed body: {}", e);
                return None;
            }
        };

        match extract_condition(&body) {
            Some(text) => Some(WeatherSnapshot::from_condition(text)),
            None => {
                tracing::warn!("Weather response carried no condition text");
                None
            }
        }
    }
}

/// Pull a condition description out of whichever response shape the provider
/// uses. Probes, in order:
/// - OpenWeather-style `current.weather[0]` / top-level `weather[0]`
///   (preferring `description` over `main`)
/// - WeatherAPI-style `current.condition.text`
/// - MetaWeather-style `consolidated_weather[0].weather_state_name`
pub fn extract_condition(body: &Value) -> Option<String> {
    // ---
    for entry in [&body["current"]["weather"][0], &body["weather"][0]] {
        if let Some(text) = entry["description"].as_str().or(entry["main"].as_str()) {
            return Some(text.to_string());
        }
    }

    if let Some(text) = body["current"]["condition"]["text"].as_str() {
        return Some(text.to_string());
    }

    body["consolidated_weather"][0]["weather_state_name"]
        .as_str()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_matches_substrings_case_insensitively() {
        // ---
        assert!(is_severe_condition("Light Rain"));
        assert!(is_severe_condition("THUNDERSTORM"));
        assert!(is_severe_condition("snow showers"));
        assert!(!is_severe_condition("Clear"));
        assert!(!is_severe_condition("Partly cloudy"));
        // "brainstorming" would match; acceptable for provider vocabularies.
    }

    #[test]
    fn extracts_nested_current_weather_shape() {
        // ---
        let body = json!({
            "current": { "weather": [{ "main": "Rain", "description": "light rain" }] }
        });
        assert_eq!(extract_condition(&body).as_deref(), Some("light rain"));
    }

    #[test]
    fn extracts_top_level_weather_shape_falling_back_to_main() {
        // ---
        let body = json!({ "weather": [{ "main": "Clouds" }] });
        assert_eq!(extract_condition(&body).as_deref(), Some("Clouds"));
    }

    #[test]
    fn extracts_condition_text_shape() {
        // ---
        let body = json!({ "current": { "condition": { "text": "Heavy snow" } } });
        assert_eq!(extract_condition(&body).as_deref(), Some("Heavy snow"));
    }

    #[test]
    fn extracts_consolidated_weather_shape() {
        // ---
        let body = json!({
            "consolidated_weather": [{ "weather_state_name": "Showers" }]
        });
        assert_eq!(extract_condition(&body).as_deref(), Some("Showers"));
    }

    #[test]
    fn unusable_bodies_yield_none() {
        // ---
        assert_eq!(extract_condition(&json!({})), None);
        assert_eq!(extract_condition(&json!({ "weather": [] })), None);
        assert_eq!(extract_condition(&json!({ "current": { "weather": [{}] } })), None);
        assert_eq!(extract_condition(&json!("not an object")), None);
    }

    #[test]
    fn snapshot_classifies_on_construction() {
        // ---
        let severe = WeatherSnapshot::from_condition("Tropical Storm".to_string());
        assert!(severe.is_severe);

        let calm = WeatherSnapshot::from_condition("Sunny".to_string());
        assert!(!calm.is_severe);
    }
}
