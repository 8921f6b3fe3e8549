//! Configuration loader for the `safedrive-backend` service.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). By consolidating configuration logic
//! here, we avoid scattering `env::var` calls throughout the codebase.

use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Port the HTTP server binds to.
    pub port: u16,

    /// Shared secret required on the ingestion endpoints.
    pub api_key: String,

    /// Recipient of threshold-alert notifications.
    pub emergency_contact: String,

    /// HTTP mail relay endpoint; notifications are disabled when unset.
    pub mail_relay_url: Option<String>,

    /// Bearer token for the mail relay, if it requires one.
    pub mail_relay_key: Option<String>,

    /// Sender address for outbound notifications.
    pub mail_from: String,

    /// Weather provider endpoint; risk queries degrade to an "Unknown"
    /// condition when unset.
    pub weather_api_url: Option<String>,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `PORT` – HTTP bind port (default: 4000)
/// - `SAFEDRIVE_API_KEY` – ingestion shared secret (default: development key)
/// - `EMERGENCY_CONTACT_EMAIL` – alert recipient
/// - `MAIL_RELAY_URL` / `MAIL_RELAY_KEY` / `MAIL_FROM` – notification channel
/// - `WEATHER_API_URL` – weather provider endpoint
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let port = parse_env_u32!("PORT", 4000) as u16;

    // Change for production
    let api_key =
        env::var("SAFEDRIVE_API_KEY").unwrap_or_else(|_| "safedrive_secret_key".to_string());
    let emergency_contact = env::var("EMERGENCY_CONTACT_EMAIL")
        .unwrap_or_else(|_| "emergency_contact@example.com".to_string());
    let mail_relay_url = env::var("MAIL_RELAY_URL").ok();
    let mail_relay_key = env::var("MAIL_RELAY_KEY").ok();
    let mail_from =
        env::var("MAIL_FROM").unwrap_or_else(|_| "alerts@safedrive.example.com".to_string());
    let weather_api_url = env::var("WEATHER_API_URL").ok();

    Ok(Config {
        db_url,
        db_pool_max,
        port,
        api_key,
        emergency_contact,
        mail_relay_url,
        mail_relay_key,
        mail_from,
        weather_api_url,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords and secrets while
    /// showing all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL            : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX             : {}", self.db_pool_max);
        tracing::info!("  PORT                    : {}", self.port);
        tracing::info!("  SAFEDRIVE_API_KEY       : ****");
        tracing::info!("  EMERGENCY_CONTACT_EMAIL : {}", self.emergency_contact);
        tracing::info!(
            "  MAIL_RELAY_URL          : {}",
            self.mail_relay_url.as_deref().unwrap_or("(unset, notifications disabled)")
        );
        tracing::info!("  MAIL_FROM               : {}", self.mail_from);
        tracing::info!(
            "  WEATHER_API_URL         : {}",
            self.weather_api_url.as_deref().unwrap_or("(unset, weather degraded)")
        );
    }
}
