use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use crate::notify::Notifier;
use crate::weather::WeatherProvider;
use crate::Config;

mod health;
mod ingest;
mod read;
mod risk;

// ---

/// Shared state for all routes: the connection pool plus the two external
/// collaborators, constructed once at startup and injected here instead of
/// living as ambient globals.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub pool: PgPool,
    pub config: Config,
    pub weather: Arc<dyn WeatherProvider>,
    pub notifier: Arc<dyn Notifier>,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(health::router())
        .merge(ingest::router())
        .merge(read::router())
        .merge(risk::router())
        .with_state(state)
}
