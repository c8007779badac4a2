//! Health check endpoint

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{state::AppState, websocket::RegistryStats};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub connections: RegistryStats,
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, store_status) = match state.orders.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            tracing::warn!(store = state.orders.name(), error = %e, "Store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: store_status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: format!("{} ({})", state.orders.name(), store_status),
            connections: state.sessions.stats().await,
        }),
    )
}
