//! Read-only order and connection routes

use axum::{extract::State, Json};
use orderpass_shared::Order;

use crate::{error::ApiResult, state::AppState, websocket::RegistryStats};

/// All orders, newest first
pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list_all().await?))
}

/// Live connection counts per role
pub async fn ws_stats(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.sessions.stats().await)
}
