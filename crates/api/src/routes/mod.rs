//! API routes

pub mod health;
pub mod orders;
pub mod push;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    state::AppState,
    websocket::{root, ws_handler},
};

/// Create all routes
pub fn create_router(state: AppState) -> Router {
    // WebSocket entry points; `/` also answers plain GETs
    let websocket_routes = Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler));

    let api_routes = Router::new()
        .route("/orders", get(orders::list_orders))
        .route("/ws/stats", get(orders::ws_stats))
        .route("/subscribe/:email", post(push::subscribe))
        .route("/subscriptions/:email", get(push::list_subscriptions))
        .route("/send/:email", post(push::send_notification))
        .route("/vapid-public-key", get(push::vapid_public_key));

    Router::new()
        .merge(websocket_routes)
        .route("/health", get(health::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
