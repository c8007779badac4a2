//! WebSocket handler for Axum
//!
//! Upgrades the request, registers the connection under its role, sends the
//! role's order snapshot and then routes frames until the peer goes away.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        RawQuery, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
    Json,
};
use futures::{stream::StreamExt, SinkExt};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::state::AppState;

use super::{
    connection::{Connection, Outbound, Role},
    events::ServerEvent,
    router::route_text,
    snapshot::build_snapshot,
};

/// First `role` value of a raw query string.
///
/// The handshake query is never rejected: repeated keys, other parameters and
/// odd encodings all fall through to "no role" or the first value given.
pub fn role_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "role")
        .map(|(_, value)| value.into_owned())
}

/// WebSocket handler - upgrades HTTP connection to WebSocket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    upgrade(ws, state, query)
}

/// `/` serves both the socket upgrade and a plain banner
pub async fn root(
    ws: Option<WebSocketUpgrade>,
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    match ws {
        Some(ws) => upgrade(ws, state, query),
        None => Json(json!({ "message": "Kitchen order relay" })).into_response(),
    }
}

fn upgrade(ws: WebSocketUpgrade, state: AppState, query: Option<String>) -> Response {
    let role = Role::from_query(role_param(query.as_deref()).as_deref());
    tracing::info!(
        role = role.map(|r| r.as_str()).unwrap_or("none"),
        "WebSocket connection upgrade requested"
    );

    ws.on_upgrade(move |socket| handle_socket(socket, role, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, role: Option<Role>, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let conn = open_session(role, tx, &state).await;
    let session_id = conn.session_id;

    // Messages leave in the order they were queued
    let send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sender.send(Message::Text(text.to_string())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => route_text(&text, &conn, &state).await,
            Ok(Message::Close(_)) => {
                tracing::info!(session_id = %session_id, "WebSocket close frame received");
                break;
            }
            Ok(_) => {} // Axum answers pings; binary frames are ignored
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "WebSocket transport error");
                break;
            }
        }
    }

    close_session(&conn, &state).await;
    send_task.abort();
}

/// Register a new connection and queue its initial snapshot.
///
/// Handlers cannot publish while this runs, so the snapshot is queued before
/// any broadcast that is not already reflected in it.
pub async fn open_session(
    role: Option<Role>,
    tx: mpsc::UnboundedSender<Outbound>,
    state: &AppState,
) -> Arc<Connection> {
    let conn = Arc::new(Connection::new(role, tx));
    let _snapshot = state.sessions.snapshot_guard().await;
    state.sessions.register(&conn).await;

    tracing::info!(
        session_id = %conn.session_id,
        role = role.map(|r| r.as_str()).unwrap_or("none"),
        "WebSocket connection opened"
    );

    match state.orders.list_all().await {
        Ok(orders) => {
            let data = build_snapshot(orders, role);
            let count = data.len();
            if let Err(e) = conn.send(&ServerEvent::InitialOrders { data }) {
                tracing::debug!(session_id = %conn.session_id, error = %e, "Dropped initial snapshot");
            } else {
                tracing::debug!(session_id = %conn.session_id, count, "Initial snapshot queued");
            }
        }
        Err(e) => {
            tracing::error!(
                session_id = %conn.session_id,
                error = %e,
                "Failed to load orders for initial snapshot"
            );
        }
    }

    conn
}

/// Remove a connection from its partition. Safe to call more than once.
pub async fn close_session(conn: &Connection, state: &AppState) {
    if state.sessions.deregister(conn).await {
        tracing::info!(
            session_id = %conn.session_id,
            role = conn.role.map(|r| r.as_str()).unwrap_or("none"),
            "WebSocket connection closed"
        );
    }
}
