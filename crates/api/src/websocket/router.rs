//! Inbound message routing
//!
//! Turns text frames into typed commands and runs their handlers. Handlers
//! complete (store write and broadcast included) before the caller reads the
//! next frame of the same connection.

use orderpass_shared::{NewOrder, OrderId, OrderStatus};
use serde_json::Value;
use std::sync::Arc;

use crate::state::AppState;

use super::{
    broadcast::broadcast,
    connection::{Connection, Role},
    events::{coerce_int, ClientEvent, ServerEvent},
};

const CREATE_FAILED: &str = "Failed to create order";

/// A validated client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateOrder(NewOrder),
    UpdateStatus { order_id: OrderId, status: OrderStatus },
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid table number: {0}")]
    InvalidTableNumber(Value),
    #[error("invalid order id: {0}")]
    InvalidOrderId(Value),
    #[error(transparent)]
    InvalidStatus(#[from] orderpass_shared::UnknownStatus),
}

impl Command {
    /// Parse a text frame. `Ok(None)` means a well-formed message of a type
    /// this server does not handle.
    pub fn parse(text: &str) -> Result<Option<Self>, RouteError> {
        let command = match serde_json::from_str::<ClientEvent>(text)? {
            ClientEvent::NewOrder { order } => {
                let table_number = coerce_int(&order.table_number)
                    .filter(|n| *n > 0)
                    .ok_or(RouteError::InvalidTableNumber(order.table_number))?;
                Command::CreateOrder(NewOrder {
                    table_number,
                    items: order.items,
                })
            }
            ClientEvent::UpdateStatus { order_id, status } => {
                let order_id = coerce_int(&order_id)
                    .map(OrderId)
                    .ok_or(RouteError::InvalidOrderId(order_id))?;
                Command::UpdateStatus {
                    order_id,
                    status: status.parse()?,
                }
            }
            ClientEvent::Unknown => return Ok(None),
        };
        Ok(Some(command))
    }
}

/// Handle one text frame from `conn`.
///
/// Nothing here closes the connection. Malformed frames and unknown types are
/// logged and dropped without a reply.
pub async fn route_text(text: &str, conn: &Arc<Connection>, state: &AppState) {
    match Command::parse(text) {
        Ok(Some(command)) => dispatch(command, conn, state).await,
        Ok(None) => {
            tracing::debug!(session_id = %conn.session_id, "Ignoring unknown message type");
        }
        Err(RouteError::Malformed(e)) => {
            tracing::warn!(
                session_id = %conn.session_id,
                error = %e,
                "Failed to parse client message"
            );
        }
        Err(e @ RouteError::InvalidTableNumber(_)) => {
            // Same outcome as a failed insert
            tracing::warn!(session_id = %conn.session_id, error = %e, "Rejected new order");
            reply(conn, &ServerEvent::error(CREATE_FAILED));
        }
        Err(e) => {
            // Status update failures are not reported to the sender
            tracing::warn!(session_id = %conn.session_id, error = %e, "Rejected status update");
        }
    }
}

pub async fn dispatch(command: Command, conn: &Arc<Connection>, state: &AppState) {
    match command {
        Command::CreateOrder(new_order) => handle_new_order(new_order, conn, state).await,
        Command::UpdateStatus { order_id, status } => {
            handle_status_update(order_id, status, conn, state).await
        }
    }
}

async fn handle_new_order(new_order: NewOrder, conn: &Arc<Connection>, state: &AppState) {
    let table_number = new_order.table_number;
    let publish = state.sessions.publish_guard().await;
    let order = match state.orders.create(new_order).await {
        Ok(order) => order,
        Err(e) => {
            tracing::error!(
                session_id = %conn.session_id,
                table_number,
                error = %e,
                "Failed to create order"
            );
            reply(conn, &ServerEvent::error(CREATE_FAILED));
            return;
        }
    };

    let order_id = order.id;
    tracing::info!(order_id = %order_id, table_number, "Order created");

    broadcast(&state.sessions, &[Role::Chef], &ServerEvent::NewOrder { data: order }).await;
    drop(publish);

    reply(
        conn,
        &ServerEvent::OrderConfirmation {
            message: format!("Order #{} sent to kitchen", order_id),
        },
    );
}

async fn handle_status_update(
    order_id: OrderId,
    status: OrderStatus,
    conn: &Arc<Connection>,
    state: &AppState,
) {
    let _publish = state.sessions.publish_guard().await;
    let order = match state.orders.update_status(order_id, status).await {
        Ok(order) => order,
        Err(e) => {
            tracing::error!(
                session_id = %conn.session_id,
                order_id = %order_id,
                status = %status,
                error = %e,
                "Failed to update order status"
            );
            return;
        }
    };

    tracing::info!(order_id = %order_id, status = %status, "Order status updated");

    broadcast(
        &state.sessions,
        &[Role::Waiter, Role::Chef],
        &ServerEvent::status_update(order),
    )
    .await;
}

/// Direct reply to one connection; a closed connection is not an error here
fn reply(conn: &Connection, event: &ServerEvent) {
    if let Err(e) = conn.send(event) {
        tracing::debug!(
            session_id = %conn.session_id,
            event_type = event.event_type(),
            error = %e,
            "Dropped reply"
        );
    }
}
