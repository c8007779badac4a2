//! Role-scoped fan-out of server events

use std::sync::Arc;

use super::{
    connection::{Outbound, Role},
    events::ServerEvent,
    registry::SessionRegistry,
};

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
}

/// Serialize `event` once and queue the same frame on every open connection
/// of the given roles.
///
/// Delivery is fire-and-forget: connections that are closed, or close between
/// the registry snapshot and the send, are skipped without affecting the
/// others.
pub async fn broadcast(
    registry: &SessionRegistry,
    roles: &[Role],
    event: &ServerEvent,
) -> BroadcastReport {
    let text: Outbound = match serde_json::to_string(event) {
        Ok(json) => json.into(),
        Err(e) => {
            tracing::error!(error = ?e, event_type = event.event_type(), "Failed to serialize broadcast event");
            return BroadcastReport::default();
        }
    };

    let mut report = BroadcastReport::default();
    for &role in roles {
        registry
            .for_each(role, |conn| {
                if !conn.is_open() {
                    report.skipped += 1;
                    return;
                }
                match conn.send_text(Arc::clone(&text)) {
                    Ok(()) => report.delivered += 1,
                    Err(_) => {
                        report.skipped += 1;
                        tracing::debug!(
                            session_id = %conn.session_id,
                            "Skipping connection that closed during broadcast"
                        );
                    }
                }
            })
            .await;
    }

    tracing::debug!(
        event_type = event.event_type(),
        roles = ?roles,
        recipients = report.delivered,
        skipped = report.skipped,
        "Broadcast event"
    );

    report
}
