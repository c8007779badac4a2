//! Common types used across orderpass

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Account that owns every order created over a socket. Connections carry no
/// identity of their own.
pub const DEFAULT_ACCOUNT_EMAIL: &str = "demo@restaurant.com";

// =============================================================================
// ID Wrappers
// =============================================================================

/// Order ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i32);

impl From<i32> for OrderId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i32);

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Kitchen progress of an order.
///
/// Any status may be set from any other; the kitchen flow is
/// PENDING → PREPARING → READY → DELIVERED by convention only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Delivered => "DELIVERED",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is not one of the four known values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

/// A kitchen order as stored and as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub table_number: i32,
    pub items: Vec<String>,
    pub status: OrderStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Input for creating an order. Status is always PENDING on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub table_number: i32,
    pub items: Vec<String>,
}

/// A browser push subscription registered for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub id: i32,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_id: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Input for registering a push subscription
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            "SERVED".parse::<OrderStatus>(),
            Err(UnknownStatus("SERVED".to_string()))
        );
        // Matching is exact
        assert!("ready".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_wire_shape() {
        let order = Order {
            id: OrderId(7),
            table_number: 5,
            items: vec!["Soup".to_string(), "Bread".to_string()],
            status: OrderStatus::Ready,
            created_at: datetime!(2025-06-01 12:30:00 UTC),
            user: None,
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["tableNumber"], 5);
        assert_eq!(value["items"][1], "Bread");
        assert_eq!(value["status"], "READY");
        assert_eq!(value["createdAt"], "2025-06-01T12:30:00Z");
        assert!(value.get("user").is_none());
    }

    #[test]
    fn test_order_includes_user_when_present() {
        let order = Order {
            id: OrderId(1),
            table_number: 2,
            items: vec![],
            status: OrderStatus::Pending,
            created_at: datetime!(2025-06-01 12:30:00 UTC),
            user: Some(User {
                id: UserId(3),
                email: DEFAULT_ACCOUNT_EMAIL.to_string(),
            }),
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["user"]["email"], "demo@restaurant.com");
        assert_eq!(value["user"]["id"], 3);
    }
}
