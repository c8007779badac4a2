//! WebSocket event types and serialization
//!
//! Defines the client-to-server commands and server-to-client events, plus
//! the lenient integer coercion applied to ids and table numbers.

use orderpass_shared::{Order, OrderId, OrderStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Client-to-Server Events
// =============================================================================

/// Events sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Waiter submits an order for the kitchen
    NewOrder { order: NewOrderPayload },

    /// Kitchen or floor moves an order to another status
    UpdateStatus {
        #[serde(rename = "orderId")]
        order_id: Value,
        status: String,
    },

    /// Any other `type`; ignored
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct NewOrderPayload {
    /// Number or numeric string
    #[serde(rename = "tableNumber")]
    pub table_number: Value,
    pub items: Vec<String>,
}

/// Coerce a JSON number or string to an integer.
///
/// Strings use leading-integer semantics: surrounding whitespace is skipped,
/// an optional sign is accepted and parsing stops at the first non-digit
/// (`" 12abc"` is 12). Floats are truncated toward zero. Returns `None` when
/// no integer can be read or the value does not fit in an `i32`.
pub fn coerce_int(value: &Value) -> Option<i32> {
    let wide = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if !f.is_finite() || f.abs() >= i64::MAX as f64 {
                    return None;
                }
                f.trunc() as i64
            }
        },
        Value::String(s) => parse_leading_int(s)?,
        _ => return None,
    };
    i32::try_from(wide).ok()
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

// =============================================================================
// Server-to-Client Events
// =============================================================================

/// Events sent from server to client
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Role-filtered snapshot sent once after connecting
    InitialOrders { data: Vec<Order> },

    /// Order created; broadcast to chefs
    NewOrder { data: Order },

    /// Acknowledgment to the client that created an order
    OrderConfirmation { message: String },

    /// Order status changed; broadcast to waiters and chefs
    StatusUpdate { data: StatusUpdate },

    /// Error message
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn status_update(order: Order) -> Self {
        Self::StatusUpdate {
            data: StatusUpdate {
                order_id: order.id,
                status: order.status,
                order,
            },
        }
    }

    /// Wire name of the event, for logs
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::InitialOrders { .. } => "initial_orders",
            Self::NewOrder { .. } => "new_order",
            Self::OrderConfirmation { .. } => "order_confirmation",
            Self::StatusUpdate { .. } => "status_update",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub order: Order,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn order() -> Order {
        Order {
            id: OrderId(7),
            table_number: 4,
            items: vec!["Ramen".to_string()],
            status: OrderStatus::Ready,
            created_at: datetime!(2025-06-01 18:00 UTC),
            user: None,
        }
    }

    #[test]
    fn test_new_order_deserialization() {
        let json = r#"{"type":"new_order","order":{"tableNumber":"5","items":["Soup","Bread"]}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        match event {
            ClientEvent::NewOrder { order } => {
                assert_eq!(coerce_int(&order.table_number), Some(5));
                assert_eq!(order.items, vec!["Soup", "Bread"]);
            }
            _ => panic!("Expected NewOrder event"),
        }
    }

    #[test]
    fn test_update_status_deserialization() {
        let json = r#"{"type":"update_status","orderId":7,"status":"READY"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        match event {
            ClientEvent::UpdateStatus { order_id, status } => {
                assert_eq!(coerce_int(&order_id), Some(7));
                assert_eq!(status, "READY");
            }
            _ => panic!("Expected UpdateStatus event"),
        }
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"ping","extra":true}"#).unwrap();
        assert!(matches!(event, ClientEvent::Unknown));
    }

    #[test]
    fn test_malformed_payloads_fail_to_parse() {
        for raw in [
            "not json",
            r#"{"orderId":1}"#,
            r#"{"type":"new_order"}"#,
            r#"{"type":"update_status","orderId":1}"#,
            r#"{"type":"new_order","order":{"tableNumber":1,"items":"Soup"}}"#,
        ] {
            assert!(
                serde_json::from_str::<ClientEvent>(raw).is_err(),
                "{raw} should not parse"
            );
        }
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int(&json!(12)), Some(12));
        assert_eq!(coerce_int(&json!(12.9)), Some(12));
        assert_eq!(coerce_int(&json!(-3)), Some(-3));
        assert_eq!(coerce_int(&json!("12")), Some(12));
        assert_eq!(coerce_int(&json!("  12 ")), Some(12));
        assert_eq!(coerce_int(&json!("12abc")), Some(12));
        assert_eq!(coerce_int(&json!("+8")), Some(8));
        assert_eq!(coerce_int(&json!("-8")), Some(-8));
        assert_eq!(coerce_int(&json!("abc")), None);
        assert_eq!(coerce_int(&json!("")), None);
        assert_eq!(coerce_int(&json!("-")), None);
        assert_eq!(coerce_int(&json!("99999999999")), None);
        assert_eq!(coerce_int(&json!(null)), None);
        assert_eq!(coerce_int(&json!(true)), None);
        assert_eq!(coerce_int(&json!([1])), None);
    }

    #[test]
    fn test_status_update_serialization() {
        let value = serde_json::to_value(ServerEvent::status_update(order())).unwrap();
        assert_eq!(value["type"], "status_update");
        assert_eq!(value["data"]["orderId"], 7);
        assert_eq!(value["data"]["status"], "READY");
        assert_eq!(value["data"]["order"]["tableNumber"], 4);
    }

    #[test]
    fn test_initial_orders_serialization() {
        let event = ServerEvent::InitialOrders {
            data: vec![order()],
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "initial_orders");
        assert_eq!(value["data"][0]["id"], 7);
        assert_eq!(event.event_type(), "initial_orders");
    }

    #[test]
    fn test_confirmation_serialization() {
        let event = ServerEvent::OrderConfirmation {
            message: "Order #7 sent to kitchen".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"order_confirmation","message":"Order #7 sent to kitchen"}"#
        );
    }
}
