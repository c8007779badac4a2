//! Initial-state snapshot for newly connected clients

use orderpass_shared::{Order, OrderStatus};

use super::connection::Role;

/// Whether an order belongs in the snapshot for a role.
///
/// Chefs see the kitchen queue (PENDING and PREPARING); every other role,
/// including unrecognized ones, sees everything not yet DELIVERED.
pub fn visible_to(role: Option<Role>, status: OrderStatus) -> bool {
    match role {
        Some(Role::Chef) => matches!(status, OrderStatus::Pending | OrderStatus::Preparing),
        Some(Role::Waiter) | None => status != OrderStatus::Delivered,
    }
}

/// Filter orders (newest first) down to what `role` sees on connect.
///
/// Only the snapshot is filtered. Broadcasts reach the whole target partition,
/// so a chef keeps getting updates for an order after it leaves the queue.
pub fn build_snapshot(orders: Vec<Order>, role: Option<Role>) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|order| visible_to(role, order.status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderpass_shared::OrderId;
    use time::{macros::datetime, Duration};

    /// One order per status, twice over, newest first
    fn orders() -> Vec<Order> {
        let base = datetime!(2025-06-01 20:00 UTC);
        (0..8)
            .map(|i| Order {
                id: OrderId(8 - i),
                table_number: 1 + i,
                items: vec![format!("dish {i}")],
                status: OrderStatus::ALL[i as usize % 4],
                created_at: base - Duration::minutes(i as i64),
                user: None,
            })
            .collect()
    }

    fn assert_newest_first(orders: &[Order]) {
        assert!(orders
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[test]
    fn test_chef_snapshot() {
        let snapshot = build_snapshot(orders(), Some(Role::Chef));

        assert_eq!(snapshot.len(), 4);
        assert!(snapshot
            .iter()
            .all(|o| matches!(o.status, OrderStatus::Pending | OrderStatus::Preparing)));
        assert_newest_first(&snapshot);
        let ids: Vec<i32> = snapshot.iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![8, 7, 4, 3]);
    }

    #[test]
    fn test_waiter_snapshot() {
        let snapshot = build_snapshot(orders(), Some(Role::Waiter));

        assert_eq!(snapshot.len(), 6);
        assert!(snapshot.iter().all(|o| o.status != OrderStatus::Delivered));
        assert_newest_first(&snapshot);
    }

    #[test]
    fn test_unrecognized_role_uses_waiter_filter() {
        assert_eq!(
            build_snapshot(orders(), None),
            build_snapshot(orders(), Some(Role::Waiter))
        );
    }

    #[test]
    fn test_visibility_table() {
        for status in OrderStatus::ALL {
            assert_eq!(
                visible_to(Some(Role::Chef), status),
                matches!(status, OrderStatus::Pending | OrderStatus::Preparing)
            );
            assert_eq!(
                visible_to(None, status),
                status != OrderStatus::Delivered
            );
        }
    }

    #[test]
    fn test_empty_store() {
        assert!(build_snapshot(Vec::new(), Some(Role::Chef)).is_empty());
    }
}
