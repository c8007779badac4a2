//! In-memory store used when no database is configured

use async_trait::async_trait;
use orderpass_shared::{
    NewOrder, NewPushSubscription, Order, OrderId, OrderStatus, PushSubscription, StoreError,
    StoreResult, User, UserId,
};
use std::cmp::Reverse;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{OrderStore, SubscriptionStore};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    orders: Vec<Order>,
    subscriptions: Vec<PushSubscription>,
    next_order_id: i32,
    next_user_id: i32,
    next_subscription_id: i32,
}

impl Inner {
    fn find_or_create_user(&mut self, email: &str) -> User {
        if let Some(user) = self.users.iter().find(|u| u.email == email) {
            return user.clone();
        }
        self.next_user_id += 1;
        let user = User {
            id: UserId(self.next_user_id),
            email: email.to_string(),
        };
        self.users.push(user.clone());
        user
    }
}

/// Process-local order and subscription storage.
///
/// Data lives for the lifetime of the process only.
#[derive(Debug)]
pub struct MemoryStore {
    default_account_email: String,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(default_account_email: impl Into<String>) -> Self {
        Self {
            default_account_email: default_account_email.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Insert orders as-is (ids and timestamps included). Later creations get
    /// ids above the highest seeded id.
    #[cfg(test)]
    pub(crate) async fn seed(&self, orders: impl IntoIterator<Item = Order>) {
        let mut inner = self.inner.write().await;
        for order in orders {
            inner.next_order_id = inner.next_order_id.max(order.id.0);
            inner.orders.retain(|o| o.id != order.id);
            inner.orders.push(order);
        }
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, new_order: NewOrder) -> StoreResult<Order> {
        if new_order.table_number <= 0 {
            return Err(StoreError::Validation(format!(
                "table number must be positive, got {}",
                new_order.table_number
            )));
        }

        let mut inner = self.inner.write().await;
        let user = inner.find_or_create_user(&self.default_account_email);
        inner.next_order_id += 1;
        let order = Order {
            id: OrderId(inner.next_order_id),
            table_number: new_order.table_number,
            items: new_order.items,
            status: OrderStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
            user: Some(user),
        };
        inner.orders.push(order.clone());
        Ok(order)
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("order {}", id)))?;
        order.status = status;
        Ok(order.clone())
    }

    async fn list_all(&self) -> StoreResult<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders = inner.orders.clone();
        orders.sort_by_key(|o| Reverse((o.created_at, o.id)));
        Ok(orders)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn subscribe(
        &self,
        email: &str,
        subscription: NewPushSubscription,
    ) -> StoreResult<PushSubscription> {
        let mut inner = self.inner.write().await;
        let user = inner.find_or_create_user(email);
        inner.next_subscription_id += 1;
        let stored = PushSubscription {
            id: inner.next_subscription_id,
            endpoint: subscription.endpoint,
            p256dh: subscription.keys.p256dh,
            auth: subscription.keys.auth,
            user_id: user.id,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.subscriptions.push(stored.clone());
        Ok(stored)
    }

    async fn subscriptions_for(&self, email: &str) -> StoreResult<Vec<PushSubscription>> {
        let inner = self.inner.read().await;
        let Some(user) = inner.users.iter().find(|u| u.email == email) else {
            return Ok(Vec::new());
        };
        Ok(inner
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user.id)
            .cloned()
            .collect())
    }
}
