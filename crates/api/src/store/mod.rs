//! Order and push-subscription storage
//!
//! The relay only needs a handful of queries, so storage sits behind two small
//! traits with a Postgres implementation for deployments and an in-memory one
//! for local runs and tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use orderpass_shared::{
    NewOrder, NewPushSubscription, Order, OrderId, OrderStatus, PushSubscription, StoreResult,
};
use std::fmt;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Durable collection of kitchen orders
#[async_trait]
pub trait OrderStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Persist a new order with status PENDING, owned by the default account
    async fn create(&self, order: NewOrder) -> StoreResult<Order>;

    /// Set the status of an existing order and return the refreshed order
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order>;

    /// All orders, newest first (ties broken by id, highest first)
    async fn list_all(&self) -> StoreResult<Vec<Order>>;

    /// Cheap connectivity check used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}

impl fmt::Debug for dyn OrderStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Push subscriptions keyed by account email
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Store a subscription, creating the account on first use
    async fn subscribe(
        &self,
        email: &str,
        subscription: NewPushSubscription,
    ) -> StoreResult<PushSubscription>;

    /// Subscriptions of an account; empty when the account does not exist
    async fn subscriptions_for(&self, email: &str) -> StoreResult<Vec<PushSubscription>>;
}
