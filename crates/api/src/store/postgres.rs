//! Postgres-backed store

use async_trait::async_trait;
use orderpass_shared::{
    NewOrder, NewPushSubscription, Order, OrderId, OrderStatus, PushSubscription, StoreError,
    StoreResult, User, UserId,
};
use sqlx::PgPool;
use time::OffsetDateTime;

use super::{OrderStore, SubscriptionStore};

const ORDER_COLUMNS: &str = r#"
    o.id, o.table_number, o.items, o.status, o.created_at,
    u.id AS user_id, u.email AS user_email
"#;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    table_number: i32,
    items: Vec<String>,
    status: String,
    created_at: OffsetDateTime,
    user_id: Option<i32>,
    user_email: Option<String>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<OrderStatus>().map_err(|e| {
            StoreError::Database(format!("order {} has invalid status: {}", row.id, e))
        })?;
        let user = match (row.user_id, row.user_email) {
            (Some(id), Some(email)) => Some(User {
                id: UserId(id),
                email,
            }),
            _ => None,
        };

        Ok(Order {
            id: OrderId(row.id),
            table_number: row.table_number,
            items: row.items,
            status,
            created_at: row.created_at,
            user,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: i32,
    endpoint: String,
    p256dh: String,
    auth: String,
    user_id: i32,
    created_at: OffsetDateTime,
}

impl From<SubscriptionRow> for PushSubscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: row.id,
            endpoint: row.endpoint,
            p256dh: row.p256dh,
            auth: row.auth,
            user_id: UserId(row.user_id),
            created_at: row.created_at,
        }
    }
}

/// Store backed by the `orders`, `users` and `push_subscriptions` tables
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    default_account_email: String,
}

impl PgStore {
    pub fn new(pool: PgPool, default_account_email: impl Into<String>) -> Self {
        Self {
            pool,
            default_account_email: default_account_email.into(),
        }
    }

    /// Find or create the account for an email
    async fn upsert_user(&self, email: &str) -> StoreResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO users (email)
            VALUES ($1)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, new_order: NewOrder) -> StoreResult<Order> {
        if new_order.table_number <= 0 {
            return Err(StoreError::Validation(format!(
                "table number must be positive, got {}",
                new_order.table_number
            )));
        }

        let user_id = self.upsert_user(&self.default_account_email).await?;

        let query = format!(
            r#"
            WITH o AS (
                INSERT INTO orders (table_number, items, status, user_id)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {ORDER_COLUMNS}
            FROM o
            LEFT JOIN users u ON u.id = o.user_id
            "#
        );
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(new_order.table_number)
            .bind(&new_order.items)
            .bind(OrderStatus::Pending.as_str())
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
        let query = format!(
            r#"
            WITH o AS (
                UPDATE orders SET status = $2
                WHERE id = $1
                RETURNING *
            )
            SELECT {ORDER_COLUMNS}
            FROM o
            LEFT JOIN users u ON u.id = o.user_id
            "#
        );
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(id.0)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("order {}", id)))?;

        row.try_into()
    }

    async fn list_all(&self) -> StoreResult<Vec<Order>> {
        let query = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            ORDER BY o.created_at DESC, o.id DESC
            "#
        );
        let rows = sqlx::query_as::<_, OrderRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn subscribe(
        &self,
        email: &str,
        subscription: NewPushSubscription,
    ) -> StoreResult<PushSubscription> {
        let user_id = self.upsert_user(email).await?;

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO push_subscriptions (endpoint, p256dh, auth, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, endpoint, p256dh, auth, user_id, created_at
            "#,
        )
        .bind(&subscription.endpoint)
        .bind(&subscription.keys.p256dh)
        .bind(&subscription.keys.auth)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn subscriptions_for(&self, email: &str) -> StoreResult<Vec<PushSubscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT s.id, s.endpoint, s.p256dh, s.auth, s.user_id, s.created_at
            FROM push_subscriptions s
            JOIN users u ON u.id = s.user_id
            WHERE u.email = $1
            ORDER BY s.id ASC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PushSubscription::from).collect())
    }
}
