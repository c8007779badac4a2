//! Shared application state

use anyhow::Context;
use orderpass_shared::{create_pool, run_migrations};
use std::sync::Arc;

use crate::{
    config::Config,
    push::{HttpPushDelivery, PushDelivery, PushSettings, VapidSigner},
    store::{MemoryStore, OrderStore, PgStore, SubscriptionStore},
    websocket::SessionRegistry,
};

/// State handed to every route and connection task
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub push: Arc<dyn PushDelivery>,
    /// Live WebSocket connections by role
    pub sessions: Arc<SessionRegistry>,
    pub vapid_public_key: Option<String>,
}

impl AppState {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        push: Arc<dyn PushDelivery>,
        vapid_public_key: Option<String>,
    ) -> Self {
        Self {
            orders,
            subscriptions,
            push,
            sessions: Arc::new(SessionRegistry::new()),
            vapid_public_key,
        }
    }

    /// Build the state for a configuration: Postgres when `DATABASE_URL` is
    /// set, otherwise a process-local store.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let (orders, subscriptions): (Arc<dyn OrderStore>, Arc<dyn SubscriptionStore>) =
            match &config.database_url {
                Some(url) => {
                    let pool = create_pool(url, config.database_max_connections)
                        .await
                        .context("failed to connect to database")?;
                    if config.run_migrations {
                        run_migrations(&pool)
                            .await
                            .context("failed to run migrations")?;
                        tracing::info!("Database migrations applied");
                    }
                    let store = Arc::new(PgStore::new(pool, &config.default_account_email));
                    (store.clone() as Arc<dyn OrderStore>, store as Arc<dyn SubscriptionStore>)
                }
                None => {
                    tracing::warn!("DATABASE_URL not set, orders are kept in memory only");
                    let store = Arc::new(MemoryStore::new(&config.default_account_email));
                    (store.clone() as Arc<dyn OrderStore>, store as Arc<dyn SubscriptionStore>)
                }
            };

        let vapid = match (
            &config.vapid_private_key,
            &config.vapid_public_key,
            &config.vapid_subject,
        ) {
            (Some(private_key), Some(public_key), Some(subject)) => Some(
                VapidSigner::from_pem(private_key, public_key, subject)
                    .context("invalid VAPID_PRIVATE_KEY")?,
            ),
            _ => None,
        };
        let push = HttpPushDelivery::new(
            PushSettings {
                ttl_seconds: config.push_ttl_seconds,
                timeout: config.push_timeout,
            },
            vapid,
        )?;

        Ok(Self::new(
            orders,
            subscriptions,
            Arc::new(push),
            config.vapid_public_key.clone(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use orderpass_shared::DEFAULT_ACCOUNT_EMAIL;

    /// State over an in-memory store, returned alongside for seeding
    pub(crate) fn memory_state() -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(DEFAULT_ACCOUNT_EMAIL));
        let push = HttpPushDelivery::new(PushSettings::default(), None).unwrap();
        let state = AppState::new(store.clone(), store.clone(), Arc::new(push), None);
        (state, store)
    }
}
