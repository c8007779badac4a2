//! Session registry
//!
//! Live connections partitioned by role. This is the only state shared between
//! connection tasks.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::connection::{Connection, Role};

/// Role partitions of live connections, keyed by session id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    partitions: RwLock<HashMap<Role, HashMap<Uuid, Arc<Connection>>>>,
    /// Orders "store write + broadcast" against "register + snapshot"
    publish: RwLock<()>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Held shared by a handler across its store write and broadcast.
    ///
    /// Any number of handlers publish at once; they only wait while a new
    /// connection is taking its snapshot.
    pub async fn publish_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.publish.read().await
    }

    /// Held exclusively by a new connection across registration, the store
    /// read and queuing its snapshot.
    ///
    /// Every change is then either in the snapshot (and its broadcast went
    /// out before the connection joined) or broadcast after the snapshot.
    pub async fn snapshot_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.publish.write().await
    }

    /// Add a connection to the partition of its role.
    ///
    /// Connections without a recognized role are accepted and placed in no
    /// partition, so they never receive broadcasts. Registering the same
    /// connection twice is a no-op. Returns whether the connection was added.
    pub async fn register(&self, conn: &Arc<Connection>) -> bool {
        let Some(role) = conn.role else {
            tracing::debug!(
                session_id = %conn.session_id,
                "Connection has no recognized role, not joining a partition"
            );
            return false;
        };

        let mut partitions = self.partitions.write().await;
        let members = partitions.entry(role).or_default();
        let added = members
            .insert(conn.session_id, Arc::clone(conn))
            .is_none();

        tracing::info!(
            session_id = %conn.session_id,
            role = %role,
            partition_size = members.len(),
            "Connection registered"
        );

        added
    }

    /// Remove a connection from its partition. Safe to call more than once.
    pub async fn deregister(&self, conn: &Connection) -> bool {
        let Some(role) = conn.role else {
            return false;
        };

        let mut partitions = self.partitions.write().await;
        let Some(members) = partitions.get_mut(&role) else {
            return false;
        };
        let removed = members.remove(&conn.session_id).is_some();

        if removed {
            tracing::info!(
                session_id = %conn.session_id,
                role = %role,
                partition_size = members.len(),
                "Connection deregistered"
            );
        }

        removed
    }

    /// Snapshot of the connections currently registered for a role
    pub async fn members(&self, role: Role) -> Vec<Arc<Connection>> {
        let partitions = self.partitions.read().await;
        partitions
            .get(&role)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Apply `f` to every connection of a role.
    ///
    /// Iterates over a snapshot, so `f` runs without holding the lock and
    /// connections joining or leaving meanwhile are not observed.
    pub async fn for_each<F>(&self, role: Role, mut f: F)
    where
        F: FnMut(&Arc<Connection>),
    {
        for conn in self.members(role).await {
            f(&conn);
        }
    }

    pub async fn contains(&self, conn: &Connection) -> bool {
        let Some(role) = conn.role else {
            return false;
        };
        let partitions = self.partitions.read().await;
        partitions
            .get(&role)
            .is_some_and(|members| members.contains_key(&conn.session_id))
    }

    pub async fn stats(&self) -> RegistryStats {
        let partitions = self.partitions.read().await;
        let size = |role: Role| partitions.get(&role).map(HashMap::len).unwrap_or(0);

        RegistryStats {
            waiters: size(Role::Waiter),
            chefs: size(Role::Chef),
        }
    }
}

/// Number of live connections per partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub waiters: usize,
    pub chefs: usize,
}
