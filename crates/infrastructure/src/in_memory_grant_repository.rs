use std::collections::HashMap;

use async_trait::async_trait;
use rowgate_application::{GrantRepository, TableSettingsRepository};
use rowgate_core::{AppResult, ConnectionId, GroupId, UserId};
use rowgate_domain::{
    AccessLevel, ConnectionGrant, ConnectionRecord, GroupGrant, TableGrant, TablePermission,
    TableSettings,
};
use tokio::sync::RwLock;

/// In-memory grant store implementation.
///
/// Grant rows are reachable only through a stored membership; a user without
/// a membership in the granting group never sees its grants.
#[derive(Debug, Default)]
pub struct InMemoryGrantRepository {
    connections: RwLock<HashMap<ConnectionId, ConnectionRecord>>,
    groups: RwLock<HashMap<GroupId, ConnectionId>>,
    memberships: RwLock<HashMap<(GroupId, UserId), bool>>,
    connection_grants: RwLock<HashMap<(GroupId, ConnectionId), AccessLevel>>,
    group_grants: RwLock<HashMap<(GroupId, GroupId), AccessLevel>>,
    table_grants: RwLock<HashMap<(GroupId, ConnectionId, String), TablePermission>>,
    table_settings: RwLock<HashMap<(ConnectionId, String), TableSettings>>,
}

impl InMemoryGrantRepository {
    /// Creates an empty in-memory grant store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection record.
    pub async fn insert_connection(&self, connection: ConnectionRecord) {
        self.connections
            .write()
            .await
            .insert(connection.id(), connection);
    }

    /// Registers a permission group under its owning connection.
    pub async fn insert_group(&self, group_id: GroupId, connection_id: ConnectionId) {
        self.groups.write().await.insert(group_id, connection_id);
    }

    /// Adds a user to a group, optionally suspended.
    pub async fn insert_membership(&self, group_id: GroupId, user_id: UserId, suspended: bool) {
        self.memberships
            .write()
            .await
            .insert((group_id, user_id), suspended);
    }

    /// Stores a connection-scoped grant for a group.
    pub async fn grant_connection_access(
        &self,
        group_id: GroupId,
        connection_id: ConnectionId,
        access_level: AccessLevel,
    ) {
        self.connection_grants
            .write()
            .await
            .insert((group_id, connection_id), access_level);
    }

    /// Stores a group-scoped grant for a group.
    pub async fn grant_group_access(
        &self,
        group_id: GroupId,
        target_group_id: GroupId,
        access_level: AccessLevel,
    ) {
        self.group_grants
            .write()
            .await
            .insert((group_id, target_group_id), access_level);
    }

    /// Stores a table-scoped grant for a group.
    pub async fn grant_table_access(
        &self,
        group_id: GroupId,
        connection_id: ConnectionId,
        table_name: impl Into<String>,
        permission: TablePermission,
    ) {
        self.table_grants
            .write()
            .await
            .insert((group_id, connection_id, table_name.into()), permission);
    }

    /// Stores per-table settings for a connection.
    pub async fn save_table_settings(
        &self,
        connection_id: ConnectionId,
        table_name: impl Into<String>,
        settings: TableSettings,
    ) {
        self.table_settings
            .write()
            .await
            .insert((connection_id, table_name.into()), settings);
    }
}

#[async_trait]
impl GrantRepository for InMemoryGrantRepository {
    async fn find_connection(
        &self,
        connection_id: ConnectionId,
    ) -> AppResult<Option<ConnectionRecord>> {
        Ok(self.connections.read().await.get(&connection_id).cloned())
    }

    async fn find_group_connection(&self, group_id: GroupId) -> AppResult<Option<ConnectionId>> {
        Ok(self.groups.read().await.get(&group_id).copied())
    }

    async fn list_connection_grants_for_user(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
    ) -> AppResult<Vec<ConnectionGrant>> {
        let memberships = self.memberships.read().await;
        let grants = self.connection_grants.read().await;

        Ok(grants
            .iter()
            .filter_map(|((group_id, granted_connection_id), access_level)| {
                if granted_connection_id != &connection_id {
                    return None;
                }

                memberships
                    .get(&(*group_id, user_id))
                    .map(|suspended| ConnectionGrant {
                        group_id: *group_id,
                        access_level: *access_level,
                        membership_suspended: *suspended,
                    })
            })
            .collect())
    }

    async fn list_group_grants_for_user(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> AppResult<Vec<GroupGrant>> {
        let memberships = self.memberships.read().await;
        let grants = self.group_grants.read().await;

        Ok(grants
            .iter()
            .filter_map(|((granting_group_id, target_group_id), access_level)| {
                if target_group_id != &group_id {
                    return None;
                }

                memberships
                    .get(&(*granting_group_id, user_id))
                    .map(|suspended| GroupGrant {
                        group_id: *granting_group_id,
                        access_level: *access_level,
                        membership_suspended: *suspended,
                    })
            })
            .collect())
    }

    async fn list_table_grants_for_user(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
        table_name: &str,
    ) -> AppResult<Vec<TableGrant>> {
        let memberships = self.memberships.read().await;
        let grants = self.table_grants.read().await;

        Ok(grants
            .iter()
            .filter_map(
                |((group_id, granted_connection_id, granted_table), permission)| {
                    if granted_connection_id != &connection_id || granted_table != table_name {
                        return None;
                    }

                    memberships
                        .get(&(*group_id, user_id))
                        .map(|suspended| TableGrant {
                            group_id: *group_id,
                            permission: *permission,
                            membership_suspended: *suspended,
                        })
                },
            )
            .collect())
    }
}

#[async_trait]
impl TableSettingsRepository for InMemoryGrantRepository {
    async fn find_table_settings(
        &self,
        connection_id: ConnectionId,
        table_name: &str,
    ) -> AppResult<Option<TableSettings>> {
        Ok(self
            .table_settings
            .read()
            .await
            .get(&(connection_id, table_name.to_owned()))
            .cloned())
    }
}
