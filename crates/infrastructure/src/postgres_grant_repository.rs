use std::str::FromStr;

use async_trait::async_trait;
use rowgate_application::GrantRepository;
use rowgate_core::{AppError, AppResult, ConnectionId, GroupId, UserId};
use rowgate_domain::{
    AccessLevel, ConnectionGrant, ConnectionKind, ConnectionRecord, GroupGrant, TableGrant,
    TablePermission,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed grant store implementation.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ConnectionRow {
    id: Uuid,
    kind: String,
    display_name: String,
}

#[derive(Debug, FromRow)]
struct GroupConnectionRow {
    connection_id: Uuid,
}

#[derive(Debug, FromRow)]
struct AccessLevelGrantRow {
    group_id: Uuid,
    access_level: String,
    suspended: bool,
}

#[derive(Debug, FromRow)]
struct TableGrantRow {
    group_id: Uuid,
    visibility: bool,
    readonly: bool,
    can_add: bool,
    can_delete: bool,
    can_edit: bool,
    suspended: bool,
}

fn decode_access_level(value: &str, group_id: Uuid) -> AppResult<AccessLevel> {
    AccessLevel::from_str(value).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode access level '{value}' granted by group '{group_id}': {error}"
        ))
    })
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn find_connection(
        &self,
        connection_id: ConnectionId,
    ) -> AppResult<Option<ConnectionRecord>> {
        let row = sqlx::query_as::<_, ConnectionRow>(
            r#"
            SELECT id, kind, display_name
            FROM connections
            WHERE id = $1
            "#,
        )
        .bind(connection_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load connection: {error}")))?;

        row.map(|row| {
            let kind = ConnectionKind::from_str(row.kind.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode kind of connection '{}': {error}",
                    row.id
                ))
            })?;

            ConnectionRecord::new(ConnectionId::from_uuid(row.id), kind, row.display_name)
        })
        .transpose()
    }

    async fn find_group_connection(&self, group_id: GroupId) -> AppResult<Option<ConnectionId>> {
        let row = sqlx::query_as::<_, GroupConnectionRow>(
            r#"
            SELECT connection_id
            FROM permission_groups
            WHERE id = $1
            "#,
        )
        .bind(group_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load group: {error}")))?;

        Ok(row.map(|row| ConnectionId::from_uuid(row.connection_id)))
    }

    async fn list_connection_grants_for_user(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
    ) -> AppResult<Vec<ConnectionGrant>> {
        let rows = sqlx::query_as::<_, AccessLevelGrantRow>(
            r#"
            SELECT grants.group_id, grants.access_level, memberships.suspended
            FROM connection_grants AS grants
            INNER JOIN group_memberships AS memberships
                ON memberships.group_id = grants.group_id
            WHERE grants.connection_id = $1
                AND memberships.user_id = $2
            "#,
        )
        .bind(connection_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load connection grants: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(ConnectionGrant {
                    group_id: GroupId::from_uuid(row.group_id),
                    access_level: decode_access_level(row.access_level.as_str(), row.group_id)?,
                    membership_suspended: row.suspended,
                })
            })
            .collect()
    }

    async fn list_group_grants_for_user(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> AppResult<Vec<GroupGrant>> {
        let rows = sqlx::query_as::<_, AccessLevelGrantRow>(
            r#"
            SELECT grants.group_id, grants.access_level, memberships.suspended
            FROM group_grants AS grants
            INNER JOIN group_memberships AS memberships
                ON memberships.group_id = grants.group_id
            WHERE grants.target_group_id = $1
                AND memberships.user_id = $2
            "#,
        )
        .bind(group_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load group grants: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Ok(GroupGrant {
                    group_id: GroupId::from_uuid(row.group_id),
                    access_level: decode_access_level(row.access_level.as_str(), row.group_id)?,
                    membership_suspended: row.suspended,
                })
            })
            .collect()
    }

    async fn list_table_grants_for_user(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
        table_name: &str,
    ) -> AppResult<Vec<TableGrant>> {
        let rows = sqlx::query_as::<_, TableGrantRow>(
            r#"
            SELECT
                grants.group_id,
                grants.visibility,
                grants.readonly,
                grants.can_add,
                grants.can_delete,
                grants.can_edit,
                memberships.suspended
            FROM table_grants AS grants
            INNER JOIN group_memberships AS memberships
                ON memberships.group_id = grants.group_id
            WHERE grants.connection_id = $1
                AND grants.table_name = $2
                AND memberships.user_id = $3
            "#,
        )
        .bind(connection_id.as_uuid())
        .bind(table_name)
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load table grants: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| TableGrant {
                group_id: GroupId::from_uuid(row.group_id),
                permission: TablePermission {
                    visibility: row.visibility,
                    readonly: row.readonly,
                    add: row.can_add,
                    delete: row.can_delete,
                    edit: row.can_edit,
                },
                membership_suspended: row.suspended,
            })
            .collect())
    }
}
