use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rowgate_core::{AppResult, ConnectionId, GroupId, UserId};
use rowgate_domain::{ConnectionGrant, ConnectionRecord, GroupGrant, TableGrant};
use serde_json::Value;

/// Read-only adjacency queries against the grant store.
///
/// Grants are reachable only through the user's group memberships; every
/// returned grant carries the suspension flag of the membership it was reached
/// through. Administrative grant mutation happens outside this core.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Finds a registered connection record.
    async fn find_connection(
        &self,
        connection_id: ConnectionId,
    ) -> AppResult<Option<ConnectionRecord>>;

    /// Finds the connection that owns a permission group.
    async fn find_group_connection(&self, group_id: GroupId) -> AppResult<Option<ConnectionId>>;

    /// Lists connection-scoped grants reachable by the user's memberships.
    async fn list_connection_grants_for_user(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
    ) -> AppResult<Vec<ConnectionGrant>>;

    /// Lists group-scoped grants reachable by the user's memberships.
    async fn list_group_grants_for_user(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> AppResult<Vec<GroupGrant>>;

    /// Lists table-scoped grants reachable by the user's memberships.
    async fn list_table_grants_for_user(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
        table_name: &str,
    ) -> AppResult<Vec<TableGrant>>;
}

/// Row mutation kinds recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAuditOperation {
    /// A row was inserted.
    AddRow,
    /// A row was updated.
    UpdateRow,
    /// A row was deleted.
    DeleteRow,
    /// A set of rows was deleted by key list.
    BulkDelete,
    /// Rows were bulk-inserted from an import stream.
    ImportRows,
}

impl RowAuditOperation {
    /// Returns a stable storage value for this operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddRow => "row.add",
            Self::UpdateRow => "row.update",
            Self::DeleteRow => "row.delete",
            Self::BulkDelete => "row.bulk_delete",
            Self::ImportRows => "row.import",
        }
    }
}

/// One audit record emitted after a successful row mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct RowAuditEvent {
    /// Connection the mutation ran against.
    pub connection_id: ConnectionId,
    /// Table the mutation ran against.
    pub table_name: String,
    /// User who performed the mutation.
    pub user_id: UserId,
    /// Mutation kind.
    pub operation: RowAuditOperation,
    /// Affected primary key, serialized.
    pub primary_key: Option<Value>,
    /// Row data before the mutation.
    pub old_data: Option<Value>,
    /// Row data after the mutation.
    pub new_data: Option<Value>,
    /// Mutation timestamp.
    pub occurred_at: DateTime<Utc>,
}

/// Sink for row mutation audit records.
#[async_trait]
pub trait RowAuditRepository: Send + Sync {
    /// Appends one audit event.
    async fn append_event(&self, event: RowAuditEvent) -> AppResult<()>;
}
