use std::sync::Arc;

use chrono::Utc;
use rowgate_core::{AppError, AppResult, ConnectionId, UserIdentity};
use rowgate_domain::{
    ColumnDescriptor, ForeignKeyDescriptor, PrimaryKey, RowData, RowPagination, TablePermission,
    TableSettings,
};
use serde_json::Value;

use crate::access_ports::{RowAuditEvent, RowAuditOperation, RowAuditRepository};
use crate::row_ports::{AdapterRegistry, BackendAdapter, TableSettingsRepository};
use crate::AccessService;

mod read;
mod transfer;
mod write;


/// One fetched page of table rows plus the table metadata callers render with.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRowPage {
    /// Fetched rows in requested order.
    pub rows: Vec<RowData>,
    /// Primary-key column descriptors.
    pub primary_columns: Vec<ColumnDescriptor>,
    /// Pagination metadata.
    pub pagination: RowPagination,
    /// All columns of the table.
    pub structure: Vec<ColumnDescriptor>,
    /// Outgoing foreign keys.
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    /// Fields callers may read but never write.
    pub readonly_fields: Vec<String>,
}

/// Application service orchestrating permission-gated row operations.
///
/// Every operation resolves the actor's effective table permission first and
/// stops before touching any adapter when the required capability is missing.
/// Requests are stateless end-to-end; the service shares no mutable state.
#[derive(Clone)]
pub struct RowService {
    access_service: AccessService,
    adapter_registry: Arc<dyn AdapterRegistry>,
    settings_repository: Arc<dyn TableSettingsRepository>,
    audit_repository: Arc<dyn RowAuditRepository>,
}

impl RowService {
    /// Creates a new row service from its collaborating ports.
    #[must_use]
    pub fn new(
        access_service: AccessService,
        adapter_registry: Arc<dyn AdapterRegistry>,
        settings_repository: Arc<dyn TableSettingsRepository>,
        audit_repository: Arc<dyn RowAuditRepository>,
    ) -> Self {
        Self {
            access_service,
            adapter_registry,
            settings_repository,
            audit_repository,
        }
    }

    /// Resolves the adapter and effective table permission for one request.
    async fn adapter_and_permission(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
    ) -> AppResult<(Arc<dyn BackendAdapter>, TablePermission)> {
        Self::ensure_table_name(table_name)?;

        let connection = self.access_service.require_connection(connection_id).await?;
        let permission = self
            .access_service
            .resolve_table_access(actor, connection_id, table_name)
            .await?;
        let adapter = self.adapter_registry.adapter_for(&connection)?;

        Ok((adapter, permission))
    }

    async fn settings_for(
        &self,
        connection_id: ConnectionId,
        table_name: &str,
    ) -> AppResult<TableSettings> {
        Ok(self
            .settings_repository
            .find_table_settings(connection_id, table_name)
            .await?
            .unwrap_or_default())
    }

    fn ensure_table_name(table_name: &str) -> AppResult<()> {
        if table_name.trim().is_empty() {
            return Err(AppError::Validation(
                "table name must not be empty".to_owned(),
            ));
        }

        Ok(())
    }

    fn ensure_row_body(row: &RowData) -> AppResult<()> {
        if row.is_empty() {
            return Err(AppError::Validation(
                "row data must contain at least one column".to_owned(),
            ));
        }

        Ok(())
    }

    fn forbidden(actor: &UserIdentity, capability: &str, table_name: &str) -> AppError {
        AppError::Forbidden(format!(
            "user '{}' may not {capability} rows of table '{table_name}'",
            actor.user_id()
        ))
    }

    async fn append_audit_event(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        operation: RowAuditOperation,
        primary_key: Option<Value>,
        old_data: Option<Value>,
        new_data: Option<Value>,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(RowAuditEvent {
                connection_id,
                table_name: table_name.to_owned(),
                user_id: actor.user_id(),
                operation,
                primary_key,
                old_data,
                new_data,
                occurred_at: Utc::now(),
            })
            .await
    }

    /// Extracts the primary-key values of a stored row for audit records.
    fn primary_key_of_row(row: &RowData, primary_columns: &[ColumnDescriptor]) -> Option<Value> {
        let entries: serde_json::Map<String, Value> = primary_columns
            .iter()
            .filter_map(|column| {
                row.get(column.column_name.as_str())
                    .map(|value| (column.column_name.clone(), value.clone()))
            })
            .collect();

        (!entries.is_empty()).then_some(Value::Object(entries))
    }

    fn serialize_key(key: &PrimaryKey) -> Option<Value> {
        serde_json::to_value(key).ok()
    }
}
