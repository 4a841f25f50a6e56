use rowgate_core::{AppError, AppResult, ConnectionId, UserIdentity};
use rowgate_domain::{PrimaryKey, RowData, RowDeleteOutcome};
use serde_json::Value;

use super::{RowAuditOperation, RowService};

impl RowService {
    /// Inserts one row and returns it as stored.
    pub async fn add_row(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        row: RowData,
    ) -> AppResult<RowData> {
        let (adapter, permission) = self
            .adapter_and_permission(actor, connection_id, table_name)
            .await?;
        if !permission.can_add_rows() {
            return Err(Self::forbidden(actor, "add", table_name));
        }
        Self::ensure_row_body(&row)?;

        let structure = adapter.describe_table(table_name).await?;
        let inserted = adapter.insert_row(table_name, row).await?;

        self.append_audit_event(
            actor,
            connection_id,
            table_name,
            RowAuditOperation::AddRow,
            Self::primary_key_of_row(&inserted, &structure.primary_columns),
            None,
            Some(Value::Object(inserted.clone())),
        )
        .await?;

        Ok(inserted)
    }

    /// Applies a partial update to the row with the given primary key.
    pub async fn update_row(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        key: &PrimaryKey,
        changes: RowData,
    ) -> AppResult<RowData> {
        let (adapter, permission) = self
            .adapter_and_permission(actor, connection_id, table_name)
            .await?;
        if !permission.can_edit_rows() {
            return Err(Self::forbidden(actor, "edit", table_name));
        }
        Self::ensure_row_body(&changes)?;

        let structure = adapter.describe_table(table_name).await?;
        key.ensure_matches_columns(&structure.primary_columns)?;

        let old_row = adapter.find_row(table_name, key).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "no row of table '{table_name}' matches the supplied primary key"
            ))
        })?;
        let updated = adapter.update_row(table_name, key, changes).await?;

        self.append_audit_event(
            actor,
            connection_id,
            table_name,
            RowAuditOperation::UpdateRow,
            Self::serialize_key(key),
            Some(Value::Object(old_row)),
            Some(Value::Object(updated.clone())),
        )
        .await?;

        Ok(updated)
    }

    /// Applies the same partial update to every row named by the key list.
    ///
    /// Unlike bulk delete, a missing key aborts with a not-found error before
    /// any row is touched.
    pub async fn bulk_update(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        keys: &[PrimaryKey],
        new_values: RowData,
    ) -> AppResult<Vec<RowData>> {
        let (adapter, permission) = self
            .adapter_and_permission(actor, connection_id, table_name)
            .await?;
        if !permission.can_edit_rows() {
            return Err(Self::forbidden(actor, "edit", table_name));
        }
        Self::ensure_row_body(&new_values)?;
        if keys.is_empty() {
            return Err(AppError::Validation(
                "bulk update requires at least one primary key".to_owned(),
            ));
        }

        let structure = adapter.describe_table(table_name).await?;
        let mut old_rows = Vec::with_capacity(keys.len());
        for key in keys {
            key.ensure_matches_columns(&structure.primary_columns)?;
            let old_row = adapter.find_row(table_name, key).await?.ok_or_else(|| {
                AppError::NotFound(format!(
                    "no row of table '{table_name}' matches one of the supplied primary keys"
                ))
            })?;
            old_rows.push(old_row);
        }

        let mut updated_rows = Vec::with_capacity(keys.len());
        for (key, old_row) in keys.iter().zip(old_rows) {
            let updated = adapter
                .update_row(table_name, key, new_values.clone())
                .await?;

            self.append_audit_event(
                actor,
                connection_id,
                table_name,
                RowAuditOperation::UpdateRow,
                Self::serialize_key(key),
                Some(Value::Object(old_row)),
                Some(Value::Object(updated.clone())),
            )
            .await?;

            updated_rows.push(updated);
        }

        Ok(updated_rows)
    }

    /// Deletes the row with the given primary key and returns its last state.
    pub async fn delete_row(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        key: &PrimaryKey,
    ) -> AppResult<RowData> {
        let (adapter, permission) = self
            .adapter_and_permission(actor, connection_id, table_name)
            .await?;
        if !permission.can_delete_rows() {
            return Err(Self::forbidden(actor, "delete", table_name));
        }

        let structure = adapter.describe_table(table_name).await?;
        key.ensure_matches_columns(&structure.primary_columns)?;

        let old_row = adapter.find_row(table_name, key).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "no row of table '{table_name}' matches the supplied primary key"
            ))
        })?;
        adapter.delete_rows(table_name, std::slice::from_ref(key)).await?;

        self.append_audit_event(
            actor,
            connection_id,
            table_name,
            RowAuditOperation::DeleteRow,
            Self::serialize_key(key),
            Some(Value::Object(old_row.clone())),
            None,
        )
        .await?;

        Ok(old_row)
    }

    /// Deletes the rows named by the key list.
    ///
    /// Keys without a matching row are reported in the outcome; the rows that
    /// do exist are still deleted.
    pub async fn bulk_delete(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        keys: &[PrimaryKey],
    ) -> AppResult<RowDeleteOutcome> {
        let (adapter, permission) = self
            .adapter_and_permission(actor, connection_id, table_name)
            .await?;
        if !permission.can_delete_rows() {
            return Err(Self::forbidden(actor, "delete", table_name));
        }
        if keys.is_empty() {
            return Err(AppError::Validation(
                "bulk delete requires at least one primary key".to_owned(),
            ));
        }

        let structure = adapter.describe_table(table_name).await?;
        for key in keys {
            key.ensure_matches_columns(&structure.primary_columns)?;
        }

        let outcome = adapter.delete_rows(table_name, keys).await?;

        self.append_audit_event(
            actor,
            connection_id,
            table_name,
            RowAuditOperation::BulkDelete,
            serde_json::to_value(&outcome.deleted).ok(),
            None,
            None,
        )
        .await?;

        Ok(outcome)
    }
}
