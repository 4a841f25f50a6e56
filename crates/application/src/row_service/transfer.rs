use rowgate_core::{AppResult, ConnectionId, UserIdentity};
use rowgate_domain::RawRowQuery;
use serde_json::json;

use super::{RowAuditOperation, RowService};
use crate::row_ports::RowByteStream;

impl RowService {
    /// Streams encoded rows matching the query, row by row.
    ///
    /// The stream never materializes the full result set; memory stays
    /// bounded on large tables.
    pub async fn export_table_rows(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        raw_query: RawRowQuery,
    ) -> AppResult<RowByteStream> {
        let (adapter, permission) = self
            .adapter_and_permission(actor, connection_id, table_name)
            .await?;
        if !permission.can_read_rows() {
            return Err(Self::forbidden(actor, "read", table_name));
        }

        let settings = self.settings_for(connection_id, table_name).await?;
        let specification = raw_query.normalize(settings.default_per_page)?;

        adapter
            .export_rows(table_name, &specification, &settings)
            .await
    }

    /// Inserts rows decoded from an encoded stream and returns the count.
    pub async fn import_table_rows(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        data: RowByteStream,
    ) -> AppResult<u64> {
        let (adapter, permission) = self
            .adapter_and_permission(actor, connection_id, table_name)
            .await?;
        if !permission.can_add_rows() {
            return Err(Self::forbidden(actor, "add", table_name));
        }

        let inserted = adapter.import_rows(table_name, data).await?;

        self.append_audit_event(
            actor,
            connection_id,
            table_name,
            RowAuditOperation::ImportRows,
            None,
            None,
            Some(json!({ "inserted": inserted })),
        )
        .await?;

        Ok(inserted)
    }
}
