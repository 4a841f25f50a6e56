use rowgate_core::{AppError, AppResult, ConnectionId, UserIdentity};
use rowgate_domain::{PrimaryKey, RawRowQuery, RowData};

use super::{RowService, TableRowPage};

impl RowService {
    /// Lists the tables of a connection that are visible to the actor.
    pub async fn list_tables(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
    ) -> AppResult<Vec<String>> {
        let connection = self.access_service.require_connection(connection_id).await?;
        let adapter = self.adapter_registry.adapter_for(&connection)?;

        let table_names = adapter.list_tables().await?;
        let visible = self
            .access_service
            .resolve_table_access_for_all(actor, connection_id, &table_names)
            .await?;

        Ok(visible.into_iter().map(|(name, _)| name).collect())
    }

    /// Fetches one page of table rows together with table metadata.
    pub async fn fetch_table_rows(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        raw_query: RawRowQuery,
    ) -> AppResult<TableRowPage> {
        let (adapter, permission) = self
            .adapter_and_permission(actor, connection_id, table_name)
            .await?;
        if !permission.can_read_rows() {
            return Err(Self::forbidden(actor, "read", table_name));
        }

        let settings = self.settings_for(connection_id, table_name).await?;
        let specification = raw_query.normalize(settings.default_per_page)?;

        let structure = adapter.describe_table(table_name).await?;
        let envelope = adapter
            .fetch_rows(table_name, &specification, &settings)
            .await?;

        Ok(TableRowPage {
            rows: envelope.rows,
            primary_columns: envelope.primary_columns,
            pagination: envelope.pagination,
            structure: structure.columns,
            foreign_keys: structure.foreign_keys,
            readonly_fields: settings.readonly_fields,
        })
    }

    /// Finds one row by primary key.
    pub async fn find_table_row(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
        key: &PrimaryKey,
    ) -> AppResult<RowData> {
        let (adapter, permission) = self
            .adapter_and_permission(actor, connection_id, table_name)
            .await?;
        if !permission.can_read_rows() {
            return Err(Self::forbidden(actor, "read", table_name));
        }

        let structure = adapter.describe_table(table_name).await?;
        key.ensure_matches_columns(&structure.primary_columns)?;

        adapter.find_row(table_name, key).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "no row of table '{table_name}' matches the supplied primary key"
            ))
        })
    }
}
