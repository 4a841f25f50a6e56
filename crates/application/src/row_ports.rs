use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use rowgate_core::{AppResult, ConnectionId};
use rowgate_domain::{
    ConnectionRecord, PrimaryKey, QuerySpecification, RowData, RowDeleteOutcome, RowEnvelope,
    TableSettings, TableStructure,
};

/// Byte stream carrying encoded rows for export and import.
///
/// Chunk boundaries are adapter-owned; consumers must not assume one chunk
/// per row.
pub type RowByteStream = BoxStream<'static, AppResult<Vec<u8>>>;

/// Uniform per-store driver contract.
///
/// Two adapters given the same [`QuerySpecification`] over data sets with the
/// same logical content must agree on row membership, `total`, `last_page`,
/// and sort order; only native column representation may differ. Pagination
/// math is `last_page = ceil(total / per_page)`, and a page beyond `last_page`
/// yields empty `rows` with the true `total`, never an error. Filters are
/// applied conjunctively, combined with the free-text search when both are
/// present. Cancellation propagates by dropping the returned future.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Lists the table names of the underlying store.
    async fn list_tables(&self) -> AppResult<Vec<String>>;

    /// Describes columns, primary key, and foreign keys of one table.
    async fn describe_table(&self, table_name: &str) -> AppResult<TableStructure>;

    /// Finds one row by primary key.
    async fn find_row(&self, table_name: &str, key: &PrimaryKey) -> AppResult<Option<RowData>>;

    /// Fetches one page of rows matching a normalized specification.
    async fn fetch_rows(
        &self,
        table_name: &str,
        specification: &QuerySpecification,
        settings: &TableSettings,
    ) -> AppResult<RowEnvelope>;

    /// Inserts one row and returns it as stored, including generated primary
    /// key and default column values.
    async fn insert_row(&self, table_name: &str, row: RowData) -> AppResult<RowData>;

    /// Applies a partial update to the row with the given key.
    ///
    /// Fails with a not-found error when no row matches and a validation
    /// error when the key does not name the declared primary-key columns.
    async fn update_row(
        &self,
        table_name: &str,
        key: &PrimaryKey,
        changes: RowData,
    ) -> AppResult<RowData>;

    /// Deletes the rows matching the given keys.
    ///
    /// Keys without a matching row are reported in the outcome; the rows that
    /// do exist are still deleted.
    async fn delete_rows(
        &self,
        table_name: &str,
        keys: &[PrimaryKey],
    ) -> AppResult<RowDeleteOutcome>;

    /// Streams encoded rows matching a normalized specification, row by row.
    async fn export_rows(
        &self,
        table_name: &str,
        specification: &QuerySpecification,
        settings: &TableSettings,
    ) -> AppResult<RowByteStream>;

    /// Inserts rows decoded from an encoded stream and returns the count.
    async fn import_rows(&self, table_name: &str, data: RowByteStream) -> AppResult<u64>;
}

/// Tagged dispatch from a connection record to its driver.
pub trait AdapterRegistry: Send + Sync {
    /// Returns the adapter serving the given connection.
    fn adapter_for(&self, connection: &ConnectionRecord) -> AppResult<Arc<dyn BackendAdapter>>;
}

/// Lookup of per-table configuration used to parametrize normalization.
#[async_trait]
pub trait TableSettingsRepository: Send + Sync {
    /// Finds settings for one table, if any were stored.
    async fn find_table_settings(
        &self,
        connection_id: ConnectionId,
        table_name: &str,
    ) -> AppResult<Option<TableSettings>>;
}
