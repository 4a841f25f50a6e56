use std::collections::BTreeMap;

use rowgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row payload keyed by column name.
pub type RowData = serde_json::Map<String, Value>;

/// One column of an external table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name as the backend reports it.
    pub column_name: String,
    /// Backend-native data type label.
    pub data_type: String,
}

/// One outgoing foreign key of an external table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    /// Referencing column name.
    pub column_name: String,
    /// Referenced table name.
    pub referenced_table: String,
    /// Referenced column name.
    pub referenced_column: String,
}

/// Structure metadata returned by adapter table introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStructure {
    /// All columns of the table.
    pub columns: Vec<ColumnDescriptor>,
    /// Columns forming the primary key.
    pub primary_columns: Vec<ColumnDescriptor>,
    /// Outgoing foreign keys.
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

/// Primary-key value of one row, keyed by primary column name.
///
/// Ordered so composite keys compare and serialize deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrimaryKey(BTreeMap<String, Value>);

impl PrimaryKey {
    /// Creates a primary key from column/value pairs.
    pub fn new(values: impl IntoIterator<Item = (String, Value)>) -> AppResult<Self> {
        let values: BTreeMap<String, Value> = values.into_iter().collect();
        if values.is_empty() {
            return Err(AppError::Validation(
                "primary key must name at least one column".to_owned(),
            ));
        }

        Ok(Self(values))
    }

    /// Returns the value for one key column.
    #[must_use]
    pub fn value(&self, column_name: &str) -> Option<&Value> {
        self.0.get(column_name)
    }

    /// Iterates over the key columns and values.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Validates that the key names exactly the table's primary columns.
    pub fn ensure_matches_columns(&self, primary_columns: &[ColumnDescriptor]) -> AppResult<()> {
        let declared: Vec<&str> = primary_columns
            .iter()
            .map(|column| column.column_name.as_str())
            .collect();

        let matches = self.0.len() == declared.len()
            && declared.iter().all(|column| self.0.contains_key(*column));

        if !matches {
            let supplied: Vec<&str> = self.0.keys().map(String::as_str).collect();
            return Err(AppError::Validation(format!(
                "primary key columns [{}] do not match declared key columns [{}]",
                supplied.join(", "),
                declared.join(", ")
            )));
        }

        Ok(())
    }

    /// Returns whether a row carries exactly this key.
    #[must_use]
    pub fn matches_row(&self, row: &RowData) -> bool {
        self.0
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }
}

/// Pagination metadata of one fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowPagination {
    /// Total rows matching the query across all pages.
    pub total: u64,
    /// Last page that holds any rows.
    pub last_page: u32,
    /// Page size the page was computed with.
    pub per_page: u32,
    /// Requested page number.
    pub current_page: u32,
}

impl RowPagination {
    /// Computes pagination metadata for a match count and page request.
    #[must_use]
    pub fn new(total: u64, per_page: u32, current_page: u32) -> Self {
        let last_page = u32::try_from(total.div_ceil(u64::from(per_page.max(1))))
            .unwrap_or(u32::MAX);

        Self {
            total,
            last_page,
            per_page,
            current_page,
        }
    }
}

/// Uniform shape of one row-fetch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowEnvelope {
    /// Fetched rows in requested sort order, or natural order without a sort.
    pub rows: Vec<RowData>,
    /// Primary-key column descriptors of the table.
    pub primary_columns: Vec<ColumnDescriptor>,
    /// Pagination metadata.
    pub pagination: RowPagination,
}

/// Per-table configuration consumed by the orchestrator and adapters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSettings {
    /// Fields scanned by free-text search.
    pub searchable_fields: Vec<String>,
    /// Fields shown when a row is referenced from elsewhere.
    pub identification_fields: Vec<String>,
    /// Fields callers may read but never write.
    pub readonly_fields: Vec<String>,
    /// Page size applied when the caller supplies none.
    pub default_per_page: Option<u32>,
}

/// Outcome of a bulk delete; partial success is reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowDeleteOutcome {
    /// Keys whose rows were deleted.
    pub deleted: Vec<PrimaryKey>,
    /// Keys that matched no row.
    pub missing: Vec<PrimaryKey>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ColumnDescriptor, PrimaryKey, RowPagination};

    fn id_column() -> ColumnDescriptor {
        ColumnDescriptor {
            column_name: "id".to_owned(),
            data_type: "integer".to_owned(),
        }
    }

    #[test]
    fn primary_key_rejects_empty_key() {
        let key = PrimaryKey::new(Vec::new());
        assert!(key.is_err());
    }

    #[test]
    fn primary_key_must_match_declared_columns() {
        let key = PrimaryKey::new(vec![("email".to_owned(), json!("a@b.c"))]);
        assert!(key.is_ok());

        let key = key.unwrap_or_default();
        assert!(key.ensure_matches_columns(&[id_column()]).is_err());
    }

    #[test]
    fn composite_primary_key_matches_when_all_columns_present() {
        let key = PrimaryKey::new(vec![
            ("order_id".to_owned(), json!(7)),
            ("line".to_owned(), json!(2)),
        ]);
        assert!(key.is_ok());

        let columns = vec![
            ColumnDescriptor {
                column_name: "line".to_owned(),
                data_type: "integer".to_owned(),
            },
            ColumnDescriptor {
                column_name: "order_id".to_owned(),
                data_type: "integer".to_owned(),
            },
        ];
        assert!(
            key.unwrap_or_default()
                .ensure_matches_columns(&columns)
                .is_ok()
        );
    }

    #[test]
    fn pagination_math_uses_ceiling_division() {
        let pagination = RowPagination::new(42, 2, 1);
        assert_eq!(pagination.last_page, 21);

        let pagination = RowPagination::new(43, 2, 1);
        assert_eq!(pagination.last_page, 22);

        let pagination = RowPagination::new(0, 2, 1);
        assert_eq!(pagination.last_page, 0);
    }
}
