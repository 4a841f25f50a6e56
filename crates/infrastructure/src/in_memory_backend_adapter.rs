use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use rowgate_application::{BackendAdapter, RowByteStream};
use rowgate_core::{AppError, AppResult};
use rowgate_domain::{
    ColumnDescriptor, ForeignKeyDescriptor, PrimaryKey, QuerySpecification, RowData,
    RowDeleteOutcome, RowEnvelope, RowPagination, TableSettings, TableStructure,
};
use serde_json::{Value, json};
use tokio::sync::RwLock;

mod query;


#[derive(Debug, Clone)]
struct TableState {
    columns: Vec<ColumnDescriptor>,
    primary_columns: Vec<ColumnDescriptor>,
    foreign_keys: Vec<ForeignKeyDescriptor>,
    defaults: RowData,
    next_generated_key: u64,
    rows: Vec<RowData>,
}

/// In-memory backend adapter implementation.
///
/// Serves as the conformance reference for the adapter contract: every
/// semantic guarantee other drivers must uphold is exercised against this
/// implementation.
#[derive(Debug, Default)]
pub struct InMemoryBackendAdapter {
    tables: RwLock<HashMap<String, TableState>>,
}

impl InMemoryBackendAdapter {
    /// Creates an adapter with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table with its structure and default column values.
    pub async fn register_table(
        &self,
        table_name: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
        primary_columns: Vec<ColumnDescriptor>,
        foreign_keys: Vec<ForeignKeyDescriptor>,
        defaults: RowData,
    ) {
        self.tables.write().await.insert(
            table_name.into(),
            TableState {
                columns,
                primary_columns,
                foreign_keys,
                defaults,
                next_generated_key: 1,
                rows: Vec::new(),
            },
        );
    }

    fn unknown_table(table_name: &str) -> AppError {
        AppError::NotFound(format!("table '{table_name}' does not exist"))
    }

    fn searchable_fields(state: &TableState, settings: &TableSettings) -> Vec<String> {
        if settings.searchable_fields.is_empty() {
            state
                .columns
                .iter()
                .map(|column| column.column_name.clone())
                .collect()
        } else {
            settings.searchable_fields.clone()
        }
    }

    fn insert_row_into_state(state: &mut TableState, row: RowData) -> AppResult<RowData> {
        let mut stored = state.defaults.clone();
        for (column, value) in row {
            stored.insert(column, value);
        }

        if let [key_column] = state.primary_columns.as_slice()
            && !stored.contains_key(key_column.column_name.as_str())
        {
            stored.insert(
                key_column.column_name.clone(),
                json!(state.next_generated_key),
            );
            state.next_generated_key += 1;
        }

        for key_column in &state.primary_columns {
            if !stored.contains_key(key_column.column_name.as_str()) {
                return Err(AppError::Validation(format!(
                    "primary key column '{}' must be supplied",
                    key_column.column_name
                )));
            }
        }

        let duplicate = state.rows.iter().any(|existing| {
            state.primary_columns.iter().all(|key_column| {
                existing.get(key_column.column_name.as_str())
                    == stored.get(key_column.column_name.as_str())
            })
        });
        if duplicate {
            return Err(AppError::Conflict(
                "a row with the same primary key already exists".to_owned(),
            ));
        }

        state.rows.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl BackendAdapter for InMemoryBackendAdapter {
    async fn list_tables(&self) -> AppResult<Vec<String>> {
        let tables = self.tables.read().await;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn describe_table(&self, table_name: &str) -> AppResult<TableStructure> {
        let tables = self.tables.read().await;
        let state = tables
            .get(table_name)
            .ok_or_else(|| Self::unknown_table(table_name))?;

        Ok(TableStructure {
            columns: state.columns.clone(),
            primary_columns: state.primary_columns.clone(),
            foreign_keys: state.foreign_keys.clone(),
        })
    }

    async fn find_row(&self, table_name: &str, key: &PrimaryKey) -> AppResult<Option<RowData>> {
        let tables = self.tables.read().await;
        let state = tables
            .get(table_name)
            .ok_or_else(|| Self::unknown_table(table_name))?;

        Ok(state.rows.iter().find(|row| key.matches_row(row)).cloned())
    }

    async fn fetch_rows(
        &self,
        table_name: &str,
        specification: &QuerySpecification,
        settings: &TableSettings,
    ) -> AppResult<RowEnvelope> {
        let tables = self.tables.read().await;
        let state = tables
            .get(table_name)
            .ok_or_else(|| Self::unknown_table(table_name))?;

        let searchable = Self::searchable_fields(state, settings);
        let listed = query::matching_rows(&state.rows, specification, &searchable);
        let total = listed.len() as u64;

        let skipped = (specification.page as usize - 1) * specification.per_page as usize;
        let rows = listed
            .into_iter()
            .skip(skipped)
            .take(specification.per_page as usize)
            .collect();

        Ok(RowEnvelope {
            rows,
            primary_columns: state.primary_columns.clone(),
            pagination: RowPagination::new(total, specification.per_page, specification.page),
        })
    }

    async fn insert_row(&self, table_name: &str, row: RowData) -> AppResult<RowData> {
        let mut tables = self.tables.write().await;
        let state = tables
            .get_mut(table_name)
            .ok_or_else(|| Self::unknown_table(table_name))?;

        Self::insert_row_into_state(state, row)
    }

    async fn update_row(
        &self,
        table_name: &str,
        key: &PrimaryKey,
        changes: RowData,
    ) -> AppResult<RowData> {
        let mut tables = self.tables.write().await;
        let state = tables
            .get_mut(table_name)
            .ok_or_else(|| Self::unknown_table(table_name))?;

        key.ensure_matches_columns(&state.primary_columns)?;

        let row = state
            .rows
            .iter_mut()
            .find(|row| key.matches_row(row))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no row of table '{table_name}' matches the supplied primary key"
                ))
            })?;

        for (column, value) in changes {
            row.insert(column, value);
        }

        Ok(row.clone())
    }

    async fn delete_rows(
        &self,
        table_name: &str,
        keys: &[PrimaryKey],
    ) -> AppResult<RowDeleteOutcome> {
        let mut tables = self.tables.write().await;
        let state = tables
            .get_mut(table_name)
            .ok_or_else(|| Self::unknown_table(table_name))?;

        for key in keys {
            key.ensure_matches_columns(&state.primary_columns)?;
        }

        let mut outcome = RowDeleteOutcome::default();
        for key in keys {
            let before = state.rows.len();
            state.rows.retain(|row| !key.matches_row(row));
            if state.rows.len() < before {
                outcome.deleted.push(key.clone());
            } else {
                outcome.missing.push(key.clone());
            }
        }

        Ok(outcome)
    }

    async fn export_rows(
        &self,
        table_name: &str,
        specification: &QuerySpecification,
        settings: &TableSettings,
    ) -> AppResult<RowByteStream> {
        let envelope = self.fetch_rows(table_name, specification, settings).await?;

        let lines: Vec<AppResult<Vec<u8>>> = envelope
            .rows
            .into_iter()
            .map(|row| {
                let mut line = serde_json::to_vec(&Value::Object(row))
                    .map_err(|error| AppError::Internal(error.to_string()))?;
                line.push(b'\n');
                Ok(line)
            })
            .collect();

        Ok(futures_util::stream::iter(lines).boxed())
    }

    async fn import_rows(&self, table_name: &str, mut data: RowByteStream) -> AppResult<u64> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut inserted = 0;

        while let Some(chunk) = data.next().await {
            buffer.extend(chunk?);

            while let Some(newline) = buffer.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                inserted += self.import_line(table_name, &line[..newline]).await?;
            }
        }

        inserted += self.import_line(table_name, buffer.as_slice()).await?;
        Ok(inserted)
    }
}

impl InMemoryBackendAdapter {
    async fn import_line(&self, table_name: &str, line: &[u8]) -> AppResult<u64> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(0);
        }

        let row: RowData = serde_json::from_slice(line).map_err(|error| {
            AppError::Validation(format!("failed to decode imported row: {error}"))
        })?;

        let mut tables = self.tables.write().await;
        let state = tables
            .get_mut(table_name)
            .ok_or_else(|| Self::unknown_table(table_name))?;
        Self::insert_row_into_state(state, row)?;

        Ok(1)
    }
}
