//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod connection;
mod grant;
mod query;
mod table;

pub use access::{AccessLevel, TablePermission};
pub use connection::{ConnectionKind, ConnectionRecord};
pub use grant::{
    ConnectionGrant, GroupGrant, TableGrant, aggregate_access_levels, aggregate_table_permissions,
};
pub use query::{
    DEFAULT_PER_PAGE, FilterOperator, QuerySpecification, RawRowFilter, RawRowQuery, RowFilter,
    RowSort, SortDirection,
};
pub use table::{
    ColumnDescriptor, ForeignKeyDescriptor, PrimaryKey, RowData, RowDeleteOutcome, RowEnvelope,
    RowPagination, TableSettings, TableStructure,
};
