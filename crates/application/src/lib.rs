//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod access_service;
mod row_ports;
mod row_service;

pub use access_ports::{GrantRepository, RowAuditEvent, RowAuditOperation, RowAuditRepository};
pub use access_service::AccessService;
pub use row_ports::{AdapterRegistry, BackendAdapter, RowByteStream, TableSettingsRepository};
pub use row_service::{RowService, TableRowPage};
