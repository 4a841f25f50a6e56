//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_backend_adapter;
mod in_memory_grant_repository;
mod postgres_grant_repository;
mod static_adapter_registry;
mod tracing_row_audit_logger;

pub use in_memory_backend_adapter::InMemoryBackendAdapter;
pub use in_memory_grant_repository::InMemoryGrantRepository;
pub use postgres_grant_repository::PostgresGrantRepository;
pub use static_adapter_registry::StaticAdapterRegistry;
pub use tracing_row_audit_logger::TracingRowAuditLogger;
