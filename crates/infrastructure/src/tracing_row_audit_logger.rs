use async_trait::async_trait;
use rowgate_application::{RowAuditEvent, RowAuditRepository};
use rowgate_core::AppResult;

/// Audit sink that emits structured log records.
///
/// Suits deployments where the audit trail is collected from logs rather than
/// stored relationally.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRowAuditLogger;

impl TracingRowAuditLogger {
    /// Creates the logger.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RowAuditRepository for TracingRowAuditLogger {
    async fn append_event(&self, event: RowAuditEvent) -> AppResult<()> {
        tracing::info!(
            operation = event.operation.as_str(),
            connection_id = %event.connection_id,
            table_name = %event.table_name,
            user_id = %event.user_id,
            primary_key = ?event.primary_key,
            old_data = ?event.old_data,
            new_data = ?event.new_data,
            occurred_at = %event.occurred_at,
            "row mutation recorded"
        );

        Ok(())
    }
}
