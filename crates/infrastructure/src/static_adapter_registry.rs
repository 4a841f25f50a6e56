use std::collections::HashMap;
use std::sync::Arc;

use rowgate_application::{AdapterRegistry, BackendAdapter};
use rowgate_core::{AppError, AppResult, ConnectionId};
use rowgate_domain::ConnectionRecord;

/// Adapter registry with a fixed connection-to-adapter mapping.
///
/// Registration happens at composition time; a connection record that reaches
/// lookup without a registered adapter is a wiring fault, not a caller error.
#[derive(Default)]
pub struct StaticAdapterRegistry {
    adapters: HashMap<ConnectionId, Arc<dyn BackendAdapter>>,
}

impl StaticAdapterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the adapter serving a connection.
    pub fn register(&mut self, connection_id: ConnectionId, adapter: Arc<dyn BackendAdapter>) {
        self.adapters.insert(connection_id, adapter);
    }
}

impl AdapterRegistry for StaticAdapterRegistry {
    fn adapter_for(&self, connection: &ConnectionRecord) -> AppResult<Arc<dyn BackendAdapter>> {
        self.adapters.get(&connection.id()).cloned().ok_or_else(|| {
            AppError::Internal(format!(
                "no adapter registered for {} connection '{}'",
                connection.kind().as_str(),
                connection.id()
            ))
        })
    }
}
