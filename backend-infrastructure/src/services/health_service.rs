use std::sync::Arc;

use backend_application::RecordStore;

/// Readiness probe over the record store; liveness needs no dependencies.
pub struct DefaultHealthService {
    record_store: Arc<RecordStore>,
}

impl DefaultHealthService {
    pub fn new(record_store: Arc<RecordStore>) -> Self {
        Self { record_store }
    }

    pub async fn check_database(&self) -> anyhow::Result<bool> {
        self.record_store.ping().await.map(|_| true).map_err(Into::into)
    }
}
