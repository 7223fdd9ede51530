use async_trait::async_trait;

use crate::entities::{DeadlineFilter, StoredDeadline};
use crate::value_objects::RecordId;

/// Minimal document-store contract the record store is built on.
#[async_trait]
pub trait DeadlineRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    async fn find_by_message_id(&self, message_id: &str) -> anyhow::Result<Option<StoredDeadline>>;
    async fn find_by_id(&self, id: &RecordId) -> anyhow::Result<Option<StoredDeadline>>;
    async fn insert(&self, record: &StoredDeadline) -> anyhow::Result<()>;
    /// Overwrites the record carrying `record.id`.
    async fn replace(&self, record: &StoredDeadline) -> anyhow::Result<()>;
    /// Newest `received_at` first.
    async fn list(
        &self,
        skip: usize,
        limit: usize,
        filter: &DeadlineFilter,
    ) -> anyhow::Result<Vec<StoredDeadline>>;
    async fn ping(&self) -> anyhow::Result<()>;
}
