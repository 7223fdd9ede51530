use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use backend_domain::{DeadlineFilter, DeadlineRepository, RecordId, StoredDeadline};

/// Process-local store for development and tests; contents are lost on exit.
#[derive(Default)]
pub struct InMemoryDeadlineRepository {
    records: RwLock<Vec<StoredDeadline>>,
}

impl InMemoryDeadlineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl DeadlineRepository for InMemoryDeadlineRepository {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn find_by_message_id(&self, message_id: &str) -> Result<Option<StoredDeadline>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| record.message_id() == message_id)
            .cloned())
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<StoredDeadline>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| &record.id == id)
            .cloned())
    }

    async fn insert(&self, record: &StoredDeadline) -> Result<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(anyhow!("record {} already exists", record.id));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn replace(&self, record: &StoredDeadline) -> Result<()> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or_else(|| anyhow!("record {} not found", record.id))?;
        *slot = record.clone();
        Ok(())
    }

    async fn list(
        &self,
        skip: usize,
        limit: usize,
        filter: &DeadlineFilter,
    ) -> Result<Vec<StoredDeadline>> {
        let mut matching: Vec<StoredDeadline> = self
            .records
            .read()
            .await
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.event.received_at.cmp(&a.event.received_at));
        Ok(matching.into_iter().skip(skip).take(limit).collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
