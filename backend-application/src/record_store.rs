// Record store
// Validated, idempotent persistence of candidate events keyed by source message id

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use backend_domain::{
    current_nanos, is_canonical_date, synthetic_message_id, CandidateEvent, DeadlineFilter,
    DeadlineRepository, RecordId, StoreError, StoredDeadline, UpsertOutcome,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct RecordStore {
    repo: Arc<dyn DeadlineRepository>,
    // Serializes the find-then-write in `upsert`.
    write_lock: Mutex<()>,
    timeout: Duration,
}

impl RecordStore {
    pub fn new(repo: Arc<dyn DeadlineRepository>, timeout: Duration) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
            timeout,
        }
    }

    pub async fn connect(&self) -> Result<(), StoreError> {
        self.guarded(self.repo.ensure_schema()).await
    }

    /// Inserts a new record, upgrades one whose stored date is malformed, or
    /// returns the existing id untouched.
    pub async fn upsert(&self, mut event: CandidateEvent) -> Result<UpsertOutcome, StoreError> {
        if !is_canonical_date(&event.due_date_canonical) {
            warn!(
                "rejecting record with non-canonical date '{}' (message {:?})",
                event.due_date_canonical, event.source_message_id
            );
            return Err(StoreError::Validation(format!(
                "due date '{}' is not in YYYY-MM-DD form",
                event.due_date_canonical
            )));
        }

        let message_id = match event.source_message_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let synthetic = synthetic_message_id(current_nanos());
                debug!("no source message id, using {}", synthetic);
                synthetic
            }
        };
        event.source_message_id = Some(message_id.clone());

        let _guard = self.write_lock.lock().await;
        let existing = self.guarded(self.repo.find_by_message_id(&message_id)).await?;

        match existing {
            None => {
                let record = StoredDeadline {
                    id: RecordId::generate(),
                    event,
                };
                self.guarded(self.repo.insert(&record)).await?;
                info!("stored record {} for message {}", record.id, message_id);
                Ok(UpsertOutcome::Inserted(record.id))
            }
            Some(current) if !current.has_canonical_date() => {
                let record = StoredDeadline {
                    id: current.id,
                    event,
                };
                self.guarded(self.repo.replace(&record)).await?;
                info!(
                    "upgraded record {} (stored date '{}' was malformed)",
                    record.id, current.event.due_date_canonical
                );
                Ok(UpsertOutcome::Upgraded(record.id))
            }
            Some(current) => {
                debug!("record {} already holds message {}", current.id, message_id);
                Ok(UpsertOutcome::Unchanged(current.id))
            }
        }
    }

    pub async fn exists(&self, message_id: &str) -> Result<bool, StoreError> {
        let found = self.guarded(self.repo.find_by_message_id(message_id.trim())).await?;
        Ok(found.is_some())
    }

    pub async fn list(
        &self,
        skip: usize,
        limit: usize,
        filter: &DeadlineFilter,
    ) -> Result<Vec<StoredDeadline>, StoreError> {
        if limit == 0 {
            return Err(StoreError::Validation("limit must be positive".to_string()));
        }
        self.guarded(self.repo.list(skip, limit, filter)).await
    }

    pub async fn get_by_id(&self, id: &RecordId) -> Result<Option<StoredDeadline>, StoreError> {
        self.guarded(self.repo.find_by_id(id)).await
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.guarded(self.repo.ping()).await
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(StoreError::Backend),
            Err(_) => Err(StoreError::Timeout(self.timeout.as_secs())),
        }
    }
}
