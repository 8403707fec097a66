//! In-memory interaction store. The default for tests and for callers that
//! load/flush the log themselves.
//!
//! Writes serialize behind a single RwLock writer; reads work over a
//! snapshot taken under the read lock.

use crate::domain::{
    DomainError, InteractionDraft, InteractionFilter, InteractionPatch, InteractionRecord,
};
use crate::ports::InteractionStore;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<InteractionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with already-validated records (e.g. a loaded snapshot).
    pub fn with_records(records: Vec<InteractionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl InteractionStore for MemoryStore {
    async fn append(&self, draft: InteractionDraft) -> Result<InteractionRecord, DomainError> {
        // Validate before taking the lock; a rejected draft never touches
        // the log.
        let record = draft.build()?;
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: InteractionPatch,
    ) -> Result<InteractionRecord, DomainError> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(DomainError::NotFound(id))?;
        let updated = patch.apply(slot)?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(DomainError::NotFound(id));
        }
        Ok(())
    }

    async fn query(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<InteractionRecord>, DomainError> {
        let records = self.records.read().await;
        let mut matched: Vec<InteractionRecord> = records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matched)
    }
}
