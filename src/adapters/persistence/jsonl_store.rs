//! JSONL-backed interaction store. One JSON object per line, append-only
//! writes; updates and deletes rewrite the file atomically.
//!
//! An in-memory cache behind a RwLock is the source of truth for queries;
//! the file is the durable copy. `load()` after construction.

use crate::domain::{
    DomainError, InteractionDraft, InteractionFilter, InteractionPatch, InteractionRecord,
};
use crate::ports::InteractionStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

pub struct JsonlStore {
    path: PathBuf,
    cache: RwLock<Vec<InteractionRecord>>,
}

impl JsonlStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: RwLock::new(Vec::new()),
        }
    }

    /// Load the log from disk. A missing file is an empty log. Lines that
    /// fail to parse are skipped with a warning rather than poisoning the
    /// whole log.
    pub async fn load(&self) -> Result<(), DomainError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(DomainError::Store(e.to_string())),
        };

        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InteractionRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(line = line_no + 1, error = %e, "skipping malformed log line"),
            }
        }
        *self.cache.write().await = records;
        Ok(())
    }

    /// Append one line to the log file. Called with the write lock held, so
    /// file writes never interleave.
    async fn append_line(&self, record: &InteractionRecord) -> Result<(), DomainError> {
        let mut line =
            serde_json::to_string(record).map_err(|e| DomainError::Store(e.to_string()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Store(e.to_string()))?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))
    }

    /// Atomic full rewrite using the write-replace pattern: temp file,
    /// sync_all, rename. Used by update/delete.
    async fn rewrite(&self, records: &[InteractionRecord]) -> Result<(), DomainError> {
        let mut body = String::new();
        for record in records {
            body.push_str(
                &serde_json::to_string(record).map_err(|e| DomainError::Store(e.to_string()))?,
            );
            body.push('\n');
        }

        let temp_path = self.path.with_extension("jsonl.tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Store(format!("create temp file: {e}")))?;
        file.write_all(body.as_bytes())
            .await
            .map_err(|e| DomainError::Store(format!("write temp file: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| DomainError::Store(format!("sync temp file: {e}")))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::Store(format!("atomic rename failed: {e}")))
    }
}

#[async_trait::async_trait]
impl InteractionStore for JsonlStore {
    async fn append(&self, draft: InteractionDraft) -> Result<InteractionRecord, DomainError> {
        let record = draft.build()?;
        let mut cache = self.cache.write().await;
        self.append_line(&record).await?;
        cache.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: InteractionPatch,
    ) -> Result<InteractionRecord, DomainError> {
        let mut cache = self.cache.write().await;
        let index = cache
            .iter()
            .position(|r| r.id == id)
            .ok_or(DomainError::NotFound(id))?;
        let updated = patch.apply(&cache[index])?;

        let mut next = cache.clone();
        next[index] = updated.clone();
        self.rewrite(&next).await?;
        *cache = next;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut cache = self.cache.write().await;
        if !cache.iter().any(|r| r.id == id) {
            return Err(DomainError::NotFound(id));
        }
        let next: Vec<InteractionRecord> =
            cache.iter().filter(|r| r.id != id).cloned().collect();
        self.rewrite(&next).await?;
        *cache = next;
        Ok(())
    }

    async fn query(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<InteractionRecord>, DomainError> {
        let cache = self.cache.read().await;
        let mut matched: Vec<InteractionRecord> =
            cache.iter().filter(|r| filter.matches(r)).cloned().collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matched)
    }
}
