use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::storage::ContentHash;
use tokio::sync::RwLock;

use super::{FileRecord, FileStore, Insertion, NewFileRecord, StoreError};

#[derive(Default)]
struct Inner {
    files: HashMap<i32, FileRecord>,
    by_hash: HashMap<ContentHash, i32>,
    last_id: i32,
}

/// Process-local [`FileStore`]. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryFileStore {
    inner: RwLock<Inner>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn create(&self, new: NewFileRecord) -> Result<Insertion, StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner
            .by_hash
            .get(&new.content_hash)
            .and_then(|id| inner.files.get(id))
        {
            return Ok(Insertion::Existing(existing.clone()));
        }

        inner.last_id += 1;
        let record = new.into_record(inner.last_id, Utc::now());
        inner.by_hash.insert(record.content_hash, record.id);
        inner.files.insert(record.id, record.clone());

        Ok(Insertion::Created(record))
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.inner.read().await.files.get(&id).cloned())
    }

    async fn get_by_content_hash(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<FileRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_hash
            .get(hash)
            .and_then(|id| inner.files.get(id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<FileRecord>, StoreError> {
        let mut files: Vec<FileRecord> = self.inner.read().await.files.values().cloned().collect();
        files.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(files)
    }

    async fn increment_downloads(&self, id: i32) -> Result<(), StoreError> {
        if let Some(file) = self.inner.write().await.files.get_mut(&id) {
            file.downloads = file.downloads.saturating_add(1);
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.files.remove(&id) {
            Some(file) => {
                inner.by_hash.remove(&file.content_hash);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
