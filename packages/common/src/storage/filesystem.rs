use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;

use super::error::StorageError;
use super::traits::{BlobStore, BoxReader, UploadMeta};

/// Filesystem-backed blob store.
///
/// Each upload gets a fresh random id; blobs live in a sharded layout:
/// `{base_path}/{first 2 id chars}/{remaining 30 id chars}`.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Compute the filesystem path for a blob id, rejecting ids this store never issued.
    fn blob_path(&self, blob_id: &str) -> Option<PathBuf> {
        let well_formed = blob_id.len() == 32
            && blob_id
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return None;
        }
        Some(self.base_path.join(&blob_id[..2]).join(&blob_id[2..]))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_file(
        &self,
        path: &std::path::Path,
        meta: &UploadMeta,
    ) -> Result<String, StorageError> {
        let size = fs::metadata(path).await?.len();
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let blob_id = uuid::Uuid::new_v4().simple().to_string();
        let Some(blob_path) = self.blob_path(&blob_id) else {
            return Err(StorageError::Rejected(format!("malformed blob id {blob_id}")));
        };

        let temp_path = self.temp_path();
        if let Err(e) = fs::copy(path, &temp_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(
            blob_id = %blob_id,
            filename = %meta.filename,
            content_hash = %meta.content_hash,
            size,
            "Stored blob on filesystem"
        );

        Ok(blob_id)
    }

    async fn get_stream(&self, blob_id: &str) -> Result<BoxReader, StorageError> {
        let blob_path = self
            .blob_path(blob_id)
            .ok_or_else(|| StorageError::NotFound(blob_id.to_string()))?;
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(blob_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
