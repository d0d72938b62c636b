use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::hash::ContentHash;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Descriptive metadata sent along with an upload.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    pub filename: String,
    pub mime: String,
    pub size: u64,
    pub content_hash: ContentHash,
}

/// A remote store holding file bytes behind opaque identifiers.
///
/// Uploads take a complete local file; retrieval is streamed.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a fully materialized local file and return its remote blob id.
    async fn put_file(&self, path: &Path, meta: &UploadMeta) -> Result<String, StorageError>;

    /// Open a blob for streaming.
    async fn get_stream(&self, blob_id: &str) -> Result<BoxReader, StorageError>;
}
