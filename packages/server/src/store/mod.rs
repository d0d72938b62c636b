//! File metadata repository.
//!
//! One trait, two implementations: [`MemoryFileStore`] keeps records in
//! process memory, [`DatabaseFileStore`] persists them through SeaORM. The
//! backend is chosen once at startup.

#[cfg(test)]
mod conformance;
mod database;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::storage::ContentHash;
use sea_orm::DbErr;
use thiserror::Error;

pub use database::DatabaseFileStore;
pub use memory::MemoryFileStore;

/// Where a stored file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Uploaded directly as a multipart body.
    Direct,
    /// Fetched from the contained URL.
    Url(String),
}

impl FileSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Url(_) => "url",
        }
    }

    pub fn original_url(&self) -> Option<&str> {
        match self {
            Self::Direct => None,
            Self::Url(url) => Some(url),
        }
    }

    /// Rebuild from the persisted `(source, original_url)` column pair.
    pub fn from_parts(kind: &str, original_url: Option<String>) -> Option<Self> {
        match (kind, original_url) {
            ("direct", None) => Some(Self::Direct),
            ("url", Some(url)) => Some(Self::Url(url)),
            _ => None,
        }
    }
}

/// Metadata about one stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i32,
    pub filename: String,
    pub size: i64,
    pub mime: String,
    pub remote_blob_id: String,
    pub content_hash: ContentHash,
    pub uploaded_at: DateTime<Utc>,
    pub downloads: i64,
    pub source: FileSource,
}

/// A record as handed to [`FileStore::create`]; id, timestamp and counter are assigned there.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub filename: String,
    pub size: i64,
    pub mime: String,
    pub remote_blob_id: String,
    pub content_hash: ContentHash,
    pub source: FileSource,
}

impl NewFileRecord {
    fn into_record(self, id: i32, uploaded_at: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id,
            filename: self.filename,
            size: self.size,
            mime: self.mime,
            remote_blob_id: self.remote_blob_id,
            content_hash: self.content_hash,
            uploaded_at,
            downloads: 0,
            source: self.source,
        }
    }
}

/// Outcome of [`FileStore::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// A new record was inserted.
    Created(FileRecord),
    /// A record with the same content hash already existed and was left untouched.
    Existing(FileRecord),
}

impl Insertion {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    #[cfg(test)]
    pub fn record(&self) -> &FileRecord {
        match self {
            Self::Created(record) | Self::Existing(record) => record,
        }
    }

    pub fn into_record(self) -> FileRecord {
        match self {
            Self::Created(record) | Self::Existing(record) => record,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("stored record {id} is malformed: {reason}")]
    Corrupt { id: i32, reason: String },
}

/// Repository of [`FileRecord`]s.
///
/// Every method is atomic on its own; `content_hash` is unique across records.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Insert a record, or return the one already holding its content hash.
    async fn create(&self, new: NewFileRecord) -> Result<Insertion, StoreError>;

    async fn get_by_id(&self, id: i32) -> Result<Option<FileRecord>, StoreError>;

    async fn get_by_content_hash(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<FileRecord>, StoreError>;

    /// All records, newest upload first.
    async fn list(&self) -> Result<Vec<FileRecord>, StoreError>;

    /// Bump the download counter by one. Unknown ids are ignored.
    async fn increment_downloads(&self, id: i32) -> Result<(), StoreError>;

    /// Remove a record. Returns `false` if it did not exist.
    async fn delete_by_id(&self, id: i32) -> Result<bool, StoreError>;
}
