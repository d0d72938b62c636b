//! Upload and download orchestration.
//!
//! Uploads run stage → dedup lookup → commit → create, so content that is
//! already stored never reaches the remote store twice. Downloads bump the
//! counter before the blob is opened.

use std::sync::Arc;

use common::storage::BoxReader;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{info, instrument, warn};

use crate::relay::{BlobRelay, BlobSource, LocalUpload, RelayError, StagedBlob};
use crate::store::{FileRecord, FileSource, FileStore, NewFileRecord, StoreError};
use crate::utils::filename::validate_flat_filename;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of an upload.
#[derive(Debug)]
pub struct UploadOutcome {
    pub record: FileRecord,
    /// `false` when the content was already stored and the existing record is returned.
    pub created: bool,
}

/// An opened download.
pub struct Download {
    pub record: FileRecord,
    pub reader: BoxReader,
}

#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn FileStore>,
    relay: Arc<BlobRelay>,
}

impl FileService {
    pub fn new(store: Arc<dyn FileStore>, relay: Arc<BlobRelay>) -> Self {
        Self { store, relay }
    }

    /// Fetch `url` and store its content.
    #[instrument(skip(self))]
    pub async fn upload_from_url(&self, url: &str) -> Result<UploadOutcome, ServiceError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ServiceError::Validation("URL is required".into()));
        }

        let staged = self.relay.stage(BlobSource::Url(url.to_string())).await?;
        self.finish_upload(staged, FileSource::Url(url.to_string()))
            .await
    }

    /// Spool a client-supplied body to disk and store it.
    ///
    /// The client filename is checked before any bytes are written.
    #[instrument(skip(self, reader))]
    pub async fn upload_stream<R: AsyncRead + Unpin>(
        &self,
        reader: R,
        filename: Option<String>,
        mime: Option<String>,
    ) -> Result<UploadOutcome, ServiceError> {
        if let Some(name) = filename.as_deref() {
            validate_flat_filename(name)
                .map_err(|e| ServiceError::Validation(e.message().into()))?;
        }

        let (file, _) = self.relay.spool(reader).await?;
        self.upload_local(LocalUpload {
            file,
            filename,
            mime,
        })
        .await
    }

    /// Store a file that is already on local disk.
    pub async fn upload_local(&self, upload: LocalUpload) -> Result<UploadOutcome, ServiceError> {
        let staged = self.relay.stage(BlobSource::Local(upload)).await?;
        self.finish_upload(staged, FileSource::Direct).await
    }

    async fn finish_upload(
        &self,
        staged: StagedBlob,
        source: FileSource,
    ) -> Result<UploadOutcome, ServiceError> {
        if let Some(existing) = self.store.get_by_content_hash(&staged.content_hash).await? {
            info!(id = existing.id, hash = %staged.content_hash, "Content already stored");
            return Ok(UploadOutcome {
                record: existing,
                created: false,
            });
        }

        let stored = self.relay.commit(staged).await?;
        let size = i64::try_from(stored.size).map_err(|_| RelayError::Oversize {
            limit: self.relay.max_size(),
        })?;

        let insertion = self
            .store
            .create(NewFileRecord {
                filename: stored.filename,
                size,
                mime: stored.mime,
                remote_blob_id: stored.remote_blob_id,
                content_hash: stored.content_hash,
                source,
            })
            .await?;

        let created = insertion.is_created();
        let record = insertion.into_record();
        if created {
            info!(id = record.id, hash = %record.content_hash, size = record.size, "File stored");
        } else {
            warn!(
                id = record.id,
                hash = %record.content_hash,
                "Concurrent upload stored the same content first; this upload's remote blob is unreferenced"
            );
        }

        Ok(UploadOutcome { record, created })
    }

    pub async fn list(&self) -> Result<Vec<FileRecord>, ServiceError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: i32) -> Result<FileRecord, ServiceError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("File not found".into()))
    }

    /// Remove the metadata record. The remote blob is left in place.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        if self.store.delete_by_id(id).await? {
            info!(id, "File deleted");
            Ok(())
        } else {
            Err(ServiceError::NotFound("File not found".into()))
        }
    }

    /// Look up a file, count the download and open its content.
    #[instrument(skip(self))]
    pub async fn open_download(&self, id: i32) -> Result<Download, ServiceError> {
        let record = self.get(id).await?;
        self.store.increment_downloads(id).await?;
        let reader = self.relay.retrieve(&record.remote_blob_id).await?;
        Ok(Download { record, reader })
    }
}
