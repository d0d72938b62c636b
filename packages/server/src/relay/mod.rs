//! Moves bytes between inbound sources and the remote blob store.
//!
//! Uploads happen in two steps. [`BlobRelay::stage`] materializes the source
//! into a local staging file, enforcing the size ceiling and computing the
//! content hash on the way. [`BlobRelay::commit`] then relays the staged file
//! to the remote store. Splitting the steps lets callers skip the remote
//! upload for content they already hold.

mod error;
mod staging;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use common::storage::{BlobStore, BoxReader, ContentHash, HashingReader, UploadMeta};
use futures::TryStreamExt;
use mime_guess::mime::{self, Mime};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Url};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info, instrument};

use crate::utils::filename::{derive_filename, synthesize_filename, validate_flat_filename};

pub use error::RelayError;
pub use staging::StagingFile;

/// A file received directly from a client and already spooled to disk.
#[derive(Debug)]
pub struct LocalUpload {
    pub file: StagingFile,
    /// Name supplied by the client, if any.
    pub filename: Option<String>,
    /// Content type supplied by the client, if any.
    pub mime: Option<String>,
}

/// Where the bytes of an upload come from.
#[derive(Debug)]
pub enum BlobSource {
    Local(LocalUpload),
    Url(String),
}

/// A source materialized locally and hashed, not yet sent to the remote store.
#[derive(Debug)]
pub struct StagedBlob {
    file: StagingFile,
    pub filename: String,
    pub mime: String,
    pub size: u64,
    pub content_hash: ContentHash,
}

/// A blob that now lives in the remote store.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub remote_blob_id: String,
    pub filename: String,
    pub mime: String,
    pub size: u64,
    pub content_hash: ContentHash,
}

pub struct BlobRelay {
    blob_store: Arc<dyn BlobStore>,
    http: Client,
    staging_dir: PathBuf,
    max_size: u64,
}

impl BlobRelay {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        http: Client,
        staging_dir: impl Into<PathBuf>,
        max_size: u64,
    ) -> Self {
        Self {
            blob_store,
            http,
            staging_dir: staging_dir.into(),
            max_size,
        }
    }

    /// Largest accepted file, in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Copy `reader` into a fresh staging file.
    ///
    /// Fails with [`RelayError::Oversize`] as soon as more than `max_size`
    /// bytes arrive; the partial file is removed.
    pub async fn spool<R: AsyncRead + Unpin>(
        &self,
        reader: R,
    ) -> Result<(StagingFile, u64), RelayError> {
        let (staging, mut file) = StagingFile::create(&self.staging_dir).await?;

        let mut limited = reader.take(self.max_size.saturating_add(1));
        let written = tokio::io::copy(&mut limited, &mut file).await?;
        if written > self.max_size {
            return Err(RelayError::Oversize {
                limit: self.max_size,
            });
        }
        file.flush().await?;

        Ok((staging, written))
    }

    /// Materialize and hash `source` without touching the remote store.
    pub async fn stage(&self, source: BlobSource) -> Result<StagedBlob, RelayError> {
        match source {
            BlobSource::Local(upload) => self.stage_local(upload).await,
            BlobSource::Url(url) => self.stage_url(&url).await,
        }
    }

    /// Upload a staged blob to the remote store. The staging file is removed afterwards.
    #[instrument(skip_all, fields(hash = %staged.content_hash, size = staged.size))]
    pub async fn commit(&self, staged: StagedBlob) -> Result<StoredBlob, RelayError> {
        let meta = UploadMeta {
            filename: staged.filename.clone(),
            mime: staged.mime.clone(),
            size: staged.size,
            content_hash: staged.content_hash,
        };

        let remote_blob_id = self.blob_store.put_file(staged.file.path(), &meta).await?;
        info!(%remote_blob_id, filename = %meta.filename, "Blob relayed to remote store");

        Ok(StoredBlob {
            remote_blob_id,
            filename: meta.filename,
            mime: meta.mime,
            size: meta.size,
            content_hash: meta.content_hash,
        })
    }

    /// [`stage`](Self::stage) followed by [`commit`](Self::commit).
    pub async fn store(&self, source: BlobSource) -> Result<StoredBlob, RelayError> {
        let staged = self.stage(source).await?;
        self.commit(staged).await
    }

    /// Open a remote blob for streaming.
    pub async fn retrieve(&self, remote_blob_id: &str) -> Result<BoxReader, RelayError> {
        Ok(self.blob_store.get_stream(remote_blob_id).await?)
    }

    async fn stage_local(&self, upload: LocalUpload) -> Result<StagedBlob, RelayError> {
        let size = tokio::fs::metadata(upload.file.path()).await?.len();
        if size > self.max_size {
            return Err(RelayError::Oversize {
                limit: self.max_size,
            });
        }

        let filename = match upload.filename.as_deref() {
            Some(name) => validate_flat_filename(name)
                .map_err(|e| RelayError::Validation(e.message().into()))?
                .to_string(),
            None => synthesize_filename(upload.mime.as_deref(), Utc::now().timestamp_millis()),
        };
        let mime = resolve_mime(upload.mime.as_deref(), &filename);
        let (content_hash, size) = ContentHash::compute_file(upload.file.path()).await?;
        debug!(%content_hash, size, %filename, "Staged direct upload");

        Ok(StagedBlob {
            file: upload.file,
            filename,
            mime,
            size,
            content_hash,
        })
    }

    #[instrument(skip(self))]
    async fn stage_url(&self, raw: &str) -> Result<StagedBlob, RelayError> {
        let url = parse_source_url(raw)?;

        let head = self.http.head(url.clone()).send().await.map_err(fetch_failed)?;
        if !head.status().is_success() {
            return Err(RelayError::Fetch(format!(
                "Failed to fetch URL: {}",
                head.status()
            )));
        }

        let headers = head.headers();
        if let Some(declared) = header_str(headers, CONTENT_LENGTH).and_then(|v| v.parse::<u64>().ok())
            && declared > self.max_size
        {
            return Err(RelayError::Oversize {
                limit: self.max_size,
            });
        }

        let content_type = header_str(headers, CONTENT_TYPE);
        let filename = derive_filename(
            header_str(headers, CONTENT_DISPOSITION),
            &url,
            content_type,
            Utc::now().timestamp_millis(),
        );
        let mime = resolve_mime(content_type, &filename);

        let response = self.http.get(url).send().await.map_err(fetch_failed)?;
        if !response.status().is_success() {
            return Err(RelayError::Fetch(format!(
                "Failed to fetch URL: {}",
                response.status()
            )));
        }

        let body = response.bytes_stream().map_err(io::Error::other);
        let mut reader = HashingReader::new(StreamReader::new(Box::pin(body)));
        let (file, size) = self.spool(&mut reader).await?;
        let (content_hash, _) = reader.finalize();
        debug!(%content_hash, size, %filename, "Staged URL download");

        Ok(StagedBlob {
            file,
            filename,
            mime,
            size,
            content_hash,
        })
    }
}

/// Parse a client-supplied source URL. Only `http` and `https` are accepted.
pub fn parse_source_url(raw: &str) -> Result<Url, RelayError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| RelayError::Validation(format!("Invalid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RelayError::Validation(format!(
            "Unsupported URL scheme '{other}'"
        ))),
    }
}

/// Declared content type if it parses, else a guess from the filename extension.
pub fn resolve_mime(declared: Option<&str>, filename: &str) -> String {
    if let Some(declared) = declared.map(str::trim)
        && declared.parse::<Mime>().is_ok()
    {
        return declared.to_string();
    }
    mime_guess::from_path(filename)
        .first()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
        .to_string()
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn fetch_failed(err: reqwest::Error) -> RelayError {
    RelayError::Fetch(format!("Failed to fetch URL: {err}"))
}
