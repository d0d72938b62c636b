use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{FileRecord, FileSource};

/// How a file entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Url,
    Direct,
}

/// Response DTO for a single stored file.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "report.pdf")]
    pub filename: String,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub size: i64,
    #[schema(example = "application/pdf")]
    pub mime: String,
    /// Opaque handle into the remote blob store.
    pub remote_blob_id: String,
    /// SHA-256 of the content, lowercase hex.
    #[schema(example = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")]
    pub content_hash: String,
    pub uploaded_at: DateTime<Utc>,
    #[schema(example = 0)]
    pub downloads: i64,
    pub source: SourceKind,
    /// Present only when `source` is `url`.
    #[schema(example = "https://example.com/report.pdf")]
    pub original_url: Option<String>,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        let (source, original_url) = match record.source {
            FileSource::Direct => (SourceKind::Direct, None),
            FileSource::Url(url) => (SourceKind::Url, Some(url)),
        };
        Self {
            id: record.id,
            filename: record.filename,
            size: record.size,
            mime: record.mime,
            remote_blob_id: record.remote_blob_id,
            content_hash: record.content_hash.to_hex(),
            uploaded_at: record.uploaded_at,
            downloads: record.downloads,
            source,
            original_url,
        }
    }
}

/// Request body for uploading from a URL.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UrlUploadRequest {
    /// `http` or `https` URL to fetch.
    #[schema(example = "https://example.com/report.pdf")]
    pub url: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    #[schema(example = "File uploaded successfully")]
    pub message: String,
    pub file: FileResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub success: bool,
    /// Newest upload first.
    pub files: Vec<FileResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileDetailResponse {
    pub success: bool,
    pub file: FileResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    #[schema(example = "File deleted successfully")]
    pub message: String,
}
