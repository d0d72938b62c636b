use std::io;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::file::{FileResponse, UploadResponse, UrlUploadRequest};
use crate::service::UploadOutcome;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Request body limit for the multipart route. The relay enforces the exact file ceiling.
pub fn upload_body_limit(max_file_size: u64) -> DefaultBodyLimit {
    let limit = max_file_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

fn upload_response(outcome: UploadOutcome) -> (StatusCode, Json<UploadResponse>) {
    let (status, message) = if outcome.created {
        (StatusCode::CREATED, "File uploaded successfully")
    } else {
        (StatusCode::OK, "File has already been uploaded")
    };
    (
        status,
        Json(UploadResponse {
            success: true,
            message: message.into(),
            file: FileResponse::from(outcome.record),
        }),
    )
}

#[utoipa::path(
    post,
    path = "/upload/url",
    tag = "Uploads",
    operation_id = "uploadFromUrl",
    summary = "Upload a file from a URL",
    description = "Fetches the URL and stores its content. If identical content is already \
        stored, the existing file is returned with status 200 and nothing is uploaded.",
    request_body = UrlUploadRequest,
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 200, description = "Content already stored", body = UploadResponse),
        (status = 400, description = "Invalid URL (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Request body too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Fetch or storage failure (FETCH_FAILED, FILE_TOO_LARGE, REMOTE_STORE_ERROR, INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip_all, fields(url = %payload.url))]
pub async fn upload_from_url(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UrlUploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let outcome = state.files.upload_from_url(&payload.url).await?;
    Ok(upload_response(outcome))
}

#[utoipa::path(
    post,
    path = "/upload/file",
    tag = "Uploads",
    operation_id = "uploadFile",
    summary = "Upload a file directly",
    description = "Stores the `file` multipart field. Other fields are ignored. If identical \
        content is already stored, the existing file is returned with status 200.",
    request_body(content_type = "multipart/form-data", description = "Multipart body with a `file` field"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 200, description = "Content already stored", body = UploadResponse),
        (status = 400, description = "Not multipart, no file provided or bad filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Request body exceeds the upload limit (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Storage failure (FILE_TOO_LARGE, REMOTE_STORE_ERROR, INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::Validation(format!(
            "Invalid multipart request: {}",
            rejection.body_text()
        ))
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge(e.body_text())
            } else {
                AppError::Validation(format!("Multipart error: {e}"))
            }
        })?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let mime = field.content_type().map(str::to_string);
        let reader = StreamReader::new(Box::pin(field.map_err(io::Error::other)));

        let outcome = state.files.upload_stream(reader, filename, mime).await?;
        return Ok(upload_response(outcome));
    }

    Err(AppError::Validation("No file provided".into()))
}
