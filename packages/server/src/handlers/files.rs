use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::handlers::parse_file_id;
use crate::models::file::{DeleteResponse, FileDetailResponse, FileListResponse, FileResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List stored files",
    description = "Returns every stored file, newest upload first.",
    responses(
        (status = 200, description = "File list", body = FileListResponse),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_files(State(state): State<AppState>) -> Result<Json<FileListResponse>, AppError> {
    let files = state
        .files
        .list()
        .await?
        .into_iter()
        .map(FileResponse::from)
        .collect();

    Ok(Json(FileListResponse {
        success: true,
        files,
    }))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get file metadata",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File metadata", body = FileDetailResponse),
        (status = 400, description = "Invalid file ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileDetailResponse>, AppError> {
    let id = parse_file_id(&id)?;
    let record = state.files.get(id).await?;

    Ok(Json(FileDetailResponse {
        success: true,
        file: record.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the metadata record. Its content hash is released, so uploading the \
        same bytes again creates a new file. The remote blob is not removed.",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted", body = DeleteResponse),
        (status = 400, description = "Invalid file ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_file_id(&id)?;
    state.files.delete(id).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "File deleted successfully".into(),
    }))
}
