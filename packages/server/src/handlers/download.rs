use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::handlers::parse_file_id;
use crate::service::Download;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/download/{id}",
    tag = "Downloads",
    operation_id = "downloadFile",
    summary = "Download a file",
    description = "Streams the file content from the remote store and counts the download. \
        Errors are plain text. A failure after streaming has started aborts the body.",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Invalid file ID", body = String, content_type = "text/plain"),
        (status = 404, description = "File not found", body = String, content_type = "text/plain"),
        (status = 500, description = "Remote store failure", body = String, content_type = "text/plain"),
    ),
)]
#[instrument(skip(state))]
pub async fn download_file(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match stream_file(&state, &id).await {
        Ok(response) => response,
        Err(err) => plain_text_error(err),
    }
}

async fn stream_file(state: &AppState, raw_id: &str) -> Result<Response, AppError> {
    let id = parse_file_id(raw_id)?;
    let Download { record, reader } = state.files.open_download(id).await?;

    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, record.mime.as_str())
        .header(header::CONTENT_LENGTH, record.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&record.filename),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

fn plain_text_error(err: AppError) -> Response {
    let (status, body) = err.status_and_body();
    let message = if status.is_server_error() {
        format!("Error streaming file: {}", body.message)
    } else {
        body.message
    };
    (status, message).into_response()
}

/// `attachment` disposition with an ASCII fallback name and an RFC 5987 `filename*`.
fn content_disposition_value(filename: &str) -> String {
    let ascii_name: String = filename
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = match ascii_name.trim() {
        "" => "download",
        trimmed => trimmed,
    };

    let encoded: String = filename
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
