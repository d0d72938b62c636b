use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::relay::RelayError;
use crate::service::ServiceError;
use crate::store::StoreError;

/// Structured error response returned by all JSON endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    #[schema(example = false)]
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `PAYLOAD_TOO_LARGE`, `FILE_TOO_LARGE`, `FETCH_FAILED`, `REMOTE_STORE_ERROR`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid file ID")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// Request body rejected by the body limit before it reached a handler.
    PayloadTooLarge(String),
    FileTooLarge(String),
    FetchFailed(String),
    RemoteStore(String),
    Internal(String),
}

impl AppError {
    pub(crate) fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            AppError::FileTooLarge(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "FILE_TOO_LARGE", msg)
            }
            AppError::FetchFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "FETCH_FAILED", msg),
            AppError::RemoteStore(msg) => {
                tracing::warn!("Remote store failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "REMOTE_STORE_ERROR", msg)
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        (
            status,
            ErrorBody {
                success: false,
                code,
                message,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Validation(msg) => AppError::Validation(msg),
            e @ RelayError::Oversize { .. } => AppError::FileTooLarge(e.to_string()),
            RelayError::Fetch(msg) => AppError::FetchFailed(msg),
            e @ RelayError::RemoteStore(_) => AppError::RemoteStore(e.to_string()),
            e @ RelayError::NotFound(_) => AppError::NotFound(e.to_string()),
            RelayError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::Relay(e) => e.into(),
            ServiceError::Store(e) => e.into(),
        }
    }
}
