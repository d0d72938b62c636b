pub mod download;
pub mod files;
pub mod upload;

use crate::error::AppError;

/// Parse a file id taken from the request path.
pub(crate) fn parse_file_id(raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::Validation("Invalid file ID".into()))
}
