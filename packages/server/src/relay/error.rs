use common::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// The source could not be accepted as given.
    #[error("{0}")]
    Validation(String),

    #[error("File exceeds the maximum allowed size ({limit} bytes)")]
    Oversize { limit: u64 },

    /// The source URL was unreachable or answered with a failure status.
    #[error("{0}")]
    Fetch(String),

    #[error("Remote store error: {0}")]
    RemoteStore(String),

    #[error("Blob {0} is no longer available in the remote store")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for RelayError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => Self::NotFound(id),
            StorageError::Io(e) => Self::Io(e),
            StorageError::SizeLimitExceeded { limit, .. } => Self::Oversize { limit },
            other @ (StorageError::InvalidHash(_)
            | StorageError::Rejected(_)
            | StorageError::Transport(_)) => Self::RemoteStore(other.to_string()),
        }
    }
}
