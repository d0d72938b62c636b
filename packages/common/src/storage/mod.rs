mod error;
mod hash;
mod hashing;
mod traits;

pub mod filesystem;
#[cfg(feature = "telegram")]
pub mod telegram;

pub use error::StorageError;
pub use hash::ContentHash;
pub use hashing::{ContentHasher, HashingReader};
pub use traits::{BlobStore, BoxReader, UploadMeta};
