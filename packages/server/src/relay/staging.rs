use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tracing::warn;
use uuid::Uuid;

/// A uniquely named scratch file that is removed when dropped.
///
/// Holds bytes between the inbound source and the remote upload, so every
/// exit path (success, error, cancelled request) cleans up after itself.
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
}

impl StagingFile {
    /// Create an empty staging file under `dir`, creating `dir` if needed.
    pub async fn create(dir: &Path) -> io::Result<(Self, File)> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("stashbot-{}", Uuid::new_v4()));
        let file = File::create(&path).await?;
        Ok((Self { path }, file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove staging file"),
        }
    }
}
