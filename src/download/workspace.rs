//! Per-request scratch directory
//!
//! Every file a request creates lives under its own `ttdl_<uuid>` directory.
//! Dropping the [`RequestWorkspace`] deletes the directory, so whichever way
//! the handler exits, nothing is left behind.

use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory prefix, also handy when cleaning up after a crash
pub const WORKSPACE_PREFIX: &str = "ttdl_";

#[derive(Debug)]
pub struct RequestWorkspace {
    dir: PathBuf,
}

impl RequestWorkspace {
    /// Creates a fresh, uniquely named directory under `root`.
    pub async fn create(root: &Path) -> io::Result<Self> {
        let dir = root.join(format!("{}{}", WORKSPACE_PREFIX, Uuid::new_v4().simple()));
        fs_err::tokio::create_dir_all(&dir).await?;
        log::debug!("Created workspace {}", dir.display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Removes everything inside the workspace, keeping the directory.
    pub async fn clear(&self) -> io::Result<()> {
        let mut entries = fs_err::tokio::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                fs_err::tokio::remove_dir_all(&path).await?;
            } else {
                fs_err::tokio::remove_file(&path).await?;
            }
        }
        Ok(())
    }

    /// Deletes one file early. Failures are logged; the drop still sweeps it.
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = fs_err::tokio::remove_file(path).await {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("Failed to discard {}: {}", path.display(), e);
            }
        }
    }
}

/// Removal is synchronous. A workspace holds at most the download, one
/// compressed copy and yt-dlp scratch files, so this is a handful of unlinks,
/// and the directory is gone by the time the handler returns. It also works
/// when the guard is dropped outside a tokio runtime.
impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        match fs_err::remove_dir_all(&self.dir) {
            Ok(()) => log::debug!("Removed workspace {}", self.dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::error!("Failed to remove workspace {}: {}", self.dir.display(), e),
        }
    }
}
