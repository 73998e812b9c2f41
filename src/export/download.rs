//! Delivering a binary report to the user as a file.
//!
//! [`FileDownloader`] is the capability the PDF export hands its payload to.
//! [`DirectoryDownloader`] saves into a directory through a temp file in the
//! same directory followed by a rename, so a crash never leaves a partial
//! report behind and the temporary is gone once `save` returns.

use crate::error::FilingError;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// A payload offered to the user for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Receives downloads; returns where the file ended up.
pub trait FileDownloader: Send + Sync {
    fn save(&self, download: Download) -> impl Future<Output = Result<PathBuf, FilingError>> + Send;
}

/// Saves downloads into a fixed directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileDownloader for DirectoryDownloader {
    async fn save(&self, download: Download) -> Result<PathBuf, FilingError> {
        let target = self.dir.join(safe_filename(&download.filename));
        let dir = self.dir.clone();
        let path = target.clone();
        let bytes = download.bytes;

        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &bytes))
            .await
            .map_err(|e| FilingError::Internal(format!("Download task panicked: {}", e)))??;

        info!("Saved {} ({}) → {}", download.filename, download.content_type, target.display());
        Ok(target)
    }
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), FilingError> {
    let write_err = |source| FilingError::DownloadWriteFailed {
        path: target.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(target).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Keep only the final path component of a server-suggested name.
pub fn safe_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        "report.pdf".to_string()
    } else {
        base.to_string()
    }
}
