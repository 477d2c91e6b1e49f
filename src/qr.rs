//! Pairing code cache.
//!
//! Holds at most one code in a plain-text file under the storage directory.
//! Saving overwrites; there is no history. Reads and writes are unguarded,
//! with a single writer (the event path) in practice.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of the cached code inside the storage directory.
pub const QR_FILE_NAME: &str = "qr_code.txt";

/// Errors from the pairing code cache.
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    /// No code has been cached yet.
    #[error("no QR code available")]
    NotFound,

    /// Filesystem failure.
    #[error("QR cache I/O failed for {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// File-backed cache for the current pairing code.
#[derive(Debug, Clone)]
pub struct QrStore {
    dir: PathBuf,
}

impl QrStore {
    /// Cache rooted at `storage_dir`. The directory is created on first save.
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: storage_dir.into(),
        }
    }

    /// Path of the cache file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(QR_FILE_NAME)
    }

    /// Replace the cached code.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::Io`] if the directory or file cannot be written.
    pub async fn save(&self, code: &str) -> Result<(), QrError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| io_error(&self.dir, source))?;
        let path = self.path();
        tokio::fs::write(&path, code)
            .await
            .map_err(|source| io_error(&path, source))
    }

    /// Load the cached code.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::NotFound`] when nothing has been cached yet.
    pub async fn load(&self) -> Result<String, QrError> {
        let path = self.path();
        match tokio::fs::read_to_string(&path).await {
            Ok(code) => Ok(code),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(QrError::NotFound),
            Err(source) => Err(io_error(&path, source)),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> QrError {
    QrError::Io {
        path: path.to_path_buf(),
        source,
    }
}
