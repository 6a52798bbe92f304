//! The remote file store seen by the pipeline.
//!
//! Transport and authentication live behind [`RemoteStore`]; the pipeline
//! only lists folder metadata and fetches bytes. [`LocalFolderStore`] serves
//! a directory tree through the same interface.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use cdr_model::{MediaType, RemoteFileMeta};

use crate::checksum::compute_file_sha256;

/// Failures reported by a remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Folder or file does not exist.
    #[error("remote path not found: {0}")]
    NotFound(String),

    /// Local or network I/O failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A call exceeded the store's time bound.
    #[error("timed out after {elapsed_ms} ms: {path}")]
    Timeout { path: String, elapsed_ms: u64 },

    /// The transport failed (connection, auth).
    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    fn from_io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

/// A remote file store.
///
/// Implementations must bound the time spent in each call and report an
/// overrun as [`RemoteError::Timeout`]; the pipeline does not retry.
pub trait RemoteStore: Send + Sync {
    /// Lists file metadata directly under `path` (no recursion, no folders).
    fn list_folder(&self, path: &str) -> Result<Vec<RemoteFileMeta>, RemoteError>;

    /// Fetches the bytes behind a [`RemoteFileMeta::reference`].
    fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>, RemoteError>;
}

/// A [`RemoteStore`] over a local directory tree.
///
/// Folder paths are resolved under `root` (a leading `/` is ignored),
/// fingerprints are SHA-256 of file content, and references are file paths.
#[derive(Debug, Clone)]
pub struct LocalFolderStore {
    root: PathBuf,
}

impl LocalFolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl RemoteStore for LocalFolderStore {
    fn list_folder(&self, path: &str) -> Result<Vec<RemoteFileMeta>, RemoteError> {
        let dir = self.resolve(path);
        let entries = fs::read_dir(&dir).map_err(|e| RemoteError::from_io(path, e))?;

        let mut listing = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RemoteError::from_io(path, e))?;
            let file_path = entry.path();
            if !file_path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let fingerprint = compute_file_sha256(&file_path)
                .map_err(|e| RemoteError::from_io(file_path.display().to_string(), e))?;
            listing.push(RemoteFileMeta::new(
                name.as_str(),
                fingerprint,
                file_path.display().to_string(),
                MediaType::from_name(&name),
            ));
        }
        listing.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(folder = %dir.display(), files = listing.len(), "listed local folder");
        Ok(listing)
    }

    fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>, RemoteError> {
        fs::read(reference).map_err(|e| RemoteError::from_io(reference, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_folder_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("meta")).unwrap();
        fs::write(dir.path().join("b.wav"), b"bbb").unwrap();
        fs::write(dir.path().join("a.wav"), b"aaa").unwrap();
        let store = LocalFolderStore::new(dir.path());

        let listing = store.list_folder("/").unwrap();

        let names: Vec<&str> = listing.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a.wav", "b.wav"]);
        assert!(listing.iter().all(|m| m.media_type == MediaType::Audio));
        assert_eq!(listing[0].fingerprint.len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.csv");
        fs::write(&path, b"filename,date\n").unwrap();
        let store = LocalFolderStore::new(dir.path());
        let before = store.list_folder("").unwrap()[0].fingerprint.clone();

        fs::write(&path, b"filename,date\na.wav,2023-01-01\n").unwrap();
        let after = store.list_folder("").unwrap()[0].fingerprint.clone();

        assert_ne!(before, after);
    }

    #[test]
    fn test_fetch_by_reference() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("calls.csv"), b"payload").unwrap();
        let store = LocalFolderStore::new(dir.path());
        let meta = &store.list_folder("/").unwrap()[0];

        assert_eq!(store.fetch_bytes(&meta.reference).unwrap(), b"payload");
    }

    #[test]
    fn test_missing_folder_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFolderStore::new(dir.path());

        let result = store.list_folder("/missing/");

        assert!(matches!(result, Err(RemoteError::NotFound(_))));
    }
}
