// src/archive.rs

//! Handle to the report archive on disk

use crate::error::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// The most current report artifact
///
/// Encryption consumes a handle and returns a new one for the encrypted
/// file, so a stale plaintext path cannot outlive the replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    path: PathBuf,
    digest: Option<String>,
}

impl ArchiveHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            digest: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Digest recorded by the checksum step, if it has run
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub(crate) fn set_digest(&mut self, digest: String) {
        self.digest = Some(digest);
    }

    /// Path, or [`Error::NoArchive`] when none has been set
    pub fn require_path(&self) -> Result<&Path> {
        if self.path.as_os_str().is_empty() {
            Err(Error::NoArchive)
        } else {
            Ok(&self.path)
        }
    }

    /// Open the archive for reading
    pub fn open(&self) -> Result<File> {
        let path = self.require_path()?;
        File::open(path).map_err(|source| Error::Unreadable {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Final path component, used as the remote name on upload
    pub fn file_name(&self) -> Result<String> {
        let path = self.require_path()?;
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or(Error::NoArchive)
    }

    /// Path of a sidecar file: the archive path with `.ext` appended
    pub fn sidecar_path(&self, ext: &str) -> Result<PathBuf> {
        let path = self.require_path()?;
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(ext);
        Ok(PathBuf::from(name))
    }
}
