// src/upload/mod.rs

//! Report delivery to a remote drop box
//!
//! Only `ftp://[user[:pass]@]host[:port]/path` endpoints are accepted.
//! Upload failures are never fatal: the finalized archive on local disk
//! remains the deliverable, so [`deliver`] folds every failure into an
//! [`UploadOutcome`] for the caller to report.

pub mod ftp;

use crate::archive::ArchiveHandle;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// The only accepted upload scheme
pub const SUPPORTED_SCHEME: &str = "ftp";

/// Default time limit for each network operation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Parsed upload endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub scheme: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl UploadTarget {
    /// Parse an upload URL; anything other than `ftp` is rejected
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input).map_err(|e| Error::InvalidUrl(format!("{}: {}", input, e)))?;

        if url.scheme() != SUPPORTED_SCHEME {
            return Err(Error::UnsupportedScheme(input.to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidUrl(format!("{}: missing host", input)))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        let username = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(decode)
            .transpose()?;
        let password = url.password().map(decode).transpose()?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            username,
            password,
            host,
            port: url.port().unwrap_or(ftp::DEFAULT_PORT),
            path: decode(url.path())?,
        })
    }

    /// Whether the URL carries a full user and password pair
    ///
    /// Anything less means an anonymous login.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

fn decode(component: &str) -> Result<String> {
    urlencoding::decode(component)
        .map(|s| s.into_owned())
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", component, e)))
}

/// Streams an archive to an FTP endpoint
#[derive(Debug, Clone)]
pub struct Uploader {
    timeout: Duration,
}

impl Default for Uploader {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Uploader {
    /// Set custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upload the archive under its base file name
    ///
    /// Returns the remote file name. The archive is only ever read.
    pub fn upload(&self, archive: &ArchiveHandle, target: &UploadTarget) -> Result<String> {
        let mut file = archive.open()?;
        let upload_name = archive.file_name()?;

        info!(
            "Uploading {} to {}:{}{}",
            upload_name, target.host, target.port, target.path
        );

        let mut session = ftp::FtpSession::connect(&target.host, target.port, self.timeout)?;
        session.login(target.username.as_deref(), target.password.as_deref())?;
        if !target.path.is_empty() {
            session.cwd(&target.path)?;
        }
        session.store(&upload_name, &mut file)?;
        session.quit()?;

        Ok(upload_name)
    }
}

/// Result of a delivery attempt
#[derive(Debug)]
pub enum UploadOutcome {
    /// Stored remotely under `name`
    Uploaded { url: String, name: String },
    /// No upload URL was configured or supplied
    Skipped,
    /// The attempt failed; the local archive is still valid
    Failed(Error),
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}

/// Resolve, validate and perform an upload, never failing hard
///
/// The archive must be readable and the URL acceptable before any network
/// connection is attempted.
pub fn deliver(archive: &ArchiveHandle, url: Option<&str>, uploader: &Uploader) -> UploadOutcome {
    if let Err(e) = archive.open() {
        warn!("Not uploading: {}", e);
        return UploadOutcome::Failed(e);
    }

    let Some(url) = url else {
        info!("No upload URL defined, skipping upload");
        return UploadOutcome::Skipped;
    };

    let target = match UploadTarget::parse(url) {
        Ok(target) => target,
        Err(e) => {
            warn!("Rejected upload URL: {}", e);
            return UploadOutcome::Failed(e);
        }
    };

    match uploader.upload(archive, &target) {
        Ok(name) => UploadOutcome::Uploaded {
            url: url.to_string(),
            name,
        },
        Err(e) => {
            warn!("Upload to {} failed: {}", target.host, e);
            UploadOutcome::Failed(e)
        }
    }
}
