// src/config.rs

//! Configuration file handling
//!
//! The file is TOML with a single `[general]` table. Every key is optional
//! and falls back to a built-in default; a missing file is the same as an
//! empty one.
//!
//! ```toml
//! [general]
//! gpg_keyring = "/usr/share/sos/rhsupport.pub"
//! gpg_recipient = "support@redhat.com"
//! ftp_upload_url = "ftp://dropbox.example.com/incoming"
//! checksum = "md5"
//! ```

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sos/sosreport.toml";

/// Keyring used when none is configured
pub const DEFAULT_GPG_KEYRING: &str = "/usr/share/sos/rhsupport.pub";

/// Encryption recipient used when none is configured
pub const DEFAULT_GPG_RECIPIENT: &str = "support@redhat.com";

/// Encryption tool used when none is configured
pub const DEFAULT_GPG_BINARY: &str = "/usr/bin/gpg";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
}

/// `[general]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Public keyring trusted for report encryption
    #[serde(default = "default_gpg_keyring")]
    pub gpg_keyring: PathBuf,

    /// Address of the encryption recipient
    #[serde(default = "default_gpg_recipient")]
    pub gpg_recipient: String,

    /// Path of the gpg executable
    #[serde(default = "default_gpg_binary")]
    pub gpg_binary: PathBuf,

    /// Default upload endpoint; uploads are skipped when unset
    #[serde(default)]
    pub ftp_upload_url: Option<String>,

    /// Digest written to the checksum sidecar
    #[serde(default)]
    pub checksum: HashAlgorithm,

    /// Time limit for each external command
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Time limit for each upload network operation
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,
}

fn default_gpg_keyring() -> PathBuf {
    PathBuf::from(DEFAULT_GPG_KEYRING)
}

fn default_gpg_recipient() -> String {
    DEFAULT_GPG_RECIPIENT.to_string()
}

fn default_gpg_binary() -> PathBuf {
    PathBuf::from(DEFAULT_GPG_BINARY)
}

fn default_command_timeout() -> u64 {
    300
}

fn default_upload_timeout() -> u64 {
    60
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            gpg_keyring: default_gpg_keyring(),
            gpg_recipient: default_gpg_recipient(),
            gpg_binary: default_gpg_binary(),
            ftp_upload_url: None,
            checksum: HashAlgorithm::default(),
            command_timeout_secs: default_command_timeout(),
            upload_timeout_secs: default_upload_timeout(),
        }
    }
}

impl GeneralConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Load configuration from a file
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            Error::ConfigError(msg) => Error::ConfigError(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the upload URL: explicit override first, then the configured default
    pub fn upload_url<'a>(&'a self, override_url: Option<&'a str>) -> Option<&'a str> {
        override_url
            .filter(|url| !url.is_empty())
            .or(self.general.ftp_upload_url.as_deref())
    }
}
