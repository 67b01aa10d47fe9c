// src/error.rs

//! Error types for report finalization and package queries

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the sosreport library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An external command could not be started or exited unsuccessfully
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// An external command exceeded its time limit and was killed
    #[error("Command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// Package specifier has fewer than four hyphen-separated fields
    #[error("Malformed package specifier: {0}")]
    MalformedSpecifier(String),

    /// Glob or regex pattern failed to compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// No archive path has been set
    #[error("No archive has been produced")]
    NoArchive,

    /// Archive exists but cannot be opened for reading
    #[error("Cannot read archive {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upload URL uses a scheme other than ftp
    #[error("Cannot upload to '{0}': only ftp:// URLs are supported")]
    UnsupportedScheme(String),

    /// Upload URL could not be parsed
    #[error("Invalid upload URL: {0}")]
    InvalidUrl(String),

    /// The encryption tool exited with a nonzero status
    #[error("Encryption of {path} failed: {reason}")]
    EncryptionFailed { path: PathBuf, reason: String },

    /// FTP protocol or transfer error
    #[error("FTP error: {0}")]
    Ftp(String),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Unexpected output from an external tool or data file
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
