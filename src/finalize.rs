// src/finalize.rs

//! Report finalization: checksum sidecar and optional encryption
//!
//! The terminal sequence on a finished archive is:
//!
//! 1. [`Finalizer::encrypt`] (only when requested) replaces the archive with
//!    `<archive>.gpg` and deletes the plaintext
//! 2. [`Finalizer::checksum`] digests the current artifact and writes
//!    `<archive>.<algorithm>` containing the hex digest and a newline
//! 3. [`Finalizer::display_summary`] reports path and digest to the operator
//!
//! Encryption failure is an error the caller must treat as fatal: a report
//! for which encryption was requested is never delivered unencrypted.

use crate::archive::ArchiveHandle;
use crate::config::GeneralConfig;
use crate::error::{Error, Result};
use crate::hash::{self, HashAlgorithm};
use crate::process::{self, DEFAULT_TIMEOUT};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settings for the external encryption tool
#[derive(Debug, Clone)]
pub struct EncryptionSettings {
    pub binary: PathBuf,
    pub keyring: PathBuf,
    pub recipient: String,
}

impl EncryptionSettings {
    /// Build the gpg invocation encrypting `input` to `output`
    pub fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--trust-model", "always", "--batch", "--keyring"])
            .arg(&self.keyring)
            .args(["--no-default-keyring", "--compress-level", "0", "--encrypt", "--recipient"])
            .arg(&self.recipient)
            .arg("--output")
            .arg(output)
            .arg(input);
        cmd
    }
}

/// Checksum and encryption of a finished archive
#[derive(Debug, Clone)]
pub struct Finalizer {
    algorithm: HashAlgorithm,
    encryption: EncryptionSettings,
    timeout: Duration,
}

impl Finalizer {
    pub fn new(algorithm: HashAlgorithm, encryption: EncryptionSettings) -> Self {
        Self {
            algorithm,
            encryption,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build from the `[general]` configuration section
    pub fn from_config(config: &GeneralConfig) -> Self {
        Self::new(
            config.checksum,
            EncryptionSettings {
                binary: config.gpg_binary.clone(),
                keyring: config.gpg_keyring.clone(),
                recipient: config.gpg_recipient.clone(),
            },
        )
        .with_timeout(config.command_timeout())
    }

    /// Set custom timeout for the encryption tool
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest the archive and write the sidecar file
    ///
    /// Returns the hex digest and records it on the handle. I/O failures
    /// are propagated; the checksum is evidence the operator relies on.
    pub fn checksum(&self, archive: &mut ArchiveHandle) -> Result<String> {
        let mut file = archive.open()?;
        let digest = hash::hash_reader(self.algorithm, &mut file)?.value;
        drop(file);

        let sidecar = archive.sidecar_path(self.algorithm.sidecar_extension())?;
        fs::write(&sidecar, format!("{}\n", digest))?;
        debug!("Wrote {} sidecar {}", self.algorithm, sidecar.display());

        archive.set_digest(digest.clone());
        Ok(digest)
    }

    /// Path of the sidecar file for an archive
    pub fn sidecar_path(&self, archive: &ArchiveHandle) -> Result<PathBuf> {
        archive.sidecar_path(self.algorithm.sidecar_extension())
    }

    /// Read back a sidecar digest
    pub fn read_sidecar(&self, archive: &ArchiveHandle) -> Result<String> {
        let sidecar = self.sidecar_path(archive)?;
        let content = fs::read_to_string(&sidecar)?;
        let digest = content.trim_end_matches('\n');
        hash::Hash::new(self.algorithm, digest)
            .map(|h| h.value)
            .map_err(|e| Error::ParseError(format!("{}: {}", sidecar.display(), e)))
    }

    /// Encrypt the archive to `<archive>.gpg`
    ///
    /// On success the plaintext file is removed and a handle to the
    /// encrypted file is returned. On failure the plaintext is left in place
    /// and [`Error::EncryptionFailed`] is returned.
    pub fn encrypt(&self, archive: ArchiveHandle) -> Result<ArchiveHandle> {
        let input = archive.require_path()?.to_path_buf();
        let output = archive.sidecar_path("gpg")?;

        info!(
            "Encrypting {} for {} using keyring {}",
            input.display(),
            self.encryption.recipient,
            self.encryption.keyring.display()
        );

        let result = process::run_command(&mut self.encryption.command(&input, &output), self.timeout);
        let reason = match result {
            Ok(out) if out.success() && output.exists() => None,
            Ok(out) if out.success() => Some(format!(
                "gpg reported success but {} is missing",
                output.display()
            )),
            Ok(out) => {
                warn!("gpg exited with {}: {}", out.code(), out.stderr.trim());
                Some(format!(
                    "gpg exited with status {}: {}",
                    out.code(),
                    out.stderr.trim()
                ))
            }
            Err(e) => Some(e.to_string()),
        };

        if let Some(reason) = reason {
            remove_partial_output(&output);
            return Err(Error::EncryptionFailed { path: input, reason });
        }

        fs::remove_file(&input)?;
        debug!("Removed plaintext archive {}", input.display());

        Ok(ArchiveHandle::new(output))
    }

    /// Operator-facing summary; the checksum must already have run
    pub fn display_summary(&self, archive: &ArchiveHandle) -> Result<Summary> {
        let path = archive.require_path()?.to_path_buf();
        Ok(Summary {
            path,
            algorithm: self.algorithm,
            digest: archive.digest().map(str::to_string),
        })
    }

    /// Encrypt (if requested), then checksum
    pub fn finalize(&self, archive: ArchiveHandle, encrypt: bool) -> Result<ArchiveHandle> {
        let mut archive = if encrypt { self.encrypt(archive)? } else { archive };
        self.checksum(&mut archive)?;
        Ok(archive)
    }
}

/// Never leave a partial ciphertext next to the plaintext
fn remove_partial_output(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => debug!("Removed partial output {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", output.display(), e),
    }
}

/// What the operator is told about the finished report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub path: PathBuf,
    pub algorithm: HashAlgorithm,
    pub digest: Option<String>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Your sosreport has been generated and saved in:")?;
        writeln!(f, "  {}", self.path.display())?;
        writeln!(f)?;
        if let Some(digest) = &self.digest {
            writeln!(f, "The {}sum is: {}", self.algorithm, digest)?;
            writeln!(f)?;
        }
        write!(f, "Please send this file to your support representative.")
    }
}
