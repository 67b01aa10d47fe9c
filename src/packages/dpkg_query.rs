// src/packages/dpkg_query.rs

//! Query installed dpkg packages from the system database
//!
//! Uses the `dpkg-query` command-line tool. Debian file names are
//! underscore-delimited (`name_version-revision_arch`), so this variant
//! overrides specifier decomposition for that form.

use super::{Nvra, PackageManager, PackageRecord, decompose_nvra, parse_listing};
use crate::error::{Error, Result};
use crate::process::{self, DEFAULT_TIMEOUT};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tracing::debug;

/// Show format producing one `name|version` line per package
pub const SHOW_FORMAT: &str = "${Package}|${Version}\n";

/// dpkg-backed package manager
#[derive(Debug, Clone)]
pub struct DpkgPackageManager {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for DpkgPackageManager {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("dpkg-query"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl DpkgPackageManager {
    /// Use a specific dpkg-query binary
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl PackageManager for DpkgPackageManager {
    fn name(&self) -> &'static str {
        "dpkg"
    }

    fn query_all(&self) -> Result<Vec<PackageRecord>> {
        debug!("Querying all installed dpkg packages");

        let output = process::run_command(
            Command::new(&self.binary).args(["-W", "-f", SHOW_FORMAT]),
            self.timeout,
        )?;

        if !output.success() {
            return Err(Error::CommandFailed(format!(
                "dpkg-query failed: {}",
                output.stderr.trim()
            )));
        }

        let packages = parse_listing(&output.stdout, '|');
        debug!("Queried {} installed packages", packages.len());
        Ok(packages)
    }

    fn decompose(&self, specifier: &str) -> Result<Nvra> {
        let fields: Vec<&str> = specifier.split('_').collect();
        if fields.len() != 3 {
            return decompose_nvra(specifier);
        }

        // Debian revision follows the last hyphen of the version, if any
        let (version, release) = match fields[1].rsplit_once('-') {
            Some((upstream, revision)) => (upstream, revision),
            None => (fields[1], ""),
        };

        if fields[0].is_empty() || version.is_empty() || fields[2].is_empty() {
            return Err(Error::MalformedSpecifier(specifier.to_string()));
        }

        Ok(Nvra {
            name: fields[0].to_string(),
            version: version.to_string(),
            release: release.to_string(),
            arch: fields[2].to_string(),
        })
    }
}

/// Check if dpkg-query is available on this system
pub fn is_dpkg_available() -> bool {
    which::which("dpkg-query").is_ok()
}
