// src/packages/rpm_query.rs

//! Query installed RPM packages from the system database
//!
//! Uses the `rpm` command-line tool with a `NAME|VERSION` query format so
//! the whole inventory comes back in a single call.

use super::{PackageManager, PackageRecord, parse_listing};
use crate::error::{Error, Result};
use crate::process::{self, DEFAULT_TIMEOUT};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tracing::debug;

/// Query format producing one `name|version` line per package
pub const QUERY_FORMAT: &str = "%{NAME}|%{VERSION}\\n";

/// RPM-backed package manager
#[derive(Debug, Clone)]
pub struct RpmPackageManager {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for RpmPackageManager {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("rpm"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RpmPackageManager {
    /// Use a specific rpm binary
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

impl PackageManager for RpmPackageManager {
    fn name(&self) -> &'static str {
        "rpm"
    }

    fn query_all(&self) -> Result<Vec<PackageRecord>> {
        debug!("Querying all installed RPM packages");

        let output = process::run_command(
            Command::new(&self.binary).args(["-qa", "--queryformat", QUERY_FORMAT]),
            self.timeout,
        )?;

        if !output.success() {
            return Err(Error::CommandFailed(format!(
                "rpm -qa failed: {}",
                output.stderr.trim()
            )));
        }

        let packages = parse_listing(&output.stdout, '|');
        debug!("Queried {} installed packages", packages.len());
        Ok(packages)
    }
}

/// Check if RPM is available on this system
pub fn is_rpm_available() -> bool {
    which::which("rpm").is_ok()
}
