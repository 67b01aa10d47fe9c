// src/host.rs

//! Static host facts captured once from `uname(2)`

use crate::error::Result;
use nix::sys::utsname::uname;
use tracing::debug;

/// Marker in the kernel version string identifying an SMP build
const SMP_MARKER: &str = "SMP";

/// Host identification, immutable after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    hostname: String,
    kernel_release: String,
    is_smp: bool,
    machine_arch: String,
}

impl HostFacts {
    /// Build facts from raw uname fields
    ///
    /// `kernel_version` is the full version string, e.g.
    /// `#1 SMP PREEMPT_DYNAMIC Fri Oct 6 ...`; the kernel is SMP when its
    /// second whitespace-separated token is `SMP`.
    pub fn new(hostname: &str, kernel_release: &str, kernel_version: &str, machine_arch: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            kernel_release: kernel_release.to_string(),
            is_smp: kernel_version.split_whitespace().nth(1) == Some(SMP_MARKER),
            machine_arch: machine_arch.to_string(),
        }
    }

    /// Capture facts for the running host
    pub fn detect() -> Result<Self> {
        let uts = uname().map_err(std::io::Error::from)?;
        let facts = Self::new(
            &uts.nodename().to_string_lossy(),
            &uts.release().to_string_lossy(),
            &uts.version().to_string_lossy(),
            &uts.machine().to_string_lossy(),
        );
        debug!(
            "Host {} kernel {} ({}, smp={})",
            facts.hostname, facts.kernel_release, facts.machine_arch, facts.is_smp
        );
        Ok(facts)
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn kernel_release(&self) -> &str {
        &self.kernel_release
    }

    pub fn is_smp(&self) -> bool {
        self.is_smp
    }

    pub fn machine_arch(&self) -> &str {
        &self.machine_arch
    }
}
