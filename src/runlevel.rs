// src/runlevel.rs

//! SysV runlevel queries
//!
//! - [`runlevels_by_service`] asks `chkconfig --list <service>` which
//!   runlevels a service is enabled in
//! - [`default_runlevel`] reads the `initdefault` record from inittab

use crate::process;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Runlevel assumed when inittab is missing or has no initdefault record
pub const FALLBACK_RUNLEVEL: u32 = 3;

/// Default inittab location
pub const INITTAB_PATH: &str = "/etc/inittab";

/// Default chkconfig location
pub const CHKCONFIG_PATH: &str = "/sbin/chkconfig";

static INITDEFAULT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id:(\d):initdefault:").expect("valid initdefault regex"));

/// Parse one `chkconfig --list` line into the set of runlevels marked "on"
///
/// The first token is the service name; every later `level:state` token
/// with state `on` contributes its level.
pub fn parse_chkconfig_listing(output: &str) -> BTreeSet<u32> {
    output
        .split_whitespace()
        .skip(1)
        .filter_map(|token| token.split_once(':'))
        .filter(|(_, state)| *state == "on")
        .filter_map(|(level, _)| level.parse().ok())
        .collect()
}

/// Runlevels in which `service` is enabled; empty on any error
pub fn runlevels_by_service(service: &str, timeout: Duration) -> BTreeSet<u32> {
    runlevels_by_service_with(Path::new(CHKCONFIG_PATH), service, timeout)
}

/// Same as [`runlevels_by_service`] with an explicit chkconfig binary
pub fn runlevels_by_service_with(chkconfig: &Path, service: &str, timeout: Duration) -> BTreeSet<u32> {
    let result = process::run_command(
        Command::new(chkconfig)
            .env("LC_ALL", "C")
            .args(["--list", service]),
        timeout,
    );

    match result {
        Ok(output) if output.stderr.is_empty() => {
            let levels = parse_chkconfig_listing(&output.stdout);
            debug!("Service {} enabled in runlevels {:?}", service, levels);
            levels
        }
        Ok(output) => {
            debug!("chkconfig reported for {}: {}", service, output.stderr.trim());
            BTreeSet::new()
        }
        Err(e) => {
            warn!("Runlevel query for {} failed: {}", service, e);
            BTreeSet::new()
        }
    }
}

/// Extract the default runlevel from inittab text
pub fn parse_initdefault(text: &str) -> Option<u32> {
    INITDEFAULT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Default runlevel from an inittab file, or [`FALLBACK_RUNLEVEL`]
pub fn default_runlevel(inittab: &Path) -> u32 {
    match std::fs::read_to_string(inittab) {
        Ok(text) => parse_initdefault(&text).unwrap_or(FALLBACK_RUNLEVEL),
        Err(e) => {
            debug!("Cannot read {}: {}", inittab.display(), e);
            FALLBACK_RUNLEVEL
        }
    }
}

/// The system inittab path
pub fn inittab_path() -> PathBuf {
    PathBuf::from(INITTAB_PATH)
}
