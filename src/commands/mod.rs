// src/commands/mod.rs
//! Command handlers for the sosreport CLI

mod query;
mod report;
mod system;

pub use query::{cmd_nvra, cmd_packages};
pub use report::{cmd_finalize, cmd_name, cmd_upload};
pub use system::{cmd_host, cmd_runlevel};

use anyhow::Result;
use sosreport::packages::{self, RpmPackageManager};
use sosreport::{Config, HostFacts, PackageManager, Policy};
use std::path::Path;
use tracing::warn;

/// Load configuration; an absent file means defaults
pub fn load_config(path: &str) -> Result<Config> {
    Ok(Config::load(Path::new(path))?)
}

/// Build the platform policy for the running host
fn open_policy(config: &Config) -> Result<Policy> {
    let host = HostFacts::detect()?;
    let timeout = config.general.command_timeout();

    let manager: Box<dyn PackageManager> = match packages::detect(timeout) {
        Some(manager) => manager,
        None => {
            warn!("No supported package manager found; package queries will be empty");
            Box::new(RpmPackageManager::default().with_timeout(timeout))
        }
    };

    Ok(Policy::new(host, manager))
}
