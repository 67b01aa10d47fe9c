// src/packages/mod.rs

//! Installed-package inventory
//!
//! A [`PackageManager`] is a capability that lists every installed package
//! in one batch call. [`PackageIndex`] wraps one, builds the name → version
//! map lazily on first use and answers exact, glob and regex lookups from
//! the cached copy. The cache is owned by the index, not global, and is only
//! rebuilt through [`PackageIndex::invalidate`].

pub mod dpkg_query;
pub mod rpm_query;

use crate::error::{Error, Result};
use regex::RegexBuilder;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

pub use dpkg_query::DpkgPackageManager;
pub use rpm_query::RpmPackageManager;

/// An installed package as reported by the package manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
}

/// Name-Version-Release-Arch decomposition of a package specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nvra {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

/// Split `name-version-release-arch` from the right
///
/// The name itself may contain hyphens; only the last three fields are
/// taken as version, release and arch.
pub fn decompose_nvra(specifier: &str) -> Result<Nvra> {
    let fields: Vec<&str> = specifier.split('-').collect();
    if fields.len() < 4 {
        return Err(Error::MalformedSpecifier(specifier.to_string()));
    }

    let split = fields.len() - 3;
    Ok(Nvra {
        name: fields[..split].join("-"),
        version: fields[split].to_string(),
        release: fields[split + 1].to_string(),
        arch: fields[split + 2].to_string(),
    })
}

/// Parse `name<delim>version` lines into records
///
/// Lines without the delimiter are skipped with a warning. Order is
/// preserved, so a later duplicate wins once inserted into a map.
pub fn parse_listing(output: &str, delimiter: char) -> Vec<PackageRecord> {
    let mut records = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(delimiter) {
            Some((name, version)) if !name.is_empty() => records.push(PackageRecord {
                name: name.to_string(),
                version: version.to_string(),
            }),
            _ => warn!("Skipping malformed package listing line: {}", line),
        }
    }

    records
}

/// Capability interface over a host package system
pub trait PackageManager: Send + Sync {
    /// Short identifier, e.g. "rpm"
    fn name(&self) -> &'static str;

    /// List every installed package in one batch call
    fn query_all(&self) -> Result<Vec<PackageRecord>>;

    /// Decompose a package specifier into its NVRA fields
    fn decompose(&self, specifier: &str) -> Result<Nvra> {
        decompose_nvra(specifier)
    }
}

/// Flags accepted by [`PackageIndex::find_by_regex`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
    pub ignore_whitespace: bool,
}

/// Lazily-built, explicitly invalidated inventory of installed packages
pub struct PackageIndex {
    manager: Box<dyn PackageManager>,
    cache: OnceLock<BTreeMap<String, PackageRecord>>,
}

impl PackageIndex {
    /// Create an index over the given package manager; nothing is queried yet
    pub fn new(manager: Box<dyn PackageManager>) -> Self {
        Self {
            manager,
            cache: OnceLock::new(),
        }
    }

    /// Name of the underlying package manager
    pub fn manager_name(&self) -> &'static str {
        self.manager.name()
    }

    /// Whether the inventory has been built
    pub fn is_built(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Full inventory keyed by name, built on first call
    ///
    /// A failing package manager yields an empty inventory; lookups then
    /// report "not found" rather than an error.
    pub fn query_all(&self) -> &BTreeMap<String, PackageRecord> {
        self.cache.get_or_init(|| {
            debug!("Building package index via {}", self.manager.name());
            match self.manager.query_all() {
                Ok(records) => {
                    let mut index = BTreeMap::new();
                    for record in records {
                        index.insert(record.name.clone(), record);
                    }
                    debug!("Indexed {} installed packages", index.len());
                    index
                }
                Err(e) => {
                    warn!(
                        "Package query via {} failed, continuing with empty inventory: {}",
                        self.manager.name(),
                        e
                    );
                    BTreeMap::new()
                }
            }
        })
    }

    /// Drop the cached inventory so the next query rebuilds it
    pub fn invalidate(&mut self) {
        self.cache.take();
    }

    /// Look up a package by exact name
    pub fn find_by_exact_name(&self, name: &str) -> Option<&PackageRecord> {
        self.query_all().get(name)
    }

    /// Names matching a shell glob, in sorted order
    pub fn find_by_glob(&self, pattern: &str) -> Result<Vec<String>> {
        let glob = glob::Pattern::new(pattern).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(self
            .query_all()
            .keys()
            .filter(|name| glob.matches(name))
            .cloned()
            .collect())
    }

    /// Names matching a regex anchored at the start of the name, in sorted order
    pub fn find_by_regex(&self, pattern: &str, flags: RegexFlags) -> Result<Vec<String>> {
        let re = RegexBuilder::new(&format!("^(?:{})", pattern))
            .case_insensitive(flags.case_insensitive)
            .multi_line(flags.multi_line)
            .dot_matches_new_line(flags.dot_matches_new_line)
            .ignore_whitespace(flags.ignore_whitespace)
            .build()
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        Ok(self
            .query_all()
            .keys()
            .filter(|name| re.is_match(name))
            .cloned()
            .collect())
    }

    /// Decompose a specifier using the underlying package manager's rules
    pub fn decompose(&self, specifier: &str) -> Result<Nvra> {
        self.manager.decompose(specifier)
    }
}

/// Pick the first package manager available on this host
pub fn detect(timeout: Duration) -> Option<Box<dyn PackageManager>> {
    if rpm_query::is_rpm_available() {
        debug!("Detected rpm package manager");
        return Some(Box::new(RpmPackageManager::default().with_timeout(timeout)));
    }
    if dpkg_query::is_dpkg_available() {
        debug!("Detected dpkg package manager");
        return Some(Box::new(DpkgPackageManager::default().with_timeout(timeout)));
    }
    None
}
