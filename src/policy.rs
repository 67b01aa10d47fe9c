// src/policy.rs

//! Platform policy for Red Hat family hosts
//!
//! Ties together host facts, the package inventory and report naming, and
//! answers the questions the collection layer asks before it runs: is this
//! platform applicable, which plugins may run, which release is installed.

use crate::error::Result;
use crate::host::HostFacts;
use crate::identity::{self, AccountLookup, NamingOptions, NamingOutcome, Prompter};
use crate::packages::{PackageIndex, PackageManager, PackageRecord, RegexFlags};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File whose presence marks a Red Hat family system
pub const RELEASE_FILE: &str = "/etc/redhat-release";

/// Package carrying the distribution release
pub const RELEASE_PACKAGE: &str = "redhat-release";

/// Distribution family a collection plugin is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    RedHat,
    Debian,
    Ubuntu,
    /// Runs on any platform
    Independent,
}

/// Red Hat platform policy
pub struct Policy {
    host: HostFacts,
    packages: PackageIndex,
    release_file: PathBuf,
}

impl Policy {
    /// Create a policy; host facts are captured once here
    pub fn new(host: HostFacts, manager: Box<dyn PackageManager>) -> Self {
        Self {
            host,
            packages: PackageIndex::new(manager),
            release_file: PathBuf::from(RELEASE_FILE),
        }
    }

    /// Check a different release marker file
    pub fn with_release_file(mut self, path: impl AsRef<Path>) -> Self {
        self.release_file = path.as_ref().to_path_buf();
        self
    }

    /// Whether this policy applies to the running system
    pub fn check(&self) -> bool {
        self.release_file.is_file()
    }

    /// Whether a plugin for the given family may run under this policy
    pub fn validate_plugin(&self, kind: PluginKind) -> bool {
        matches!(kind, PluginKind::RedHat | PluginKind::Independent)
    }

    pub fn host(&self) -> &HostFacts {
        &self.host
    }

    pub fn hostname(&self) -> &str {
        self.host.hostname()
    }

    pub fn kernel_version(&self) -> &str {
        self.host.kernel_release()
    }

    pub fn is_kernel_smp(&self) -> bool {
        self.host.is_smp()
    }

    pub fn arch(&self) -> &str {
        self.host.machine_arch()
    }

    pub fn packages(&self) -> &PackageIndex {
        &self.packages
    }

    pub fn packages_mut(&mut self) -> &mut PackageIndex {
        &mut self.packages
    }

    pub fn package_by_name(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.find_by_exact_name(name)
    }

    /// Major release of the installed distribution, if known
    ///
    /// Taken from the `redhat-release` package, or the last package whose
    /// name starts with `redhat-release-` (e.g. `redhat-release-server`).
    pub fn distro_version(&self) -> Option<u32> {
        let record = match self.packages.find_by_exact_name(RELEASE_PACKAGE) {
            Some(record) => record,
            None => {
                let names = self
                    .packages
                    .find_by_regex("redhat-release-.*", RegexFlags::default())
                    .ok()?;
                self.packages.find_by_exact_name(names.last()?)?
            }
        };

        let version = parse_major_release(&record.version);
        debug!("{} {} -> major release {:?}", record.name, record.version, version);
        version
    }

    /// Run naming pre-work for this host
    pub fn name_report(
        &self,
        options: &NamingOptions,
        account: &dyn AccountLookup,
        prompter: &mut dyn Prompter,
    ) -> Result<NamingOutcome> {
        identity::name_report(options, account, self.hostname(), prompter)
    }
}

/// Leading major number of a release package version
///
/// Handles the RHEL 5 style `5Server` / `5Client` as well as `7.9`, `9.3`.
pub fn parse_major_release(version: &str) -> Option<u32> {
    let digits: String = version.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::tests::ScriptedPrompter;
    use crate::identity::{NoAccount, ReportIdentity};
    use crate::packages::tests::StaticPackageManager;
    use tempfile::TempDir;

    fn policy(listing: &str) -> Policy {
        Policy::new(
            HostFacts::new("web01", "5.14.0-362.el9.x86_64", "#1 SMP PREEMPT_DYNAMIC", "x86_64"),
            Box::new(StaticPackageManager::new(listing)),
        )
    }

    #[test]
    fn test_check_release_file() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("redhat-release");

        let p = policy("").with_release_file(&marker);
        assert!(!p.check());

        std::fs::write(&marker, "Red Hat Enterprise Linux release 9.3 (Plow)\n").unwrap();
        assert!(p.check());
    }

    #[test]
    fn test_validate_plugin() {
        let p = policy("");
        assert!(p.validate_plugin(PluginKind::RedHat));
        assert!(p.validate_plugin(PluginKind::Independent));
        assert!(!p.validate_plugin(PluginKind::Debian));
        assert!(!p.validate_plugin(PluginKind::Ubuntu));
    }

    #[test]
    fn test_host_accessors() {
        let p = policy("");
        assert_eq!(p.hostname(), "web01");
        assert_eq!(p.kernel_version(), "5.14.0-362.el9.x86_64");
        assert!(p.is_kernel_smp());
        assert_eq!(p.arch(), "x86_64");
    }

    #[test]
    fn test_parse_major_release() {
        assert_eq!(parse_major_release("4AS"), Some(4));
        assert_eq!(parse_major_release("5Server"), Some(5));
        assert_eq!(parse_major_release("5Client"), Some(5));
        assert_eq!(parse_major_release("6Workstation"), Some(6));
        assert_eq!(parse_major_release("9.3"), Some(9));
        assert_eq!(parse_major_release("Server"), None);
    }

    #[test]
    fn test_distro_version_exact_package() {
        assert_eq!(policy("redhat-release|9.3\nbash|5.1\n").distro_version(), Some(9));
    }

    #[test]
    fn test_distro_version_variant_package() {
        let p = policy("redhat-release-client|5Client\nredhat-release-server|6Server\n");
        assert_eq!(p.distro_version(), Some(6));
    }

    #[test]
    fn test_distro_version_unknown() {
        assert_eq!(policy("bash|5.1\n").distro_version(), None);
        let failing = Policy::new(
            HostFacts::new("h", "r", "v", "m"),
            Box::new(StaticPackageManager::failing()),
        );
        assert_eq!(failing.distro_version(), None);
    }

    #[test]
    fn test_package_by_name() {
        let p = policy("bash|5.1.8\n");
        assert_eq!(p.package_by_name("bash").unwrap().version, "5.1.8");
        assert!(p.package_by_name("zsh").is_none());
    }

    #[test]
    fn test_name_report_uses_hostname() {
        let options = NamingOptions {
            batch: true,
            ticket: Some("00219".to_string()),
            ..NamingOptions::default()
        };
        let outcome = policy("")
            .name_report(&options, &NoAccount, &mut ScriptedPrompter::answers(&[]))
            .unwrap();
        assert_eq!(
            outcome,
            NamingOutcome::Named(ReportIdentity {
                report_name: "web01".to_string(),
                ticket_number: "00219".to_string(),
            })
        );
    }
}
