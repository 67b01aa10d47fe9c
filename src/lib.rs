// src/lib.rs

//! sosreport report finalization
//!
//! Platform policy for naming, checksumming, encrypting and delivering a
//! generated support report, plus the installed-package inventory used to
//! inspect the host.
//!
//! # Architecture
//!
//! - Capabilities at the seams: package managers, prompts and remote
//!   account lookup are traits, so hosts and tests can substitute them
//! - Every external tool runs with a bounded timeout
//! - Fatal outcomes (operator cancel, encryption failure) are values the
//!   caller turns into exit statuses; the library never exits the process

pub mod archive;
pub mod config;
mod error;
pub mod finalize;
pub mod hash;
pub mod host;
pub mod identity;
pub mod packages;
pub mod policy;
pub mod process;
pub mod runlevel;
pub mod upload;

pub use archive::ArchiveHandle;
pub use config::Config;
pub use error::{Error, Result};
pub use finalize::{EncryptionSettings, Finalizer, Summary};
pub use hash::{Hash, HashAlgorithm, Hasher};
pub use host::HostFacts;
pub use identity::{
    AccountLookup, NamingOptions, NamingOutcome, NoAccount, PromptReply, Prompter, ReportIdentity,
    ReportNamer, RhnSystemId, StdinPrompter,
};
pub use packages::{Nvra, PackageIndex, PackageManager, PackageRecord, RegexFlags};
pub use policy::{PluginKind, Policy};
pub use upload::{UploadOutcome, UploadTarget, Uploader};
