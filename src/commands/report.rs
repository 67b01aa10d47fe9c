// src/commands/report.rs
//! Report naming, finalization and delivery commands

use anyhow::Result;
use sosreport::upload::{self, UploadOutcome, Uploader};
use sosreport::{ArchiveHandle, Config, Error, Finalizer, NamingOptions, NamingOutcome, RhnSystemId, StdinPrompter};
use tracing::info;

use super::open_policy;

/// Work out the archive name for a new report
pub fn cmd_name(config: &Config, name: Option<String>, ticket: Option<String>, batch: bool) -> Result<()> {
    let policy = open_policy(config)?;
    let options = NamingOptions { batch, name, ticket };

    let identity = match policy.name_report(&options, &RhnSystemId::default(), &mut StdinPrompter)? {
        NamingOutcome::Named(identity) => identity,
        NamingOutcome::Cancelled => {
            println!();
            return Ok(());
        }
    };

    info!(
        "Report named '{}' (ticket '{}')",
        identity.report_name, identity.ticket_number
    );
    println!("{}", identity.archive_name_at(chrono::Local::now().naive_local()));
    Ok(())
}

/// Encrypt, checksum, summarize and optionally upload a generated archive
pub fn cmd_finalize(
    config: &Config,
    archive: &str,
    encrypt: bool,
    upload: bool,
    upload_url: Option<&str>,
) -> Result<()> {
    let finalizer = Finalizer::from_config(&config.general);

    let archive = match finalizer.finalize(ArchiveHandle::new(archive), encrypt) {
        Ok(archive) => archive,
        Err(e @ Error::EncryptionFailed { .. }) => {
            eprintln!("There was a problem encrypting your report.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", finalizer.display_summary(&archive)?);

    if upload || upload_url.is_some() {
        deliver(config, &archive, upload_url);
    }

    Ok(())
}

/// Upload an already finalized archive
pub fn cmd_upload(config: &Config, archive: &str, upload_url: Option<&str>) -> Result<()> {
    let archive = ArchiveHandle::new(archive);
    archive.require_path()?;
    deliver(config, &archive, upload_url);
    Ok(())
}

/// Attempt delivery and tell the operator how it went; never fatal
fn deliver(config: &Config, archive: &ArchiveHandle, upload_url: Option<&str>) {
    let uploader = Uploader::default().with_timeout(config.general.upload_timeout());

    match upload::deliver(archive, config.upload_url(upload_url), &uploader) {
        UploadOutcome::Uploaded { url, name } => {
            println!("Your report was successfully uploaded to {} with name:", url);
            println!("  {}", name);
            println!();
            println!("Please communicate this name to your support representative.");
        }
        UploadOutcome::Skipped => {
            println!("No upload URL defined in config file.");
        }
        UploadOutcome::Failed(e) => {
            println!("There was a problem uploading your report: {}", e);
        }
    }
}
