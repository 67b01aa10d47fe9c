// src/cli.rs
//! CLI definitions for sosreport
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "sosreport")]
#[command(author = "sosreport Contributors")]
#[command(version)]
#[command(about = "Name, checksum, encrypt and deliver support reports", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = sosreport::config::DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Work out the archive name for a new report
    Name {
        /// Report name (letters, digits and periods are kept)
        #[arg(long)]
        name: Option<String>,

        /// Support case number (digits are kept)
        #[arg(long)]
        ticket: Option<String>,

        /// Do not prompt; use overrides or the derived name
        #[arg(long)]
        batch: bool,
    },

    /// Finalize a generated archive: encrypt, checksum, summarize, upload
    Finalize {
        /// Path to the generated archive
        archive: String,

        /// Encrypt the archive with gpg before delivery
        #[arg(long)]
        encrypt: bool,

        /// Upload the archive after finalizing
        #[arg(long)]
        upload: bool,

        /// Upload URL (overrides the configured ftp_upload_url; implies --upload)
        #[arg(long)]
        upload_url: Option<String>,
    },

    /// Upload an already finalized archive
    Upload {
        /// Path to the archive
        archive: String,

        /// Upload URL (overrides the configured ftp_upload_url)
        #[arg(long)]
        upload_url: Option<String>,
    },

    /// List installed packages, optionally filtered
    Packages {
        /// Shell glob (or regex with --regex) matched against package names
        pattern: Option<String>,

        /// Treat the pattern as a regular expression anchored at the start
        #[arg(long)]
        regex: bool,

        /// Case-insensitive regex matching
        #[arg(short, long, requires = "regex")]
        ignore_case: bool,
    },

    /// Split a package specifier into name, version, release and arch
    Nvra {
        /// Package specifier, e.g. foo-bar-1.2-3.el7.x86_64
        specifier: String,
    },

    /// Show host facts and platform information
    Host,

    /// Show the runlevels a service is enabled in
    Runlevel {
        /// Service name
        service: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}
