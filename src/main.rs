// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::io;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise warnings only, or debug with --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "sosreport", &mut io::stdout());
        return Ok(());
    }

    let config = commands::load_config(&cli.config)?;

    match cli.command {
        Commands::Name { name, ticket, batch } => commands::cmd_name(&config, name, ticket, batch),
        Commands::Finalize {
            archive,
            encrypt,
            upload,
            upload_url,
        } => commands::cmd_finalize(&config, &archive, encrypt, upload, upload_url.as_deref()),
        Commands::Upload { archive, upload_url } => {
            commands::cmd_upload(&config, &archive, upload_url.as_deref())
        }
        Commands::Packages {
            pattern,
            regex,
            ignore_case,
        } => commands::cmd_packages(&config, pattern.as_deref(), regex, ignore_case),
        Commands::Nvra { specifier } => commands::cmd_nvra(&config, &specifier),
        Commands::Host => commands::cmd_host(&config),
        Commands::Runlevel { service } => commands::cmd_runlevel(&config, &service),
        Commands::Completions { .. } => Ok(()),
    }
}
