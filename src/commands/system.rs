// src/commands/system.rs
//! Host inspection commands

use anyhow::Result;
use sosreport::{Config, runlevel};

use super::open_policy;

/// Show host facts and platform information
pub fn cmd_host(config: &Config) -> Result<()> {
    let policy = open_policy(config)?;

    println!("Hostname:        {}", policy.hostname());
    println!("Kernel:          {}", policy.kernel_version());
    println!("SMP:             {}", if policy.is_kernel_smp() { "yes" } else { "no" });
    println!("Architecture:    {}", policy.arch());
    println!("Package manager: {}", policy.packages().manager_name());
    println!("Red Hat policy:  {}", if policy.check() { "applies" } else { "does not apply" });

    match policy.distro_version() {
        Some(version) => println!("Release:         {}", version),
        None => println!("Release:         unknown"),
    }
    println!("Default runlevel: {}", runlevel::default_runlevel(&runlevel::inittab_path()));
    Ok(())
}

/// Show the runlevels a service is enabled in
pub fn cmd_runlevel(config: &Config, service: &str) -> Result<()> {
    let levels = runlevel::runlevels_by_service(service, config.general.command_timeout());

    if levels.is_empty() {
        println!("{} is not enabled in any runlevel.", service);
        return Ok(());
    }

    let levels: Vec<String> = levels.iter().map(u32::to_string).collect();
    println!("{}: {}", service, levels.join(" "));
    Ok(())
}
