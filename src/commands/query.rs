// src/commands/query.rs
//! Installed-package query commands

use anyhow::Result;
use sosreport::{Config, RegexFlags};

use super::open_policy;

/// List installed packages, or the names matching a glob or regex
pub fn cmd_packages(config: &Config, pattern: Option<&str>, regex: bool, ignore_case: bool) -> Result<()> {
    let policy = open_policy(config)?;
    let index = policy.packages();

    let Some(pattern) = pattern else {
        let all = index.query_all();
        if all.is_empty() {
            println!("No installed packages found via {}.", index.manager_name());
            return Ok(());
        }
        for record in all.values() {
            println!("{} {}", record.name, record.version);
        }
        return Ok(());
    };

    let names = if regex {
        let flags = RegexFlags {
            case_insensitive: ignore_case,
            ..RegexFlags::default()
        };
        index.find_by_regex(pattern, flags)?
    } else {
        index.find_by_glob(pattern)?
    };

    if names.is_empty() {
        println!("No installed packages match '{}'.", pattern);
        return Ok(());
    }

    for name in &names {
        match index.find_by_exact_name(name) {
            Some(record) => println!("{} {}", record.name, record.version),
            None => println!("{}", name),
        }
    }
    println!("\n{} package(s)", names.len());
    Ok(())
}

/// Split a package specifier into its NVRA fields
pub fn cmd_nvra(config: &Config, specifier: &str) -> Result<()> {
    let policy = open_policy(config)?;
    let nvra = policy.packages().decompose(specifier)?;

    println!("Name:    {}", nvra.name);
    println!("Version: {}", nvra.version);
    println!("Release: {}", nvra.release);
    println!("Arch:    {}", nvra.arch);
    Ok(())
}
