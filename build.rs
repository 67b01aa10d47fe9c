// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: upload URL override
fn upload_url_arg() -> Arg {
    Arg::new("upload_url")
        .long("upload-url")
        .value_name("URL")
        .help("Upload URL (overrides the configured ftp_upload_url)")
}

fn build_cli() -> Command {
    Command::new("sosreport")
        .version(env!("CARGO_PKG_VERSION"))
        .author("sosreport Contributors")
        .about("Name, checksum, encrypt and deliver support reports")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .default_value("/etc/sos/sosreport.toml")
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("name")
                .about("Work out the archive name for a new report")
                .arg(Arg::new("name").long("name").help("Report name (letters, digits and periods are kept)"))
                .arg(Arg::new("ticket").long("ticket").help("Support case number (digits are kept)"))
                .arg(
                    Arg::new("batch")
                        .long("batch")
                        .action(ArgAction::SetTrue)
                        .help("Do not prompt; use overrides or the derived name"),
                ),
        )
        .subcommand(
            Command::new("finalize")
                .about("Finalize a generated archive: encrypt, checksum, summarize, upload")
                .arg(Arg::new("archive").required(true).help("Path to the generated archive"))
                .arg(
                    Arg::new("encrypt")
                        .long("encrypt")
                        .action(ArgAction::SetTrue)
                        .help("Encrypt the archive with gpg before delivery"),
                )
                .arg(
                    Arg::new("upload")
                        .long("upload")
                        .action(ArgAction::SetTrue)
                        .help("Upload the archive after finalizing"),
                )
                .arg(upload_url_arg()),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload an already finalized archive")
                .arg(Arg::new("archive").required(true).help("Path to the archive"))
                .arg(upload_url_arg()),
        )
        .subcommand(
            Command::new("packages")
                .about("List installed packages, optionally filtered")
                .arg(Arg::new("pattern").help("Shell glob (or regex with --regex) matched against package names"))
                .arg(
                    Arg::new("regex")
                        .long("regex")
                        .action(ArgAction::SetTrue)
                        .help("Treat the pattern as a regular expression anchored at the start"),
                )
                .arg(
                    Arg::new("ignore_case")
                        .short('i')
                        .long("ignore-case")
                        .action(ArgAction::SetTrue)
                        .help("Case-insensitive regex matching"),
                ),
        )
        .subcommand(
            Command::new("nvra")
                .about("Split a package specifier into name, version, release and arch")
                .arg(Arg::new("specifier").required(true).help("Package specifier")),
        )
        .subcommand(Command::new("host").about("Show host facts and platform information"))
        .subcommand(
            Command::new("runlevel")
                .about("Show the runlevels a service is enabled in")
                .arg(Arg::new("service").required(true).help("Service name")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("sosreport.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
