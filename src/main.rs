//! artifactctl - Falco artifact installer
//!
//! Resolves artifact names against the configured indexes, pulls them from
//! OCI registries for the current platform and installs plugins and rules
//! files into their directories.

use clap::Parser;

mod cli;
mod commands;
mod config;
mod error;
mod index;
mod install;
mod oci;
mod platform;
#[cfg(test)]
mod test_fixtures;
mod ui;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Install(args) => {
            commands::install::run(cli.config_dir.as_deref(), args, cli.verbose)
        }
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(&args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
