//! Install command implementation
//!
//! Wires the configured indexes, the credential store and the registry
//! connectivity check into an [`InstallOperation`] and runs it over the
//! tokens given on the command line.

use std::path::Path;

use crate::cli::InstallArgs;
use crate::config::{self, CREDENTIALS_FILE};
use crate::error::Result;
use crate::index;
use crate::install::{Destinations, InstallOperation, InstallReport};
use crate::oci::authn::FileCredentialStore;
use crate::oci::gate::HttpConnectivityCheck;
use crate::oci::RegistryGate;
use crate::platform::Platform;
use crate::ui::{ConsoleReporter, Reporter};

/// Run install command
pub fn run(config_dir: Option<&Path>, args: InstallArgs, verbose: bool) -> Result<()> {
    let mut reporter = ConsoleReporter::new(verbose);
    let config_dir = config::config_dir(config_dir)?;
    reporter.verbose(&format!("Using configuration directory {:?}", config_dir.display().to_string()));

    let merged = index::load_merged(&config_dir, &mut reporter)?;
    if merged.is_empty() {
        reporter.verbose("No indexed artifacts, names can only be installed by full reference");
    }

    let gate = RegistryGate::new(
        FileCredentialStore::new(config_dir.join(CREDENTIALS_FILE)),
        HttpConnectivityCheck::new(args.plain_http),
        args.plain_http,
    );
    let destinations = Destinations::new(args.plugins_dir, args.rulesfiles_dir);
    let platform = Platform::current();
    reporter.verbose(&format!("Pulling artifacts for platform {platform}"));

    let report = InstallOperation::new(&merged, &gate, &destinations, platform)
        .execute(&args.refs, &mut reporter)?;

    print_summary(&report, &mut reporter);
    Ok(())
}

fn print_summary(report: &InstallReport, reporter: &mut dyn Reporter) {
    for artifact in &report.installed {
        reporter.verbose(&format!(
            "{} ({}) -> {}",
            artifact.reference,
            artifact.kind,
            dunce::simplified(&artifact.destination).display()
        ));
    }

    if !report.skipped.is_empty() {
        reporter.verbose(&format!("Skipped: {}", report.skipped.join(", ")));
    }
}
