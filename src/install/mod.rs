//! Artifact installation
//!
//! The install process, for each token in order:
//! 1. Resolve the token to a reference (unknown names are skipped with a warning)
//! 2. Extract the registry host from the reference
//! 3. Open registry access (credential lookup and connectivity check)
//! 4. Pull the artifact for the current platform into the scratch workspace
//! 5. Extract it into the directory for its kind and delete the archive
//!
//! Any failure after step 1 aborts the whole run. Artifacts installed before
//! the failure stay in place.

pub mod extract;
pub mod installer;
pub mod resolve;
pub mod workspace;

use std::path::PathBuf;

use crate::error::Result;
use crate::index::IndexLookup;
use crate::oci::reference::registry_from_ref;
use crate::oci::{ArtifactType, RegistryAccess};
use crate::platform::Platform;
use crate::ui::Reporter;

pub use installer::{Destinations, Installer};
pub use resolve::resolve_reference;
pub use workspace::with_scratch_workspace;

/// One installed artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    pub token: String,
    pub reference: String,
    pub kind: ArtifactType,
    pub destination: PathBuf,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<InstalledArtifact>,
    /// Names not found in any configured index
    pub skipped: Vec<String>,
}

/// Installs a batch of artifacts, one at a time
pub struct InstallOperation<'a> {
    index: &'a dyn IndexLookup,
    access: &'a dyn RegistryAccess,
    destinations: &'a Destinations,
    platform: Platform,
}

impl<'a> InstallOperation<'a> {
    pub fn new(
        index: &'a dyn IndexLookup,
        access: &'a dyn RegistryAccess,
        destinations: &'a Destinations,
        platform: Platform,
    ) -> Self {
        Self {
            index,
            access,
            destinations,
            platform,
        }
    }

    /// Install `tokens` in order, stopping at the first fatal error
    pub fn execute(&self, tokens: &[String], reporter: &mut dyn Reporter) -> Result<InstallReport> {
        with_scratch_workspace(|scratch| {
            let installer = Installer::new(self.destinations);
            let mut report = InstallReport::default();

            for token in tokens {
                let Some(reference) = resolve_reference(token, self.index) else {
                    reporter.warning(&format!(
                        "cannot find {token} among the configured indexes, skipping"
                    ));
                    report.skipped.push(token.clone());
                    continue;
                };

                reporter.info(&format!("Preparing to pull {reference:?}"));

                let registry = registry_from_ref(&reference)?;
                let puller = self.access.open(&registry, reporter)?;

                let result = puller.pull(&reference, scratch, &self.platform, reporter)?;
                reporter.verbose(&format!(
                    "Pulled {reference} ({}, {})",
                    result.kind, result.digest
                ));

                let destination = installer.install(&reference, &result, scratch, reporter)?;

                report.installed.push(InstalledArtifact {
                    token: token.clone(),
                    reference,
                    kind: result.kind,
                    destination,
                });
            }

            Ok(report)
        })
    }
}
