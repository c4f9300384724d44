//! Installs pulled artifacts into their destination directory

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::extract::extract_tar_gz;
use crate::error::{ArtifactError, Result};
use crate::oci::{ArtifactType, PullResult};
use crate::ui::Reporter;

/// Install directory for each artifact kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destinations {
    pub plugins_dir: PathBuf,
    pub rulesfiles_dir: PathBuf,
}

impl Destinations {
    pub fn new(plugins_dir: impl Into<PathBuf>, rulesfiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins_dir: plugins_dir.into(),
            rulesfiles_dir: rulesfiles_dir.into(),
        }
    }

    /// Directory for `kind`; unknown kinds have none
    pub fn for_kind(&self, kind: &ArtifactType) -> Option<&Path> {
        match kind {
            ArtifactType::Plugin => Some(self.plugins_dir.as_path()),
            ArtifactType::Rulesfile => Some(self.rulesfiles_dir.as_path()),
            ArtifactType::Unknown(_) => None,
        }
    }
}

pub struct Installer<'a> {
    destinations: &'a Destinations,
}

impl<'a> Installer<'a> {
    pub fn new(destinations: &'a Destinations) -> Self {
        Self { destinations }
    }

    /// Extract the archive pulled for `reference` into its destination and
    /// delete the archive
    ///
    /// Returns the destination directory. Errors name `reference`.
    pub fn install(
        &self,
        reference: &str,
        result: &PullResult,
        scratch_dir: &Path,
        reporter: &mut dyn Reporter,
    ) -> Result<PathBuf> {
        let destination = self.destinations.for_kind(&result.kind).ok_or_else(|| {
            ArtifactError::UnsupportedArtifactType {
                artifact: reference.to_string(),
                kind: result.kind.to_string(),
            }
        })?;

        let archive = scratch_dir.join(&result.filename);
        reporter.start_step(&format!(
            "Extracting and installing {:?} {:?}",
            result.kind.to_string(),
            archive.display().to_string()
        ));

        match extract_and_remove(reference, &archive, destination) {
            Ok(()) => {
                reporter.success(&format!(
                    "Artifact successfully installed in {:?}",
                    destination.display().to_string()
                ));
                Ok(destination.to_path_buf())
            }
            Err(e) => {
                reporter.abandon();
                Err(e)
            }
        }
    }
}

fn extract_and_remove(reference: &str, archive: &Path, destination: &Path) -> Result<()> {
    let path = archive.display().to_string();
    {
        let file = File::open(archive).map_err(|e| ArtifactError::ArchiveOpenFailed {
            artifact: reference.to_string(),
            path: path.clone(),
            reason: e.to_string(),
        })?;

        extract_tar_gz(BufReader::new(file), destination).map_err(|e| {
            ArtifactError::ExtractionFailed {
                artifact: reference.to_string(),
                path: path.clone(),
                destination: destination.display().to_string(),
                reason: e.to_string(),
            }
        })?;
    }

    fs::remove_file(archive).map_err(|e| ArtifactError::ArchiveRemoveFailed {
        artifact: reference.to_string(),
        path,
        reason: e.to_string(),
    })
}
