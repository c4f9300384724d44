//! Scratch workspace for one install run
//!
//! Pulled archives are downloaded into a private temporary directory that
//! lives exactly as long as the run.

use std::env;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{ArtifactError, Result};

const SCRATCH_PREFIX: &str = "artifactctl";

/// Parent directory for scratch workspaces
///
/// Always absolute: a relative `TMPDIR` (e.g. `TMPDIR=tmp`) is ignored in
/// favour of the platform temp location, so pulled archives never land under
/// the working directory or next to the install destinations.
pub fn scratch_parent() -> PathBuf {
    Some(env::temp_dir())
        .filter(|dir| dir.is_absolute())
        .unwrap_or_else(platform_temp_dir)
}

#[cfg(windows)]
fn platform_temp_dir() -> PathBuf {
    ["TEMP", "TMP"]
        .iter()
        .filter_map(|var| env::var_os(var))
        .map(PathBuf::from)
        .find(|dir| dir.is_absolute())
        .unwrap_or_else(|| PathBuf::from("C:\\Windows\\Temp"))
}

#[cfg(not(windows))]
fn platform_temp_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

/// Uniquely named temporary directory, removed on drop
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(scratch_parent())
            .map_err(|e| ArtifactError::ScratchWorkspaceFailed {
                reason: format!("cannot create temporary directory: {e}"),
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory, reporting failures
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().display().to_string();
        self.dir
            .close()
            .map_err(|e| ArtifactError::ScratchWorkspaceFailed {
                reason: format!("cannot remove {path}: {e}"),
            })
    }
}

/// Run `run` with a fresh scratch directory and remove it afterwards
///
/// The directory is removed whether `run` succeeds or fails. A failure of
/// `run` takes precedence over a failure to remove the directory.
pub fn with_scratch_workspace<T>(run: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let workspace = ScratchWorkspace::create()?;
    let outcome = run(workspace.path());

    match outcome {
        Ok(value) => {
            workspace.close()?;
            Ok(value)
        }
        Err(e) => {
            drop(workspace);
            Err(e)
        }
    }
}
