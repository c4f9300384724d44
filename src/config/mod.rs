//! Configuration file handling for artifactctl
//!
//! All configuration lives in a single directory:
//! - `indexes.yaml` - Configured artifact indexes
//! - `<index name>.yaml` - One file per configured index
//! - `credentials.yaml` - Registry credentials

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{ArtifactError, Result};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "ARTIFACTCTL_CONFIG_DIR";

/// Configuration directory name under the user's config directory
const CONFIG_DIR: &str = "artifactctl";

/// File listing the configured indexes
pub const INDEXES_FILE: &str = "indexes.yaml";

/// File holding registry credentials
pub const CREDENTIALS_FILE: &str = "credentials.yaml";

/// Default directory for plugin artifacts
pub const DEFAULT_PLUGINS_DIR: &str = "/usr/share/falco/plugins";

/// Default directory for rules file artifacts
pub const DEFAULT_RULESFILES_DIR: &str = "/etc/falco";

/// Resolve the configuration directory
///
/// An explicit directory (from `--config-dir` or `ARTIFACTCTL_CONFIG_DIR`) wins,
/// otherwise the platform's standard config location is used.
pub fn config_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }

    let base = dirs::config_dir().ok_or(ArtifactError::ConfigDirUnavailable)?;
    Ok(base.join(CONFIG_DIR))
}

/// Read and parse a YAML file, returning `None` when the file does not exist
pub fn read_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| ArtifactError::ConfigReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    // An empty file is a valid, empty configuration
    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|e| ArtifactError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
    }

    #[test]
    fn test_config_dir_explicit_wins() {
        let dir = config_dir(Some(Path::new("/opt/artifactctl"))).unwrap();
        assert_eq!(dir, PathBuf::from("/opt/artifactctl"));
    }

    #[test]
    fn test_config_dir_default_ends_with_app_name() {
        if let Ok(dir) = config_dir(None) {
            assert!(dir.ends_with("artifactctl"));
        }
    }

    #[test]
    fn test_read_yaml_file_missing() {
        let temp = TempDir::new().unwrap();
        let result: Option<Sample> = read_yaml_file(&temp.path().join("missing.yaml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_yaml_file_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.yaml");
        fs::write(&path, "\n").unwrap();
        let result: Option<Sample> = read_yaml_file(&path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_yaml_file_parses() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sample.yaml");
        fs::write(&path, "name: hello\n").unwrap();
        let result: Option<Sample> = read_yaml_file(&path).unwrap();
        assert_eq!(
            result,
            Some(Sample {
                name: "hello".to_string()
            })
        );
    }

    #[test]
    fn test_read_yaml_file_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        fs::write(&path, "name: [unterminated\n").unwrap();
        let result: Result<Option<Sample>> = read_yaml_file(&path);
        let err = result.unwrap_err();
        assert!(matches!(err, ArtifactError::ConfigParseFailed { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }
}
