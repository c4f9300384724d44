//! Index file contents
//!
//! An index file is a YAML list of artifact entries:
//!
//! ```yaml
//! - name: k8saudit
//!   type: plugin
//!   registry: ghcr.io
//!   repository: falcosecurity/plugins/plugin/k8saudit
//!   description: Read Kubernetes Audit Events
//!   keywords: [audit, kubernetes]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{ArtifactError, Result};

/// Maintainer of an indexed artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One artifact listed in an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,

    /// Declared artifact type (`plugin`, `rulesfile`); informational only
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,

    pub registry: String,
    pub repository: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl IndexEntry {
    #[cfg(test)]
    pub fn new(
        name: impl Into<String>,
        registry: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            artifact_type: None,
            registry: registry.into(),
            repository: repository.into(),
            description: None,
            home: None,
            keywords: Vec::new(),
            license: None,
            maintainers: Vec::new(),
            sources: Vec::new(),
        }
    }
}

/// A named collection of index entries
#[derive(Debug, Clone, Default)]
pub struct Index {
    pub name: String,
    pub entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Parse index entries from a YAML string
    #[cfg(test)]
    pub fn from_yaml(name: impl Into<String>, yaml: &str) -> Result<Self> {
        let entries: Option<Vec<IndexEntry>> = serde_yaml::from_str(yaml)?;
        Ok(Self {
            name: name.into(),
            entries: entries.unwrap_or_default(),
        })
    }

    /// Read index entries from a file
    ///
    /// A configured index must have a readable file; a missing file is an error.
    pub fn read(&mut self, path: &Path) -> Result<()> {
        let entries: Option<Vec<IndexEntry>> =
            config::read_yaml_file(path).map_err(|e| ArtifactError::IndexLoadFailed {
                name: self.name.clone(),
                reason: e.to_string(),
            })?;

        match entries {
            Some(entries) => {
                self.entries = entries;
                Ok(())
            }
            None if path.exists() => {
                self.entries.clear();
                Ok(())
            }
            None => Err(ArtifactError::IndexLoadFailed {
                name: self.name.clone(),
                reason: format!("file not found: {}", path.display()),
            }),
        }
    }
}
