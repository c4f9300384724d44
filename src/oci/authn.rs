//! Registry credentials
//!
//! Credentials are read from `credentials.yaml` in the configuration directory:
//!
//! ```yaml
//! registries:
//!   - registry: ghcr.io
//!     username: octocat
//!     password: ghp_xxx
//!   - registry: registry.example.com
//!     token: eyJhbGciOi...
//! ```
//!
//! Registries without an entry are accessed anonymously.

use std::path::PathBuf;

use serde::Deserialize;

use crate::config;
use crate::error::{ArtifactError, Result};

/// Credential for one registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Bearer token used as-is, without a token exchange
    pub token: Option<String>,
}

impl Credential {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none() && self.token.is_none()
    }
}

/// Source of registry credentials
pub trait CredentialStore {
    fn credential(&self, registry: &str) -> Result<Credential>;
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    registries: Vec<RegistryCredential>,
}

#[derive(Debug, Deserialize)]
struct RegistryCredential {
    registry: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

/// Credential store backed by `credentials.yaml`
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn credential(&self, registry: &str) -> Result<Credential> {
        let file: Option<CredentialsFile> =
            config::read_yaml_file(&self.path).map_err(|e| ArtifactError::CredentialFailed {
                registry: registry.to_string(),
                reason: e.to_string(),
            })?;

        let Some(file) = file else {
            return Ok(Credential::anonymous());
        };

        Ok(file
            .registries
            .into_iter()
            .find(|entry| entry.registry == registry)
            .map(|entry| Credential {
                username: entry.username,
                password: entry.password,
                token: entry.token,
            })
            .unwrap_or_default())
    }
}
