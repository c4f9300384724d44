//! OCI registry access
//!
//! This module handles:
//! - Parsing artifact references ([`reference`])
//! - Registry credentials ([`authn`])
//! - HTTP access to the distribution API ([`client`])
//! - Pulling artifacts for a platform ([`puller`])
//! - Credential lookup and connectivity checks before a pull ([`gate`])

pub mod authn;
pub mod client;
pub mod gate;
pub mod puller;
pub mod reference;

use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::platform::Platform;
use crate::ui::Reporter;

pub use gate::{RegistryAccess, RegistryGate};

/// Config media type of plugin artifacts
pub const PLUGIN_CONFIG_MEDIA_TYPE: &str = "application/vnd.cncf.falco.plugin.config.v1+json";

/// Config media type of rules file artifacts
pub const RULESFILE_CONFIG_MEDIA_TYPE: &str =
    "application/vnd.cncf.falco.rulesfile.config.v1+json";

/// Kind of a pulled artifact, taken from its manifest config media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactType {
    Plugin,
    Rulesfile,
    /// Any other config media type
    Unknown(String),
}

impl ArtifactType {
    pub fn from_config_media_type(media_type: &str) -> Self {
        match media_type {
            PLUGIN_CONFIG_MEDIA_TYPE => ArtifactType::Plugin,
            RULESFILE_CONFIG_MEDIA_TYPE => ArtifactType::Rulesfile,
            other => ArtifactType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactType::Plugin => f.write_str("plugin"),
            ArtifactType::Rulesfile => f.write_str("rulesfile"),
            ArtifactType::Unknown(media_type) => f.write_str(media_type),
        }
    }
}

/// Outcome of one successful pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullResult {
    pub kind: ArtifactType,
    /// File name relative to the directory the artifact was pulled into
    pub filename: String,
    /// Digest of the pulled layer
    pub digest: String,
}

/// Fetches one artifact from a registry
pub trait Puller {
    /// Pull `reference` for `platform` into `dest_dir`, reporting download progress
    fn pull(
        &self,
        reference: &str,
        dest_dir: &Path,
        platform: &Platform,
        reporter: &mut dyn Reporter,
    ) -> Result<PullResult>;
}
