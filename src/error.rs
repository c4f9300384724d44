//! Error types and handling for artifactctl
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for artifactctl operations
#[derive(Error, Diagnostic, Debug)]
pub enum ArtifactError {
    // Configuration errors
    #[error("Could not determine configuration directory")]
    #[diagnostic(
        code(artifactctl::config::dir_unavailable),
        help("Set ARTIFACTCTL_CONFIG_DIR or pass --config-dir")
    )]
    ConfigDirUnavailable,

    #[error("Failed to read configuration file {path}: {reason}")]
    #[diagnostic(code(artifactctl::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file {path}: {reason}")]
    #[diagnostic(code(artifactctl::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    // Index errors
    #[error("cannot load index {name}: {reason}")]
    #[diagnostic(
        code(artifactctl::index::load_failed),
        help("Check that the index file exists in the configuration directory and is valid YAML")
    )]
    IndexLoadFailed { name: String, reason: String },

    // Reference errors
    #[error("cannot extract registry name from ref {reference:?}: {reason}")]
    #[diagnostic(
        code(artifactctl::reference::invalid),
        help("References look like registry.example.com/org/artifact:tag or name@sha256:<digest>")
    )]
    InvalidReference { reference: String, reason: String },

    // Registry errors
    #[error("cannot get credential for registry {registry:?}: {reason}")]
    #[diagnostic(code(artifactctl::registry::credential_failed))]
    CredentialFailed { registry: String, reason: String },

    #[error("unable to connect to registry {registry:?}")]
    #[diagnostic(
        code(artifactctl::registry::unreachable),
        help("Run with --verbose for details, check credentials.yaml or try --plain-http for local registries")
    )]
    RegistryUnreachable { registry: String },

    #[error("Registry request failed: {url}: {reason}")]
    #[diagnostic(code(artifactctl::registry::request_failed))]
    RegistryRequestFailed { url: String, reason: String },

    #[error("Failed to pull {reference}: {reason}")]
    #[diagnostic(code(artifactctl::registry::pull_failed))]
    PullFailed { reference: String, reason: String },

    #[error("Digest mismatch: expected {expected}, got {actual}")]
    #[diagnostic(code(artifactctl::registry::digest_mismatch))]
    DigestMismatch { expected: String, actual: String },

    // Install errors
    #[error("Unsupported artifact type {kind:?} for {artifact}")]
    #[diagnostic(
        code(artifactctl::install::unsupported_type),
        help("Only plugin and rulesfile artifacts can be installed")
    )]
    UnsupportedArtifactType { artifact: String, kind: String },

    #[error("scratch workspace error: {reason}")]
    #[diagnostic(code(artifactctl::install::scratch_failed))]
    ScratchWorkspaceFailed { reason: String },

    #[error("cannot open archive {path} of {artifact}: {reason}")]
    #[diagnostic(code(artifactctl::install::archive_open_failed))]
    ArchiveOpenFailed {
        artifact: String,
        path: String,
        reason: String,
    },

    #[error("cannot extract {artifact} ({path}) into {destination}: {reason}")]
    #[diagnostic(
        code(artifactctl::install::extraction_failed),
        help("Check that the destination directory is writable")
    )]
    ExtractionFailed {
        artifact: String,
        path: String,
        destination: String,
        reason: String,
    },

    #[error("cannot remove archive {path} of {artifact}: {reason}")]
    #[diagnostic(code(artifactctl::install::archive_remove_failed))]
    ArchiveRemoveFailed {
        artifact: String,
        path: String,
        reason: String,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(artifactctl::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for ArtifactError {
    fn from(err: std::io::Error) -> Self {
        ArtifactError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ArtifactError {
    fn from(err: serde_yaml::Error) -> Self {
        ArtifactError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ArtifactError {
    fn from(err: serde_json::Error) -> Self {
        ArtifactError::RegistryRequestFailed {
            url: "unknown".to_string(),
            reason: format!("invalid JSON response: {err}"),
        }
    }
}

impl From<reqwest::Error> for ArtifactError {
    fn from(err: reqwest::Error) -> Self {
        ArtifactError::RegistryRequestFailed {
            url: err
                .url()
                .map_or_else(|| "unknown".to_string(), ToString::to_string),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ArtifactError>;
