//! Target platform of the running process
//!
//! Registries describe platform-specific manifests with OCI platform names
//! (`linux/amd64`, `darwin/arm64`, ...), which differ from Rust's target
//! constants for some architectures.

use std::fmt;

/// Operating system and architecture pair used to select a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Platform of the running binary, fixed for the whole process
    pub fn current() -> Self {
        Self::new(
            oci_os(std::env::consts::OS),
            oci_arch(std::env::consts::ARCH),
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn oci_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn oci_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64le",
        "loongarch64" => "loong64",
        other => other,
    }
}
