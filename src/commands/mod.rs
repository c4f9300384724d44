//! Command implementations for the artifactctl CLI

pub mod completions;
pub mod install;
pub mod version;
