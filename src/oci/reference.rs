//! OCI reference parsing
//!
//! Follows the `docker pull` rules: the first path component is a registry
//! host only when it looks like one (contains `.` or `:`, or is `localhost`),
//! otherwise `docker.io` is implied.

use std::fmt;

use crate::error::{ArtifactError, Result};

/// Registry implied when a reference has no host component
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Tag implied when a reference has neither tag nor digest
pub const DEFAULT_TAG: &str = "latest";

const MAX_TAG_LEN: usize = 128;

/// A parsed `registry/repository[:tag][@digest]` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub registry: String,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl Reference {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| ArtifactError::InvalidReference {
            reference: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("empty reference"));
        }

        let (name_and_tag, digest) = match input.split_once('@') {
            Some((name, digest)) => {
                validate_digest(digest).map_err(|reason| invalid(reason))?;
                (name, Some(digest.to_string()))
            }
            None => (input, None),
        };

        // A ':' after the last '/' separates the tag; earlier ones belong to a host port
        let last_slash = name_and_tag.rfind('/');
        let (name, tag) = match name_and_tag.rfind(':') {
            Some(colon) if last_slash.is_none_or(|slash| colon > slash) => (
                &name_and_tag[..colon],
                Some(name_and_tag[colon + 1..].to_string()),
            ),
            _ => (name_and_tag, None),
        };

        if let Some(tag) = &tag {
            validate_tag(tag).map_err(|reason| invalid(reason))?;
        }

        let (registry, repository) = split_registry(name).map_err(|reason| invalid(reason))?;
        validate_repository(&repository).map_err(|reason| invalid(reason))?;

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Tag or digest to request the manifest with
    pub fn manifest_reference(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or(DEFAULT_TAG)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

/// Extract the registry host from a reference string
pub fn registry_from_ref(reference: &str) -> Result<String> {
    Reference::parse(reference).map(|r| r.registry)
}

fn split_registry(name: &str) -> std::result::Result<(String, String), &'static str> {
    if name.is_empty() {
        return Err("empty repository");
    }
    if name.starts_with('/') {
        return Err("empty registry");
    }

    match name.split_once('/') {
        Some((first, rest)) if looks_like_host(first) => {
            Ok((first.to_string(), rest.to_string()))
        }
        Some(_) => Ok((DEFAULT_REGISTRY.to_string(), name.to_string())),
        None => Ok((DEFAULT_REGISTRY.to_string(), format!("library/{name}"))),
    }
}

fn looks_like_host(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

fn validate_repository(repository: &str) -> std::result::Result<(), &'static str> {
    if repository.is_empty() {
        return Err("empty repository");
    }
    if repository.split('/').any(str::is_empty) {
        return Err("empty path component in repository");
    }
    let valid = repository.chars().all(|c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-' | '/')
    });
    if !valid {
        return Err("repository must contain only lowercase letters, digits, '.', '_', '-' and '/'");
    }
    Ok(())
}

fn validate_tag(tag: &str) -> std::result::Result<(), &'static str> {
    if tag.is_empty() {
        return Err("empty tag");
    }
    if tag.len() > MAX_TAG_LEN {
        return Err("tag longer than 128 characters");
    }
    if tag.starts_with(['.', '-']) {
        return Err("tag must start with a letter, digit or '_'");
    }
    if !tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err("tag contains invalid characters");
    }
    Ok(())
}

fn validate_digest(digest: &str) -> std::result::Result<(), &'static str> {
    match digest.split_once(':') {
        Some((algorithm, encoded)) if !algorithm.is_empty() && !encoded.is_empty() => {
            if encoded.chars().all(|c| c.is_ascii_hexdigit()) {
                Ok(())
            } else {
                Err("digest must be hex encoded")
            }
        }
        _ => Err("digest must look like <algorithm>:<hex>"),
    }
}
