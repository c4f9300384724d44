//! Artifact puller
//!
//! Pulling an artifact:
//! 1. Fetch the manifest (or image index) for the reference
//! 2. Pick the manifest matching the current platform from an image index
//! 3. Read the artifact kind from the config media type
//! 4. Download the single layer, verify its digest and store it under its title

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::client::RegistryClient;
use super::reference::Reference;
use super::{ArtifactType, PullResult, Puller};
use crate::error::{ArtifactError, Result};
use crate::platform::Platform;
use crate::ui::Reporter;

pub const OCI_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";
pub const OCI_INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";

/// Annotation carrying the file name of a layer
const TITLE_ANNOTATION: &str = "org.opencontainers.image.title";

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Descriptor {
    media_type: String,
    digest: String,
    #[serde(default)]
    annotations: HashMap<String, String>,
    #[serde(default)]
    platform: Option<DescriptorPlatform>,
}

#[derive(Debug, Clone, Deserialize)]
struct DescriptorPlatform {
    os: String,
    architecture: String,
}

#[derive(Debug, Deserialize)]
struct ImageManifest {
    config: Descriptor,
    #[serde(default)]
    layers: Vec<Descriptor>,
}

#[derive(Debug, Deserialize)]
struct ImageIndex {
    manifests: Vec<Descriptor>,
}

/// Puller talking to a remote registry
pub struct RegistryPuller {
    client: RegistryClient,
}

impl RegistryPuller {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }

    fn fetch_manifest(
        &self,
        reference: &str,
        parsed: &Reference,
        platform: &Platform,
    ) -> Result<ImageManifest> {
        let (content_type, body) = self.fetch_manifest_body(parsed, parsed.manifest_reference())?;

        if !is_index(content_type.as_deref(), &body) {
            return parse_json(&body, reference);
        }

        let index: ImageIndex = parse_json(&body, reference)?;
        let descriptor = select_manifest(&index.manifests, platform).ok_or_else(|| {
            ArtifactError::PullFailed {
                reference: reference.to_string(),
                reason: format!("no manifest found for platform {platform}"),
            }
        })?;

        let (_, body) = self.fetch_manifest_body(parsed, &descriptor.digest)?;
        parse_json(&body, reference)
    }

    fn fetch_manifest_body(
        &self,
        parsed: &Reference,
        manifest_ref: &str,
    ) -> Result<(Option<String>, Vec<u8>)> {
        let url = self.client.url(
            &parsed.registry,
            &format!("{}/manifests/{manifest_ref}", parsed.repository),
        );
        let response = self
            .client
            .get(&url, &[OCI_INDEX_MEDIA_TYPE, OCI_MANIFEST_MEDIA_TYPE])?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response.bytes()?.to_vec();
        Ok((content_type, body))
    }
}

impl Puller for RegistryPuller {
    fn pull(
        &self,
        reference: &str,
        dest_dir: &Path,
        platform: &Platform,
        reporter: &mut dyn Reporter,
    ) -> Result<PullResult> {
        let parsed = Reference::parse(reference)?;
        let manifest = self.fetch_manifest(reference, &parsed, platform)?;
        let kind = ArtifactType::from_config_media_type(&manifest.config.media_type);

        let layer = match manifest.layers.as_slice() {
            [layer] => layer,
            layers => {
                return Err(ArtifactError::PullFailed {
                    reference: reference.to_string(),
                    reason: format!("expected exactly one layer, found {}", layers.len()),
                });
            }
        };

        let filename = layer_filename(layer).ok_or_else(|| ArtifactError::PullFailed {
            reference: reference.to_string(),
            reason: format!("invalid layer title for {}", layer.digest),
        })?;

        let url = self.client.url(
            &parsed.registry,
            &format!("{}/blobs/{}", parsed.repository, layer.digest),
        );
        let response = self.client.get(&url, &[])?;
        let total = response.content_length();
        let bytes = receive_layer(response, total, reference, &layer.digest, reporter)?;

        let path = dest_dir.join(&filename);
        fs::write(&path, &bytes).map_err(|e| ArtifactError::PullFailed {
            reference: reference.to_string(),
            reason: format!("cannot write {}: {e}", path.display()),
        })?;

        Ok(PullResult {
            kind,
            filename,
            digest: layer.digest.clone(),
        })
    }
}

/// Download a layer body with a progress display and check its digest
///
/// The display is finished on success and abandoned on any error.
fn receive_layer<R: Read>(
    reader: R,
    total: Option<u64>,
    reference: &str,
    digest: &str,
    reporter: &mut dyn Reporter,
) -> Result<Vec<u8>> {
    reporter.start_transfer(&format!("Pulling layer {digest}"), total);

    let received = read_with_progress(reader, reporter)
        .map_err(|e| ArtifactError::PullFailed {
            reference: reference.to_string(),
            reason: format!("cannot download layer {digest}: {e}"),
        })
        .and_then(|bytes| verify_digest(&bytes, digest).map(|()| bytes));

    match received {
        Ok(bytes) => {
            reporter.success(&format!("Layer {digest} pulled ({} bytes)", bytes.len()));
            Ok(bytes)
        }
        Err(e) => {
            reporter.abandon();
            Err(e)
        }
    }
}

fn read_with_progress<R: Read>(mut reader: R, reporter: &mut dyn Reporter) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => return Ok(bytes),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        bytes.extend_from_slice(&chunk[..n]);
        reporter.advance(n as u64);
    }
}

fn is_index(content_type: Option<&str>, body: &[u8]) -> bool {
    match content_type {
        Some(ct) if ct.starts_with(OCI_INDEX_MEDIA_TYPE) => true,
        Some(ct) if ct.starts_with(OCI_MANIFEST_MEDIA_TYPE) => false,
        // Fall back to the document shape when the registry sends a generic type
        _ => serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .is_some_and(|v| v.get("manifests").is_some()),
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8], reference: &str) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| ArtifactError::PullFailed {
        reference: reference.to_string(),
        reason: format!("invalid manifest: {e}"),
    })
}

/// Pick the manifest for `platform`
///
/// Platform-independent artifacts (rules files) are published as an index with
/// a single manifest and no platform, which matches any platform.
fn select_manifest<'a>(manifests: &'a [Descriptor], platform: &Platform) -> Option<&'a Descriptor> {
    manifests
        .iter()
        .find(|m| {
            m.platform
                .as_ref()
                .is_some_and(|p| p.os == platform.os && p.architecture == platform.arch)
        })
        .or_else(|| match manifests {
            [only] if only.platform.is_none() => Some(only),
            _ => None,
        })
}

/// File name to store a layer under; must not escape the destination directory
fn layer_filename(layer: &Descriptor) -> Option<String> {
    match layer.annotations.get(TITLE_ANNOTATION) {
        Some(title) => {
            let name = Path::new(title).file_name()?.to_str()?;
            (name == title).then(|| title.clone())
        }
        None => {
            let hex = layer.digest.split_once(':').map_or(layer.digest.as_str(), |(_, h)| h);
            Some(format!("{hex}.tar.gz"))
        }
    }
}

fn verify_digest(bytes: &[u8], expected: &str) -> Result<()> {
    let Some(("sha256", expected_hex)) = expected.split_once(':') else {
        return Err(ArtifactError::DigestMismatch {
            expected: expected.to_string(),
            actual: "unsupported digest algorithm".to_string(),
        });
    };

    let actual = format!("{:x}", Sha256::digest(bytes));
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(ArtifactError::DigestMismatch {
            expected: expected.to_string(),
            actual: format!("sha256:{actual}"),
        })
    }
}
