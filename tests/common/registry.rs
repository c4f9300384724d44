//! Minimal OCI registry serving fixed responses over plain HTTP
//!
//! Optionally guarded by `Basic` or `Bearer` authentication; bearer tokens are
//! handed out by a `/token` endpoint on the same host.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};

pub const PLUGIN_CONFIG: &str = "application/vnd.cncf.falco.plugin.config.v1+json";
pub const RULESFILE_CONFIG: &str = "application/vnd.cncf.falco.rulesfile.config.v1+json";
const MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";
const INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";
const LAYER_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar+gzip";

type Routes = HashMap<String, (String, Vec<u8>)>;

/// Authentication the registry demands on `/v2/` routes
#[derive(Debug, Clone)]
enum Auth {
    Open,
    /// Expected `Authorization` header value
    Basic(String),
    /// Token issued by `/token`
    Bearer(String),
}

/// One platform-specific artifact of an image index
pub struct PlatformArtifact<'a> {
    pub os: &'a str,
    pub arch: &'a str,
    pub config_media_type: &'a str,
    pub title: &'a str,
    pub files: &'a [(&'a str, &'a [u8])],
}

/// Registry answering `GET` requests from a route table
pub struct FakeRegistry {
    host: String,
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeRegistry {
    /// Bind to a free local port and serve without authentication
    pub fn start() -> Self {
        Self::serve(Auth::Open)
    }

    /// Serve behind a bearer challenge; `/token` issues `token` to anyone
    pub fn start_bearer(token: &str) -> Self {
        Self::serve(Auth::Bearer(token.to_string()))
    }

    /// Serve behind a basic challenge accepting only `username`/`password`
    pub fn start_basic(username: &str, password: &str) -> Self {
        let expected = format!("Basic {}", base64(format!("{username}:{password}").as_bytes()));
        Self::serve(Auth::Basic(expected))
    }

    fn serve(auth: Auth) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind registry");
        let host = listener.local_addr().expect("No local address").to_string();

        let mut table = Routes::new();
        table.insert("/v2/".to_string(), ("application/json".to_string(), b"{}".to_vec()));
        let routes = Arc::new(Mutex::new(table));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let (served_routes, seen) = (Arc::clone(&routes), Arc::clone(&requests));
        let served_host = host.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                handle(stream, &served_host, &auth, &served_routes, &seen);
            }
        });

        Self {
            host,
            routes,
            requests,
        }
    }

    /// `host:port` of the registry
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Request paths served so far, query strings included
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("poisoned").clone()
    }

    /// Publish a single-layer artifact under `repository:tag`
    ///
    /// Returns the full reference.
    pub fn publish(
        &self,
        repository: &str,
        tag: &str,
        config_media_type: &str,
        title: &str,
        files: &[(&str, &[u8])],
    ) -> String {
        let manifest = self.store_artifact(repository, config_media_type, title, files);
        self.route(
            &format!("/v2/{repository}/manifests/{tag}"),
            MANIFEST_MEDIA_TYPE,
            manifest,
        );
        format!("{}/{repository}:{tag}", self.host)
    }

    /// Publish an image index under `repository:tag` with one manifest per platform
    ///
    /// Returns the full reference.
    pub fn publish_index(&self, repository: &str, tag: &str, artifacts: &[PlatformArtifact]) -> String {
        let manifests: Vec<serde_json::Value> = artifacts
            .iter()
            .map(|artifact| {
                let manifest = self.store_artifact(
                    repository,
                    artifact.config_media_type,
                    artifact.title,
                    artifact.files,
                );
                let digest = sha256_digest(&manifest);
                let size = manifest.len();
                self.route(
                    &format!("/v2/{repository}/manifests/{digest}"),
                    MANIFEST_MEDIA_TYPE,
                    manifest,
                );
                serde_json::json!({
                    "mediaType": MANIFEST_MEDIA_TYPE,
                    "digest": digest,
                    "size": size,
                    "platform": { "os": artifact.os, "architecture": artifact.arch },
                })
            })
            .collect();

        let index = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": INDEX_MEDIA_TYPE,
            "manifests": manifests,
        });
        self.route(
            &format!("/v2/{repository}/manifests/{tag}"),
            INDEX_MEDIA_TYPE,
            serde_json::to_vec(&index).expect("Failed to encode index"),
        );

        format!("{}/{repository}:{tag}", self.host)
    }

    /// Store the layer blob and return the encoded manifest
    fn store_artifact(
        &self,
        repository: &str,
        config_media_type: &str,
        title: &str,
        files: &[(&str, &[u8])],
    ) -> Vec<u8> {
        let layer = tar_gz(files);
        let layer_digest = sha256_digest(&layer);
        let config = b"{}".to_vec();
        let config_digest = sha256_digest(&config);

        let manifest = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": MANIFEST_MEDIA_TYPE,
            "config": {
                "mediaType": config_media_type,
                "digest": config_digest,
                "size": config.len(),
            },
            "layers": [{
                "mediaType": LAYER_MEDIA_TYPE,
                "digest": layer_digest,
                "size": layer.len(),
                "annotations": { "org.opencontainers.image.title": title },
            }],
        });

        self.route(
            &format!("/v2/{repository}/blobs/{layer_digest}"),
            "application/octet-stream",
            layer,
        );
        serde_json::to_vec(&manifest).expect("Failed to encode manifest")
    }

    fn route(&self, path: &str, content_type: &str, body: Vec<u8>) {
        self.routes
            .lock()
            .expect("poisoned")
            .insert(path.to_string(), (content_type.to_string(), body));
    }
}

/// OCI `(os, architecture)` of the machine running the tests
pub fn current_platform() -> (&'static str, &'static str) {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64le",
        "loongarch64" => "loong64",
        other => other,
    };
    (os, arch)
}

fn handle(
    stream: TcpStream,
    host: &str,
    auth: &Auth,
    routes: &Mutex<Routes>,
    requests: &Mutex<Vec<String>>,
) {
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }

    let mut authorization = None;
    let mut line = String::new();
    while reader.read_line(&mut line).is_ok_and(|n| n > 0) && line != "\r\n" {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("authorization") {
                authorization = Some(value.trim().to_string());
            }
        }
        line.clear();
    }

    let target = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();
    requests.lock().expect("poisoned").push(target.clone());
    let path = target.split_once('?').map_or(target.as_str(), |(path, _)| path);

    let (status, headers, content_type, body) = if path == "/token" {
        let token = match auth {
            Auth::Bearer(token) => token.as_str(),
            _ => "",
        };
        (
            "200 OK",
            String::new(),
            "application/json".to_string(),
            serde_json::to_vec(&serde_json::json!({ "token": token })).expect("Failed to encode token"),
        )
    } else if let Some(challenge) = challenge(auth, host, authorization.as_deref()) {
        (
            "401 Unauthorized",
            format!("WWW-Authenticate: {challenge}\r\n"),
            "application/json".to_string(),
            br#"{"errors":[{"code":"UNAUTHORIZED"}]}"#.to_vec(),
        )
    } else {
        match routes.lock().expect("poisoned").get(path).cloned() {
            Some((content_type, body)) => ("200 OK", String::new(), content_type, body),
            None => (
                "404 Not Found",
                String::new(),
                "application/json".to_string(),
                b"{}".to_vec(),
            ),
        }
    };

    let mut stream = &stream;
    let header = format!(
        "HTTP/1.1 {status}\r\n{headers}Content-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

/// `WWW-Authenticate` value when `authorization` does not satisfy `auth`
fn challenge(auth: &Auth, host: &str, authorization: Option<&str>) -> Option<String> {
    match auth {
        Auth::Open => None,
        Auth::Basic(expected) => (authorization != Some(expected.as_str()))
            .then(|| r#"Basic realm="fake""#.to_string()),
        Auth::Bearer(token) => (authorization != Some(format!("Bearer {token}").as_str())).then(|| {
            format!(r#"Bearer realm="http://{host}/token",service="fake",scope="repository:*:pull""#)
        }),
    }
}

fn base64(data: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::new();
    for chunk in data.chunks(3) {
        let bytes = [chunk[0], *chunk.get(1).unwrap_or(&0), *chunk.get(2).unwrap_or(&0)];
        let n = (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);
        for i in 0..4 {
            if i <= chunk.len() {
                out.push(ALPHABET[((n >> (18 - 6 * i)) & 0x3f) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

fn tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *data)
            .expect("Failed to append archive entry");
    }
    builder
        .into_inner()
        .expect("Failed to finish tar archive")
        .finish()
        .expect("Failed to finish gzip stream")
}

fn sha256_digest(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    let hex: String = hash.iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256:{hex}")
}
