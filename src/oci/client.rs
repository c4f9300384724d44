//! Blocking HTTP client for the OCI distribution API
//!
//! Handles the two authentication schemes registries advertise through
//! `WWW-Authenticate`:
//! - `Basic`: username/password sent on every request
//! - `Bearer`: token fetched from the advertised realm, then sent on every request

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, WWW_AUTHENTICATE};
use serde::Deserialize;

use super::authn::Credential;
use crate::error::{ArtifactError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Host serving the API for `docker.io` references
const DOCKER_HUB_API_HOST: &str = "registry-1.docker.io";

/// Authentication challenge from a `WWW-Authenticate` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub scheme: String,
    pub params: HashMap<String, String>,
}

impl Challenge {
    /// Parse `Bearer realm="...",service="...",scope="..."`
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, rest) = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) => (scheme, rest),
            None => (header, ""),
        };
        if scheme.is_empty() {
            return None;
        }

        Some(Self {
            scheme: scheme.to_string(),
            params: parse_params(rest),
        })
    }

    fn is(&self, scheme: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(scheme)
    }

    fn from_response(response: &Response) -> Option<Self> {
        response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::parse)
    }
}

fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| *c == ',' || c.is_whitespace()) {
            chars.next();
        }

        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        let key = key.trim();
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    other => value.push(other),
                }
            }
        } else {
            while let Some(c) = chars.peek() {
                if *c == ',' {
                    break;
                }
                value.push(*c);
                chars.next();
            }
            value = value.trim().to_string();
        }

        params.insert(key.to_ascii_lowercase(), value);
    }

    params
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Registry client bound to one credential
///
/// Not shared between threads; the bearer token cache uses interior mutability
/// so callers only need `&self`.
pub struct RegistryClient {
    http: Client,
    credential: Credential,
    plain_http: bool,
    token: RefCell<Option<String>>,
}

impl RegistryClient {
    pub fn new(credential: Credential, plain_http: bool) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("artifactctl/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            token: RefCell::new(credential.token.clone()),
            http,
            credential,
            plain_http,
        })
    }

    /// URL of `path` under the registry's `/v2/` API root
    pub fn url(&self, registry: &str, path: &str) -> String {
        let scheme = if self.plain_http { "http" } else { "https" };
        format!("{scheme}://{}/v2/{path}", api_host(registry))
    }

    /// Check that the registry is reachable and accepts the credential
    pub fn ping(&self, registry: &str) -> Result<()> {
        let url = self.url(registry, "");
        let response = self.send(&url, &[])?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }
        if status != StatusCode::UNAUTHORIZED {
            return Err(request_failed(&url, format!("registry answered {status}")));
        }

        let challenge = Challenge::from_response(&response).ok_or_else(|| {
            request_failed(&url, "401 without a WWW-Authenticate challenge")
        })?;
        self.authenticate(&challenge, &url)?;

        let retry = self.send(&url, &[])?;
        if retry.status().is_success() {
            Ok(())
        } else {
            Err(request_failed(
                &url,
                format!("authentication rejected: {}", retry.status()),
            ))
        }
    }

    /// GET `url`, authenticating once if the registry asks for it
    pub fn get(&self, url: &str, accept: &[&str]) -> Result<Response> {
        let mut response = self.send(url, accept)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(challenge) = Challenge::from_response(&response) {
                self.authenticate(&challenge, url)?;
                response = self.send(url, accept)?;
            }
        }

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(request_failed(url, format!("registry answered {status}")))
        }
    }

    fn send(&self, url: &str, accept: &[&str]) -> Result<Response> {
        let mut request = self.http.get(url);
        if !accept.is_empty() {
            request = request.header(ACCEPT, accept.join(", "));
        }

        if let Some(token) = self.token.borrow().as_deref() {
            request = request.bearer_auth(token);
        } else if let Some(username) = &self.credential.username {
            request = request.basic_auth(username, self.credential.password.as_deref());
        }

        request
            .send()
            .map_err(|e| request_failed(url, e.to_string()))
    }

    fn authenticate(&self, challenge: &Challenge, url: &str) -> Result<()> {
        if challenge.is("basic") {
            if self.credential.username.is_none() {
                return Err(request_failed(url, "registry requires a username and password"));
            }
            // Credentials are already attached by `send`; a static token would take precedence
            self.token.replace(None);
            return Ok(());
        }

        if !challenge.is("bearer") {
            return Err(request_failed(
                url,
                format!("unsupported authentication scheme {}", challenge.scheme),
            ));
        }

        let realm = challenge
            .params
            .get("realm")
            .ok_or_else(|| request_failed(url, "bearer challenge without realm"))?;

        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(service) = challenge.params.get("service") {
            query.push(("service", service.as_str()));
        }
        if let Some(scope) = challenge.params.get("scope") {
            query.push(("scope", scope.as_str()));
        }

        let mut request = self.http.get(realm).query(&query);
        if let Some(username) = &self.credential.username {
            request = request.basic_auth(username, self.credential.password.as_deref());
        }

        let response = request
            .send()
            .map_err(|e| request_failed(realm, e.to_string()))?;
        if !response.status().is_success() {
            return Err(request_failed(
                realm,
                format!("token request answered {}", response.status()),
            ));
        }

        let body: TokenResponse = response.json()?;
        let token = body
            .token
            .or(body.access_token)
            .ok_or_else(|| request_failed(realm, "token response without token"))?;
        self.token.replace(Some(token));
        Ok(())
    }
}

fn api_host(registry: &str) -> &str {
    if registry == super::reference::DEFAULT_REGISTRY {
        DOCKER_HUB_API_HOST
    } else {
        registry
    }
}

fn request_failed(url: &str, reason: impl Into<String>) -> ArtifactError {
    ArtifactError::RegistryRequestFailed {
        url: url.to_string(),
        reason: reason.into(),
    }
}
