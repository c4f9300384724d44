//! Registry access gate
//!
//! Every pull goes through [`RegistryAccess::open`], which looks up the
//! registry credential and checks connectivity before handing out a puller.
//! Nothing is cached between calls: each artifact gets a fresh check.

use super::authn::{Credential, CredentialStore};
use super::client::RegistryClient;
use super::puller::RegistryPuller;
use super::Puller;
use crate::error::{ArtifactError, Result};
use crate::ui::Reporter;

/// Opens pullers for registries
pub trait RegistryAccess {
    /// Return a puller for `registry`, failing when it cannot be reached
    fn open(&self, registry: &str, reporter: &mut dyn Reporter) -> Result<Box<dyn Puller>>;
}

/// Connectivity and authentication check
pub trait ConnectivityCheck {
    fn check(&self, registry: &str, credential: &Credential) -> Result<()>;
}

/// Check pinging the registry's `/v2/` endpoint
pub struct HttpConnectivityCheck {
    plain_http: bool,
}

impl HttpConnectivityCheck {
    pub fn new(plain_http: bool) -> Self {
        Self { plain_http }
    }
}

impl ConnectivityCheck for HttpConnectivityCheck {
    fn check(&self, registry: &str, credential: &Credential) -> Result<()> {
        RegistryClient::new(credential.clone(), self.plain_http)?.ping(registry)
    }
}

/// Registry access backed by a credential store and a connectivity check
pub struct RegistryGate<S, C> {
    store: S,
    check: C,
    plain_http: bool,
}

impl<S: CredentialStore, C: ConnectivityCheck> RegistryGate<S, C> {
    pub fn new(store: S, check: C, plain_http: bool) -> Self {
        Self {
            store,
            check,
            plain_http,
        }
    }
}

impl<S: CredentialStore, C: ConnectivityCheck> RegistryAccess for RegistryGate<S, C> {
    fn open(&self, registry: &str, reporter: &mut dyn Reporter) -> Result<Box<dyn Puller>> {
        let credential = self.store.credential(registry)?;
        if credential.is_anonymous() {
            reporter.verbose(&format!("No credentials for {registry:?}, using anonymous access"));
        }

        if let Err(e) = self.check.check(registry, &credential) {
            reporter.verbose(&e.to_string());
            return Err(ArtifactError::RegistryUnreachable {
                registry: registry.to_string(),
            });
        }

        let client = RegistryClient::new(credential, self.plain_http)?;
        Ok(Box::new(RegistryPuller::new(client)))
    }
}
