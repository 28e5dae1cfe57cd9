//! Certificate-header authentication for Certgate.
//!
//! Implements [`certgate_auth::Mechanism`] for requests that arrive through a
//! TLS-terminating proxy which forwards the client certificate's subject and
//! issuer in headers:
//! - Trust configuration loaded once from `CERTAUTH_*` variables
//! - Header decoding and ordered trust validation
//! - Owner lookup against the upstream identity service

use std::sync::Arc;

use http::HeaderMap;

use certgate_auth::{AuthError, BoxFuture, Mechanism, ResolvedIdentity};

mod config;
mod extract;
mod resolve;
mod validate;

pub use config::{ENV_PREFIX, TrustConfiguration, TrustSettings};
pub use extract::{RawCredentials, decode_common_name, decode_issuer, extract_credentials};
pub use resolve::{CustomerNumber, OwnerLookup, UpstreamRecord, build_user_object};
pub use validate::{ensure_credentials, is_present};

/// Registry name of the cert mechanism.
pub const MECHANISM_NAME: &str = "cert";

/// The certificate-header mechanism.
pub struct CertMechanism {
    config: Arc<TrustConfiguration>,
    lookup: OwnerLookup,
}

impl CertMechanism {
    /// Create a mechanism with a default HTTP client.
    pub fn new(config: Arc<TrustConfiguration>) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a mechanism with a caller-supplied HTTP client (timeouts,
    /// proxies and TLS roots are the caller's concern).
    pub fn with_client(config: Arc<TrustConfiguration>, http_client: reqwest::Client) -> Self {
        let lookup = OwnerLookup::new(config.lookup_endpoint_base(), http_client);
        Self { config, lookup }
    }

    /// Build from raw settings, failing if any setting is missing.
    pub fn from_settings(settings: TrustSettings) -> Result<Self, AuthError> {
        let config = TrustConfiguration::try_from(settings)?;
        Ok(Self::new(Arc::new(config)))
    }

    /// Build from the process environment.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_settings(TrustSettings::from_env())
    }

    /// The trust configuration in use.
    pub fn config(&self) -> &TrustConfiguration {
        &self.config
    }
}

impl Mechanism for CertMechanism {
    type Credentials = RawCredentials;

    fn name(&self) -> &'static str {
        MECHANISM_NAME
    }

    fn applies(&self, headers: &HeaderMap) -> bool {
        [
            self.config.common_name_header(),
            self.config.issuer_header(),
            self.config.host_header(),
        ]
        .into_iter()
        .any(|name| headers.contains_key(name))
    }

    fn credentials(&self, headers: &HeaderMap) -> Option<RawCredentials> {
        Some(extract_credentials(headers, &self.config))
    }

    fn ensure_credentials(&self, creds: Option<&RawCredentials>) -> Result<(), AuthError> {
        ensure_credentials(creds, &self.config)
    }

    fn cache_key(&self, creds: &RawCredentials) -> String {
        creds.common_name.clone().unwrap_or_default()
    }

    fn resolve<'a>(
        &'a self,
        creds: &'a RawCredentials,
    ) -> BoxFuture<'a, Result<ResolvedIdentity, AuthError>> {
        Box::pin(async move {
            let common_name = creds.common_name.as_deref().unwrap_or_default();
            let record = self.lookup.remote_lookup(common_name).await?;
            let identity = build_user_object(&record);
            log::info!(
                "Resolved certificate '{common_name}' to account {}",
                identity.account_number
            );
            Ok(identity)
        })
    }
}
