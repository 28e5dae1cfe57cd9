//! Trust configuration for the cert mechanism.
//!
//! [`TrustSettings`] is the raw, possibly incomplete record read from the
//! environment. [`TrustConfiguration`] is the validated, immutable form the
//! mechanism is built from; it can only be obtained through
//! `TryFrom<TrustSettings>`, which rejects any missing value.

use serde::Deserialize;

use certgate_auth::AuthError;

use crate::MECHANISM_NAME;

/// Prefix shared by every cert-auth environment variable.
pub const ENV_PREFIX: &str = "CERTAUTH_";

const COMMON_NAME_HEADER: &str = "CERTAUTH_COMMONNAMEHEADER";
const ISSUER_HEADER: &str = "CERTAUTH_ISSUERHEADER";
const HOST_HEADER: &str = "CERTAUTH_HOSTHEADER";
const TRUSTED_ISSUER: &str = "CERTAUTH_TRUSTEDISSUER";
const TRUSTED_HOST: &str = "CERTAUTH_TRUSTEDHOST";
const FIND_OWNER_URL: &str = "CERTAUTH_CANDLEPINFINDOWNERURL";

/// Raw cert-auth settings. Any field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrustSettings {
    /// Header carrying the client certificate subject.
    pub common_name_header: Option<String>,
    /// Header carrying the client certificate issuer.
    pub issuer_header: Option<String>,
    /// Header carrying the host the request was addressed to.
    pub host_header: Option<String>,
    /// The only issuer accepted.
    pub trusted_issuer: Option<String>,
    /// The only host accepted.
    pub trusted_host: Option<String>,
    /// Base URL of the owner lookup; the common name is appended verbatim.
    pub candlepin_find_owner_url: Option<String>,
}

impl TrustSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary `name -> value` lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            common_name_header: lookup(COMMON_NAME_HEADER),
            issuer_header: lookup(ISSUER_HEADER),
            host_header: lookup(HOST_HEADER),
            trusted_issuer: lookup(TRUSTED_ISSUER),
            trusted_host: lookup(TRUSTED_HOST),
            candlepin_find_owner_url: lookup(FIND_OWNER_URL),
        }
    }
}

/// Validated, immutable trust configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustConfiguration {
    common_name_header: String,
    issuer_header: String,
    host_header: String,
    trusted_issuer: String,
    trusted_host: String,
    lookup_endpoint_base: String,
}

impl TrustConfiguration {
    /// Header carrying the client certificate subject.
    pub fn common_name_header(&self) -> &str {
        &self.common_name_header
    }

    /// Header carrying the client certificate issuer.
    pub fn issuer_header(&self) -> &str {
        &self.issuer_header
    }

    /// Header carrying the addressed host.
    pub fn host_header(&self) -> &str {
        &self.host_header
    }

    /// The only issuer accepted.
    pub fn trusted_issuer(&self) -> &str {
        &self.trusted_issuer
    }

    /// The only host accepted.
    pub fn trusted_host(&self) -> &str {
        &self.trusted_host
    }

    /// Base URL of the owner lookup.
    pub fn lookup_endpoint_base(&self) -> &str {
        &self.lookup_endpoint_base
    }
}

impl TryFrom<TrustSettings> for TrustConfiguration {
    type Error = AuthError;

    fn try_from(settings: TrustSettings) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let mut require = |value: Option<String>, name: &str| -> String {
            match value {
                Some(v) if !v.trim().is_empty() => v,
                _ => {
                    log::error!("Missing prop: {name}");
                    missing.push(name.to_string());
                    String::new()
                }
            }
        };

        let config = Self {
            common_name_header: require(settings.common_name_header, COMMON_NAME_HEADER),
            issuer_header: require(settings.issuer_header, ISSUER_HEADER),
            host_header: require(settings.host_header, HOST_HEADER),
            trusted_issuer: require(settings.trusted_issuer, TRUSTED_ISSUER),
            trusted_host: require(settings.trusted_host, TRUSTED_HOST),
            lookup_endpoint_base: require(settings.candlepin_find_owner_url, FIND_OWNER_URL),
        };

        if !missing.is_empty() {
            return Err(AuthError::MissingConfiguration {
                mechanism: MECHANISM_NAME,
                missing,
            });
        }

        Ok(config)
    }
}
