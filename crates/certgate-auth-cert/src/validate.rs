//! Trust validation of extracted credentials.

use certgate_auth::AuthError;

use crate::{RawCredentials, TrustConfiguration};

/// Whether a header value counts as supplied.
///
/// Blank values and the literal string `"undefined"` (a stringified missing
/// value from upstream proxies) are treated as absent.
pub fn is_present(value: Option<&str>) -> bool {
    match value {
        Some(v) => !v.trim().is_empty() && v != "undefined",
        None => false,
    }
}

/// Check credentials against the trust configuration.
///
/// Rules run in a fixed order and the first failure wins, so a wrong host is
/// reported without revealing anything about the other fields.
pub fn ensure_credentials(
    creds: Option<&RawCredentials>,
    config: &TrustConfiguration,
) -> Result<(), AuthError> {
    let creds = creds.ok_or(AuthError::MissingHeaders)?;

    // Host
    let host = creds.host.as_deref();
    if !is_present(host) {
        return Err(AuthError::MissingHeader("host"));
    }
    let host = host.unwrap_or_default();
    if host != config.trusted_host() {
        return Err(AuthError::InvalidHost {
            expected: config.trusted_host().to_string(),
            actual: host.to_string(),
        });
    }

    // Common name
    if !is_present(creds.common_name.as_deref()) {
        return Err(AuthError::MissingHeader("common name"));
    }

    // Issuer
    let issuer = creds.issuer.as_deref();
    if !is_present(issuer) {
        return Err(AuthError::MissingHeader("issuer"));
    }
    if issuer != Some(config.trusted_issuer()) {
        return Err(AuthError::InvalidIssuer);
    }

    Ok(())
}
