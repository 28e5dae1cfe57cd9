//! Reading raw credentials from request headers.

use http::HeaderMap;

use crate::TrustConfiguration;

/// Distinguished-name marker preceding the subject in the common name header.
const CN_MARKER: &str = "/CN=";

/// Credentials as read from a single request, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCredentials {
    /// Decoded certificate subject.
    pub common_name: Option<String>,
    /// Decoded certificate issuer.
    pub issuer: Option<String>,
    /// Host header content, verbatim.
    pub host: Option<String>,
}

/// Read the three configured headers. Never fails; absent headers become
/// `None`, and bytes that are not UTF-8 are decoded lossily.
pub fn extract_credentials(headers: &HeaderMap, config: &TrustConfiguration) -> RawCredentials {
    RawCredentials {
        common_name: header_str(headers, config.common_name_header())
            .map(|raw| decode_common_name(&raw)),
        issuer: header_str(headers, config.issuer_header()).map(|raw| decode_issuer(&raw)),
        host: header_str(headers, config.host_header()),
    }
}

/// URL-decode, drop the `/CN=` marker, trim.
pub fn decode_common_name(raw: &str) -> String {
    url_decode(raw).replacen(CN_MARKER, "", 1).trim().to_string()
}

/// URL-decode, trim.
pub fn decode_issuer(raw: &str) -> String {
    url_decode(raw).trim().to_string()
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

// Percent sequences are read as UTF-8 and decoded lossily; `%uXXXX` is left as is.
fn url_decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned(),
    }
}
