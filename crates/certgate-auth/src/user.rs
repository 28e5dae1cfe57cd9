//! Resolved user identity and extraction helpers.

use serde::{Deserialize, Serialize};

/// The canonical identity of an authenticated request.
///
/// Produced by a mechanism once per successful resolution, cached by the
/// [`IdentityCache`](crate::IdentityCache) and stored in HTTP request
/// extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    /// Customer account number.
    pub account_number: String,
    /// Organization identifier.
    pub org_id: String,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the user administers the organization.
    pub is_org_admin: bool,
    /// Whether the user is an internal employee.
    pub is_internal: bool,
    /// Username used for SSO-style attribution.
    pub sso_username: String,
}

/// Extract the `ResolvedIdentity` from HTTP request `Parts`, if present.
pub fn identity_from_parts(parts: &http::request::Parts) -> Option<&ResolvedIdentity> {
    parts.extensions.get::<ResolvedIdentity>()
}

/// Extract the SSO username from HTTP request `Parts`.
///
/// Returns `"anonymous"` if no identity is present (auth disabled).
pub fn sso_username_from_parts(parts: &http::request::Parts) -> &str {
    parts
        .extensions
        .get::<ResolvedIdentity>()
        .map(|u| u.sso_username.as_str())
        .unwrap_or("anonymous")
}
