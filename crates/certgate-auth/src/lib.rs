//! Generic authentication primitives for Certgate.
//!
//! Provides:
//! - [`ResolvedIdentity`] — Canonical identity produced by a mechanism
//! - [`Mechanism`] — Trait for one pluggable authentication method
//! - [`Authenticator`] / [`MechanismRegistry`] — Per-request mechanism selection
//! - [`IdentityCache`] — TTL cache keyed by credential fingerprint
//! - [`AuthLayer`] / [`AuthService`] — Tower middleware over a registry
//! - [`AuthConfig`] — Configuration for the auth layer
//! - [`AuthError`] — Auth-specific error types

use std::time::Duration;

mod cache;
mod error;
mod mechanism;
mod middleware;
mod user;

pub use cache::IdentityCache;
pub use error::{AuthError, ErrorKind};
pub use mechanism::{Authenticator, BoxFuture, Mechanism, MechanismRegistry};
pub use middleware::{AuthLayer, AuthService};
pub use user::{ResolvedIdentity, identity_from_parts, sso_username_from_parts};

/// Configuration for the auth middleware.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Whether authentication is enabled. When false, all requests pass through.
    pub enabled: bool,
    /// How long a resolved identity stays cached. Zero disables the cache.
    pub cache_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_ttl: Duration::from_secs(300),
        }
    }
}
