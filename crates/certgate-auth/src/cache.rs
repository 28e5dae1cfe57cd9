//! In-memory identity cache keyed by credential fingerprint.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::ResolvedIdentity;

/// A cached identity with the time it was resolved.
struct CachedIdentity {
    identity: ResolvedIdentity,
    resolved_at: Instant,
}

/// TTL cache of resolved identities.
///
/// Keys are `<mechanism>:<cache key>` so two mechanisms can never collide.
/// A zero TTL disables caching entirely.
pub struct IdentityCache {
    entries: RwLock<HashMap<String, CachedIdentity>>,
    ttl: Duration,
}

impl IdentityCache {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Look up a live entry.
    pub fn get(&self, mechanism: &str, key: &str) -> Option<ResolvedIdentity> {
        if self.ttl.is_zero() {
            return None;
        }

        let entries = self.entries.read().ok()?;
        let cached = entries.get(&Self::slot(mechanism, key))?;

        if cached.resolved_at.elapsed() > self.ttl {
            return None;
        }

        Some(cached.identity.clone())
    }

    /// Store an identity, replacing any previous entry for the key.
    pub fn insert(&self, mechanism: &str, key: &str, identity: ResolvedIdentity) {
        if self.ttl.is_zero() {
            return;
        }

        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(
                    Self::slot(mechanism, key),
                    CachedIdentity {
                        identity,
                        resolved_at: Instant::now(),
                    },
                );
            }
            Err(e) => log::warn!("Identity cache poisoned, skipping insert: {e}"),
        }
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, cached| cached.resolved_at.elapsed() <= ttl);
        before - entries.len()
    }

    /// Number of stored entries, live or expired.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(mechanism: &str, key: &str) -> String {
        format!("{mechanism}:{key}")
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
