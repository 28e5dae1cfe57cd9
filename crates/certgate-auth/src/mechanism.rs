//! Authentication mechanisms and the registry that selects between them.
//!
//! A [`Mechanism`] implements one authentication method as a pipeline of
//! small steps: read credentials from headers, validate them, derive a cache
//! key, and resolve an identity. Every mechanism is also an
//! [`Authenticator`], which runs that pipeline against an [`IdentityCache`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::HeaderMap;

use crate::{AuthError, IdentityCache, ResolvedIdentity};

/// A boxed, `Send` future borrowed for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One pluggable authentication method.
pub trait Mechanism: Send + Sync + 'static {
    /// Credentials read from a single request.
    type Credentials: Send + Sync;

    /// Short unique name, used for cache namespacing and logging.
    fn name(&self) -> &'static str;

    /// Whether the request carries anything this mechanism understands.
    fn applies(&self, headers: &HeaderMap) -> bool;

    /// Read credentials from request headers. `None` means the headers could
    /// not be read at all.
    fn credentials(&self, headers: &HeaderMap) -> Option<Self::Credentials>;

    /// Check credentials, failing on the first violated rule.
    fn ensure_credentials(&self, creds: Option<&Self::Credentials>) -> Result<(), AuthError>;

    /// Fingerprint of validated credentials for the identity cache.
    fn cache_key(&self, creds: &Self::Credentials) -> String;

    /// Resolve validated credentials to an identity.
    fn resolve<'a>(
        &'a self,
        creds: &'a Self::Credentials,
    ) -> BoxFuture<'a, Result<ResolvedIdentity, AuthError>>;
}

/// Object-safe view of a mechanism, as stored in the registry.
pub trait Authenticator: Send + Sync {
    /// Name of the underlying mechanism.
    fn mechanism_name(&self) -> &'static str;

    /// Whether this authenticator should handle the request.
    fn handles(&self, headers: &HeaderMap) -> bool;

    /// Run the full pipeline: extract, validate, consult the cache, resolve.
    fn authenticate<'a>(
        &'a self,
        headers: &'a HeaderMap,
        cache: &'a IdentityCache,
    ) -> BoxFuture<'a, Result<ResolvedIdentity, AuthError>>;
}

impl<M: Mechanism> Authenticator for M {
    fn mechanism_name(&self) -> &'static str {
        self.name()
    }

    fn handles(&self, headers: &HeaderMap) -> bool {
        self.applies(headers)
    }

    fn authenticate<'a>(
        &'a self,
        headers: &'a HeaderMap,
        cache: &'a IdentityCache,
    ) -> BoxFuture<'a, Result<ResolvedIdentity, AuthError>> {
        Box::pin(async move {
            let creds = self.credentials(headers);
            self.ensure_credentials(creds.as_ref())?;
            let creds = creds.ok_or(AuthError::MissingHeaders)?;

            let key = self.cache_key(&creds);
            if let Some(identity) = cache.get(self.name(), &key) {
                log::debug!("Identity cache hit for {} key '{key}'", self.name());
                return Ok(identity);
            }

            let identity = self.resolve(&creds).await?;
            cache.insert(self.name(), &key, identity.clone());
            Ok(identity)
        })
    }
}

/// Ordered set of authenticators; the first one that handles a request wins.
#[derive(Clone, Default)]
pub struct MechanismRegistry {
    authenticators: Vec<Arc<dyn Authenticator>>,
}

impl MechanismRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authenticator after those already present.
    pub fn register(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticators.push(authenticator);
        self
    }

    /// Find an authenticator by mechanism name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Authenticator>> {
        self.authenticators
            .iter()
            .find(|a| a.mechanism_name() == name)
    }

    /// Pick the authenticator for a request.
    pub fn select(&self, headers: &HeaderMap) -> Option<&Arc<dyn Authenticator>> {
        self.authenticators.iter().find(|a| a.handles(headers))
    }

    /// Names of every registered mechanism, in selection order.
    pub fn names(&self) -> Vec<&'static str> {
        self.authenticators
            .iter()
            .map(|a| a.mechanism_name())
            .collect()
    }

    /// Authenticate a request with whichever mechanism handles it.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        cache: &IdentityCache,
    ) -> Result<ResolvedIdentity, AuthError> {
        let authenticator = self.select(headers).ok_or(AuthError::NoCredentials)?;
        authenticator.authenticate(headers, cache).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Accepts `x-test-user`, rejects the literal user "mallory".
    struct HeaderMechanism {
        resolutions: AtomicUsize,
    }

    impl HeaderMechanism {
        fn new() -> Self {
            Self {
                resolutions: AtomicUsize::new(0),
            }
        }
    }

    impl Mechanism for HeaderMechanism {
        type Credentials = String;

        fn name(&self) -> &'static str {
            "header"
        }

        fn applies(&self, headers: &HeaderMap) -> bool {
            headers.contains_key("x-test-user")
        }

        fn credentials(&self, headers: &HeaderMap) -> Option<String> {
            headers
                .get("x-test-user")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        }

        fn ensure_credentials(&self, creds: Option<&String>) -> Result<(), AuthError> {
            match creds {
                None => Err(AuthError::MissingHeaders),
                Some(user) if user == "mallory" => Err(AuthError::InvalidIssuer),
                Some(_) => Ok(()),
            }
        }

        fn cache_key(&self, creds: &String) -> String {
            creds.clone()
        }

        fn resolve<'a>(
            &'a self,
            creds: &'a String,
        ) -> BoxFuture<'a, Result<ResolvedIdentity, AuthError>> {
            Box::pin(async move {
                self.resolutions.fetch_add(1, Ordering::SeqCst);
                Ok(ResolvedIdentity {
                    account_number: creds.clone(),
                    org_id: "test".to_string(),
                    is_active: true,
                    is_org_admin: false,
                    is_internal: false,
                    sso_username: creds.clone(),
                })
            })
        }
    }

    fn headers_for(user: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-test-user", user.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_pipeline_resolves_and_caches() {
        let mechanism = Arc::new(HeaderMechanism::new());
        let cache = IdentityCache::new(Duration::from_secs(60));
        let headers = headers_for("alice");

        let first = mechanism.authenticate(&headers, &cache).await.unwrap();
        let second = mechanism.authenticate(&headers, &cache).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.account_number, "alice");
        assert_eq!(mechanism.resolutions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pipeline_validation_failure_skips_resolution() {
        let mechanism = HeaderMechanism::new();
        let cache = IdentityCache::new(Duration::from_secs(60));

        let result = mechanism
            .authenticate(&headers_for("mallory"), &cache)
            .await;

        assert!(matches!(result, Err(AuthError::InvalidIssuer)));
        assert_eq!(mechanism.resolutions.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_registry_without_matching_mechanism() {
        let registry = MechanismRegistry::new().register(Arc::new(HeaderMechanism::new()));
        let cache = IdentityCache::disabled();

        let result = registry.authenticate(&HeaderMap::new(), &cache).await;
        assert!(matches!(result, Err(AuthError::NoCredentials)));
    }

    #[tokio::test]
    async fn test_registry_dispatches_to_handler() {
        let registry = MechanismRegistry::new().register(Arc::new(HeaderMechanism::new()));
        let cache = IdentityCache::disabled();

        let identity = registry
            .authenticate(&headers_for("bob"), &cache)
            .await
            .unwrap();
        assert_eq!(identity.sso_username, "bob");
    }

    #[test]
    fn test_registry_lookup_by_name() {
        let registry = MechanismRegistry::new().register(Arc::new(HeaderMechanism::new()));
        assert!(registry.get("header").is_some());
        assert!(registry.get("cert").is_none());
        assert_eq!(registry.names(), vec!["header"]);
    }
}
