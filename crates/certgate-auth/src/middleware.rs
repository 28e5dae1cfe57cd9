//! Tower authentication middleware.
//!
//! `AuthLayer` and `AuthService` wrap any inner service with identity
//! resolution through a [`MechanismRegistry`].

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, StatusCode};
use tower::{Layer, Service};

use crate::{AuthConfig, AuthError, ErrorKind, IdentityCache, MechanismRegistry};

/// Tower `Layer` that wraps services with request authentication.
#[derive(Clone)]
pub struct AuthLayer {
    registry: Arc<MechanismRegistry>,
    cache: Arc<IdentityCache>,
    config: AuthConfig,
}

impl AuthLayer {
    /// Create a new auth layer. The identity cache is sized from `config`.
    pub fn new(registry: Arc<MechanismRegistry>, config: AuthConfig) -> Self {
        let cache = Arc::new(IdentityCache::new(config.cache_ttl));
        Self::with_cache(registry, cache, config)
    }

    /// Create a new auth layer sharing an existing identity cache.
    pub fn with_cache(
        registry: Arc<MechanismRegistry>,
        cache: Arc<IdentityCache>,
        config: AuthConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            config,
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            registry: self.registry.clone(),
            cache: self.cache.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that authenticates requests before forwarding them.
///
/// On success, inserts `ResolvedIdentity` into request extensions where it's
/// available to downstream handlers.
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    registry: Arc<MechanismRegistry>,
    cache: Arc<IdentityCache>,
    config: AuthConfig,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let registry = self.registry.clone();
        let cache = self.cache.clone();
        let enabled = self.config.enabled;

        Box::pin(async move {
            // Dev mode — no auth required
            if !enabled {
                let resp = inner
                    .call(req)
                    .await
                    .unwrap_or_else(|infallible| match infallible {});
                return Ok(resp.into_response());
            }

            let headers = req.headers().clone();
            match registry.authenticate(&headers, &cache).await {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    let resp = inner
                        .call(req)
                        .await
                        .unwrap_or_else(|infallible| match infallible {});
                    Ok(resp.into_response())
                }
                Err(auth_err) => {
                    log::warn!("Authentication failed: {auth_err}");
                    Ok(error_response(&auth_err))
                }
            }
        })
    }
}

/// Map an auth error onto a JSON error response.
fn error_response(err: &AuthError) -> axum::response::Response {
    let (status, category) = match err.kind() {
        ErrorKind::Validation => (StatusCode::UNAUTHORIZED, "authentication"),
        ErrorKind::Upstream => (StatusCode::BAD_GATEWAY, "identity_lookup"),
        ErrorKind::Configuration => (StatusCode::INTERNAL_SERVER_ERROR, "configuration"),
    };

    let body = serde_json::json!({
        "error": {
            "category": category,
            "message": err.to_string(),
        }
    });

    (
        status,
        [(http::header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&body).unwrap_or_default(),
    )
        .into_response()
}
