//! Router and handlers.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use certgate_auth::{
    AuthConfig, AuthLayer, IdentityCache, MechanismRegistry, identity_from_parts,
    sso_username_from_parts,
};

/// Build the application router. `/health` is never authenticated.
pub fn router(
    registry: Arc<MechanismRegistry>,
    cache: Arc<IdentityCache>,
    config: AuthConfig,
) -> Router {
    let api = Router::new()
        .route("/api/identity", get(identity))
        .layer(AuthLayer::with_cache(registry, cache, config));

    Router::new().route("/health", get(health)).merge(api)
}

async fn health() -> &'static str {
    "ok"
}

/// Echo the identity the middleware resolved for this request.
async fn identity(parts: Parts) -> Response {
    tracing::debug!(user = sso_username_from_parts(&parts), "identity requested");

    match identity_from_parts(&parts) {
        Some(identity) => Json(identity.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": {
                    "category": "authentication",
                    "message": "authentication is disabled",
                }
            })),
        )
            .into_response(),
    }
}
