//! Certgate server entry point.
//!
//! Loads the cert trust configuration from `CERTAUTH_*` variables, registers
//! the cert mechanism and serves identity resolution over HTTP.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use certgate_auth::{AuthConfig, IdentityCache, MechanismRegistry};
use certgate_auth_cert::{CertMechanism, TrustConfiguration, TrustSettings};

mod app;

/// Certgate - certificate-header identity resolution
#[derive(Parser, Debug)]
#[command(name = "certgate")]
#[command(about = "Resolve client-certificate headers to account identities", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "CERTGATE_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Seconds a resolved identity stays cached (0 disables caching)
    #[arg(long, env = "CERTGATE_CACHE_TTL_SECS", default_value_t = 300)]
    cache_ttl_secs: u64,

    /// Let every request through without authentication
    #[arg(long, env = "CERTGATE_DISABLE_AUTH")]
    disable_auth: bool,

    /// Timeout for the owner lookup; unset means no timeout
    #[arg(long, env = "CERTGATE_UPSTREAM_TIMEOUT_SECS")]
    upstream_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,certgate=debug".into()),
        )
        .init();

    let args = Args::parse();

    // A partially configured cert mechanism must never serve requests.
    let config = match TrustConfiguration::try_from(TrustSettings::from_env()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!("Cert auth configuration invalid: {e}");
            return Err(e).context("loading CERTAUTH_* configuration");
        }
    };

    let mut client = reqwest::Client::builder();
    if let Some(secs) = args.upstream_timeout_secs {
        client = client.timeout(Duration::from_secs(secs));
    }
    let client = client.build().context("building HTTP client")?;

    let registry =
        MechanismRegistry::new().register(Arc::new(CertMechanism::with_client(config, client)));
    tracing::info!(mechanisms = ?registry.names(), "Registered auth mechanisms");

    let auth_config = AuthConfig {
        enabled: !args.disable_auth,
        cache_ttl: Duration::from_secs(args.cache_ttl_secs),
    };
    if !auth_config.enabled {
        tracing::warn!("Authentication disabled, all requests pass through");
    }

    let cache = Arc::new(IdentityCache::new(auth_config.cache_ttl));
    if !auth_config.cache_ttl.is_zero() {
        spawn_cache_purge(cache.clone(), auth_config.cache_ttl);
    }

    let app = app::router(Arc::new(registry), cache, auth_config);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    tracing::info!(addr = %args.listen, "Certgate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("Certgate stopped");
    Ok(())
}

fn spawn_cache_purge(cache: Arc<IdentityCache>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired identities");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
