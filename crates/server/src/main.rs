//! lantern-proxy entry point.
//!
//! Boots the caching proxy in front of the configured origin. Install and
//! activation run in the background; until they finish every request is
//! passed straight through. Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::Result;
use lantern_client::{CachingProxy, FetchClient, FetchConfig};
use lantern_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let proxy = Arc::new(CachingProxy::from_config(&config, db, fetcher)?);

    tokio::spawn({
        let proxy = proxy.clone();
        async move {
            match proxy.install().await {
                Ok(_) => {
                    proxy.activate().await;
                }
                Err(e) => tracing::error!("install failed, staying in passthrough: {}", e),
            }
        }
    });

    let state = handler::AppState::new(proxy, config.origin_url()?);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("lantern-proxy listening on {} for {}", config.listen_addr, config.origin);

    axum::serve(listener, handler::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
