//! shellcache server entry point.
//!
//! Loads configuration, opens the cache store, runs install and activate
//! for the configured version, then serves MCP on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{CacheRouter, FetchClient, FetchConfig, Lifecycle, RouterSettings};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_version, origin = %config.origin, "Starting shellcache on stdio transport");

    let db = Arc::new(CacheDb::open(config.db_path.clone()).await?);
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let settings = RouterSettings::from_config(&config)?;
    let router = Arc::new(CacheRouter::new(network, db.clone(), settings));
    let lifecycle = Arc::new(Lifecycle::new(router, config.app_shell.clone()));

    // Until install and activate succeed the router claims nothing and forwards every request.
    match lifecycle.install().await {
        Ok(outcome) => {
            let activated = lifecycle.activate().await?;
            tracing::info!(cached = outcome.cached, deleted = activated.deleted.len(), "cache router active");
        }
        Err(e) => tracing::warn!(error = %e, "install failed; forwarding all requests until sw_install succeeds"),
    }

    let handler = handler::ShellCacheServer::new(db, lifecycle);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
