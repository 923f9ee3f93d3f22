//! soid-sw server entry point.
//!
//! Boots the offline worker for the configured origin and serves its tools
//! over the MCP stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use soid_client::{ApiConfig, FetchClient, FetchConfig, SoidApi};
use soid_core::worker::Network;
use soid_core::{AppConfig, CacheDb, Worker};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod host;
mod tools;

#[cfg(test)]
mod testing;

use host::{HostNotifications, HostPages};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        origin = %config.origin,
        version = %config.cache_version,
        "Starting soid-sw server on stdio transport"
    );

    let store = Arc::new(CacheDb::open(&config.db_path).await?);
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let pages = Arc::new(HostPages::default());
    let notifications = Arc::new(HostNotifications::new(config.badge_supported));
    let worker = Arc::new(Worker::new(
        config.worker_config()?,
        store,
        Arc::clone(&network),
        notifications.clone(),
        pages.clone(),
    ));
    let api = Arc::new(SoidApi::new(ApiConfig::from_app(&config)?)?);

    let report = worker.install().await;
    tracing::info!(
        precached = report.precached.len(),
        failed = report.failed.len(),
        activated = report.activation.is_some(),
        "worker installed"
    );

    let handler = handler::SoidServer::new(worker, network, pages, notifications, api);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
