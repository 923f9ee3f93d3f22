//! Response strategies, one per route policy.
//!
//! Only the current cache version is read or written. Cache failures are
//! logged and treated as misses; they never turn into a failed response.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Worker;
use super::host::Network;
use super::route::RoutePolicy;
use crate::Error;
use crate::cache::{CacheEntry, CacheStore};
use crate::http::{Request, Response};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The cached offline fallback page.
    OfflinePage,
    /// The built-in offline page.
    Synthesized,
    /// Empty 404: the asset is neither cached nor reachable.
    Unavailable,
}

/// A response chosen by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub policy: RoutePolicy,
    pub source: ResponseSource,
    pub response: Response,
}

/// Result of offering a request to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host fetches it as usual.
    Bypass,
    Respond(Served),
}

impl Worker {
    /// Route a page request and produce the response to hand back.
    ///
    /// # Errors
    ///
    /// Only `network_only` requests can fail, with the network's own error;
    /// every cached policy always yields a response.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        let policy = self.config.routes.classify_request(request);
        tracing::debug!(method = %request.method, url = %request.url, %policy, "routing request");

        let (source, response) = match policy {
            RoutePolicy::Bypass => return Ok(FetchOutcome::Bypass),
            RoutePolicy::NetworkFirst => self.network_first(request).await,
            RoutePolicy::CacheFirstRefresh => self.cache_first_refresh(request).await,
            RoutePolicy::NetworkOnly => (ResponseSource::Network, self.network.fetch(request).await?),
        };

        Ok(FetchOutcome::Respond(Served { policy, source, response }))
    }

    /// Network, then cached copy, then cached offline page, then built-in offline page.
    async fn network_first(&self, request: &Request) -> (ResponseSource, Response) {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    let entry = CacheEntry::capture(&self.config.cache_version, request, &response);
                    let store = Arc::clone(&self.store);
                    self.spawn_background(async move { store_entry(store.as_ref(), &entry).await })
                        .await;
                }
                return (ResponseSource::Network, response);
            }
            Err(e) => tracing::debug!(url = %request.url, error = %e, "network failed; trying cache"),
        }

        if let Some(entry) = self.lookup(&request.cache_key()).await {
            return (ResponseSource::Cache, entry.to_response());
        }

        if let Ok(offline_url) = self.config.origin.join(&self.config.offline_path) {
            let offline = Request::get(offline_url);
            if let Some(entry) = self.lookup(&offline.cache_key()).await {
                return (ResponseSource::OfflinePage, entry.to_response());
            }
        }

        tracing::warn!(url = %request.url, "offline with nothing cached; serving built-in page");
        (ResponseSource::Synthesized, Response::offline_html())
    }

    /// Stale-while-revalidate.
    async fn cache_first_refresh(&self, request: &Request) -> (ResponseSource, Response) {
        let cached = self.lookup(&request.cache_key()).await;
        let refresh = refresh(
            Arc::clone(&self.network),
            Arc::clone(&self.store),
            self.config.cache_version.clone(),
            request.clone(),
        );

        if let Some(entry) = cached {
            self.spawn_background(async move {
                refresh.await;
            })
            .await;
            return (ResponseSource::Cache, entry.to_response());
        }

        match refresh.await {
            Some(response) => (ResponseSource::Network, response),
            None => (ResponseSource::Unavailable, Response::not_found()),
        }
    }

    async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        match self.store.get(&self.config.cache_version, key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "cache read failed; treating as miss");
                None
            }
        }
    }
}

/// Fetch `request` and store a successful response under `version`.
///
/// Returns `None` if the network failed.
async fn refresh(
    network: Arc<dyn Network>, store: Arc<dyn CacheStore>, version: String, request: Request,
) -> Option<Response> {
    match network.fetch(&request).await {
        Ok(response) => {
            if response.is_ok() {
                let entry = CacheEntry::capture(&version, &request, &response);
                store_entry(store.as_ref(), &entry).await;
            }
            Some(response)
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "refresh failed");
            None
        }
    }
}

async fn store_entry(store: &dyn CacheStore, entry: &CacheEntry) {
    match store.put(entry).await {
        Ok(()) => tracing::debug!(url = %entry.url, version = %entry.version, "cached response"),
        Err(e) => tracing::warn!(error = %e, url = %entry.url, "cache write failed"),
    }
}
