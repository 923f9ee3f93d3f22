//! cache_get tool implementation.
//!
//! Looks up the cached response for a request in the current cache version.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use soid_core::{Error, Request, Worker};

use crate::tools::{body_text, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Site path or absolute URL of the cached request.
    pub url: String,

    /// HTTP method of the cached request (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub version: String,
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub stored_at: String,
    /// Body as text; absent for binary bodies.
    pub body: Option<String>,
    pub body_len: usize,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &Worker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = worker.resolve(&params.url)?;
    let request = Request::new(params.method.as_deref().unwrap_or("GET"), url);
    let version = &worker.config().cache_version;

    let entry = worker
        .store()
        .get(version, &request.cache_key())
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} {}", request.method, request.url)))?;

    let output = CacheGetOutput {
        body: body_text(&entry.body),
        body_len: entry.body.len(),
        version: entry.version,
        key: entry.key,
        method: entry.method,
        url: entry.url,
        status: entry.status,
        headers: entry.headers,
        stored_at: entry.stored_at,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, output_json};
    use soid_core::{CacheEntry, Response};

    #[tokio::test]
    async fn test_get_impl_missing() {
        let f = Fixture::new().await;
        let params = CacheGetParams { url: "/nada/".into(), method: None };

        let result = get_impl(&f.worker, params).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let f = Fixture::new().await;
        let request = Request::get(f.worker.resolve("/offline/").unwrap());
        let entry = CacheEntry::capture("soid-tf-cache-v5", &request, &Response::offline_html());
        f.worker.store().put(&entry).await.unwrap();

        let params = CacheGetParams { url: "/offline/".into(), method: Some("get".into()) };
        let json = output_json(&get_impl(&f.worker, params).await.unwrap());

        assert_eq!(json["status"], 200);
        assert_eq!(json["url"], "https://soid.example/offline/");
        assert!(json["body"].as_str().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_get_ignores_other_versions() {
        let f = Fixture::new().await;
        let request = Request::get(f.worker.resolve("/").unwrap());
        let entry = CacheEntry::capture("soid-tf-cache-v4", &request, &Response::new(200, "viejo"));
        f.worker.store().put(&entry).await.unwrap();

        let params = CacheGetParams { url: "/".into(), method: None };
        assert!(get_impl(&f.worker, params).await.is_err());
    }
}
