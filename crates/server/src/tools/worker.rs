//! Worker lifecycle and fetch tools.
//!
//! - `worker_fetch`: offer a request to the worker, as a page would
//! - `worker_install`, `worker_activate`: drive the lifecycle
//! - `worker_message`: post a page message (`SKIP_WAITING`, `GET_VERSION`)
//! - `worker_status`: state, cache versions and stored URLs

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use soid_core::worker::{FetchOutcome, Network, ResponseSource, RoutePolicy, VersionReply, WorkerState};
use soid_core::{Request, Worker};

use super::{body_text, json_result};
use crate::error::ToolError;

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Site path (`/miembros/`) or absolute URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Accept header, e.g. `text/html` for page navigations.
    #[serde(default)]
    pub accept: Option<String>,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Wait for background cache writes and refreshes before answering.
    #[serde(default)]
    pub settle: bool,
}

/// Output structure for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    pub url: String,
    pub policy: RoutePolicy,
    /// False when the worker let the request through untouched.
    pub intercepted: bool,
    pub source: ResponseSource,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Body as text; absent for binary bodies.
    pub body: Option<String>,
    pub body_len: usize,
}

/// Implementation of the worker_fetch tool.
///
/// A request the worker does not intercept goes straight to the network, as
/// the browser would do.
pub async fn fetch_impl(
    worker: &Worker, network: &dyn Network, params: WorkerFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let url = worker.resolve(&params.url)?;
    let method = params.method.as_deref().unwrap_or("GET");
    let mut request = Request::new(method, url);
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    if let Some(accept) = &params.accept {
        request = request.with_accept(accept);
    }

    let (policy, intercepted, source, response) = match worker.handle_fetch(&request).await? {
        FetchOutcome::Respond(served) => (served.policy, true, served.source, served.response),
        FetchOutcome::Bypass => {
            let response = network.fetch(&request).await?;
            (RoutePolicy::Bypass, false, ResponseSource::Network, response)
        }
    };

    if params.settle {
        worker.settle().await;
    }

    let output = WorkerFetchOutput {
        url: request.url.to_string(),
        policy,
        intercepted,
        source,
        status: response.status,
        body: body_text(&response.body),
        body_len: response.body.len(),
        headers: response.headers,
    };
    json_result(&output)
}

/// Implementation of the worker_install tool.
pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    json_result(&worker.install().await)
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    json_result(&worker.activate().await)
}

/// Input parameters for worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Raw message text, e.g. `SKIP_WAITING` or `GET_VERSION`.
    pub message: String,
}

/// Output structure for worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    /// Present for `GET_VERSION`.
    pub reply: Option<VersionReply>,
    /// Worker state after handling the message.
    pub state: WorkerState,
}

/// Implementation of the worker_message tool.
pub async fn message_impl(worker: &Worker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let reply = worker.handle_message(&params.message).await;
    json_result(&WorkerMessageOutput { reply, state: worker.state().await })
}

/// Output structure for worker_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusOutput {
    pub state: WorkerState,
    pub cache_version: String,
    pub origin: String,
    /// Every cache version present in the store.
    pub versions: Vec<String>,
    /// URLs stored under the current version.
    pub cached_urls: Vec<String>,
}

/// Implementation of the worker_status tool.
pub async fn status_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let config = worker.config();
    let output = WorkerStatusOutput {
        state: worker.state().await,
        cache_version: config.cache_version.clone(),
        origin: config.origin.to_string(),
        versions: worker.store().versions().await?,
        cached_urls: worker.store().keys(&config.cache_version).await?,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, output_json};
    use soid_core::Response;

    fn get(url: &str) -> WorkerFetchParams {
        WorkerFetchParams { url: url.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let f = Fixture::new().await;
        let result = fetch_impl(&f.worker, f.network.as_ref(), get("  ")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_navigation_network_first() {
        let f = Fixture::new().await;
        f.network.respond("https://soid.example/miembros/", Response::new(200, "lista"));

        let params = WorkerFetchParams { accept: Some("text/html".into()), settle: true, ..get("/miembros/") };
        let json = output_json(&fetch_impl(&f.worker, f.network.as_ref(), params).await.unwrap());

        assert_eq!(json["policy"], "network_first");
        assert_eq!(json["source"], "network");
        assert_eq!(json["body"], "lista");
        assert_eq!(json["intercepted"], true);
    }

    #[tokio::test]
    async fn test_fetch_offline_navigation_served_from_cache() {
        let f = Fixture::new().await;
        f.network.respond("https://soid.example/miembros/", Response::new(200, "lista"));
        let params = WorkerFetchParams { accept: Some("text/html".into()), settle: true, ..get("/miembros/") };
        fetch_impl(&f.worker, f.network.as_ref(), params.clone()).await.unwrap();

        f.network.clear();
        let json = output_json(&fetch_impl(&f.worker, f.network.as_ref(), params).await.unwrap());

        assert_eq!(json["source"], "cache");
        assert_eq!(json["body"], "lista");
    }

    #[tokio::test]
    async fn test_fetch_bypass_goes_to_network() {
        let f = Fixture::new().await;
        f.network.respond("https://soid.example/api/buscar-miembros/?q=ana", Response::new(200, "{}"));

        let json = output_json(
            &fetch_impl(&f.worker, f.network.as_ref(), get("/api/buscar-miembros/?q=ana"))
                .await
                .unwrap(),
        );

        assert_eq!(json["policy"], "bypass");
        assert_eq!(json["intercepted"], false);
        assert_eq!(json["status"], 200);
    }

    #[tokio::test]
    async fn test_fetch_bypass_offline_is_error() {
        let f = Fixture::new().await;
        let result = fetch_impl(&f.worker, f.network.as_ref(), get("/admin/")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_static_asset_unavailable() {
        let f = Fixture::new().await;
        let json = output_json(
            &fetch_impl(&f.worker, f.network.as_ref(), get("/static/core/app.css"))
                .await
                .unwrap(),
        );

        assert_eq!(json["policy"], "cache_first_refresh");
        assert_eq!(json["source"], "unavailable");
        assert_eq!(json["status"], 404);
    }

    #[tokio::test]
    async fn test_install_and_status() {
        let f = Fixture::new().await;
        f.network.respond("https://soid.example/", Response::new(200, "inicio"));
        f.network.respond("https://soid.example/offline/", Response::new(200, "offline"));

        let json = output_json(&install_impl(&f.worker).await.unwrap());
        assert_eq!(json["precached"].as_array().unwrap().len(), 2);

        let json = output_json(&status_impl(&f.worker).await.unwrap());
        assert_eq!(json["state"], "activated");
        assert_eq!(json["cache_version"], "soid-tf-cache-v5");
        assert_eq!(json["versions"], serde_json::json!(["soid-tf-cache-v5"]));
        assert_eq!(json["cached_urls"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_activate_evicts_old_versions() {
        let f = Fixture::new().await;
        f.worker.store().open("soid-tf-cache-v4").await.unwrap();

        let json = output_json(&activate_impl(&f.worker).await.unwrap());
        assert_eq!(json["evicted"], serde_json::json!(["soid-tf-cache-v4"]));
    }

    #[tokio::test]
    async fn test_message_get_version() {
        let f = Fixture::new().await;
        let params = WorkerMessageParams { message: "GET_VERSION".into() };
        let json = output_json(&message_impl(&f.worker, params).await.unwrap());

        assert_eq!(json["reply"]["version"], "soid-tf-cache-v5");
        assert_eq!(json["state"], "parsed");
    }

    #[tokio::test]
    async fn test_message_unknown_has_no_reply() {
        let f = Fixture::new().await;
        let params = WorkerMessageParams { message: "HOLA".into() };
        let json = output_json(&message_impl(&f.worker, params).await.unwrap());
        assert!(json["reply"].is_null());
    }
}
