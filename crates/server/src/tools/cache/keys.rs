//! cache_keys tool implementation.
//!
//! Lists cache versions and the request URLs stored under one of them.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use soid_core::Worker;

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Cache version to list (default: the worker's current version).
    #[serde(default)]
    pub version: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub version: String,
    pub current: bool,
    pub versions: Vec<String>,
    pub urls: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(worker: &Worker, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let current = &worker.config().cache_version;
    let version = params.version.unwrap_or_else(|| current.clone());

    let output = CacheKeysOutput {
        current: &version == current,
        versions: worker.store().versions().await?,
        urls: worker.store().keys(&version).await?,
        version,
    };
    json_result(&output)
}
