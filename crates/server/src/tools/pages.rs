//! Page tools: open a page and read what the worker posted to it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use soid_core::Worker;
use soid_core::worker::{PageHandle, WorkerMessage};

use super::json_result;
use crate::error::ToolError;
use crate::host::{HostPages, PageRecord};

/// Input parameters for page_attach tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PageAttachParams {
    /// Site path or absolute URL the page shows.
    pub url: String,
}

/// Output structure for page_attach tool.
#[derive(Debug, Clone, Serialize)]
pub struct PageAttachOutput {
    pub page: PageHandle,
    /// Every open page after attaching.
    pub pages: Vec<PageRecord>,
}

/// Implementation of the page_attach tool.
pub async fn attach_impl(
    worker: &Worker, pages: &HostPages, params: PageAttachParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }
    let page = pages.attach(worker.resolve(&params.url)?).await;
    json_result(&PageAttachOutput { page, pages: pages.list().await })
}

/// Input parameters for page_messages tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PageMessagesParams {
    /// Page id returned by page_attach.
    pub page_id: String,
}

/// Output structure for page_messages tool.
#[derive(Debug, Clone, Serialize)]
pub struct PageMessagesOutput {
    pub page_id: String,
    /// Messages posted since the last call, oldest first.
    pub messages: Vec<WorkerMessage>,
}

/// Implementation of the page_messages tool.
pub async fn messages_impl(pages: &HostPages, params: PageMessagesParams) -> Result<CallToolResult, McpError> {
    let messages = pages.drain(&params.page_id).await?;
    json_result(&PageMessagesOutput { page_id: params.page_id, messages })
}
