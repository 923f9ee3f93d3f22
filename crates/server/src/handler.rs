//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use soid_client::SoidApi;
use soid_core::Worker;
use soid_core::worker::Network;

use crate::host::{HostNotifications, HostPages};
use crate::tools::attachments::{AttachmentDeleteParams, AttachmentListParams, AttachmentUploadParams};
use crate::tools::cache::{CacheGetParams, CacheKeysParams};
use crate::tools::members::MemberSearchParams;
use crate::tools::pages::{PageAttachParams, PageMessagesParams};
use crate::tools::push::{NotificationClickParams, WorkerPushParams};
use crate::tools::worker::{WorkerFetchParams, WorkerMessageParams};
use crate::tools::{attachments, cache, members, pages, push, worker};

/// The main MCP server handler for soid-sw.
#[derive(Clone)]
pub struct SoidServer {
    worker: Arc<Worker>,
    network: Arc<dyn Network>,
    pages: Arc<HostPages>,
    notifications: Arc<HostNotifications>,
    api: Arc<SoidApi>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SoidServer {
    /// Create a new server handler around a worker and its hosts.
    pub fn new(
        worker: Arc<Worker>, network: Arc<dyn Network>, pages: Arc<HostPages>, notifications: Arc<HostNotifications>,
        api: Arc<SoidApi>,
    ) -> Self {
        Self { worker, network, pages, notifications, api, tool_router: Self::tool_router() }
    }

    #[tool(description = "Offer a request to the offline worker as a page would. Returns the routing policy, \
                          where the response came from (network, cache, offline page) and the response.")]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        worker::fetch_impl(&self.worker, self.network.as_ref(), params.0).await
    }

    #[tool(description = "Install the worker: open the current cache version and pre-cache the app shell.")]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        worker::install_impl(&self.worker).await
    }

    #[tool(description = "Activate the worker: evict stale cache versions and claim open pages.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        worker::activate_impl(&self.worker).await
    }

    #[tool(description = "Post a page message to the worker (SKIP_WAITING or GET_VERSION).")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        worker::message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Worker state, cache versions and the URLs cached under the current version.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        worker::status_impl(&self.worker).await
    }

    #[tool(description = "Deliver a push message. Shows a notification, updates the app badge and notifies open pages.")]
    async fn worker_push(&self, params: Parameters<WorkerPushParams>) -> Result<CallToolResult, McpError> {
        push::push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click a notification: focus an open page (navigating it if needed) or open a new one.")]
    async fn notification_click(
        &self, params: Parameters<NotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        push::click_impl(&self.worker, &self.notifications, params.0).await
    }

    #[tool(description = "Notifications shown so far and the current app badge.")]
    async fn notifications_list(&self) -> Result<CallToolResult, McpError> {
        push::list_impl(&self.notifications).await
    }

    #[tool(description = "Open a page of the app. The page is controlled once the worker claims it.")]
    async fn page_attach(&self, params: Parameters<PageAttachParams>) -> Result<CallToolResult, McpError> {
        pages::attach_impl(&self.worker, &self.pages, params.0).await
    }

    #[tool(description = "Read and clear the messages the worker posted to a page.")]
    async fn page_messages(&self, params: Parameters<PageMessagesParams>) -> Result<CallToolResult, McpError> {
        pages::messages_impl(&self.pages, params.0).await
    }

    #[tool(description = "Get the cached response for a URL from the current cache version.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        cache::get_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache versions and the URLs stored under one of them.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        cache::keys_impl(&self.worker, params.0).await
    }

    #[tool(description = "Search church members by name, code or ID number (autocomplete).")]
    async fn member_search(&self, params: Parameters<MemberSearchParams>) -> Result<CallToolResult, McpError> {
        members::search_impl(&self.api, params.0).await
    }

    #[tool(description = "List the attachments of a financial movement.")]
    async fn attachment_list(&self, params: Parameters<AttachmentListParams>) -> Result<CallToolResult, McpError> {
        attachments::list_impl(&self.api, params.0).await
    }

    #[tool(description = "Upload a local file (max 10MB) as an attachment of a financial movement.")]
    async fn attachment_upload(
        &self, params: Parameters<AttachmentUploadParams>,
    ) -> Result<CallToolResult, McpError> {
        attachments::upload_impl(&self.api, params.0).await
    }

    #[tool(description = "Delete an attachment of a financial movement.")]
    async fn attachment_delete(
        &self, params: Parameters<AttachmentDeleteParams>,
    ) -> Result<CallToolResult, McpError> {
        attachments::delete_impl(&self.api, params.0).await
    }
}

impl ServerHandler for SoidServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "soid-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use soid_client::ApiConfig;

    #[tokio::test]
    async fn test_router_lists_every_tool() {
        let f = Fixture::new().await;
        let api = SoidApi::new(ApiConfig::from_app(&soid_core::AppConfig::default()).unwrap()).unwrap();
        let server = SoidServer::new(f.worker, f.network, f.pages, f.notifications, Arc::new(api));

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "attachment_delete",
                "attachment_list",
                "attachment_upload",
                "cache_get",
                "cache_keys",
                "member_search",
                "notification_click",
                "notifications_list",
                "page_attach",
                "page_messages",
                "worker_activate",
                "worker_fetch",
                "worker_install",
                "worker_message",
                "worker_push",
                "worker_status",
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let f = Fixture::new().await;
        let api = SoidApi::new(ApiConfig::from_app(&soid_core::AppConfig::default()).unwrap()).unwrap();
        let server = SoidServer::new(f.worker, f.network, f.pages, f.notifications, Arc::new(api));
        assert_eq!(server.get_info().server_info.name, "soid-sw");
    }
}
