//! Push relay tools: deliver a push, click a notification, read the log.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use soid_core::Worker;
use soid_core::worker::NotificationClick;

use super::json_result;
use crate::host::HostNotifications;

/// Input parameters for worker_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushParams {
    /// Push data: a JSON object (`title`, `body`, `url`, `badge_count`),
    /// plain text, or absent.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Implementation of the worker_push tool.
pub async fn push_impl(worker: &Worker, params: WorkerPushParams) -> Result<CallToolResult, McpError> {
    let report = worker.handle_push(params.payload.as_deref().map(str::as_bytes)).await;
    json_result(&report)
}

/// Input parameters for notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// Tag of the clicked notification.
    pub tag: String,
    /// Target URL; defaults to the one the notification was shown with.
    #[serde(default)]
    pub url: Option<String>,
}

/// Implementation of the notification_click tool.
pub async fn click_impl(
    worker: &Worker, notifications: &HostNotifications, params: NotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let url = match params.url {
        Some(url) => Some(url),
        None => notifications.target_url(&params.tag).await,
    };
    let click = NotificationClick { tag: params.tag, url };
    json_result(&worker.handle_notification_click(&click).await?)
}

/// Implementation of the notifications_list tool.
pub async fn list_impl(notifications: &HostNotifications) -> Result<CallToolResult, McpError> {
    json_result(&notifications.snapshot().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, output_json};

    #[tokio::test]
    async fn test_push_json_payload() {
        let f = Fixture::new().await;
        let page = f.pages.attach(url::Url::parse("https://soid.example/").unwrap()).await;
        let params = WorkerPushParams {
            payload: Some(r#"{"title": "Agenda", "body": "Culto a las 7", "url": "/agenda/", "badge_count": "3"}"#.into()),
        };

        let json = output_json(&push_impl(&f.worker, params).await.unwrap());

        assert_eq!(json["format"], "json");
        assert_eq!(json["payload"]["title"], "Agenda");
        assert_eq!(json["badge"]["status"], "set");
        assert_eq!(json["delivered"], 1);

        let messages = f.pages.drain(&page.id).await.unwrap();
        assert_eq!(messages.len(), 1);

        let log = output_json(&list_impl(&f.notifications).await.unwrap());
        assert_eq!(log["notifications"][0]["title"], "Agenda");
        assert_eq!(log["badge"], 3);
    }

    #[tokio::test]
    async fn test_push_without_payload_uses_defaults() {
        let f = Fixture::new().await;
        let json = output_json(&push_impl(&f.worker, WorkerPushParams::default()).await.unwrap());

        assert_eq!(json["format"], "default");
        assert_eq!(json["payload"]["title"], "SOID");
        assert_eq!(json["payload"]["body"], "Tienes una notificación nueva.");
        assert_eq!(json["badge"]["status"], "cleared");
    }

    #[tokio::test]
    async fn test_push_badge_unsupported() {
        let f = Fixture::with_badges(false).await;
        let params = WorkerPushParams { payload: Some(r#"{"badge_count": 2}"#.into()) };
        let json = output_json(&push_impl(&f.worker, params).await.unwrap());

        assert_eq!(json["shown"], true);
        assert_eq!(json["badge"]["status"], "unsupported");
    }

    #[tokio::test]
    async fn test_click_opens_window_without_pages() {
        let f = Fixture::new().await;
        let params = NotificationClickParams { tag: "soid-1".into(), url: Some("/notificaciones/".into()) };
        let json = output_json(&click_impl(&f.worker, &f.notifications, params).await.unwrap());

        assert_eq!(json["action"], "opened");
        assert_eq!(json["page"]["url"], "https://soid.example/notificaciones/");
    }

    #[tokio::test]
    async fn test_click_by_tag_uses_notification_url() {
        let f = Fixture::new().await;
        let params = WorkerPushParams { payload: Some(r#"{"url": "/agenda/"}"#.into()) };
        let pushed = output_json(&push_impl(&f.worker, params).await.unwrap());
        let tag = pushed["tag"].as_str().unwrap().to_string();

        let params = NotificationClickParams { tag, url: None };
        let json = output_json(&click_impl(&f.worker, &f.notifications, params).await.unwrap());

        assert_eq!(json["action"], "opened");
        assert_eq!(json["page"]["url"], "https://soid.example/agenda/");
        assert!(f.notifications.snapshot().await.notifications[0].closed);
    }

    #[tokio::test]
    async fn test_click_unknown_tag_opens_default_url() {
        let f = Fixture::new().await;
        let params = NotificationClickParams { tag: "soid-0-9".into(), url: None };
        let json = output_json(&click_impl(&f.worker, &f.notifications, params).await.unwrap());

        assert_eq!(json["page"]["url"], "https://soid.example/");
    }

    #[tokio::test]
    async fn test_click_focuses_existing_page() {
        let f = Fixture::new().await;
        f.pages.attach(url::Url::parse("https://soid.example/").unwrap()).await;

        let params = NotificationClickParams { tag: "soid-1".into(), url: Some("/agenda/".into()) };
        let json = output_json(&click_impl(&f.worker, &f.notifications, params).await.unwrap());

        assert_eq!(json["action"], "focused");
        assert_eq!(json["navigated"], true);
        assert_eq!(f.pages.list().await[0].page.url.path(), "/agenda/");
    }
}
