//! Push relay and notification clicks.
//!
//! Each step of handling a push (notification, badge, broadcast) fails on its
//! own: a broken badge never keeps the notification from showing, and a
//! malformed payload still produces a notification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::Ordering;

use super::Worker;
use super::host::{NotificationOptions, PageHandle};
use super::message::WorkerMessage;
use crate::Error;

/// Values used when a push payload omits a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub url: String,
    pub icon: String,
    pub vibrate: Vec<u32>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "SOID".into(),
            body: "Tienes una notificación nueva.".into(),
            url: "/".into(),
            icon: "/static/core/icons/icon-192.png".into(),
            vibrate: vec![100, 50, 100],
        }
    }
}

/// How much of the push payload could be understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// A JSON object.
    Json,
    /// Not a JSON object; the text became the body.
    Text,
    /// Missing, empty or undecodable; defaults only.
    Default,
}

/// Notification content extracted from a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub badge_count: u32,
}

impl NotificationPayload {
    fn defaults(defaults: &NotificationDefaults) -> Self {
        Self { title: defaults.title.clone(), body: defaults.body.clone(), url: defaults.url.clone(), badge_count: 0 }
    }

    /// Decode a push payload, degrading from JSON to plain text to defaults.
    pub fn parse(data: Option<&[u8]>, defaults: &NotificationDefaults) -> (Self, PayloadFormat) {
        let mut payload = Self::defaults(defaults);
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            return (payload, PayloadFormat::Default);
        };

        if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(data) {
            if let Some(title) = text_field(&fields, "title") {
                payload.title = title;
            }
            if let Some(body) = text_field(&fields, "body") {
                payload.body = body;
            }
            if let Some(url) = text_field(&fields, "url") {
                payload.url = url;
            }
            payload.badge_count = badge_count(fields.get("badge_count"));
            return (payload, PayloadFormat::Json);
        }

        match std::str::from_utf8(data).map(str::trim) {
            Ok(text) if !text.is_empty() => {
                payload.body = text.to_string();
                (payload, PayloadFormat::Text)
            }
            _ => (payload, PayloadFormat::Default),
        }
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Numbers and numeric strings count; anything else, or below one, is zero.
fn badge_count(value: Option<&Value>) -> u32 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() && n >= 1.0 => n.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// What happened to the app-icon badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum BadgeUpdate {
    Set { count: u32 },
    Cleared,
    Unsupported,
    Failed { reason: String },
}

/// Result of relaying one push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PushReport {
    pub payload: NotificationPayload,
    pub format: PayloadFormat,
    pub tag: String,
    pub shown: bool,
    pub badge: BadgeUpdate,
    /// Pages the payload was delivered to.
    pub delivered: usize,
}

/// A click on a notification shown by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationClick {
    pub tag: String,
    /// Target carried by the notification; the default URL when absent.
    #[serde(default)]
    pub url: Option<String>,
}

/// Exactly one of these happens per click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum ClickOutcome {
    Focused { page: PageHandle, navigated: bool },
    Opened { page: PageHandle },
}

impl Worker {
    /// Show a notification for a push, update the badge and tell open pages.
    pub async fn handle_push(&self, data: Option<&[u8]>) -> PushReport {
        let defaults = &self.config.notifications;
        let (payload, format) = NotificationPayload::parse(data, defaults);
        if format != PayloadFormat::Json {
            tracing::warn!(?format, "push payload was not a JSON object; using fallbacks");
        }

        let tag = self.next_tag();
        let options = NotificationOptions {
            body: payload.body.clone(),
            tag: tag.clone(),
            url: payload.url.clone(),
            icon: defaults.icon.clone(),
            badge: defaults.icon.clone(),
            vibrate: defaults.vibrate.clone(),
        };

        let shown = match self.notifications.show(&payload.title, &options).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, tag = %tag, "failed to show notification");
                false
            }
        };

        let badge = self.update_badge(payload.badge_count).await;

        let message = WorkerMessage::PushReceived {
            badge_count: payload.badge_count,
            url: payload.url.clone(),
            title: payload.title.clone(),
            body: payload.body.clone(),
        };
        let delivered = self.broadcast(&message).await;

        tracing::info!(tag = %tag, shown, delivered, "relayed push");
        PushReport { payload, format, tag, shown, badge, delivered }
    }

    async fn update_badge(&self, count: u32) -> BadgeUpdate {
        let result = if count > 0 {
            self.notifications.set_badge(count).await
        } else {
            self.notifications.clear_badge().await
        };

        match result {
            Ok(()) if count > 0 => BadgeUpdate::Set { count },
            Ok(()) => BadgeUpdate::Cleared,
            Err(Error::Unsupported(_)) => {
                tracing::debug!("app badge not supported by host");
                BadgeUpdate::Unsupported
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to update app badge");
                BadgeUpdate::Failed { reason: e.to_string() }
            }
        }
    }

    /// Post `message` to every open page. Returns how many received it.
    pub async fn broadcast(&self, message: &WorkerMessage) -> usize {
        let pages = match self.pages.match_all().await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list open pages");
                return 0;
            }
        };

        let mut delivered = 0;
        for page in &pages {
            match self.pages.post_message(&page.id, message).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(error = %e, page = %page.id, "failed to post message"),
            }
        }
        delivered
    }

    /// Focus an open page of this origin, or open a new one, at the click target.
    ///
    /// # Errors
    ///
    /// Returns the host error if focusing, navigating or opening fails.
    pub async fn handle_notification_click(&self, click: &NotificationClick) -> Result<ClickOutcome, Error> {
        if let Err(e) = self.notifications.close(&click.tag).await {
            tracing::warn!(error = %e, tag = %click.tag, "failed to close notification");
        }

        let raw = click
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.config.notifications.url);
        let target = match self.config.origin.join(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, url = raw, "bad notification target; opening origin root");
                self.config.origin.join("/")?
            }
        };

        let pages = match self.pages.match_all().await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list open pages");
                Vec::new()
            }
        };

        if let Some(page) = pages.into_iter().find(|p| p.same_origin(&self.config.origin)) {
            self.pages.focus(&page.id).await?;
            let navigated = page.url != target;
            if navigated {
                self.pages.navigate(&page.id, &target).await?;
            }
            tracing::debug!(page = %page.id, navigated, "focused existing page");
            return Ok(ClickOutcome::Focused { page, navigated });
        }

        let page = self.pages.open_window(&target).await?;
        tracing::debug!(page = %page.id, url = %target, "opened new page");
        Ok(ClickOutcome::Opened { page })
    }

    fn next_tag(&self) -> String {
        let seq = self.tag_seq.fetch_add(1, Ordering::Relaxed);
        format!("soid-{}-{seq}", chrono::Utc::now().timestamp_millis())
    }
}
