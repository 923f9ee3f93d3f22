//! Interfaces the worker needs from its host.
//!
//! The host provides the network, a notification surface and the set of open
//! pages. Keeping them behind traits lets the classifier, strategies and
//! relay run against in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::message::WorkerMessage;
use crate::Error;
use crate::http::{Request, Response};

/// Outbound HTTP.
///
/// `Err` means the request never produced a response (offline, DNS, reset,
/// timeout). Error statuses are returned as `Ok` responses.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Options carried by a system notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationOptions {
    pub body: String,
    /// Unique per notification so several never collapse into one.
    pub tag: String,
    /// Page opened when the notification is clicked.
    pub url: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
}

/// System notification surface and app-icon badge.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn show(&self, title: &str, options: &NotificationOptions) -> Result<(), Error>;

    async fn close(&self, tag: &str) -> Result<(), Error>;

    /// Set the app-icon badge. Hosts without badges return `Error::Unsupported`.
    async fn set_badge(&self, count: u32) -> Result<(), Error>;

    async fn clear_badge(&self) -> Result<(), Error>;
}

/// A live page controlled (or controllable) by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageHandle {
    pub id: String,
    pub url: Url,
}

impl PageHandle {
    pub fn same_origin(&self, other: &Url) -> bool {
        self.url.origin() == other.origin()
    }
}

/// The open pages of the worker's origin.
#[async_trait]
pub trait PageClients: Send + Sync {
    /// Every open page, including ones the worker does not control yet.
    async fn match_all(&self) -> Result<Vec<PageHandle>, Error>;

    async fn focus(&self, id: &str) -> Result<(), Error>;

    async fn navigate(&self, id: &str, url: &Url) -> Result<(), Error>;

    async fn open_window(&self, url: &Url) -> Result<PageHandle, Error>;

    async fn post_message(&self, id: &str, message: &WorkerMessage) -> Result<(), Error>;

    /// Take control of every open page. Returns how many were claimed.
    async fn claim(&self) -> Result<usize, Error>;
}
